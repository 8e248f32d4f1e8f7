//! Sync engine
//!
//! Bidirectional GitHub <-> Linear synchronization.
//!
//! # Flow
//!
//! 1. **Classify**: turn the inbound event into sync actions
//! 2. **Resolve link**: find the cross-system link (GitHub comment or Linear description)
//! 3. **Apply**: call the other system's transport, one awaited step at a time
//! 4. **Link back**: on first sync only, post the tracking comment on GitHub

mod assignee;
mod engine;
mod links;
mod ports;

pub use assignee::{resolve_assignee, AssigneePicker, ClockPicker, FirstPicker};
pub use engine::{EngineSettings, SkipReason, SyncAction, SyncEngine, SyncReport};
pub use links::{description_link, CommentLinks};
pub use ports::{
    CreatedRecord, ExternalTracker, Person, RecordUpdate, TeamMember, TicketComment,
    TicketState, TicketSubject, TicketSystem, WorkflowState,
};
