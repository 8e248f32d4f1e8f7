//! Inbound events and their classification
//!
//! - **github**: GitHub Actions issue/PR events (forward direction)
//! - **linear**: Linear webhook payloads (reverse direction)
//!
//! Classification is a pure function of the payload: it only looks at the
//! declared action and the delta between previous and new values.

pub mod github;
pub mod linear;

pub use github::{ForwardAction, GitHubEventPayload, TicketAction, TicketEvent};
pub use linear::{LinearWebhook, Reassignment, StateCategory, TrackerActions, WebhookAction};
