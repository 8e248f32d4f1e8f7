//! GitHub issue/PR events
//!
//! Parsed from the event JSON that GitHub Actions writes to `GITHUB_EVENT_PATH`.

use crate::link::TicketRef;
use crate::{Result, SyncError};
use serde::Deserialize;
use std::path::Path;

/// The subset of a GitHub Actions `issues` / `pull_request` event we read
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubEventPayload {
    pub action: String,
    #[serde(default)]
    pub issue: Option<SubjectPayload>,
    #[serde(default)]
    pub pull_request: Option<SubjectPayload>,
    pub repository: RepositoryPayload,
    #[serde(default)]
    pub sender: Option<ActorPayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubjectPayload {
    pub number: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryPayload {
    pub full_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActorPayload {
    pub login: String,
}

/// Declared action of a GitHub event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketAction {
    Opened,
    Closed,
    Other(String),
}

impl From<&str> for TicketAction {
    fn from(action: &str) -> Self {
        match action {
            "opened" => TicketAction::Opened,
            "closed" => TicketAction::Closed,
            other => TicketAction::Other(other.to_string()),
        }
    }
}

/// One GitHub event, reduced to what the sync engine needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketEvent {
    pub action: TicketAction,
    pub subject: TicketRef,
    /// Account that triggered the event
    pub actor: String,
}

impl TicketEvent {
    /// Build an event from a parsed payload.
    ///
    /// `actor` overrides the payload's `sender` (GitHub Actions exposes the
    /// triggering account as `GITHUB_ACTOR`).
    pub fn from_payload(payload: GitHubEventPayload, actor: Option<String>) -> Result<Self> {
        let number = payload
            .issue
            .as_ref()
            .or(payload.pull_request.as_ref())
            .map(|subject| subject.number)
            .ok_or_else(|| {
                SyncError::Parse("Event has neither an issue nor a pull_request".to_string())
            })?;

        let subject = TicketRef::from_full_name(&payload.repository.full_name, number)?;

        let actor = actor
            .or_else(|| payload.sender.map(|sender| sender.login))
            .ok_or_else(|| SyncError::Parse("Event has no actor".to_string()))?;

        Ok(Self {
            action: TicketAction::from(payload.action.as_str()),
            subject,
            actor,
        })
    }

    /// Read and parse the event file written by GitHub Actions
    pub fn from_path(path: impl AsRef<Path>, actor: Option<String>) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "Reading GitHub event payload");

        let content = std::fs::read_to_string(path)?;
        let payload: GitHubEventPayload = serde_json::from_str(&content)?;
        Self::from_payload(payload, actor)
    }

    pub fn classify(&self) -> ForwardAction {
        classify(self)
    }
}

/// Sync action for the GitHub -> Linear direction.
///
/// There is no reopen or reassign in this direction; Linear is the source
/// of truth for those transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardAction {
    Create,
    Close,
    None,
}

pub fn classify(event: &TicketEvent) -> ForwardAction {
    match event.action {
        TicketAction::Opened => ForwardAction::Create,
        TicketAction::Closed => ForwardAction::Close,
        TicketAction::Other(_) => ForwardAction::None,
    }
}
