//! Collaborator interfaces the sync engine drives
//!
//! `TicketSystem` is implemented by the GitHub adapter and `ExternalTracker`
//! by the Linear adapter. Tests use in-memory fakes.

use crate::link::TicketRef;
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Open/closed state of a GitHub issue or PR
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketState {
    Open,
    Closed,
}

impl TicketState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketState::Open => "open",
            TicketState::Closed => "closed",
        }
    }
}

/// A GitHub issue or pull request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketSubject {
    pub author: String,
    pub title: String,
    pub url: String,
    pub is_pull_request: bool,
    pub state: TicketState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketComment {
    pub author: String,
    pub body: String,
}

/// Linear issue returned by a create call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedRecord {
    pub id: String,
    pub url: String,
}

/// Fields to change on a Linear issue
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowState {
    pub id: String,
    pub name: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamMember {
    pub id: String,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    pub display_name: String,
}

/// Issue/comment/assignee operations against GitHub
#[async_trait]
pub trait TicketSystem: Send + Sync {
    async fn get_subject(&self, subject: &TicketRef) -> Result<TicketSubject>;

    /// Comments in creation order
    async fn list_comments(&self, subject: &TicketRef) -> Result<Vec<TicketComment>>;

    async fn create_comment(&self, subject: &TicketRef, body: &str) -> Result<()>;

    async fn set_state(&self, subject: &TicketRef, state: TicketState) -> Result<()>;

    async fn list_assignees(&self, subject: &TicketRef) -> Result<Vec<String>>;

    async fn add_assignees(&self, subject: &TicketRef, logins: &[String]) -> Result<()>;

    async fn remove_assignees(&self, subject: &TicketRef, logins: &[String]) -> Result<()>;
}

/// Issue, workflow state and team operations against Linear
#[async_trait]
pub trait ExternalTracker: Send + Sync {
    /// `Ok(None)` when the tracker accepted the call but returned no issue
    async fn create_record(
        &self,
        team_id: &str,
        title: &str,
        description: &str,
    ) -> Result<Option<CreatedRecord>>;

    /// Returns the tracker's `success` flag
    async fn update_record(&self, id: &str, update: RecordUpdate) -> Result<bool>;

    async fn find_workflow_states(
        &self,
        team_id: &str,
        name: &str,
        category: &str,
    ) -> Result<Vec<WorkflowState>>;

    async fn team_members(&self, team_id: &str) -> Result<Vec<TeamMember>>;

    async fn get_person(&self, id: &str) -> Result<Person>;
}
