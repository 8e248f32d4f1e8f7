//! Bidirectional sync engine
//!
//! One call handles one inbound event to completion. Every remote call is
//! awaited before the next decision; the first failure aborts the call and
//! nothing already applied is rolled back.
//!
//! Re-delivery of an event is safe: creation first checks for an existing
//! link, and close/reopen/reassign set absolute state.

use super::assignee::{resolve_assignee, AssigneePicker, ClockPicker};
use super::links::{description_link, CommentLinks};
use super::ports::{
    ExternalTracker, RecordUpdate, TicketState, TicketSystem, WorkflowState,
};
use crate::events::{
    ForwardAction, LinearWebhook, Reassignment, TicketEvent,
};
use crate::identity::IdentityMap;
use crate::link::{self, TicketRef};
use crate::{Result, SyncError};
use serde::Serialize;
use tracing::{debug, info};

/// Settings the engine needs at runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// Linear team that receives mirrored issues (forward direction only)
    pub team_id: Option<String>,
    /// Account used by the Linear -> GitHub direction; GitHub events
    /// triggered by it are not propagated back
    pub automation_actor: String,
    /// Author of the tracking comments on GitHub
    pub comment_author: String,
    pub autoclosed_state_name: String,
    pub autoclosed_state_category: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            team_id: None,
            automation_actor: "nomic-foundation-automation".to_string(),
            comment_author: "github-actions[bot]".to_string(),
            autoclosed_state_name: "Autoclosed".to_string(),
            autoclosed_state_category: "completed".to_string(),
        }
    }
}

/// Side effect performed during a sync
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SyncAction {
    CreatedRecord { id: String, url: String },
    LinkedTicket { linear_id: String },
    AssignedRecord { display_name: String },
    AssignedTicket { login: String },
    ClosedRecord { linear_id: String },
    ClosedTicket,
    ReopenedTicket,
    ReassignedTicket { login: Option<String> },
}

/// Why an event led to no side effect
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Nothing to do for this action type
    Unsupported,
    /// The GitHub issue already has a Linear issue
    AlreadyLinked,
    /// Pull request opened by a maintainer in response to a Linear issue
    OwnPullRequest,
    /// No link between the two sides
    NoLink,
    /// Event caused by the reverse-direction automation
    FeedbackLoop,
    /// Linear webhook about something other than an issue
    NotAnIssue,
}

/// Outcome of one engine invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub subject: Option<String>,
    pub actions: Vec<SyncAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<SkipReason>,
}

impl SyncReport {
    fn for_subject(subject: &impl ToString) -> Self {
        Self {
            subject: Some(subject.to_string()),
            actions: Vec::new(),
            skipped: None,
        }
    }

    fn skip(mut self, reason: SkipReason) -> Self {
        self.skipped = Some(reason);
        self
    }

    /// Whether any side effect was performed
    pub fn is_noop(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Orchestrates GitHub <-> Linear sync
pub struct SyncEngine<T, E> {
    ticket: T,
    tracker: E,
    /// Full users table, used to map Linear assignees back to GitHub
    identities: IdentityMap,
    /// Users eligible as default assignees of new Linear issues
    maintainers: IdentityMap,
    settings: EngineSettings,
    picker: Box<dyn AssigneePicker>,
}

impl<T: TicketSystem, E: ExternalTracker> SyncEngine<T, E> {
    pub fn new(ticket: T, tracker: E, identities: IdentityMap, settings: EngineSettings) -> Self {
        Self {
            ticket,
            tracker,
            maintainers: identities.clone(),
            identities,
            settings,
            picker: Box::new(ClockPicker),
        }
    }

    /// Restrict the GitHub -> Linear direction to a subset of the users table
    pub fn with_maintainers(mut self, maintainers: IdentityMap) -> Self {
        self.maintainers = maintainers;
        self
    }

    /// Replace the default-assignee policy
    pub fn with_picker(mut self, picker: impl AssigneePicker + 'static) -> Self {
        self.picker = Box::new(picker);
        self
    }

    pub fn ticket_system(&self) -> &T {
        &self.ticket
    }

    pub fn tracker(&self) -> &E {
        &self.tracker
    }

    pub fn identities(&self) -> &IdentityMap {
        &self.identities
    }

    pub fn maintainers(&self) -> &IdentityMap {
        &self.maintainers
    }

    fn team_id(&self) -> Result<&str> {
        self.settings
            .team_id
            .as_deref()
            .ok_or_else(|| SyncError::Config("Linear team id is not configured".to_string()))
    }

    fn comment_links(&self) -> CommentLinks<'_, T> {
        CommentLinks::new(&self.ticket, &self.settings.comment_author)
    }

    // ============ GitHub -> Linear ============

    /// Handle an issue/PR event coming from GitHub
    pub async fn handle_ticket_event(&self, event: &TicketEvent) -> Result<SyncReport> {
        info!(subject = %event.subject, action = ?event.action, actor = %event.actor, "Handling GitHub event");

        match event.classify() {
            ForwardAction::Create => self.create_record(&event.subject).await,
            ForwardAction::Close => self.close_record(event).await,
            ForwardAction::None => {
                debug!(subject = %event.subject, "Nothing to sync for this action");
                Ok(SyncReport::for_subject(&event.subject).skip(SkipReason::Unsupported))
            }
        }
    }

    async fn create_record(&self, subject_ref: &TicketRef) -> Result<SyncReport> {
        let mut report = SyncReport::for_subject(subject_ref);
        let links = self.comment_links();

        if let Some(linear_id) = links.find(subject_ref).await? {
            info!(subject = %subject_ref, linear_id = %linear_id, "Already linked to a Linear issue");
            return Ok(report.skip(SkipReason::AlreadyLinked));
        }

        let subject = self.ticket.get_subject(subject_ref).await?;

        // Maintainers open PRs in response to Linear issues; those already
        // have a Linear issue driving them.
        let is_own = self.maintainers.to_external(&subject.author).is_some();
        let suppress_creation = subject.is_pull_request && is_own;

        let login = resolve_assignee(&subject.author, &self.maintainers, self.picker.as_ref())
            .ok_or_else(|| SyncError::Config("No maintainers configured".to_string()))?;
        let display_name = self
            .maintainers
            .to_external(&login)
            .ok_or_else(|| {
                SyncError::Config(format!("GitHub user {} has no Linear user configured", login))
            })?
            .to_string();

        info!(
            subject = %subject_ref,
            is_pull_request = subject.is_pull_request,
            is_own,
            suppress_creation,
            assignee = %login,
            "Resolved GitHub subject"
        );

        if suppress_creation {
            return Ok(report.skip(SkipReason::OwnPullRequest));
        }

        let team_id = self.team_id()?;
        let title = link::record_title(&subject.title, subject_ref);
        let description = link::record_description(&subject.url, subject_ref);

        let record = self
            .tracker
            .create_record(team_id, &title, &description)
            .await?
            .ok_or_else(|| {
                SyncError::RemoteOperation(format!(
                    "Failed to create Linear issue for GitHub issue/PR: {}",
                    subject.url
                ))
            })?;
        info!(subject = %subject_ref, linear_id = %record.id, "Created Linear issue");
        report.actions.push(SyncAction::CreatedRecord {
            id: record.id.clone(),
            url: record.url.clone(),
        });

        links.record(subject_ref, &record).await?;
        report.actions.push(SyncAction::LinkedTicket {
            linear_id: record.id.clone(),
        });

        self.assign_record(team_id, &record.id, &display_name).await?;
        report.actions.push(SyncAction::AssignedRecord {
            display_name: display_name.clone(),
        });

        info!(subject = %subject_ref, login = %login, "Assigning GitHub issue");
        self.ticket
            .add_assignees(subject_ref, std::slice::from_ref(&login))
            .await?;
        report.actions.push(SyncAction::AssignedTicket { login });

        Ok(report)
    }

    /// Assign a Linear issue to the team member with this exact display name
    async fn assign_record(&self, team_id: &str, record_id: &str, display_name: &str) -> Result<()> {
        let members = self.tracker.team_members(team_id).await?;
        let mut matching = members
            .into_iter()
            .filter(|member| member.display_name == display_name);

        let member = match (matching.next(), matching.next()) {
            (Some(member), None) => member,
            (None, _) => {
                return Err(SyncError::LookupAmbiguity(format!(
                    "Linear user ({}) not present in team {}",
                    display_name, team_id
                )))
            }
            (Some(_), Some(_)) => {
                return Err(SyncError::LookupAmbiguity(format!(
                    "Multiple Linear users named {} in team {}",
                    display_name, team_id
                )))
            }
        };

        let update = RecordUpdate {
            assignee_id: Some(member.id),
            ..Default::default()
        };
        if !self.tracker.update_record(record_id, update).await? {
            return Err(SyncError::RemoteOperation(format!(
                "Failed to assign Linear issue {}",
                record_id
            )));
        }
        info!(linear_id = %record_id, assignee = %display_name, "Assigned Linear issue");
        Ok(())
    }

    async fn close_record(&self, event: &TicketEvent) -> Result<SyncReport> {
        let mut report = SyncReport::for_subject(&event.subject);

        let Some(linear_id) = self.comment_links().find(&event.subject).await? else {
            info!(subject = %event.subject, "No associated Linear issue found");
            return Ok(report.skip(SkipReason::NoLink));
        };

        // This close was made by the Linear -> GitHub sync; pushing it back
        // would overwrite the state chosen in Linear.
        if event.actor == self.settings.automation_actor {
            info!(subject = %event.subject, actor = %event.actor, "Closed by sync automation, not propagating");
            return Ok(report.skip(SkipReason::FeedbackLoop));
        }

        let team_id = self.team_id()?;
        let state = self.autoclosed_state(team_id).await?;

        info!(subject = %event.subject, linear_id = %linear_id, "Closing Linear issue");
        let update = RecordUpdate {
            state_id: Some(state.id),
            ..Default::default()
        };
        if !self.tracker.update_record(&linear_id, update).await? {
            return Err(SyncError::RemoteOperation(format!(
                "Failed to close Linear issue {}",
                linear_id
            )));
        }

        report.actions.push(SyncAction::ClosedRecord { linear_id });
        Ok(report)
    }

    async fn autoclosed_state(&self, team_id: &str) -> Result<WorkflowState> {
        let name = &self.settings.autoclosed_state_name;
        let mut states = self
            .tracker
            .find_workflow_states(team_id, name, &self.settings.autoclosed_state_category)
            .await?;

        match states.len() {
            0 => Err(SyncError::LookupAmbiguity(format!("{} state not found", name))),
            1 => Ok(states.remove(0)),
            n => Err(SyncError::LookupAmbiguity(format!(
                "Multiple {} states found ({})",
                name, n
            ))),
        }
    }

    // ============ Linear -> GitHub ============

    /// Handle a webhook coming from Linear
    pub async fn handle_tracker_event(&self, webhook: &LinearWebhook) -> Result<SyncReport> {
        if !webhook.is_issue() {
            debug!(kind = ?webhook.kind, "Ignoring non-issue Linear webhook");
            return Ok(SyncReport {
                subject: None,
                actions: Vec::new(),
                skipped: Some(SkipReason::NotAnIssue),
            });
        }

        let Some(subject) = description_link(webhook) else {
            info!(linear_id = %webhook.data.id, "No associated GitHub issue found");
            return Ok(SyncReport {
                subject: None,
                actions: Vec::new(),
                skipped: Some(SkipReason::NoLink),
            });
        };

        let mut report = SyncReport::for_subject(&subject);
        let actions = webhook.classify();
        debug!(subject = %subject, ?actions, "Classified Linear webhook");

        if actions.is_empty() {
            return Ok(report.skip(SkipReason::Unsupported));
        }

        if actions.close {
            info!(subject = %subject, "Closing GitHub issue");
            self.ticket.set_state(&subject, TicketState::Closed).await?;
            report.actions.push(SyncAction::ClosedTicket);
        }

        if actions.reopen {
            info!(subject = %subject, "Reopening GitHub issue");
            self.ticket.set_state(&subject, TicketState::Open).await?;
            report.actions.push(SyncAction::ReopenedTicket);
        }

        if let Some(reassignment) = &actions.reassign {
            info!(subject = %subject, "Updating GitHub issue assignees");
            let login = self.resolve_login(reassignment).await?;
            self.reassign_ticket(&subject, login.as_deref()).await?;
            report.actions.push(SyncAction::ReassignedTicket { login });
        }

        Ok(report)
    }

    /// GitHub login of the new Linear assignee
    async fn resolve_login(&self, reassignment: &Reassignment) -> Result<Option<String>> {
        let Reassignment::To(user_id) = reassignment else {
            return Ok(None);
        };

        let person = self.tracker.get_person(user_id).await?;
        self.identities
            .to_ticket_system(&person.display_name)
            .map(|login| Some(login.to_string()))
            .ok_or_else(|| {
                SyncError::Config(format!("Linear user {} not configured", person.display_name))
            })
    }

    /// Converge the GitHub assignees to exactly `{login}` (or nobody)
    async fn reassign_ticket(&self, subject: &TicketRef, login: Option<&str>) -> Result<()> {
        let stale: Vec<String> = self
            .ticket
            .list_assignees(subject)
            .await?
            .into_iter()
            .filter(|current| Some(current.as_str()) != login)
            .collect();

        if !stale.is_empty() {
            debug!(subject = %subject, removed = ?stale, "Removing GitHub assignees");
            self.ticket.remove_assignees(subject, &stale).await?;
        }

        if let Some(login) = login {
            info!(subject = %subject, login = %login, "Assigning GitHub issue");
            self.ticket
                .add_assignees(subject, &[login.to_string()])
                .await?;
        }

        Ok(())
    }
}
