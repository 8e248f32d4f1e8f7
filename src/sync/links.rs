//! Link storage on top of the transports
//!
//! GitHub side: the link is the automation account's tracking comment.
//! Linear side: the link is the `GH-ID:` line of the issue description,
//! which arrives with every webhook so it is read straight from the payload.

use super::ports::{CreatedRecord, TicketSystem};
use crate::events::LinearWebhook;
use crate::link::{self, TicketRef};
use crate::Result;

/// Links stored as comments on GitHub issues
pub struct CommentLinks<'a, T: ?Sized> {
    ticket: &'a T,
    automation_login: &'a str,
}

impl<'a, T: TicketSystem + ?Sized> CommentLinks<'a, T> {
    pub fn new(ticket: &'a T, automation_login: &'a str) -> Self {
        Self {
            ticket,
            automation_login,
        }
    }

    /// Linear id linked to the subject, scanning all comments in order
    pub async fn find(&self, subject: &TicketRef) -> Result<Option<String>> {
        let comments = self.ticket.list_comments(subject).await?;
        Ok(link::linear_id_from_comments(&comments, self.automation_login))
    }

    /// Post the tracking comment for a freshly created Linear issue
    pub async fn record(&self, subject: &TicketRef, record: &CreatedRecord) -> Result<()> {
        let body = link::tracking_comment(&record.url, &record.id);
        self.ticket.create_comment(subject, &body).await
    }
}

/// GitHub coordinates linked to the Linear issue of a webhook
pub fn description_link(webhook: &LinearWebhook) -> Option<TicketRef> {
    webhook
        .data
        .description
        .as_deref()
        .and_then(link::decode_ticket_ref)
}
