//! Link codec
//!
//! The cross-system link has no storage of its own. It lives as a marked
//! line of text in two places:
//!
//! - a comment on the GitHub issue: `LINEAR-ID: <linear issue id>`
//! - the description of the Linear issue: `GH-ID: <owner>/<repo>#<number>`
//!
//! Decoding scans line by line for the first line containing the marker.
//! A line whose trailing token does not parse is treated as "no link".

use crate::sync::TicketComment;
use crate::{Result, SyncError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Marker for the line embedded in the GitHub comment
pub const LINEAR_ID_MARKER: &str = "LINEAR-ID:";

/// Marker for the line embedded in the Linear description
pub const GH_ID_MARKER: &str = "GH-ID:";

/// Coordinates of a GitHub issue or pull request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TicketRef {
    pub owner: String,
    pub repo: String,
    pub number: u64,
}

impl TicketRef {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>, number: u64) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            number,
        }
    }

    /// Build from a repository full name (`owner/repo`) and a number
    pub fn from_full_name(full_name: &str, number: u64) -> Result<Self> {
        let (owner, repo) = split_full_name(full_name).ok_or_else(|| {
            SyncError::Parse(format!("Invalid repository name: {}", full_name))
        })?;
        Ok(Self::new(owner, repo, number))
    }

    /// Parse an issue/PR html URL such as
    /// `https://github.com/owner/repo/issues/12` or `.../pull/12`
    pub fn from_html_url(url: &str) -> Result<Self> {
        let invalid = || SyncError::Parse(format!("Not a GitHub issue URL: {}", url));

        let without_scheme = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
        let path = without_scheme
            .split_once('/')
            .map(|(_, path)| path)
            .ok_or_else(invalid)?;
        let path = path.split(['?', '#']).next().unwrap_or_default();

        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            [owner, repo, "issues" | "pull", number, ..] => {
                let number = number.parse().map_err(|_| invalid())?;
                Ok(Self::new(*owner, *repo, number))
            }
            _ => Err(invalid()),
        }
    }

    /// `owner/repo`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

impl fmt::Display for TicketRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.owner, self.repo, self.number)
    }
}

impl FromStr for TicketRef {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || SyncError::Parse(format!("Invalid GitHub reference: {}", s));

        let (full_name, number) = s.trim().split_once('#').ok_or_else(invalid)?;
        let number = number.parse().map_err(|_| invalid())?;
        let (owner, repo) = split_full_name(full_name).ok_or_else(invalid)?;

        Ok(Self::new(owner, repo, number))
    }
}

fn split_full_name(full_name: &str) -> Option<(&str, &str)> {
    let (owner, repo) = full_name.split_once('/')?;
    if owner.is_empty() || repo.is_empty() || repo.contains('/') {
        return None;
    }
    Some((owner, repo))
}

/// `LINEAR-ID: <id>`
pub fn encode_linear_id(linear_id: &str) -> String {
    format!("{} {}", LINEAR_ID_MARKER, linear_id)
}

/// `GH-ID: <owner>/<repo>#<number>`
pub fn encode_ticket_ref(ticket: &TicketRef) -> String {
    format!("{} {}", GH_ID_MARKER, ticket)
}

/// Body of the comment posted on the GitHub issue after the Linear issue is created
pub fn tracking_comment(linear_url: &str, linear_id: &str) -> String {
    format!(
        "This issue is also being [tracked on Linear]({}).\n\n\
         We use Linear to manage our development process, but we keep the conversations on Github.\n\n\
         {}",
        linear_url,
        encode_linear_id(linear_id)
    )
}

/// Description of the Linear issue mirroring a GitHub issue/PR
pub fn record_description(github_url: &str, ticket: &TicketRef) -> String {
    format!(
        "[Github issue/pull request]({})\n\n\
         _This issue was automatically created, **do not edit its description**._\n\n\
         {}",
        github_url,
        encode_ticket_ref(ticket)
    )
}

/// Title of the Linear issue mirroring a GitHub issue/PR
pub fn record_title(title: &str, ticket: &TicketRef) -> String {
    format!("{} [{}]", title, ticket)
}

/// Text following the marker on the first line that contains it
fn marked_value<'a>(text: &'a str, marker: &str) -> Option<&'a str> {
    let line = text.lines().find(|line| line.contains(marker))?;
    let start = line.find(marker)? + marker.len();
    Some(line[start..].trim())
}

/// Extract the Linear issue id from a comment body
pub fn decode_linear_id(body: &str) -> Option<String> {
    marked_value(body, LINEAR_ID_MARKER)?
        .split_whitespace()
        .next()
        .map(str::to_string)
}

/// Extract the GitHub coordinates from a Linear issue description
pub fn decode_ticket_ref(description: &str) -> Option<TicketRef> {
    marked_value(description, GH_ID_MARKER)?.parse().ok()
}

/// Find the Linear id among comments written by the automation account.
///
/// Comments from anyone else are skipped, even if they carry the marker.
pub fn linear_id_from_comments(comments: &[TicketComment], automation_login: &str) -> Option<String> {
    comments
        .iter()
        .filter(|comment| comment.author == automation_login)
        .find_map(|comment| decode_linear_id(&comment.body))
}
