//! Linear webhook payloads and their classification
//!
//! Linear sends `updatedFrom` with the *previous* values of the fields that
//! changed. A key that is present with `null` means "was unset", which is
//! different from an absent key ("did not change"), so those fields are
//! read as `Option<Option<_>>`.
//!
//! Only issue payloads are decoded in full. Other entities (projects,
//! comments, cycles, ...) use different `data` shapes and are kept as a bare
//! id so they can be acknowledged and skipped.

use serde::{Deserialize, Deserializer, Serialize};

/// Declared action of a Linear webhook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebhookAction {
    Create,
    Update,
    Remove,
    Restore,
}

/// Linear webhook payload
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "RawWebhook")]
pub struct LinearWebhook {
    pub action: WebhookAction,
    /// Entity kind ("Issue", "Comment", ...)
    pub kind: Option<String>,
    pub data: IssueData,
    pub updated_from: Option<UpdatedFrom>,
}

/// Envelope read before the entity kind is known
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawWebhook {
    action: WebhookAction,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    data: serde_json::Value,
    #[serde(default)]
    updated_from: Option<serde_json::Value>,
}

impl TryFrom<RawWebhook> for LinearWebhook {
    type Error = serde_json::Error;

    fn try_from(raw: RawWebhook) -> Result<Self, Self::Error> {
        if !is_issue_kind(raw.kind.as_deref()) {
            let id = raw
                .data
                .get("id")
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default()
                .to_string();
            return Ok(Self {
                action: raw.action,
                kind: raw.kind,
                data: IssueData {
                    id,
                    ..IssueData::default()
                },
                updated_from: None,
            });
        }

        Ok(Self {
            action: raw.action,
            kind: raw.kind,
            data: serde_json::from_value(raw.data)?,
            updated_from: raw
                .updated_from
                .map(serde_json::from_value)
                .transpose()?,
        })
    }
}

/// Payloads without a type are treated as issues
fn is_issue_kind(kind: Option<&str>) -> bool {
    kind.map_or(true, |kind| kind == "Issue")
}

impl LinearWebhook {
    /// Whether the payload is about an issue
    pub fn is_issue(&self) -> bool {
        is_issue_kind(self.kind.as_deref())
    }

    pub fn classify(&self) -> TrackerActions {
        classify(self)
    }
}

/// Current state of the Linear issue
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueData {
    pub id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub state: Option<StateRef>,
    #[serde(default)]
    pub assignee_id: Option<String>,
    #[serde(default)]
    pub assignee: Option<UserRef>,
}

impl IssueData {
    /// Id of the current assignee, if any
    pub fn current_assignee(&self) -> Option<&str> {
        self.assignee
            .as_ref()
            .map(|user| user.id.as_str())
            .or(self.assignee_id.as_deref())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StateRef {
    #[serde(rename = "type")]
    pub category: StateCategory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserRef {
    pub id: String,
}

/// Workflow state category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateCategory {
    Triage,
    Backlog,
    Unstarted,
    Started,
    Completed,
    Canceled,
    #[serde(other)]
    Unknown,
}

impl StateCategory {
    /// Completed and canceled states close the GitHub side
    pub fn is_closed(self) -> bool {
        matches!(self, StateCategory::Completed | StateCategory::Canceled)
    }
}

/// Previous values of the fields changed by an update
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedFrom {
    #[serde(default, deserialize_with = "present")]
    pub canceled_at: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub state_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub assignee_id: Option<Option<String>>,
}

/// Maps a present key to `Some(value)`, including `Some(None)` for `null`.
/// Absent keys fall back to `None` through `#[serde(default)]`.
fn present<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// New GitHub assignee, as a Linear user id
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Reassignment {
    To(String),
    Unassigned,
}

/// Actions derived from one webhook. Each is an independent check; when
/// both `close` and `reopen` are set they are applied in that order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TrackerActions {
    pub close: bool,
    pub reopen: bool,
    pub reassign: Option<Reassignment>,
}

impl TrackerActions {
    pub fn is_empty(&self) -> bool {
        !self.close && !self.reopen && self.reassign.is_none()
    }
}

pub fn classify(webhook: &LinearWebhook) -> TrackerActions {
    match webhook.action {
        WebhookAction::Remove => TrackerActions {
            close: true,
            ..TrackerActions::default()
        },
        WebhookAction::Restore => TrackerActions {
            reopen: true,
            ..TrackerActions::default()
        },
        WebhookAction::Create => TrackerActions::default(),
        WebhookAction::Update => classify_update(webhook),
    }
}

fn classify_update(webhook: &LinearWebhook) -> TrackerActions {
    let Some(delta) = webhook.updated_from.as_ref() else {
        return TrackerActions::default();
    };
    let category = webhook.data.state.as_ref().map(|state| state.category);

    let was_canceled = matches!(delta.canceled_at, Some(None));
    let state_changed = delta.state_id.is_some();

    let close = was_canceled || (state_changed && category.is_some_and(StateCategory::is_closed));
    let reopen = state_changed && category.is_some_and(|category| !category.is_closed());

    let reassign = delta.assignee_id.as_ref().map(|_| {
        match webhook.data.current_assignee() {
            Some(id) => Reassignment::To(id.to_string()),
            None => Reassignment::Unassigned,
        }
    });

    TrackerActions {
        close,
        reopen,
        reassign,
    }
}
