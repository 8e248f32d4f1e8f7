//! Configuration validation
//!
//! Checks a loaded configuration before any remote call is made:
//! - Valid API URLs
//! - Non-empty automation identities
//! - `users` is a one-to-one mapping
//!
//! Maintainers missing from `users` are only warnings: they are left out of
//! the maintainer set.

use super::sync_config::SyncConfig;
use crate::SyncError;
use std::collections::HashSet;

/// Validation error details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub context: Option<String>,
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            context: None,
            field: field.into(),
            message: message.into(),
        }
    }

    fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref ctx) = self.context {
            write!(f, "[{}] {}: {}", ctx, self.field, self.message)
        } else {
            write!(f, "{}: {}", self.field, self.message)
        }
    }
}

/// Validation result
pub type ValidationResult = std::result::Result<(), Vec<ValidationError>>;

/// Validate a linear-sync configuration
pub fn validate_config(config: &SyncConfig) -> ValidationResult {
    let mut errors = Vec::new();

    if !is_http_url(&config.github.url) {
        errors.push(ValidationError::new(
            "github.url",
            format!("Invalid GitHub URL: {}", config.github.url),
        ));
    }

    if !is_http_url(&config.linear.api_url) {
        errors.push(ValidationError::new(
            "linear.api_url",
            format!("Invalid Linear API URL: {}", config.linear.api_url),
        ));
    }

    if let Some(ref team_id) = config.linear.team_id {
        if team_id.trim().is_empty() {
            errors.push(ValidationError::new(
                "linear.team_id",
                "Team id cannot be blank",
            ));
        }
    }

    let automation = &config.automation;
    for (field, value) in [
        ("automation.actor", &automation.actor),
        ("automation.comment_author", &automation.comment_author),
        ("automation.autoclosed_state.name", &automation.autoclosed_state.name),
        (
            "automation.autoclosed_state.category",
            &automation.autoclosed_state.category,
        ),
    ] {
        if value.trim().is_empty() {
            errors.push(ValidationError::new(field, "Value cannot be empty"));
        }
    }

    // Display names are map keys already; logins must be unique too
    let mut seen_logins = HashSet::new();
    for (display_name, login) in &config.users {
        if login.trim().is_empty() {
            errors.push(
                ValidationError::new("users", "GitHub login cannot be empty")
                    .with_context(display_name),
            );
        } else if !seen_logins.insert(login) {
            errors.push(
                ValidationError::new("users", format!("Duplicate GitHub login: {}", login))
                    .with_context(display_name),
            );
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Non-fatal problems: maintainers that have no entry in `users`
pub fn config_warnings(config: &SyncConfig) -> Vec<ValidationError> {
    let known: HashSet<&String> = config.users.values().collect();
    config
        .maintainers
        .iter()
        .filter(|maintainer| !known.contains(maintainer))
        .map(|maintainer| {
            ValidationError::new(
                "maintainers",
                format!("Maintainer '{}' has no entry in users and is ignored", maintainer),
            )
        })
        .collect()
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("https://") || url.starts_with("http://")
}

/// Validate configuration and return a Result
pub fn validate_config_result(config: &SyncConfig) -> crate::Result<()> {
    validate_config(config).map_err(|errors| {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        SyncError::Config(format!(
            "Configuration validation failed:\n  - {}",
            messages.join("\n  - ")
        ))
    })
}
