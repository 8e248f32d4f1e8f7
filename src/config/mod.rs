//! Configuration system
//!
//! Loads ~/.config/linear-sync/config.yaml with support for:
//! - GitHub and Linear endpoints (GitHub Enterprise included)
//! - The Linear display name to GitHub login table
//! - Maintainers eligible for default assignment
//! - Automation identities and the autoclosed workflow state

mod integrations;
mod sync_config;
pub mod validation;

pub use integrations::{AutoclosedState, AutomationConfig, GitHubIntegration, LinearIntegration};
pub use sync_config::{Credentials, SyncConfig};
pub use validation::{config_warnings, validate_config, validate_config_result, ValidationError};
