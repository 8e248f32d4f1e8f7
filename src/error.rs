//! Error types for linear-sync
//!
//! Every failure is fatal for the current invocation. There is no retry and
//! no rollback of steps that were already applied.

use thiserror::Error;

/// Result type alias for sync operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// Error type for sync operations
#[derive(Error, Debug)]
pub enum SyncError {
    /// Missing or invalid setting, detected before any sync attempt
    #[error("Configuration error: {0}")]
    Config(String),

    /// Zero or several matches where exactly one was required
    /// (workflow states, team members)
    #[error("Lookup error: {0}")]
    LookupAmbiguity(String),

    /// The remote system reported a non-success result for a create/update
    #[error("Remote operation failed: {0}")]
    RemoteOperation(String),

    /// Non-success HTTP status or GraphQL errors from GitHub or Linear
    #[error("Integration error: {0}")]
    Integration(String),

    /// Malformed payloads and identifiers
    #[error("Parse error: {0}")]
    Parse(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Anyhow errors (for more context)
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),
}
