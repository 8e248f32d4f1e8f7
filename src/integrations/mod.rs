//! External Integrations
//!
//! HTTP adapters for the two systems kept in sync.
//!
//! - **GitHub**: REST API adapter for issues, pull requests, comments and assignees
//! - **Linear**: GraphQL API adapter for issues, workflow states and team members
//!
//! Each adapter implements the matching collaborator trait from [`crate::sync`],
//! so the engine never talks HTTP directly.

pub mod github;
pub mod linear;

// GitHub exports
pub use github::{GitHubAdapter, GitHubComment, GitHubIssue, GitHubUser};

// Linear exports
pub use linear::LinearAdapter;
