//! linear-sync - Bidirectional GitHub <-> Linear issue sync
//!
//! Mirrors GitHub issues and pull requests into Linear and keeps the
//! lifecycle of the two linked items consistent.
//!
//! # Architecture
//!
//! - **events**: Inbound GitHub events and Linear webhooks, and their classification
//! - **link**: Text markers that tie a GitHub issue to its Linear issue
//! - **identity**: GitHub login <-> Linear display name mapping
//! - **sync**: The sync engine and the collaborator traits it drives
//! - **integrations**: GitHub REST and Linear GraphQL adapters
//! - **server**: Linear webhook receiver (axum)
//! - **config**: YAML configuration, environment overrides and validation

// Core modules
pub mod config;
pub mod error;
pub mod events;
pub mod identity;
pub mod link;
pub mod logging;
pub mod sync;

// Outer surfaces
pub mod integrations;
pub mod server;

// Re-exports
pub use error::{Result, SyncError};
