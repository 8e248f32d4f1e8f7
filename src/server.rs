//! HTTP receiver for Linear webhooks
//!
//! Each delivery runs one engine invocation to completion before responding.
//!
//! # Routes
//!
//! - `GET /health` - Liveness check
//! - `POST /webhooks/linear` - Linear webhook delivery
//!
//! A successful sync answers `200` with the [`SyncReport`]. A payload that
//! cannot be decoded answers `4xx`; a sync failure answers `500`. Both carry
//! an [`ErrorResponse`] body.

use crate::events::LinearWebhook;
use crate::sync::{ExternalTracker, SyncEngine, SyncReport, TicketSystem};
use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;

/// Default request body limit (Linear payloads are a few KB)
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

/// Server error types
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Bind error: {0}")]
    Bind(String),
}

/// Error body returned for rejected or failed deliveries
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Shared server state
struct AppState<T, E> {
    engine: SyncEngine<T, E>,
}

/// Webhook server driving a sync engine
pub struct WebhookServer<T, E> {
    state: Arc<AppState<T, E>>,
    max_body_size: usize,
}

impl<T, E> WebhookServer<T, E>
where
    T: TicketSystem + 'static,
    E: ExternalTracker + 'static,
{
    pub fn new(engine: SyncEngine<T, E>) -> Self {
        Self {
            state: Arc::new(AppState { engine }),
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }

    pub fn with_max_body_size(mut self, max_body_size: usize) -> Self {
        self.max_body_size = max_body_size;
        self
    }

    /// Build the router
    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(health))
            .route("/webhooks/linear", post(linear_webhook::<T, E>))
            .layer(DefaultBodyLimit::max(self.max_body_size))
            .with_state(self.state.clone())
    }

    /// Run the server on the given address
    pub async fn run(self, addr: &str) -> Result<(), ServerError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind(e.to_string()))?;

        tracing::info!(
            addr = addr,
            max_body_size = self.max_body_size,
            "Linear webhook server listening"
        );

        axum::serve(listener, self.router())
            .await
            .map_err(ServerError::Io)
    }
}

// ============================================================================
// Handlers
// ============================================================================

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn linear_webhook<T, E>(
    State(state): State<Arc<AppState<T, E>>>,
    payload: Result<Json<LinearWebhook>, JsonRejection>,
) -> Result<Json<SyncReport>, (StatusCode, Json<ErrorResponse>)>
where
    T: TicketSystem + 'static,
    E: ExternalTracker + 'static,
{
    let Json(webhook) = payload.map_err(|rejection| {
        tracing::warn!(error = %rejection.body_text(), "Rejected Linear webhook payload");
        (
            rejection.status(),
            Json(ErrorResponse {
                error: rejection.body_text(),
            }),
        )
    })?;

    match state.engine.handle_tracker_event(&webhook).await {
        Ok(report) => {
            tracing::info!(
                subject = report.subject.as_deref().unwrap_or("-"),
                actions = report.actions.len(),
                skipped = ?report.skipped,
                "Linear webhook processed"
            );
            Ok(Json(report))
        }
        Err(e) => {
            tracing::error!(linear_id = %webhook.data.id, error = %e, "Linear webhook sync failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            ))
        }
    }
}
