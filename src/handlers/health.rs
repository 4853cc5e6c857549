//! Health check endpoint handler.
//!
//! This module provides the `/health` endpoint handler that reports whether
//! the process collector can read the process-information filesystem.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use tracing::{debug, instrument};

use crate::state::SharedState;

/// Handler for the /health endpoint.
#[instrument(skip(state))]
pub async fn health_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing /health request");

    let proc_root = state
        .config
        .proc_root
        .as_deref()
        .map(|p| p.display().to_string())
        .unwrap_or_default();

    let (status, message) = match state.boot_time {
        Some(btime) if state.collector_available => (
            StatusCode::OK,
            format!("OK\n\nproc root: {proc_root}\nboot time: {btime}\n"),
        ),
        _ => (
            StatusCode::SERVICE_UNAVAILABLE,
            format!(
                "Process metrics unavailable\n\nproc root: {proc_root}\nboot time could not be read at start-up\n"
            ),
        ),
    };

    debug!("Health check: {}", status);
    (
        status,
        [("Content-Type", "text/plain; charset=utf-8")],
        message,
    )
}
