//! Root endpoint handler for the landing page.

use axum::{extract::State, response::IntoResponse};
use tracing::{debug, instrument};

use crate::state::SharedState;

/// Handler for the root `/` endpoint.
#[instrument(skip(state))]
pub async fn root_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing / request");

    let version = env!("CARGO_PKG_VERSION");

    let uptime_secs = state.start_time.elapsed().as_secs();
    let hours = uptime_secs / 3600;
    let minutes = (uptime_secs % 3600) / 60;
    let seconds = uptime_secs % 60;

    let mut endpoints = String::from("  /metrics  Prometheus metrics\n");
    if state.config.enable_health.unwrap_or(true) {
        endpoints.push_str("  /health   Collector health\n");
    }

    (
        [("Content-Type", "text/plain; charset=utf-8")],
        format!(
            "herakles-process-collector {version}\n\
             Uptime: {hours}h {minutes}m {seconds}s\n\n\
             Endpoints:\n{endpoints}"
        ),
    )
}
