//! Metrics endpoint handler for Prometheus scraping.
//!
//! This module provides the `/metrics` endpoint handler that gathers the
//! registry (which runs a process collection pass) and returns it in
//! Prometheus text format.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use prometheus::{Encoder, TextEncoder};
use std::time::Instant;
use tracing::{debug, error, instrument};

use crate::state::SharedState;

/// Buffer capacity for metrics encoding.
const BUFFER_CAP: usize = 16 * 1024;

/// Error type for metrics endpoint failures.
#[derive(Debug)]
pub enum MetricsError {
    EncodingFailed,
}

impl IntoResponse for MetricsError {
    fn into_response(self) -> axum::response::Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to encode metrics",
        )
            .into_response()
    }
}

/// Encodes every family of the registry in the text exposition format.
pub fn encode_registry(registry: &prometheus::Registry) -> Result<String, MetricsError> {
    let families = registry.gather();

    let mut buffer = Vec::with_capacity(BUFFER_CAP);
    let encoder = TextEncoder::new();

    if let Err(e) = encoder.encode(&families, &mut buffer) {
        error!("Failed to encode Prometheus metrics: {}", e);
        return Err(MetricsError::EncodingFailed);
    }

    String::from_utf8(buffer).map_err(|_| MetricsError::EncodingFailed)
}

/// Handler for the /metrics endpoint.
#[instrument(skip(state))]
pub async fn metrics_handler(State(state): State<SharedState>) -> Result<String, MetricsError> {
    let start = Instant::now();
    debug!("Processing /metrics request");

    // The collector scans /proc with blocking reads
    let registry = state.registry.clone();
    let body = tokio::task::spawn_blocking(move || encode_registry(&registry))
        .await
        .map_err(|e| {
            error!("Metrics collection task failed: {}", e);
            MetricsError::EncodingFailed
        })??;

    let elapsed = start.elapsed().as_secs_f64();
    state.scrape_duration.set(elapsed);

    debug!(
        "Metrics request completed: {} bytes, {:.3}ms",
        body.len(),
        elapsed * 1000.0
    );

    Ok(body)
}
