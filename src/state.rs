//! Application state management for the exporter.
//!
//! This module defines the shared application state that is passed
//! to HTTP handlers.

use prometheus::{Gauge, Registry};
use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;

/// Type alias for shared application state.
pub type SharedState = Arc<AppState>;

/// Global application state shared across requests.
pub struct AppState {
    pub registry: Registry,
    pub scrape_duration: Gauge,
    pub config: Arc<Config>,
    /// Whether the process collector found a boot time at start-up.
    pub collector_available: bool,
    /// Boot time probed by the process collector, if any.
    pub boot_time: Option<u64>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}
