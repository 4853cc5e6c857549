//! Herakles Process Collector Library
//!
//! This library provides a Prometheus collector for process-level resource
//! metrics read from the Linux `/proc` filesystem: virtual and resident memory,
//! CPU time, start time, and open/max file descriptors.
//!
//! # Features
//!
//! - **Fault-Tolerant Scans**: Processes that exit or deny access mid-scan are skipped
//! - **Unit Conversion**: Clock ticks become seconds, memory pages become bytes
//! - **Explicit Registration**: No global collector, callers own construction and registration
//! - **Test-Friendly**: The filesystem root and platform constants can be injected
//!
//! # Usage
//!
//! ```rust,no_run
//! use herakles_process_collector::{CollectorOptions, ProcessStatsCollector};
//! use prometheus::{Encoder, Registry, TextEncoder};
//!
//! let registry = Registry::new();
//!
//! let collector = ProcessStatsCollector::new(CollectorOptions {
//!     namespace: "myapp".to_string(),
//!     ..CollectorOptions::default()
//! })?;
//! collector.register(&registry)?;
//!
//! let mut buffer = Vec::new();
//! TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
//! println!("{}", String::from_utf8_lossy(&buffer));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod collector;
pub mod platform;
pub mod stat;

// Re-export main types for convenience
pub use collector::{
    metric_prefix, CollectorError, CollectorOptions, PidSelector, ProcessStatsCollector,
    ProcessTotals, DEFAULT_PROC_ROOT,
};
pub use platform::{PlatformConstants, DEFAULT_CLOCK_TICKS, DEFAULT_PAGE_SIZE};
pub use stat::{ProcStat, StatError};
