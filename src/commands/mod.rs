//! CLI command implementations for herakles-process-collector.
//!
//! This module provides implementations for all CLI subcommands:
//! - `check`: Configuration and /proc access validation
//! - `test`: One-shot collection passes

pub mod check;
pub mod test;

// Re-export command functions
pub use check::command_check;
pub use test::command_test;
