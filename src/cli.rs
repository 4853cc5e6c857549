//! CLI arguments and subcommands for herakles-process-collector.
//!
//! This module defines the command-line interface structure using the clap library,
//! including all flags, options, and subcommands.

use clap::{Parser, Subcommand, ValueEnum};
use std::net::IpAddr;
use std::path::PathBuf;

/// Log level options for CLI parsing
#[derive(Debug, Clone, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Configuration format options for output
#[derive(Debug, Clone, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "herakles-process-collector",
    about = "Prometheus exporter for process CPU, memory and start time metrics",
    long_about = "Prometheus exporter for process CPU, memory and start time metrics.\n\n\
                  Reads /proc/<pid>/stat for every process on the host and exports the \
                  standard process_* metric set (virtual/resident memory, CPU seconds, \
                  start time, file descriptors).",
    version,
    propagate_version = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// HTTP listen port
    #[arg(short = 'p', long)]
    pub port: Option<u16>,

    /// Bind to specific interface/IP
    #[arg(long)]
    pub bind: Option<IpAddr>,

    /// Log level (overrides the config file, default: info)
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,

    /// Metric namespace (metrics are named <namespace>_process_*)
    #[arg(long)]
    pub namespace: Option<String>,

    /// Root of the process-information filesystem
    #[arg(long)]
    pub proc_root: Option<PathBuf>,

    /// Process selector used by `check` ("self" or a numeric pid)
    #[arg(long)]
    pub pid: Option<String>,

    /// Disable /health endpoint
    #[arg(long)]
    pub disable_health: bool,
}

/// Subcommands for additional functionality
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate configuration and /proc access
    Check,

    /// Run collection passes and print the exported metrics
    Test {
        /// Number of test iterations
        #[arg(short = 'n', long, default_value_t = 1)]
        iterations: usize,

        /// Print the Prometheus text exposition once after the last pass
        #[arg(long)]
        verbose: bool,
    },
}
