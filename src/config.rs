//! Configuration management for herakles-process-collector.
//!
//! This module handles loading, merging, and validating configuration from files
//! and CLI arguments. It supports YAML, JSON, and TOML formats.

use clap::ValueEnum;
use herakles_process_collector::{metric_prefix, CollectorOptions, PidSelector, DEFAULT_PROC_ROOT};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::cli::{Args, ConfigFormat, LogLevel};

// Default configuration constants
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 9216;

/// Exporter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub port: Option<u16>,
    pub bind: Option<String>,

    // Collector
    pub namespace: Option<String>,
    #[serde(alias = "proc-root")]
    pub proc_root: Option<PathBuf>,
    /// "self" or a numeric process id
    pub pid: Option<String>,

    // Feature flags
    #[serde(alias = "enable-health")]
    pub enable_health: Option<bool>,

    // Logging
    #[serde(alias = "log-level")]
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: Some(DEFAULT_BIND_ADDR.to_string()),
            port: Some(DEFAULT_PORT),
            namespace: Some(String::new()),
            proc_root: Some(PathBuf::from(DEFAULT_PROC_ROOT)),
            pid: Some("self".into()),
            enable_health: Some(true),
            log_level: Some("info".into()),
        }
    }
}

impl Config {
    /// Builds the collector options described by this configuration.
    pub fn collector_options(&self) -> Result<CollectorOptions, Box<dyn std::error::Error>> {
        let pid = match self.pid.as_deref() {
            Some(p) => p.parse()?,
            None => PidSelector::default(),
        };

        Ok(CollectorOptions {
            namespace: self.namespace.clone().unwrap_or_default(),
            pid,
            proc_root: self
                .proc_root
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PROC_ROOT)),
        })
    }
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<(), Box<dyn std::error::Error>> {
    if cfg.port == Some(0) {
        return Err("port must be between 1 and 65535".into());
    }

    if let Some(bind) = cfg.bind.as_deref() {
        if bind.parse::<std::net::IpAddr>().is_err() {
            return Err(format!("Invalid bind address '{}'", bind).into());
        }
    }

    if let Some(ns) = cfg.namespace.as_deref() {
        if !is_valid_namespace(ns) {
            return Err(format!(
                "Invalid namespace '{}': metric name '{}' must match [a-zA-Z_:][a-zA-Z0-9_:]*",
                ns,
                metric_prefix(ns)
            )
            .into());
        }
    }

    if let Some(root) = cfg.proc_root.as_deref() {
        if root.as_os_str().is_empty() {
            return Err("proc_root must not be empty".into());
        }
    }

    if let Some(pid) = cfg.pid.as_deref() {
        pid.parse::<PidSelector>()?;
    }

    if let Some(level) = cfg.log_level.as_deref() {
        if LogLevel::from_str(level, true).is_err() {
            return Err(format!(
                "Invalid log_level '{}', expected off, error, warn, info, debug or trace",
                level
            )
            .into());
        }
    }

    Ok(())
}

/// An empty namespace is allowed and yields the bare `process_` prefix.
fn is_valid_namespace(ns: &str) -> bool {
    let mut chars = ns.chars();
    match chars.next() {
        None => true,
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
        }
        Some(_) => false,
    }
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    if let Some(bind_ip) = args.bind {
        config.bind = Some(bind_ip.to_string());
    }

    // Only override port if the user supplied it on the CLI.
    if let Some(cli_port) = args.port {
        config.port = Some(cli_port);
    }

    if let Some(ns) = &args.namespace {
        config.namespace = Some(ns.clone());
    }
    if let Some(root) = &args.proc_root {
        config.proc_root = Some(root.clone());
    }
    if let Some(pid) = &args.pid {
        config.pid = Some(pid.clone());
    }

    if args.disable_health {
        config.enable_health = Some(false);
    }

    Ok(config)
}

/// Configuration loading with multiple format support
pub fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => {
            // Try default locations
            let defaults = [
                "/etc/herakles/process-collector.yaml",
                "/etc/herakles/process-collector.yml",
                "/etc/herakles/process-collector.json",
                "./herakles-process-collector.yaml",
                "./herakles-process-collector.yml",
                "./herakles-process-collector.json",
            ];

            match defaults.iter().find(|p| Path::new(p).exists()) {
                Some(p) => PathBuf::from(p),
                None => return Ok(Config::default()),
            }
        }
    };

    if !path.exists() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&path)?;

    match path.extension().and_then(|s| s.to_str()) {
        Some("json") => {
            let config: Config = serde_json::from_str(&content)?;
            info!("Loaded JSON configuration from: {}", path.display());
            Ok(config)
        }
        Some("toml") => {
            let config: Config = toml::from_str(&content)?;
            info!("Loaded TOML configuration from: {}", path.display());
            Ok(config)
        }
        _ => {
            // Default to YAML
            let config: Config = serde_yaml::from_str(&content)?;
            info!("Loaded YAML configuration from: {}", path.display());
            Ok(config)
        }
    }
}

/// Renders configuration in the requested format
pub fn render_config(
    config: &Config,
    format: &ConfigFormat,
) -> Result<String, Box<dyn std::error::Error>> {
    let output = match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    };
    Ok(output)
}

/// Shows configuration in requested format
pub fn show_config(config: &Config, format: ConfigFormat) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", render_config(config, &format)?);
    Ok(())
}
