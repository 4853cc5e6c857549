//! herakles-process-collector
//!
//! Prometheus exporter for process CPU and memory metrics with tracing logging.
//! This is the main entry point that initializes the server and handles subcommands.

mod cli;
mod commands;
mod config;
mod handlers;
mod state;

use axum::{routing::get, Router};
use clap::{Parser, ValueEnum};
use herakles_process_collector::ProcessStatsCollector;
use prometheus::{Gauge, Registry};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Instant;
use tokio::{net::TcpListener, signal};
use tracing::{debug, error, info, warn, Level};

use cli::{Args, Commands, LogLevel};
use commands::{command_check, command_test};
use config::{
    resolve_config, show_config, validate_effective_config, Config, DEFAULT_BIND_ADDR,
    DEFAULT_PORT,
};
use handlers::{health_handler, metrics_handler, root_handler};
use state::AppState;

/// Initializes tracing logging subsystem with configured log level.
/// Precedence: CLI > config file > info.
fn setup_logging(config: &Config, args: &Args) {
    let level = args
        .log_level
        .clone()
        .or_else(|| {
            config
                .log_level
                .as_deref()
                .and_then(|l| LogLevel::from_str(l, true).ok())
        })
        .unwrap_or(LogLevel::Info);

    let log_level = match level {
        LogLevel::Off => None,
        LogLevel::Error => Some(Level::ERROR),
        LogLevel::Warn => Some(Level::WARN),
        LogLevel::Info => Some(Level::INFO),
        LogLevel::Debug => Some(Level::DEBUG),
        LogLevel::Trace => Some(Level::TRACE),
    };

    let Some(log_level) = log_level else {
        return;
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return;
    }

    info!("Logging initialized with level: {:?}", level);
}

/// Helper function to load and validate configuration.
/// Exits the process with error code 1 if validation fails.
fn load_validated_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let config = resolve_config(args)?;
    if let Err(e) = validate_effective_config(&config) {
        eprintln!("❌ Configuration invalid: {}", e);
        std::process::exit(1);
    }
    Ok(config)
}

/// Resolves once SIGINT or SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), shutting down gracefully...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        }
    }
}

/// Main application entry point.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Early config resolution for show/check modes
    if args.show_config || args.check_config {
        let config = resolve_config(&args)?;

        if args.check_config {
            if let Err(e) = validate_effective_config(&config) {
                eprintln!("❌ Configuration invalid: {}", e);
                std::process::exit(1);
            }
            println!("✅ Configuration is valid");
            return Ok(());
        }

        return show_config(&config, args.config_format.clone());
    }

    let config = load_validated_config(&args)?;
    setup_logging(&config, &args);

    if let Some(command) = &args.command {
        return match command {
            Commands::Check => command_check(&config),
            Commands::Test {
                iterations,
                verbose,
            } => command_test(*iterations, *verbose, &config),
        };
    }

    info!("Starting herakles-process-collector");

    let bind_ip_str = config.bind.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
    let port = config.port.unwrap_or(DEFAULT_PORT);

    // Initialize Prometheus metrics registry
    let registry = Registry::new();
    debug!("Prometheus registry initialized");

    let collector = ProcessStatsCollector::new(config.collector_options()?)?;
    let collector_available = collector.is_available();
    let boot_time = collector.boot_time();
    if !collector_available {
        warn!(
            "⚠️  Boot time not readable under {} - process metrics will be empty",
            collector.proc_root().display()
        );
    }
    info!(
        "Process collector ready (prefix: {}, root: {})",
        collector.prefix(),
        collector.proc_root().display()
    );
    collector.register(&registry)?;

    let scrape_duration = Gauge::new(
        "herakles_process_collector_scrape_duration_seconds",
        "Time spent serving the last /metrics request",
    )?;
    registry.register(Box::new(scrape_duration.clone()))?;

    debug!("All metrics registered successfully");

    let enable_health = config.enable_health.unwrap_or(true);

    let state = Arc::new(AppState {
        registry,
        scrape_duration,
        config: Arc::new(config.clone()),
        collector_available,
        boot_time,
        start_time: Instant::now(),
    });

    // Configure HTTP server routes
    let bind_ip: IpAddr = bind_ip_str.parse()?;
    let addr = SocketAddr::new(bind_ip, port);

    let mut app = Router::new()
        .route("/", get(root_handler))
        .route("/metrics", get(metrics_handler));

    if enable_health {
        app = app.route("/health", get(health_handler));
    }

    let app = app.with_state(state);

    let listener = TcpListener::bind(addr).await?;
    info!("herakles-process-collector listening on http://{}", addr);

    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                error!("Server error: {}", e);
                return Err(e.into());
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received, exiting...");
        }
    }

    info!("herakles-process-collector stopped gracefully");
    Ok(())
}
