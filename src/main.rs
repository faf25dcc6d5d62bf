//! Prometheus exporter for Arris cable modem channel diagnostics.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use prometheus_client::registry::Registry;
use tokio::sync::watch;
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;

use arris_mon::config::LogFormat;
use arris_mon::{HttpServer, ModemMetrics, ModemPoller, MonitorConfig, status};

/// Prometheus exporter for Arris cable modem channel diagnostics.
#[derive(Parser, Debug)]
#[command(name = "arris-mon")]
#[command(about = "Export cable modem channel diagnostics as Prometheus metrics")]
#[command(version)]
struct Args {
    /// Path to configuration file (JSON5 format).
    #[arg(short, long)]
    config: Option<String>,

    /// HTTP listen address (overrides config).
    #[arg(long)]
    listen: Option<String>,

    /// Modem status page URL (overrides config).
    #[arg(long)]
    source: Option<String>,

    /// Poll interval in seconds (overrides config).
    #[arg(long)]
    interval: Option<u64>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = if let Some(config_path) = &args.config {
        MonitorConfig::load_from_file(config_path)?
    } else {
        MonitorConfig::default()
    };

    // CLI overrides
    if let Some(listen) = args.listen {
        config.http.listen = listen;
    }
    if let Some(source) = args.source {
        config.modem.source_url = source;
    }
    if let Some(interval) = args.interval {
        config.modem.poll_interval_secs = interval;
    }
    config.validate()?;

    // Initialize logging
    let log_level = args.log_level.parse().unwrap_or(Level::INFO);
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("arris_mon={}", log_level).parse()?);

    match config.logging.format {
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .json()
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }

    info!("Starting Arris modem exporter");

    // Parse listen address
    let listen_addr = config
        .http
        .listen
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid listen address: {}", e))?;

    // Create shutdown signal
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Registry and metric set, registered once at startup
    let mut registry = Registry::default();
    let metrics = Arc::new(ModemMetrics::new(&mut registry));
    let registry = Arc::new(registry);

    let shared_status = status::shared(&config.modem.source_url);

    // Create components
    let poller = ModemPoller::new(&config.modem, metrics, shared_status.clone())?;
    let http_server = HttpServer::new(
        registry,
        shared_status,
        listen_addr,
        config.http.clone(),
        config.modem.source_url.clone(),
    )?;

    // Start poller
    let poller_shutdown = shutdown_rx.clone();
    let poller_task = tokio::spawn(async move {
        poller.run(poller_shutdown).await;
    });

    // Start HTTP server
    let http_shutdown = shutdown_rx.clone();
    let http_task = tokio::spawn(async move {
        if let Err(e) = http_server.run(http_shutdown).await {
            error!("HTTP server error: {}", e);
        }
    });

    // Wait for shutdown signal
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
        _ = async {
            #[cfg(unix)]
            {
                let mut sigterm = tokio::signal::unix::signal(
                    tokio::signal::unix::SignalKind::terminate()
                ).unwrap();
                sigterm.recv().await;
            }
            #[cfg(not(unix))]
            {
                std::future::pending::<()>().await;
            }
        } => {
            info!("Received SIGTERM, shutting down...");
        }
    }

    // Signal shutdown
    shutdown_tx.send(true)?;

    // Wait for tasks to complete
    let _ = tokio::time::timeout(Duration::from_secs(5), async {
        let _ = poller_task.await;
        let _ = http_task.await;
    })
    .await;

    info!("Exporter stopped");
    Ok(())
}
