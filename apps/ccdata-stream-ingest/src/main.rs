//! CCData Stream Ingest Binary
//!
//! Starts the index-tick ingestion client.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin ccdata-stream-ingest
//! ```
//!
//! # Environment Variables
//!
//! ## Required
//! - `CCDATA_API_KEY`: streamer API key
//!
//! ## Optional
//! - `CCDATA_STREAM_HOST`: streamer host (default: data-streamer.cryptocompare.com)
//! - `INGEST_FLUSH_INTERVAL_SECS`: buffer flush interval (default: 5)
//! - `INGEST_INBOUND_CAPACITY`: inbound channel capacity (default: 100)
//! - `INGEST_METRICS_PORT`: Prometheus exporter port (default: 9090)
//! - `RUST_LOG`: log level (default: info)

use std::sync::Arc;

use ccdata_stream_ingest::{
    ConnectionManager, IngestConfig, IngestService, LoggingSink, WsConnector, domain::product,
    init_metrics, telemetry,
};
use tokio::signal;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    load_dotenv();

    telemetry::init();

    tracing::info!("Starting CCData stream ingest");

    let config = IngestConfig::from_env()?;
    init_metrics(config.metrics_port);
    log_config(&config);

    let (inbound_tx, inbound_rx) = mpsc::channel(config.inbound_capacity);
    let (error_tx, error_rx) = mpsc::unbounded_channel();

    let manager = ConnectionManager::new(
        config.stream_url(),
        Arc::new(WsConnector::new()),
        inbound_tx,
        error_tx,
    );

    let mut service = IngestService::new(
        manager,
        inbound_rx,
        error_rx,
        Box::new(LoggingSink::new()),
        config.flush_interval,
    );

    let products = product::load();
    tracing::info!(products = products.len(), "requesting initial subscriptions");

    // A dial failure leaves no open connection; the process keeps running
    // so the host can still shut it down cleanly. The error is already in
    // the sink.
    if let Err(e) = service.start(&products).await {
        tracing::error!(error = %e, "initial subscribe failed");
    }

    tracing::info!("stream ingest ready");

    await_shutdown().await;

    service.stop().await;

    tracing::info!("stream ingest stopped");
    Ok(())
}

/// Log the parsed configuration.
fn log_config(config: &IngestConfig) {
    tracing::info!(
        stream_host = %config.stream_host,
        flush_interval_secs = config.flush_interval.as_secs(),
        inbound_capacity = config.inbound_capacity,
        metrics_port = config.metrics_port,
        "Configuration loaded"
    );
}

/// Load .env file from current directory or any ancestor directory.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
#[allow(clippy::expect_used)]
async fn await_shutdown() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }
}
