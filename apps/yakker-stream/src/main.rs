//! Yakker Stream Server
//!
//! Consumes the Yakker feed (or the demo feed) and serves the aggregated
//! metrics over HTTP and the `livedata.xml` snapshot file.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin yakker-stream
//! YAKKER_DEMO=true cargo run --bin yakker-stream
//! ```
//!
//! # Environment Variables
//!
//! ## Required (unless `YAKKER_DEMO=true`)
//! - `YAKKER_WS_URL`: Yakker WebSocket URL
//!
//! ## Optional
//! - `YAKKER_AUTH_HEADER`: `Authorization` header, with or without the name
//! - `YAKKER_DEMO`: Replay built-in payloads (default: false)
//! - `YAKKER_CONSOLE_ECHO`: Print each summary to stderr (default: true)
//! - `YAKKER_PORT`: HTTP port (default: 8000)
//! - `YAKKER_POLL_INTERVAL`: Demo pacing in seconds (default: 1.0)
//! - `YAKKER_RECONNECT_DELAY_MS`: Delay between reconnects (default: 3000)
//! - `YAKKER_SNAPSHOT_INTERVAL_MS`: Snapshot rewrite interval (default: 1000)
//! - `YAKKER_LIVEDATA_TEMPLATE`: Snapshot template (default: livedata.xml.template)
//! - `YAKKER_LIVEDATA_PATH`: Snapshot output (default: livedata.xml)
//! - `OTEL_ENABLED`: Export spans over OTLP (default: false)
//! - `RUST_LOG`: Log filter (default: yakker_stream=info)

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use yakker_stream::infrastructure::http::{HttpServer, HttpState};
use yakker_stream::infrastructure::runtime::{self, PRUNE_INTERVAL};
use yakker_stream::infrastructure::snapshot::SnapshotWriter;
use yakker_stream::infrastructure::telemetry;
use yakker_stream::{FeedState, IngestPipeline, MetricAggregator, StreamConfig, init_metrics};

/// Time allowed for tasks to finish after shutdown is requested.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("rustls crypto provider already installed"))?;

    runtime::load_dotenv();

    let _telemetry_guard = telemetry::init();

    tracing::info!("Starting Yakker stream");

    if let Err(e) = init_metrics() {
        tracing::warn!(error = %e, "Prometheus recorder unavailable");
    }

    let config = StreamConfig::from_env().context("invalid configuration")?;
    log_config(&config);

    let shutdown_token = CancellationToken::new();

    let aggregator = Arc::new(MetricAggregator::default());
    let feed_state = Arc::new(FeedState::new());
    let pipeline = Arc::new(
        IngestPipeline::new(Arc::clone(&aggregator))
            .with_console_echo(config.output.console_echo),
    );

    let feed_task = runtime::spawn_feed(
        &config.feed,
        pipeline,
        Arc::clone(&feed_state),
        shutdown_token.clone(),
    )?;

    let pruner_task = runtime::spawn_pruner(
        Arc::clone(&aggregator),
        PRUNE_INTERVAL,
        shutdown_token.clone(),
    );

    let snapshot_aggregator = Arc::clone(&aggregator);
    let snapshot_output = config.output.clone();
    let snapshot_shutdown = shutdown_token.clone();
    let snapshot_task = tokio::spawn(async move {
        match SnapshotWriter::load(
            snapshot_aggregator,
            &snapshot_output.livedata_template,
            snapshot_output.livedata_path.clone(),
            snapshot_output.snapshot_interval,
        )
        .await
        {
            Ok(writer) => writer.run(snapshot_shutdown).await,
            Err(e) => tracing::error!(error = %e, "Snapshot writer disabled"),
        }
    });

    let http_state = Arc::new(HttpState::new(
        env!("CARGO_PKG_VERSION").to_string(),
        Arc::clone(&aggregator),
        Arc::clone(&feed_state),
        config.output.livedata_path.clone(),
    ));
    let http_server = HttpServer::new(config.output.port, http_state, shutdown_token.clone());
    let http_shutdown = shutdown_token.clone();
    let http_task = tokio::spawn(async move {
        if let Err(e) = http_server.run().await {
            tracing::error!(error = %e, "HTTP server error");
            http_shutdown.cancel();
        }
    });

    tracing::info!(port = config.output.port, "Yakker stream ready");

    await_shutdown(shutdown_token).await;

    let drained = tokio::time::timeout(SHUTDOWN_TIMEOUT, async {
        let _ = tokio::join!(feed_task, pruner_task, snapshot_task, http_task);
    })
    .await;
    if drained.is_err() {
        tracing::warn!(
            timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
            "Tasks still running at shutdown"
        );
    }

    tracing::info!("Yakker stream stopped");
    Ok(())
}

/// Log the parsed configuration.
fn log_config(config: &StreamConfig) {
    tracing::info!(
        demo = config.feed.demo,
        port = config.output.port,
        console_echo = config.output.console_echo,
        has_auth = config.feed.auth.is_some(),
        "Configuration loaded"
    );
    if let Some(url) = config.feed.ws_url.as_deref() {
        tracing::debug!(url = %url, "Yakker endpoint");
    }
}

/// Wait for Ctrl+C, SIGTERM, or an internal cancellation.
async fn await_shutdown(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Ctrl+C handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
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
        () = shutdown_token.cancelled() => {
            tracing::info!("Internal shutdown requested");
        }
    }

    shutdown_token.cancel();
}
