//! Yakker Terminal Dashboard
//!
//! Full-screen live view of the Yakker feed. Runs the same feed as the
//! server (live or demo) without the HTTP or snapshot outputs.
//!
//! Quit with `q`, `Esc`, or `Ctrl+C`.
//!
//! # Environment Variables
//!
//! Same feed variables as `yakker-stream`, plus:
//! - `YAKKER_CLI_REFRESH`: Redraw interval in seconds (default: 0.25, min 0.1)
//! - `RUST_LOG`: Log filter (default: warn)

use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use yakker_stream::infrastructure::runtime::{self, PRUNE_INTERVAL};
use yakker_stream::infrastructure::telemetry::{self, TERMINAL_DIRECTIVE, TelemetryConfig};
use yakker_stream::infrastructure::terminal::{DashboardSources, run_dashboard};
use yakker_stream::{FeedState, IngestPipeline, MetricAggregator, RawPayloadStore, StreamConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("rustls crypto provider already installed"))?;

    runtime::load_dotenv();

    let _telemetry_guard = telemetry::init_with_config(
        TelemetryConfig::from_env().with_default_directive(TERMINAL_DIRECTIVE),
    );

    let config = StreamConfig::from_env().context("invalid configuration")?;
    let cancel = CancellationToken::new();

    let aggregator = Arc::new(MetricAggregator::default());
    let feed_state = Arc::new(FeedState::new());
    let raw_store = Arc::new(RawPayloadStore::new());
    let pipeline = Arc::new(
        IngestPipeline::new(Arc::clone(&aggregator))
            .with_hook(raw_store.clone())
            .with_console_echo(false),
    );

    let feed_task = runtime::spawn_feed(
        &config.feed,
        pipeline,
        Arc::clone(&feed_state),
        cancel.clone(),
    )?;
    let pruner_task = runtime::spawn_pruner(Arc::clone(&aggregator), PRUNE_INTERVAL, cancel.clone());

    let sources = DashboardSources {
        aggregator,
        feed_state,
        raw_store,
    };
    let refresh = config.output.effective_cli_refresh();
    let dashboard_cancel = cancel.clone();
    let dashboard = tokio::task::spawn_blocking(move || {
        run_dashboard(&sources, refresh, &dashboard_cancel)
    });

    let result = dashboard.await.context("dashboard task panicked")?;
    cancel.cancel();
    let _ = tokio::join!(feed_task, pruner_task);

    result.context("terminal error")
}
