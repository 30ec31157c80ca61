//! Process Wiring
//!
//! Startup pieces shared by the stream server and the terminal dashboard:
//! `.env` loading, launching the configured feed, and the rolling-window
//! pruner.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::application::services::IngestPipeline;
use crate::domain::aggregator::MetricAggregator;
use crate::domain::streaming::FeedState;
use crate::infrastructure::config::{ConfigError, FeedSettings};
use crate::infrastructure::yakker::{DemoFeed, FeedClientConfig, YakkerClient};

/// How often the pruner touches the rolling window.
pub const PRUNE_INTERVAL: Duration = Duration::from_secs(1);

/// Load `.env` from the current directory or the nearest ancestor holding one.
pub fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        for dir in cwd.ancestors().skip(1) {
            let env_path = dir.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
        }
    }
}

/// Spawn the demo feed or the live client, whichever `feed` selects.
///
/// # Errors
///
/// Returns [`ConfigError::MissingEnvVar`] when live mode has no URL.
pub fn spawn_feed(
    feed: &FeedSettings,
    pipeline: Arc<IngestPipeline>,
    feed_state: Arc<FeedState>,
    cancel: CancellationToken,
) -> Result<JoinHandle<()>, ConfigError> {
    if feed.demo {
        tracing::info!("Demo mode: replaying built-in payloads");
        let demo = DemoFeed::new(pipeline, feed_state, feed.demo_interval, cancel);
        return Ok(tokio::spawn(demo.run()));
    }

    let url = feed
        .ws_url
        .clone()
        .ok_or_else(|| ConfigError::MissingEnvVar("YAKKER_WS_URL".to_string()))?;
    let config = FeedClientConfig {
        url,
        auth: feed.auth.as_ref().map(|a| a.expose().to_string()),
        reconnect: feed.reconnect(),
        heartbeat: feed.heartbeat(),
    };
    let client = Arc::new(YakkerClient::new(config, pipeline, feed_state, cancel));
    Ok(tokio::spawn(client.run()))
}

/// Spawn a task that reads the rolling summary on a fixed interval so the
/// rolling buffers are pruned even when nothing else reads them.
pub fn spawn_pruner(
    aggregator: Arc<MetricAggregator>,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(interval) => {
                    let _ = aggregator.rolling_summary();
                }
            }
        }
        tracing::debug!("Pruner stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::streaming::ConnectionState;

    fn pipeline() -> Arc<IngestPipeline> {
        Arc::new(IngestPipeline::new(Arc::new(MetricAggregator::default())))
    }

    #[test]
    fn live_feed_without_url_is_rejected() {
        let result = spawn_feed(
            &FeedSettings::default(),
            pipeline(),
            Arc::new(FeedState::new()),
            CancellationToken::new(),
        );
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(_))));
    }

    #[tokio::test]
    async fn demo_feed_is_spawned_when_selected() {
        let feed_state = Arc::new(FeedState::new());
        let cancel = CancellationToken::new();
        let settings = FeedSettings {
            demo: true,
            demo_interval: Duration::from_millis(5),
            ..FeedSettings::default()
        };

        let handle = spawn_feed(&settings, pipeline(), feed_state.clone(), cancel.clone()).unwrap();
        tokio::time::timeout(Duration::from_secs(2), async {
            while feed_state.messages_received() == 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
        assert_eq!(feed_state.state(), ConnectionState::Demo);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn pruner_stops_on_cancel() {
        let cancel = CancellationToken::new();
        let handle = spawn_pruner(
            Arc::new(MetricAggregator::default()),
            Duration::from_millis(5),
            cancel.clone(),
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
