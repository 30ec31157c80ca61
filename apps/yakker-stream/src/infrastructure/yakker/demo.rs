//! Demo Feed
//!
//! Replays three recorded payloads forever through the same ingest pipeline
//! the live client uses, so every consumer can be exercised offline.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

use crate::application::services::IngestPipeline;
use crate::domain::streaming::{ConnectionState, FeedState};

/// Default pause between demo payloads.
pub const DEFAULT_DEMO_INTERVAL: Duration = Duration::from_secs(1);

/// The recorded payloads, in replay order.
#[must_use]
pub fn demo_payloads() -> Vec<Value> {
    vec![
        json!({
            "event_uuid": "demo-001",
            "pitch_data": {"ZoneSpeedMPH": 44.7, "SpinRateRPM": 1031.4},
            "hit_data": {
                "ExitSpeedMPH": 87.9,
                "AngleDegrees": 30.3,
                "DistanceFeet": 287.0,
                "HangTimeSeconds": 3.58
            }
        }),
        json!({
            "event_uuid": "demo-001",
            "pitch_data": {"ZoneSpeedMPH": 44.8, "SpinRateRPM": 1073.3},
            "hit_data": {
                "ExitSpeedMPH": 87.7,
                "AngleDegrees": 30.3,
                "DistanceFeet": 287.0,
                "HangTimeSeconds": 3.58
            }
        }),
        json!({
            "event_uuid": "demo-002",
            "pitch_data": {"ZoneSpeedMPH": 45.8, "SpinRateRPM": 1123.6},
            "hit_data": {
                "ExitSpeedMPH": 95.9,
                "AngleDegrees": 21.1,
                "DistanceFeet": 321.8,
                "HangTimeSeconds": 3.59
            }
        }),
    ]
}

/// Built-in replay feed.
#[derive(Debug)]
pub struct DemoFeed {
    pipeline: Arc<IngestPipeline>,
    feed_state: Arc<FeedState>,
    interval: Duration,
    cancel: CancellationToken,
}

impl DemoFeed {
    /// Create a demo feed pacing payloads `interval` apart.
    #[must_use]
    pub const fn new(
        pipeline: Arc<IngestPipeline>,
        feed_state: Arc<FeedState>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            pipeline,
            feed_state,
            interval,
            cancel,
        }
    }

    /// Replay until cancelled.
    pub async fn run(self) {
        self.feed_state.set_state(ConnectionState::Demo);
        tracing::info!(interval_ms = self.interval.as_millis(), "Demo feed started");

        for payload in demo_payloads().into_iter().cycle() {
            if self.cancel.is_cancelled() {
                break;
            }

            self.feed_state.increment_messages();
            if let Err(e) = self.pipeline.ingest(payload).await {
                self.feed_state.increment_malformed();
                tracing::warn!(error = %e, "Demo payload rejected");
            }

            tokio::select! {
                () = self.cancel.cancelled() => break,
                () = tokio::time::sleep(self.interval) => {}
            }
        }

        tracing::info!("Demo feed stopped");
    }
}
