//! Ingest Pipeline
//!
//! The single entry point for feed payloads, shared by the live feed client
//! and the demo replay.

use std::fmt::Write as _;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures_util::FutureExt;
use serde_json::Value;

use crate::application::ports::PayloadHook;
use crate::domain::aggregator::MetricAggregator;
use crate::domain::event::{FeedPayload, classify};
use crate::domain::metrics::Summary;
use crate::infrastructure::metrics::{self, MalformedStage};

/// Errors that reject a payload.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// The value is not a feed payload (not an object, or a known field has
    /// the wrong type).
    #[error("payload has unexpected shape: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Runs hooks, classification, and aggregation for each payload.
pub struct IngestPipeline {
    aggregator: Arc<MetricAggregator>,
    hooks: Vec<Arc<dyn PayloadHook>>,
    echo_console: bool,
}

impl IngestPipeline {
    /// Create a pipeline with no hooks and console echo off.
    #[must_use]
    pub const fn new(aggregator: Arc<MetricAggregator>) -> Self {
        Self {
            aggregator,
            hooks: Vec::new(),
            echo_console: false,
        }
    }

    /// Register a payload hook. Hooks run in registration order.
    #[must_use]
    pub fn with_hook(mut self, hook: Arc<dyn PayloadHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Print each accepted summary to stderr.
    #[must_use]
    pub const fn with_console_echo(mut self, enabled: bool) -> Self {
        self.echo_console = enabled;
        self
    }

    /// The aggregator payloads are fed into.
    #[must_use]
    pub const fn aggregator(&self) -> &Arc<MetricAggregator> {
        &self.aggregator
    }

    /// Ingest one decoded payload and return the latest summary.
    ///
    /// Hooks see the raw value first; their failures are logged and
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Payload`] if the value does not have the
    /// payload shape. The aggregator is untouched in that case.
    pub async fn ingest(&self, raw: Value) -> Result<Summary, IngestError> {
        let started = Instant::now();
        metrics::record_payload_received();

        self.dispatch_hooks(&raw).await;

        let payload = FeedPayload::from_value(raw).inspect_err(|_| {
            metrics::record_payload_malformed(MalformedStage::Payload);
        })?;

        let classification = classify(&payload);
        if classification.throwback {
            metrics::record_throwback_suppressed();
            tracing::debug!(
                event_id = ?classification.measurement.event_id,
                "Suppressed throwback hit data"
            );
        }

        let summary = self.aggregator.add_measurement(classification.measurement);

        if self.echo_console {
            eprintln!("{}", format_console_summary(&summary));
        }

        metrics::record_ingest_duration(started.elapsed());
        Ok(summary)
    }

    async fn dispatch_hooks(&self, raw: &Value) {
        for (index, hook) in self.hooks.iter().enumerate() {
            let outcome = AssertUnwindSafe(async { hook.on_payload(raw).await })
                .catch_unwind()
                .await;
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    metrics::record_hook_failure();
                    tracing::warn!(hook = index, error = %e, "Payload hook failed");
                }
                Err(_) => {
                    metrics::record_hook_failure();
                    tracing::warn!(hook = index, "Payload hook panicked");
                }
            }
        }
    }
}

impl std::fmt::Debug for IngestPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestPipeline")
            .field("hooks", &self.hooks.len())
            .field("echo_console", &self.echo_console)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Console Echo
// =============================================================================

const CONSOLE_MISSING: &str = "\u{2014}";
const CONSOLE_EVENT_ID_CHARS: usize = 6;

/// Multi-line console block for one summary.
///
/// The event id is shortened to its last six characters and missing values
/// show as an em dash.
#[must_use]
pub fn format_console_summary(summary: &Summary) -> String {
    let event = summary
        .event_id
        .as_deref()
        .map_or_else(|| "N/A".to_string(), short_event_id);

    let mut out = String::from("  -----------------------------\n");
    let _ = writeln!(out, "Event {event}");
    let _ = writeln!(out, "- Pitch Velo: {} mph", console_metric(summary.pitch_velocity_mph, 1));
    let _ = writeln!(out, "- Spin: {} rpm", console_metric(summary.spin_rate_rpm, 0));
    let _ = writeln!(out, "- Exit Velo: {} mph", console_metric(summary.exit_velocity_mph, 1));
    let _ = writeln!(out, "- Launch: {}\u{b0}", console_metric(summary.launch_angle_deg, 1));
    let _ = writeln!(out, "- Distance: {} ft", console_metric(summary.hit_distance_ft, 0));
    let _ = write!(out, "- Hangtime: {} s", console_metric(summary.hangtime_sec, 1));
    out
}

fn short_event_id(id: &str) -> String {
    let skip = id.chars().count().saturating_sub(CONSOLE_EVENT_ID_CHARS);
    id.chars().skip(skip).collect()
}

fn console_metric(value: Option<f64>, decimals: usize) -> String {
    value.map_or_else(
        || CONSOLE_MISSING.to_string(),
        |v| format!("{v:.decimals$}"),
    )
}

#[cfg(test)]
mod tests {
    use mockall::Sequence;
    use serde_json::json;

    use super::*;
    use crate::application::ports::{HookError, MockPayloadHook};

    fn pipeline() -> IngestPipeline {
        IngestPipeline::new(Arc::new(MetricAggregator::default()))
    }

    #[tokio::test]
    async fn ingest_feeds_the_aggregator() {
        let pipeline = pipeline();
        let summary = pipeline
            .ingest(json!({
                "event_uuid": "demo-002",
                "pitch_data": {"ZoneSpeedMPH": 45.8, "SpinRateRPM": 1123.6},
                "hit_data": {"ExitSpeedMPH": 95.9, "AngleDegrees": 21.1}
            }))
            .await
            .unwrap();

        assert_eq!(summary.event_id.as_deref(), Some("demo-002"));
        assert_eq!(summary.pitch_velocity_mph, Some(45.8));
        assert_eq!(summary.exit_velocity_mph, Some(95.9));
        assert_eq!(pipeline.aggregator().event_count(), 1);
    }

    #[tokio::test]
    async fn non_object_payload_is_rejected_after_hooks() {
        let mut hook = MockPayloadHook::new();
        hook.expect_on_payload().times(1).returning(|_| Ok(()));
        let pipeline = pipeline().with_hook(Arc::new(hook));

        let result = pipeline.ingest(json!([1, 2, 3])).await;

        assert!(matches!(result, Err(IngestError::Payload(_))));
        assert_eq!(pipeline.aggregator().event_count(), 0);
    }

    #[tokio::test]
    async fn hooks_run_in_order_and_failures_are_swallowed() {
        let mut seq = Sequence::new();
        let mut failing = MockPayloadHook::new();
        failing
            .expect_on_payload()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(HookError::failed("boom")));
        let mut observer = MockPayloadHook::new();
        observer
            .expect_on_payload()
            .withf(|raw| raw["event_uuid"] == "e1")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let pipeline = pipeline()
            .with_hook(Arc::new(failing))
            .with_hook(Arc::new(observer));

        let summary = pipeline
            .ingest(json!({"event_uuid": "e1", "pitch_data": {"RelSpeedMPH": 90.1}}))
            .await
            .unwrap();
        assert_eq!(summary.pitch_velocity_mph, Some(90.1));
    }

    #[tokio::test]
    async fn panicking_hook_does_not_stop_ingest() {
        let mut hook = MockPayloadHook::new();
        hook.expect_on_payload()
            .returning(|_| panic!("hook exploded"));
        let pipeline = pipeline().with_hook(Arc::new(hook));

        let summary = pipeline
            .ingest(json!({"event_uuid": "e1", "pitch_data": {"SpinRateRPM": 2100}}))
            .await
            .unwrap();
        assert_eq!(summary.spin_rate_rpm, Some(2100.0));
    }

    #[tokio::test]
    async fn throwback_hit_fields_never_reach_the_aggregator() {
        let pipeline = pipeline();
        let summary = pipeline
            .ingest(json!({
                "event_uuid": "tb",
                "hit_data": {"ExitSpeedMPH": 55.0, "AngleDegrees": 15.0, "DistanceFeet": 40.0}
            }))
            .await
            .unwrap();

        assert_eq!(summary.exit_velocity_mph, None);
        assert_eq!(summary.hit_distance_ft, None);
    }

    #[test]
    fn console_summary_shortens_id_and_marks_missing() {
        let summary = Summary {
            event_id: Some("4f1c2a-9b7e-demo01".to_string()),
            pitch_velocity_mph: Some(44.76),
            spin_rate_rpm: Some(1031.4),
            ..Summary::default()
        };
        let out = format_console_summary(&summary);

        assert!(out.contains("Event demo01\n"));
        assert!(out.contains("- Pitch Velo: 44.8 mph"));
        assert!(out.contains("- Spin: 1031 rpm"));
        assert!(out.contains("- Exit Velo: \u{2014} mph"));
        assert!(out.ends_with("- Hangtime: \u{2014} s"));
    }

    #[test]
    fn console_summary_without_event_id() {
        let out = format_console_summary(&Summary::default());
        assert!(out.contains("Event N/A"));
    }
}
