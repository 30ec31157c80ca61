//! Prometheus Metrics Module
//!
//! Exposes ingest and feed metrics in Prometheus format.
//!
//! # Metrics Categories
//!
//! - **Payloads**: received, malformed, hook failures, suppressed throwbacks
//! - **Feed**: reconnect attempts and current connection state
//! - **Latency**: time to ingest one payload
//!
//! # Integration
//!
//! Metrics are exposed at `/metrics` on the HTTP port.

use std::sync::OnceLock;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

// =============================================================================
// Global Metrics Handle
// =============================================================================

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder, or return the one already installed.
///
/// # Errors
///
/// Returns an error if the recorder cannot be installed (for example when
/// another global recorder is already registered).
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    if let Some(handle) = PROMETHEUS_HANDLE.get() {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    register_metrics();
    Ok(PROMETHEUS_HANDLE.get_or_init(|| handle).clone())
}

/// Get the Prometheus handle for rendering metrics.
///
/// Returns `None` if metrics have not been initialized.
#[must_use]
pub fn get_metrics_handle() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE.get().cloned()
}

// =============================================================================
// Metric Registration
// =============================================================================

fn register_metrics() {
    describe_counter!(
        "yakker_payloads_received_total",
        "Total payloads handed to the ingest pipeline"
    );
    describe_counter!(
        "yakker_payloads_malformed_total",
        "Total frames skipped because they could not be decoded"
    );
    describe_counter!(
        "yakker_payload_hook_failures_total",
        "Total payload hook errors and panics swallowed"
    );
    describe_counter!(
        "yakker_throwbacks_suppressed_total",
        "Total hit observations dropped as catcher throwbacks"
    );
    describe_counter!(
        "yakker_reconnects_total",
        "Total feed reconnection attempts"
    );

    describe_gauge!(
        "yakker_feed_connected",
        "1 while the live feed socket is open, else 0"
    );

    describe_histogram!(
        "yakker_ingest_seconds",
        "Time to run one payload through hooks, classification, and aggregation"
    );
}

// =============================================================================
// Metric Recording Functions
// =============================================================================

/// Stage at which a payload was rejected.
#[derive(Debug, Clone, Copy)]
pub enum MalformedStage {
    /// Frame text was not JSON.
    Decode,
    /// JSON did not have the payload shape.
    Payload,
}

impl MalformedStage {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Decode => "decode",
            Self::Payload => "payload",
        }
    }
}

/// Record a payload entering the ingest pipeline.
pub fn record_payload_received() {
    counter!("yakker_payloads_received_total").increment(1);
}

/// Record a skipped frame.
pub fn record_payload_malformed(stage: MalformedStage) {
    counter!(
        "yakker_payloads_malformed_total",
        "stage" => stage.as_str()
    )
    .increment(1);
}

/// Record a payload hook error or panic.
pub fn record_hook_failure() {
    counter!("yakker_payload_hook_failures_total").increment(1);
}

/// Record a hit observation suppressed as a throwback.
pub fn record_throwback_suppressed() {
    counter!("yakker_throwbacks_suppressed_total").increment(1);
}

/// Record a feed reconnection attempt.
pub fn record_reconnect() {
    counter!("yakker_reconnects_total").increment(1);
}

/// Update the live feed connection gauge.
pub fn set_feed_connected(connected: bool) {
    gauge!("yakker_feed_connected").set(if connected { 1.0 } else { 0.0 });
}

/// Record how long one payload took to ingest.
pub fn record_ingest_duration(duration: Duration) {
    histogram!("yakker_ingest_seconds").record(duration.as_secs_f64());
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_stage_as_str() {
        assert_eq!(MalformedStage::Decode.as_str(), "decode");
        assert_eq!(MalformedStage::Payload.as_str(), "payload");
    }

    #[test]
    fn recording_without_recorder_is_a_no_op() {
        record_payload_received();
        record_payload_malformed(MalformedStage::Decode);
        record_hook_failure();
        set_feed_connected(true);
        record_ingest_duration(Duration::from_millis(2));
    }
}
