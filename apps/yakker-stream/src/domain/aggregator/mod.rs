//! Metric Aggregator
//!
//! Reconciles measurements into per-event buckets and serves two views of
//! the result:
//!
//! - **Latest summary**: the last good value per metric, hidden per metric
//!   once it is older than the stale timeout (10 s), and `None` as a whole
//!   once no measurement has arrived for that long.
//! - **Rolling summary**: the most recent non-zero sample per metric inside
//!   a short trailing window (1 s), for high-refresh displays.
//!
//! All state sits behind one mutex. Every method takes the lock once, does
//! in-memory work, and returns; nothing is awaited while it is held.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;

use super::clock::{Clock, SystemClock};
use super::event::Measurement;
use super::metrics::{Metric, MetricEntry, MetricSample, Summary};

// =============================================================================
// Configuration
// =============================================================================

/// Default rolling window.
pub const DEFAULT_ROLLING_WINDOW: Duration = Duration::from_secs(1);
/// Default absolute staleness timeout.
pub const DEFAULT_STALE_TIMEOUT: Duration = Duration::from_secs(10);
/// Default number of retained event buckets.
pub const DEFAULT_MAX_EVENT_BUCKETS: usize = 4096;

/// Aggregator window lengths and retention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregatorConfig {
    /// Trailing window for the rolling summary.
    pub rolling_window: Duration,
    /// Age beyond which a metric is considered dead.
    pub stale_timeout: Duration,
    /// Maximum event buckets kept; the oldest is evicted first.
    pub max_event_buckets: usize,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            rolling_window: DEFAULT_ROLLING_WINDOW,
            stale_timeout: DEFAULT_STALE_TIMEOUT,
            max_event_buckets: DEFAULT_MAX_EVENT_BUCKETS,
        }
    }
}

// =============================================================================
// Event Bucket
// =============================================================================

/// Most recent valid value per metric for one event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventBucket {
    values: [Option<f64>; Metric::COUNT],
}

impl EventBucket {
    /// Stored value for a metric.
    #[must_use]
    pub const fn get(&self, metric: Metric) -> Option<f64> {
        self.values[metric.index()]
    }

    /// Metrics that currently hold a value, with their values.
    pub fn values(&self) -> impl Iterator<Item = (Metric, f64)> + '_ {
        Metric::ALL
            .into_iter()
            .filter_map(|m| self.get(m).map(|v| (m, v)))
    }
}

// =============================================================================
// State
// =============================================================================

#[derive(Debug, Default)]
struct AggregatorState {
    buckets: HashMap<String, EventBucket>,
    /// Bucket keys in first-seen order.
    bucket_order: VecDeque<String>,
    latest_event_id: Option<String>,
    last_update: Option<DateTime<Utc>>,
    latest: [Option<MetricEntry>; Metric::COUNT],
    rolling: [VecDeque<MetricSample>; Metric::COUNT],
}

impl AggregatorState {
    fn bucket_mut(&mut self, key: &str, capacity: usize) -> &mut EventBucket {
        if !self.buckets.contains_key(key) {
            while self.buckets.len() >= capacity {
                let Some(oldest) = self.bucket_order.pop_front() else {
                    break;
                };
                self.buckets.remove(&oldest);
                tracing::debug!(event_id = %oldest, "Evicted event bucket");
            }
            self.bucket_order.push_back(key.to_string());
        }
        self.buckets.entry(key.to_string()).or_default()
    }

    fn prune_rolling(&mut self, now: DateTime<Utc>, window: TimeDelta) {
        let cutoff = now - window;
        for samples in &mut self.rolling {
            samples.retain(|s| s.timestamp > cutoff);
        }
    }

    /// Newest sample for a metric; ties go to the later append.
    fn newest_sample(&self, metric: Metric) -> Option<&MetricSample> {
        self.rolling[metric.index()]
            .iter()
            .max_by_key(|s| s.timestamp)
    }

    fn prune_latest(&mut self, now: DateTime<Utc>, stale: TimeDelta) {
        for slot in &mut self.latest {
            if slot.as_ref().is_some_and(|e| now - e.updated_at > stale) {
                *slot = None;
            }
        }
    }

    fn table_summary(&self) -> Summary {
        let mut summary = Summary {
            event_id: self.latest_event_id.clone(),
            updated_at: self.last_update,
            ..Summary::default()
        };
        for metric in Metric::ALL {
            summary.set(
                metric,
                self.latest[metric.index()].as_ref().map(|e| e.value),
            );
        }
        summary
    }
}

// =============================================================================
// Aggregator
// =============================================================================

/// Thread-safe metric aggregator shared by the feed and every consumer.
pub struct MetricAggregator {
    clock: Arc<dyn Clock>,
    rolling_window: TimeDelta,
    stale_timeout: TimeDelta,
    max_event_buckets: usize,
    state: Mutex<AggregatorState>,
}

impl MetricAggregator {
    /// Create an aggregator reading the system clock.
    #[must_use]
    pub fn new(config: AggregatorConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create an aggregator reading the given clock.
    #[must_use]
    pub fn with_clock(config: AggregatorConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            rolling_window: to_delta(config.rolling_window),
            stale_timeout: to_delta(config.stale_timeout),
            max_event_buckets: config.max_event_buckets.max(1),
            state: Mutex::new(AggregatorState::default()),
        }
    }

    /// Accept a measurement and return the latest summary.
    ///
    /// Invalid or missing readings leave the bucket untouched. Valid
    /// non-zero readings also enter the rolling buffers.
    pub fn add_measurement(&self, measurement: Measurement) -> Summary {
        let mut state = self.state.lock();
        let now = self.clock.now();
        let key = measurement
            .event_id
            .clone()
            .unwrap_or_else(|| synthesize_event_key(now));

        let mut accepted = [None; Metric::COUNT];
        for metric in Metric::ALL {
            accepted[metric.index()] = measurement.reading(metric).and_then(|r| r.value());
        }

        let bucket = state.bucket_mut(&key, self.max_event_buckets);
        for metric in Metric::ALL {
            if let Some(value) = accepted[metric.index()] {
                bucket.values[metric.index()] = Some(value);
            }
        }
        let current = bucket.clone();

        for metric in Metric::ALL {
            if let Some(value) = accepted[metric.index()]
                && value != 0.0
            {
                state.rolling[metric.index()].push_back(MetricSample {
                    value,
                    timestamp: now,
                });
            }
        }

        state.latest_event_id = Some(key.clone());
        state.last_update = Some(now);

        for (metric, value) in current.values() {
            state.latest[metric.index()] = Some(MetricEntry {
                value,
                event_id: key.clone(),
                updated_at: now,
            });
        }

        state.prune_rolling(now, self.rolling_window);
        state.prune_latest(now, self.stale_timeout);
        state.table_summary()
    }

    /// Last good value per metric, or `None` once the feed has gone quiet.
    ///
    /// Returns `None` before the first measurement and whenever the most
    /// recent one is older than the stale timeout. Individual metrics older
    /// than the timeout are hidden.
    #[must_use]
    pub fn latest_summary(&self) -> Option<Summary> {
        let mut state = self.state.lock();
        let now = self.clock.now();
        state.prune_latest(now, self.stale_timeout);
        state.prune_rolling(now, self.rolling_window);

        let last_update = state.last_update?;
        if now - last_update > self.stale_timeout {
            return None;
        }
        Some(state.table_summary())
    }

    /// Most recent sample per metric inside the rolling window.
    ///
    /// Always returns a summary; its `updated_at` is the time of the read.
    #[must_use]
    pub fn rolling_summary(&self) -> Summary {
        let mut state = self.state.lock();
        let now = self.clock.now();
        state.prune_rolling(now, self.rolling_window);

        let mut summary = Summary {
            event_id: state.latest_event_id.clone(),
            updated_at: Some(now),
            ..Summary::default()
        };
        for metric in Metric::ALL {
            summary.set(
                metric,
                state.newest_sample(metric).map(|s| s.value),
            );
        }
        summary
    }

    /// Copy of an event's bucket.
    #[must_use]
    pub fn bucket(&self, event_id: &str) -> Option<EventBucket> {
        self.state.lock().buckets.get(event_id).cloned()
    }

    /// Latest-metrics table entry for a metric, stale or not.
    #[must_use]
    pub fn latest_metric(&self, metric: Metric) -> Option<MetricEntry> {
        self.state.lock().latest[metric.index()].clone()
    }

    /// Identifier of the most recently accepted event.
    #[must_use]
    pub fn latest_event_id(&self) -> Option<String> {
        self.state.lock().latest_event_id.clone()
    }

    /// Number of retained event buckets.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.state.lock().buckets.len()
    }
}

impl Default for MetricAggregator {
    fn default() -> Self {
        Self::new(AggregatorConfig::default())
    }
}

impl std::fmt::Debug for MetricAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricAggregator")
            .field("rolling_window", &self.rolling_window)
            .field("stale_timeout", &self.stale_timeout)
            .field("max_event_buckets", &self.max_event_buckets)
            .finish_non_exhaustive()
    }
}

/// Key for an event the feed sent without an identifier.
fn synthesize_event_key(now: DateTime<Utc>) -> String {
    format!("event-{}", now.timestamp_millis())
}

fn to_delta(duration: Duration) -> TimeDelta {
    TimeDelta::from_std(duration).unwrap_or(TimeDelta::MAX)
}
