//! Tracked Metric Types
//!
//! The six metrics the aggregator reconciles, and the records it hands to
//! consumers: the per-metric table entry, the rolling-buffer sample, and the
//! `Summary` every consumer polls.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Metric
// =============================================================================

/// A metric tracked per event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Batted-ball exit velocity.
    ExitVelocity,
    /// Batted-ball launch angle.
    LaunchAngle,
    /// Pitch velocity (zone speed, falling back to release speed).
    PitchVelocity,
    /// Pitch spin rate.
    SpinRate,
    /// Batted-ball carry distance.
    HitDistance,
    /// Batted-ball hang time.
    Hangtime,
}

impl Metric {
    /// Number of tracked metrics.
    pub const COUNT: usize = 6;

    /// All tracked metrics, in summary field order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::ExitVelocity,
        Self::LaunchAngle,
        Self::PitchVelocity,
        Self::SpinRate,
        Self::HitDistance,
        Self::Hangtime,
    ];

    /// Summary field name for this metric.
    #[must_use]
    pub const fn field_name(self) -> &'static str {
        match self {
            Self::ExitVelocity => "exit_velocity_mph",
            Self::LaunchAngle => "launch_angle_deg",
            Self::PitchVelocity => "pitch_velocity_mph",
            Self::SpinRate => "spin_rate_rpm",
            Self::HitDistance => "hit_distance_ft",
            Self::Hangtime => "hangtime_sec",
        }
    }

    /// Position of this metric in per-metric tables.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

// =============================================================================
// Table Records
// =============================================================================

/// Latest good reading for one metric, independent of which event supplied it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricEntry {
    /// Reading value.
    pub value: f64,
    /// Event that owns the reading.
    pub event_id: String,
    /// Wall-clock time the entry was last refreshed.
    pub updated_at: DateTime<Utc>,
}

/// One rolling-buffer sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricSample {
    /// Sample value (never zero).
    pub value: f64,
    /// Time the sample was accepted.
    pub timestamp: DateTime<Utc>,
}

// =============================================================================
// Summary
// =============================================================================

/// Metric set handed to consumers. Every metric is independently nullable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Latest event identifier.
    pub event_id: Option<String>,
    /// Exit velocity in mph.
    pub exit_velocity_mph: Option<f64>,
    /// Launch angle in degrees.
    pub launch_angle_deg: Option<f64>,
    /// Pitch velocity in mph.
    pub pitch_velocity_mph: Option<f64>,
    /// Spin rate in rpm.
    pub spin_rate_rpm: Option<f64>,
    /// Hit distance in feet.
    pub hit_distance_ft: Option<f64>,
    /// Hang time in seconds.
    pub hangtime_sec: Option<f64>,
    /// Time of the most recent accepted measurement (latest view) or of the
    /// read itself (rolling view).
    pub updated_at: Option<DateTime<Utc>>,
}

impl Summary {
    /// Value for a metric.
    #[must_use]
    pub const fn get(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::ExitVelocity => self.exit_velocity_mph,
            Metric::LaunchAngle => self.launch_angle_deg,
            Metric::PitchVelocity => self.pitch_velocity_mph,
            Metric::SpinRate => self.spin_rate_rpm,
            Metric::HitDistance => self.hit_distance_ft,
            Metric::Hangtime => self.hangtime_sec,
        }
    }

    /// Set the value for a metric.
    pub fn set(&mut self, metric: Metric, value: Option<f64>) {
        let slot = match metric {
            Metric::ExitVelocity => &mut self.exit_velocity_mph,
            Metric::LaunchAngle => &mut self.launch_angle_deg,
            Metric::PitchVelocity => &mut self.pitch_velocity_mph,
            Metric::SpinRate => &mut self.spin_rate_rpm,
            Metric::HitDistance => &mut self.hit_distance_ft,
            Metric::Hangtime => &mut self.hangtime_sec,
        };
        *slot = value;
    }

    /// Whether no metric carries a value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        Metric::ALL.iter().all(|m| self.get(*m).is_none())
    }
}
