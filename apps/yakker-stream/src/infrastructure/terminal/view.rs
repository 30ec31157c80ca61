//! Dashboard view model.
//!
//! Everything the terminal shows, already formatted, so rendering is a pure
//! layout step and the content can be tested without a terminal.

use chrono::{DateTime, Local, Utc};

use crate::application::services::{RawSection, RawSnapshot};
use crate::domain::metrics::{Metric, Summary};
use crate::domain::streaming::ConnectionState;

/// Core metrics table rows: label, metric, unit.
const CORE_METRICS: [(&str, Metric, &str); 4] = [
    ("Pitch Velocity", Metric::PitchVelocity, "mph"),
    ("Spin Rate", Metric::SpinRate, "rpm"),
    ("Exit Velocity", Metric::ExitVelocity, "mph"),
    ("Launch Angle", Metric::LaunchAngle, "deg"),
];

const MISSING: &str = "--";

/// Formatted dashboard content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardView {
    /// Connection state, upper case.
    pub connection: String,
    /// Last event id, or `--`.
    pub last_event: String,
    /// Last update time with its age.
    pub last_update: String,
    /// Core metric label/value rows.
    pub core_rows: Vec<(String, String)>,
    /// Raw payload arrival time with its age.
    pub raw_update: String,
    /// Raw payload sections; `None` until a payload arrives.
    pub raw_sections: Option<Vec<RawSection>>,
}

impl DashboardView {
    /// Build the view.
    ///
    /// Core metrics prefer the rolling value and fall back to the latest
    /// one. The header follows the latest summary, or the rolling one once
    /// the latest bucket has gone stale.
    #[must_use]
    pub fn build(
        state: ConnectionState,
        rolling: &Summary,
        latest: Option<&Summary>,
        raw: Option<&RawSnapshot>,
        now: DateTime<Utc>,
    ) -> Self {
        let active = latest.unwrap_or(rolling);

        let last_event = active
            .event_id
            .clone()
            .unwrap_or_else(|| MISSING.to_string());
        let last_update = active
            .updated_at
            .map_or_else(|| "waiting for data".to_string(), |at| stamp(at, now));

        let core_rows = CORE_METRICS
            .iter()
            .map(|(label, metric, unit)| {
                let value = rolling
                    .get(*metric)
                    .or_else(|| latest.and_then(|s| s.get(*metric)));
                let cell = value.map_or_else(|| MISSING.to_string(), |v| format!("{v:.1} {unit}"));
                ((*label).to_string(), cell)
            })
            .collect();

        Self {
            connection: state.as_str().to_uppercase(),
            last_event,
            last_update,
            core_rows,
            raw_update: raw.map_or_else(
                || "waiting for payload".to_string(),
                |snapshot| stamp(snapshot.updated_at, now),
            ),
            raw_sections: raw.map(|snapshot| snapshot.sections.clone()),
        }
    }
}

/// `HH:MM:SS (N.Ns ago)` in local time.
fn stamp(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    #[allow(clippy::cast_precision_loss)]
    let age = (now - at).num_milliseconds().max(0) as f64 / 1000.0;
    format!(
        "{} ({age:.1}s ago)",
        at.with_timezone(&Local).format("%H:%M:%S")
    )
}
