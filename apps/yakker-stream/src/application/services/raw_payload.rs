//! Raw Payload Store
//!
//! Payload hook that keeps the most recent raw payload, pre-sorted into the
//! labelled sections the terminal dashboard shows under its core metrics.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde_json::{Map, Value};

use crate::application::ports::{HookError, PayloadHook};
use crate::domain::validity::{DISTANCE_KEY, HANG_TIME_KEY, reading_value};

/// Hit spin rate key (shown raw only, never aggregated).
pub const HIT_SPIN_RATE_KEY: &str = "HitSpinRateRPM";

const STRUCTURED_KEYS: [&str; 2] = ["pitch_data", "hit_data"];

/// Raw metrics pulled straight from the last payload: label, path, unit.
const RAW_METRICS: [(&str, [&str; 2], &str); 3] = [
    ("Hang Time", ["hit_data", HANG_TIME_KEY], "s"),
    ("Hit Distance", ["hit_data", DISTANCE_KEY], "ft"),
    ("Hit Spin Rate", ["hit_data", HIT_SPIN_RATE_KEY], "rpm"),
];

/// A titled list of label/value rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSection {
    /// Section title.
    pub title: String,
    /// Label/value rows.
    pub rows: Vec<(String, String)>,
}

/// The most recent payload and its display sections.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSnapshot {
    /// When the payload arrived.
    pub updated_at: DateTime<Utc>,
    /// The payload as received.
    pub payload: Map<String, Value>,
    /// Display sections built from the payload.
    pub sections: Vec<RawSection>,
}

/// Keeps a copy of the latest object payload.
#[derive(Debug, Default)]
pub struct RawPayloadStore {
    latest: RwLock<Option<RawSnapshot>>,
}

impl RawPayloadStore {
    /// Create an empty store.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            latest: RwLock::new(None),
        }
    }

    /// Replace the stored payload.
    pub fn update(&self, payload: Map<String, Value>) {
        let sections = build_raw_sections(&payload);
        *self.latest.write() = Some(RawSnapshot {
            updated_at: Utc::now(),
            payload,
            sections,
        });
    }

    /// Copy of the latest payload, if any has arrived.
    #[must_use]
    pub fn snapshot(&self) -> Option<RawSnapshot> {
        self.latest.read().clone()
    }
}

#[async_trait]
impl PayloadHook for RawPayloadStore {
    async fn on_payload(&self, payload: &Value) -> Result<(), HookError> {
        if let Value::Object(map) = payload {
            self.update(map.clone());
        }
        Ok(())
    }
}

/// Split a payload into display sections.
///
/// Order: "live metrics" (hang time, distance, hit spin rate), then
/// "pitch data" and "hit data" when non-empty, then "payload" with the
/// remaining top-level keys. Rows within a section are sorted by key.
#[must_use]
pub fn build_raw_sections(payload: &Map<String, Value>) -> Vec<RawSection> {
    let mut sections = Vec::new();
    if payload.is_empty() {
        return sections;
    }

    let live = RAW_METRICS
        .iter()
        .map(|(label, [group, key], unit)| {
            let value = payload
                .get(*group)
                .and_then(Value::as_object)
                .and_then(|g| reading_value(g.get(*key)));
            let cell = value.map_or_else(|| "--".to_string(), |v| format!("{v:.1} {unit}"));
            ((*label).to_string(), cell)
        })
        .collect();
    sections.push(RawSection {
        title: "live metrics".to_string(),
        rows: live,
    });

    for key in STRUCTURED_KEYS {
        if let Some(Value::Object(group)) = payload.get(key)
            && !group.is_empty()
        {
            sections.push(RawSection {
                title: key.replace('_', " "),
                rows: sorted_rows(group.iter()),
            });
        }
    }

    let remaining: Vec<_> = payload
        .iter()
        .filter(|(k, _)| !STRUCTURED_KEYS.contains(&k.as_str()))
        .collect();
    if !remaining.is_empty() {
        sections.push(RawSection {
            title: "payload".to_string(),
            rows: sorted_rows(remaining.into_iter()),
        });
    }

    sections
}

fn sorted_rows<'a>(entries: impl Iterator<Item = (&'a String, &'a Value)>) -> Vec<(String, String)> {
    let mut rows: Vec<_> = entries
        .map(|(k, v)| (k.clone(), format_payload_value(v)))
        .collect();
    rows.sort_by(|a, b| a.0.cmp(&b.0));
    rows
}

/// Display form of a raw payload value.
///
/// Null shows as `--`, floats as up to three decimals with trailing zeros
/// trimmed, strings without quotes.
#[must_use]
pub fn format_payload_value(value: &Value) -> String {
    match value {
        Value::Null => "--".to_string(),
        Value::String(s) => s.clone(),
        Value::Number(n) if n.is_f64() => n.as_f64().map_or_else(
            || n.to_string(),
            |f| {
                let formatted = format!("{f:.3}");
                let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
                if trimmed.is_empty() || trimmed == "-" {
                    "0".to_string()
                } else {
                    trimmed.to_string()
                }
            },
        ),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn float_values_trim_trailing_zeros() {
        assert_eq!(format_payload_value(&json!(3.5)), "3.5");
        assert_eq!(format_payload_value(&json!(287.0)), "287");
        assert_eq!(format_payload_value(&json!(1.23456)), "1.235");
        assert_eq!(format_payload_value(&json!(42)), "42");
        assert_eq!(format_payload_value(&json!(null)), "--");
        assert_eq!(format_payload_value(&json!("N/A")), "N/A");
        assert_eq!(format_payload_value(&json!(true)), "true");
    }

    #[test]
    fn sections_follow_display_order() {
        let payload = object(json!({
            "event_uuid": "demo-001",
            "pitch_data": {"ZoneSpeedMPH": 44.7, "SpinRateRPM": 1031.4},
            "hit_data": {"HangTimeSeconds": 3.58, "DistanceFeet": 287.0},
            "contributing_events": []
        }));
        let sections = build_raw_sections(&payload);
        let titles: Vec<_> = sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, ["live metrics", "pitch data", "hit data", "payload"]);

        let live = &sections[0].rows;
        assert_eq!(live[0], ("Hang Time".to_string(), "3.6 s".to_string()));
        assert_eq!(live[1], ("Hit Distance".to_string(), "287.0 ft".to_string()));
        assert_eq!(live[2], ("Hit Spin Rate".to_string(), "--".to_string()));

        let pitch_keys: Vec<_> = sections[1].rows.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(pitch_keys, ["SpinRateRPM", "ZoneSpeedMPH"]);

        let payload_keys: Vec<_> = sections[3].rows.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(payload_keys, ["contributing_events", "event_uuid"]);
    }

    #[test]
    fn empty_groups_are_skipped() {
        let sections = build_raw_sections(&object(json!({"hit_data": {}})));
        let titles: Vec<_> = sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, ["live metrics"]);
        assert!(build_raw_sections(&Map::new()).is_empty());
    }

    #[tokio::test]
    async fn hook_stores_objects_and_ignores_other_values() {
        let store = RawPayloadStore::new();
        store.on_payload(&json!([1, 2])).await.unwrap();
        assert!(store.snapshot().is_none());

        store.on_payload(&json!({"event_uuid": "x"})).await.unwrap();
        let snapshot = store.snapshot().unwrap();
        assert_eq!(snapshot.payload["event_uuid"], "x");
        assert_eq!(snapshot.sections.last().unwrap().title, "payload");
    }
}
