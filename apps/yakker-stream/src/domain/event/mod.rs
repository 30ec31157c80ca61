//! Feed Event Records
//!
//! The inbound payload shape and its reduction to the measurement the
//! aggregator accepts.

use serde::Deserialize;
use serde_json::Value;

use super::metrics::Metric;
use super::validity::{
    DISTANCE_KEY, EXIT_SPEED_KEY, HANG_TIME_KEY, LAUNCH_ANGLE_KEY, Observation, REL_SPEED_KEY,
    Reading, SPIN_RATE_KEY, ZONE_SPEED_KEY, is_genuine_hit, is_throwback,
};

// =============================================================================
// Feed Payload
// =============================================================================

/// One decoded feed message.
///
/// Every field is optional; unknown top-level keys are ignored here and only
/// visible to payload hooks through the raw value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FeedPayload {
    /// Primary event identifier.
    #[serde(default)]
    pub event_uuid: Option<String>,
    /// Legacy event identifier.
    #[serde(default, rename = "eventId")]
    pub event_id: Option<String>,
    /// Pitch measurement group.
    #[serde(default)]
    pub pitch_data: Option<Observation>,
    /// Hit measurement group.
    #[serde(default)]
    pub hit_data: Option<Observation>,
    /// Secondary identifiers merged into this record.
    #[serde(default)]
    pub contributing_events: Option<Vec<String>>,
}

impl FeedPayload {
    /// Decode a payload from a raw JSON value.
    ///
    /// # Errors
    ///
    /// Returns an error when the value is not an object or a known field has
    /// the wrong type.
    pub fn from_value(raw: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(raw)
    }

    /// Event identifier: `event_uuid`, falling back to `eventId`.
    ///
    /// Empty strings count as absent.
    #[must_use]
    pub fn resolved_event_id(&self) -> Option<&str> {
        [self.event_uuid.as_deref(), self.event_id.as_deref()]
            .into_iter()
            .flatten()
            .find(|id| !id.is_empty())
    }

    /// Contributing event identifiers (empty when absent).
    #[must_use]
    pub fn contributing(&self) -> &[String] {
        self.contributing_events.as_deref().unwrap_or_default()
    }
}

// =============================================================================
// Measurement
// =============================================================================

/// Raw readings offered to the aggregator for one payload.
///
/// Readings are still unvalidated; the aggregator applies the validity gate
/// per metric.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Measurement {
    /// Event identifier, synthesized by the aggregator when absent.
    pub event_id: Option<String>,
    /// Exit velocity reading.
    pub exit_velocity: Option<Reading>,
    /// Launch angle reading.
    pub launch_angle: Option<Reading>,
    /// Pitch velocity reading.
    pub pitch_velocity: Option<Reading>,
    /// Spin rate reading.
    pub spin_rate: Option<Reading>,
    /// Hit distance reading.
    pub hit_distance: Option<Reading>,
    /// Hang time reading.
    pub hangtime: Option<Reading>,
}

impl Measurement {
    /// Start a measurement for an event.
    #[must_use]
    pub fn for_event(event_id: impl Into<String>) -> Self {
        Self {
            event_id: Some(event_id.into()),
            ..Self::default()
        }
    }

    /// Reading supplied for a metric, if any.
    #[must_use]
    pub const fn reading(&self, metric: Metric) -> Option<&Reading> {
        match metric {
            Metric::ExitVelocity => self.exit_velocity.as_ref(),
            Metric::LaunchAngle => self.launch_angle.as_ref(),
            Metric::PitchVelocity => self.pitch_velocity.as_ref(),
            Metric::SpinRate => self.spin_rate.as_ref(),
            Metric::HitDistance => self.hit_distance.as_ref(),
            Metric::Hangtime => self.hangtime.as_ref(),
        }
    }

    /// Set the exit velocity reading.
    #[must_use]
    pub fn exit_velocity(mut self, reading: impl Into<Reading>) -> Self {
        self.exit_velocity = Some(reading.into());
        self
    }

    /// Set the launch angle reading.
    #[must_use]
    pub fn launch_angle(mut self, reading: impl Into<Reading>) -> Self {
        self.launch_angle = Some(reading.into());
        self
    }

    /// Set the pitch velocity reading.
    #[must_use]
    pub fn pitch_velocity(mut self, reading: impl Into<Reading>) -> Self {
        self.pitch_velocity = Some(reading.into());
        self
    }

    /// Set the spin rate reading.
    #[must_use]
    pub fn spin_rate(mut self, reading: impl Into<Reading>) -> Self {
        self.spin_rate = Some(reading.into());
        self
    }

    /// Set the hit distance reading.
    #[must_use]
    pub fn hit_distance(mut self, reading: impl Into<Reading>) -> Self {
        self.hit_distance = Some(reading.into());
        self
    }

    /// Set the hang time reading.
    #[must_use]
    pub fn hangtime(mut self, reading: impl Into<Reading>) -> Self {
        self.hangtime = Some(reading.into());
        self
    }
}

// =============================================================================
// Classification
// =============================================================================

/// Outcome of reducing a payload to a measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// Readings to offer the aggregator.
    pub measurement: Measurement,
    /// Whether the hit group was accepted as genuine contact.
    pub genuine_hit: bool,
    /// Whether the hit group matched the throwback pattern.
    pub throwback: bool,
}

/// Reduce a payload to the measurement the aggregator should see.
///
/// Pitch velocity is the zone speed, or the release-relative speed when the
/// zone speed is missing or blank. Hit readings are included only for
/// genuine contact.
#[must_use]
pub fn classify(payload: &FeedPayload) -> Classification {
    let pitch = payload.pitch_data.as_ref();
    let hit = payload.hit_data.as_ref();

    let pitch_velocity = pitch.and_then(|p| {
        p.get(ZONE_SPEED_KEY)
            .filter(|v| !is_blank(v))
            .or_else(|| p.get(REL_SPEED_KEY))
            .cloned()
    });
    let spin_rate = pitch.and_then(|p| p.get(SPIN_RATE_KEY).cloned());

    let throwback = hit.is_some_and(is_throwback);
    let genuine_hit = is_genuine_hit(hit, pitch, payload.contributing());
    let hit_reading = |key: &str| {
        hit.filter(|_| genuine_hit)
            .and_then(|h| h.get(key).cloned())
            .map(Reading::new)
    };

    Classification {
        measurement: Measurement {
            event_id: payload.resolved_event_id().map(str::to_string),
            exit_velocity: hit_reading(EXIT_SPEED_KEY),
            launch_angle: hit_reading(LAUNCH_ANGLE_KEY),
            pitch_velocity: pitch_velocity.map(Reading::new),
            spin_rate: spin_rate.map(Reading::new),
            hit_distance: hit_reading(DISTANCE_KEY),
            hangtime: hit_reading(HANG_TIME_KEY),
        },
        genuine_hit,
        throwback,
    }
}

/// Values the feed uses to mean "no zone speed": null, zero, empty string,
/// false, or an empty container.
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn payload(raw: Value) -> FeedPayload {
        FeedPayload::from_value(raw).unwrap()
    }

    #[test]
    fn decodes_full_payload() {
        let p = payload(json!({
            "event_uuid": "demo-001",
            "pitch_data": {"ZoneSpeedMPH": 44.7, "SpinRateRPM": 1031.4},
            "hit_data": {"ExitSpeedMPH": 87.9, "AngleDegrees": 30.3},
            "contributing_events": ["a", "b"],
            "extra": {"ignored": true}
        }));
        assert_eq!(p.resolved_event_id(), Some("demo-001"));
        assert_eq!(p.contributing().len(), 2);
        assert!(p.pitch_data.is_some());
    }

    #[test]
    fn rejects_non_object_and_mistyped_groups() {
        assert!(FeedPayload::from_value(json!([1, 2])).is_err());
        assert!(FeedPayload::from_value(json!({"pitch_data": "fast"})).is_err());
    }

    #[test]
    fn event_id_falls_back_to_legacy_key() {
        assert_eq!(
            payload(json!({"eventId": "legacy"})).resolved_event_id(),
            Some("legacy")
        );
        assert_eq!(
            payload(json!({"event_uuid": "", "eventId": "legacy"})).resolved_event_id(),
            Some("legacy")
        );
        assert_eq!(payload(json!({})).resolved_event_id(), None);
    }

    #[test]
    fn pitch_velocity_prefers_zone_speed() {
        let c = classify(&payload(json!({
            "pitch_data": {"ZoneSpeedMPH": 88.1, "RelSpeedMPH": 91.0}
        })));
        assert_eq!(c.measurement.pitch_velocity.unwrap().value(), Some(88.1));
    }

    #[test]
    fn pitch_velocity_falls_back_when_zone_speed_blank() {
        for zone in [json!(null), json!(0), json!("")] {
            let c = classify(&payload(json!({
                "pitch_data": {"ZoneSpeedMPH": zone, "RelSpeedMPH": 91.0}
            })));
            assert_eq!(c.measurement.pitch_velocity.unwrap().value(), Some(91.0));
        }
    }

    #[test]
    fn invalid_zone_speed_is_kept_for_the_validity_gate() {
        let c = classify(&payload(json!({
            "pitch_data": {"ZoneSpeedMPH": "NaN", "RelSpeedMPH": 91.0}
        })));
        let reading = c.measurement.pitch_velocity.unwrap();
        assert_eq!(reading.raw(), &json!("NaN"));
        assert_eq!(reading.value(), None);
    }

    #[test]
    fn throwback_drops_every_hit_reading() {
        let c = classify(&payload(json!({
            "event_uuid": "tb",
            "pitch_data": {"ZoneSpeedMPH": 85.0},
            "hit_data": {
                "ExitSpeedMPH": 55.0,
                "AngleDegrees": 15.0,
                "DistanceFeet": 60.0,
                "HangTimeSeconds": 1.2
            }
        })));
        assert!(c.throwback);
        assert!(!c.genuine_hit);
        assert!(c.measurement.exit_velocity.is_none());
        assert!(c.measurement.launch_angle.is_none());
        assert!(c.measurement.hit_distance.is_none());
        assert!(c.measurement.hangtime.is_none());
        assert!(c.measurement.pitch_velocity.is_some());
    }

    #[test]
    fn genuine_hit_carries_hit_readings() {
        let c = classify(&payload(json!({
            "hit_data": {
                "ExitSpeedMPH": 95.9,
                "AngleDegrees": 21.1,
                "DistanceFeet": 321.8,
                "HangTimeSeconds": 3.59
            }
        })));
        assert!(c.genuine_hit);
        assert_eq!(c.measurement.exit_velocity.unwrap().value(), Some(95.9));
        assert_eq!(c.measurement.hit_distance.unwrap().value(), Some(321.8));
        assert_eq!(c.measurement.hangtime.unwrap().value(), Some(3.59));
        assert!(c.measurement.event_id.is_none());
    }

    #[test]
    fn builder_sets_readings() {
        let m = Measurement::for_event("e1").pitch_velocity(90.5).spin_rate("N/A");
        assert_eq!(m.event_id.as_deref(), Some("e1"));
        assert_eq!(m.pitch_velocity.unwrap().value(), Some(90.5));
        assert!(!m.spin_rate.unwrap().is_valid());
    }
}
