//! Validity Classifier
//!
//! Pure functions that decide whether a raw feed reading is usable and
//! whether a batted-ball observation is a genuine hit or feed noise.
//!
//! # Noise patterns
//!
//! - **Placeholders**: the feed fills missing numbers with strings such as
//!   `"N/A"` or `"NaN"`. These are never converted to numbers.
//! - **Throwbacks**: the catcher's return throw to the mound is picked up by
//!   the hit sensor as a soft, shallow "hit" (under 60 mph, 10° to 20°).
//! - **Lone hit records**: the feed merges pitch and hit telemetry into one
//!   record for genuine contact, so a hit-only record with no bat-speed and
//!   no pitch corroboration needs at least two contributing events.

use serde_json::{Map, Value};

// =============================================================================
// Feed Keys
// =============================================================================

/// Pitch zone speed key.
pub const ZONE_SPEED_KEY: &str = "ZoneSpeedMPH";
/// Pitch release-relative speed key.
pub const REL_SPEED_KEY: &str = "RelSpeedMPH";
/// Pitch spin rate key.
pub const SPIN_RATE_KEY: &str = "SpinRateRPM";
/// Pitch metrics that corroborate a plate appearance.
pub const PITCH_METRIC_KEYS: [&str; 3] = [ZONE_SPEED_KEY, REL_SPEED_KEY, SPIN_RATE_KEY];

/// Hit exit speed key.
pub const EXIT_SPEED_KEY: &str = "ExitSpeedMPH";
/// Hit launch angle key.
pub const LAUNCH_ANGLE_KEY: &str = "AngleDegrees";
/// Hit distance key.
pub const DISTANCE_KEY: &str = "DistanceFeet";
/// Hit hang time key.
pub const HANG_TIME_KEY: &str = "HangTimeSeconds";

// =============================================================================
// Thresholds
// =============================================================================

/// Exit speeds strictly below this may be a throwback.
pub const THROWBACK_MAX_EXIT_VELO: f64 = 60.0;
/// Lower bound (inclusive) of the throwback launch-angle band.
pub const THROWBACK_MIN_ANGLE_DEG: f64 = 10.0;
/// Upper bound (inclusive) of the throwback launch-angle band.
pub const THROWBACK_MAX_ANGLE_DEG: f64 = 20.0;
/// Contributing events required to accept an uncorroborated hit record.
pub const MIN_CONTRIBUTING_EVENTS_FOR_HIT: usize = 2;

const PLACEHOLDERS: [&str; 3] = ["n/a", "na", "nan"];

/// A measurement group (`pitch_data` or `hit_data`) as sent by the feed.
pub type Observation = Map<String, Value>;

// =============================================================================
// Reading
// =============================================================================

/// A raw scalar reading exactly as the feed sent it.
///
/// Only [`Reading::value`] turns it into a number, and only when the reading
/// passes [`is_valid_reading`].
#[derive(Debug, Clone, PartialEq)]
pub struct Reading(Value);

impl Reading {
    /// Wrap a raw JSON value.
    #[must_use]
    pub const fn new(raw: Value) -> Self {
        Self(raw)
    }

    /// The raw value.
    #[must_use]
    pub const fn raw(&self) -> &Value {
        &self.0
    }

    /// Numeric value, or `None` when the reading is not valid.
    #[must_use]
    pub fn value(&self) -> Option<f64> {
        reading_value(Some(&self.0))
    }

    /// Whether the reading passes the validity gate.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.value().is_some()
    }
}

impl From<Value> for Reading {
    fn from(raw: Value) -> Self {
        Self(raw)
    }
}

impl From<f64> for Reading {
    fn from(value: f64) -> Self {
        // Non-finite floats have no JSON form and map to null.
        Self(Value::from(value))
    }
}

impl From<&str> for Reading {
    fn from(value: &str) -> Self {
        Self(Value::String(value.to_string()))
    }
}

// =============================================================================
// Validity Gate
// =============================================================================

/// Parse a raw reading into a finite number.
///
/// Returns `None` for absent or null values, placeholder strings (`"n/a"`,
/// `"na"`, `"nan"`, any case), booleans, arrays, objects, strings that do not
/// parse as a number, and non-finite results.
#[must_use]
pub fn reading_value(raw: Option<&Value>) -> Option<f64> {
    let parsed = match raw? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let lowered = s.to_lowercase();
            if PLACEHOLDERS.contains(&lowered.as_str()) {
                return None;
            }
            s.trim().parse::<f64>().ok()
        }
        Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_) => None,
    }?;
    parsed.is_finite().then_some(parsed)
}

/// Whether a raw reading is usable as a number.
#[must_use]
pub fn is_valid_reading(raw: Option<&Value>) -> bool {
    reading_value(raw).is_some()
}

// =============================================================================
// Hit Classification
// =============================================================================

/// Whether a hit observation matches a catcher's throwback to the mound.
///
/// Both exit speed and launch angle must be valid numbers; exit speed strictly
/// below 60 mph and launch angle within 10° to 20° inclusive.
#[must_use]
pub fn is_throwback(hit: &Observation) -> bool {
    let (Some(exit_velocity), Some(launch_angle)) = (
        reading_value(hit.get(EXIT_SPEED_KEY)),
        reading_value(hit.get(LAUNCH_ANGLE_KEY)),
    ) else {
        return false;
    };

    exit_velocity < THROWBACK_MAX_EXIT_VELO
        && (THROWBACK_MIN_ANGLE_DEG..=THROWBACK_MAX_ANGLE_DEG).contains(&launch_angle)
}

/// Whether a payload's hit observation describes genuine bat contact.
///
/// Ordered decision chain:
/// 1. no (or empty) hit observation: not a hit
/// 2. throwback pattern: not a hit
/// 3. valid exit speed: hit (the bat sensor is self-certifying)
/// 4. any valid pitch metric on the same payload: hit
/// 5. otherwise a hit only with at least two contributing events
#[must_use]
pub fn is_genuine_hit<S: AsRef<str>>(
    hit: Option<&Observation>,
    pitch: Option<&Observation>,
    contributing_events: &[S],
) -> bool {
    let Some(hit) = hit.filter(|h| !h.is_empty()) else {
        return false;
    };
    if is_throwback(hit) {
        return false;
    }
    if is_valid_reading(hit.get(EXIT_SPEED_KEY)) {
        return true;
    }

    let corroborated = pitch.is_some_and(|p| {
        PITCH_METRIC_KEYS
            .iter()
            .any(|key| is_valid_reading(p.get(*key)))
    });
    if corroborated {
        return true;
    }

    contributing_events.len() >= MIN_CONTRIBUTING_EVENTS_FOR_HIT
}
