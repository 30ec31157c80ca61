//! Scoreboard Rendering
//!
//! Formats a [`Summary`] for the ProScoreboard Datalink surfaces: the
//! `<scoreboard>` XML document, the HTML wall view, and the placeholder
//! substitutions used by the snapshot file.
//!
//! Scoreboards show a placeholder instead of `0`, so a zero reading and a
//! missing one render the same.

use crate::domain::metrics::{Metric, Summary};

/// Placeholder for a missing metric.
pub const EMPTY_PLACEHOLDER: &str = "-- ";

/// Placeholder for a missing spin rate (four digits wide).
pub const EMPTY_SPIN_PLACEHOLDER: &str = "---- ";

/// Scoreboard sport mode sent with every document.
pub const SPORT_MODE: &str = "Custom";

/// Format one value, rendering `None` or zero as `placeholder`.
#[must_use]
pub fn format_metric(value: Option<f64>, decimals: usize, placeholder: &str) -> String {
    match value {
        Some(v) if v != 0.0 => format!("{v:.decimals$}"),
        _ => placeholder.to_string(),
    }
}

/// Display decimals for each metric.
#[must_use]
pub const fn metric_decimals(metric: Metric) -> usize {
    match metric {
        Metric::SpinRate | Metric::HitDistance => 0,
        Metric::ExitVelocity
        | Metric::LaunchAngle
        | Metric::PitchVelocity
        | Metric::Hangtime => 1,
    }
}

/// One summary, formatted for scoreboard output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreboardMetrics {
    /// Exit velocity (mph).
    pub exit_velo: String,
    /// Launch angle (degrees).
    pub launch_angle: String,
    /// Spin rate (rpm).
    pub spin_rate: String,
    /// Pitch velocity (mph).
    pub pitch_velo: String,
    /// Hit distance (ft).
    pub hit_distance: String,
    /// Hang time (s).
    pub hangtime: String,
}

impl ScoreboardMetrics {
    /// Format a summary; `None` renders every field as a placeholder.
    #[must_use]
    pub fn from_summary(summary: Option<&Summary>) -> Self {
        let field = |metric: Metric| {
            let placeholder = if metric == Metric::SpinRate {
                EMPTY_SPIN_PLACEHOLDER
            } else {
                EMPTY_PLACEHOLDER
            };
            format_metric(
                summary.and_then(|s| s.get(metric)),
                metric_decimals(metric),
                placeholder,
            )
        };

        Self {
            exit_velo: field(Metric::ExitVelocity),
            launch_angle: field(Metric::LaunchAngle),
            spin_rate: field(Metric::SpinRate),
            pitch_velo: field(Metric::PitchVelocity),
            hit_distance: field(Metric::HitDistance),
            hangtime: field(Metric::Hangtime),
        }
    }

    /// Template placeholder tokens paired with their replacement.
    #[must_use]
    pub fn substitutions(&self) -> [(&'static str, &str); 6] {
        [
            ("XXX-ExitVelo-XXX", &self.exit_velo),
            ("XXX-LaunchAngle-XXX", &self.launch_angle),
            ("XXX-SpinRate-XXX", &self.spin_rate),
            ("XXX-PitchVelo-XXX", &self.pitch_velo),
            ("XXX-HitDistance-XXX", &self.hit_distance),
            ("XXX-Hangtime-XXX", &self.hangtime),
        ]
    }

    /// Render the ProScoreboard `<scoreboard>` document.
    #[must_use]
    pub fn to_xml(&self) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<scoreboard>
    <sportMode>{SPORT_MODE}</sportMode>
    <ExitVelo>{}</ExitVelo>
    <LaunchAngle>{}</LaunchAngle>
    <SpinRate>{}</SpinRate>
    <PitchVelo>{}</PitchVelo>
    <HitDistance>{}</HitDistance>
    <Hangtime>{}</Hangtime>
</scoreboard>"#,
            self.exit_velo,
            self.launch_angle,
            self.spin_rate,
            self.pitch_velo,
            self.hit_distance,
            self.hangtime,
        )
    }

    /// Render the self-refreshing HTML wall view.
    #[must_use]
    pub fn to_html(&self) -> String {
        let rows = [
            ("Exit Velocity", &self.exit_velo, " mph"),
            ("Launch Angle", &self.launch_angle, "\u{b0}"),
            ("Spin Rate", &self.spin_rate, " rpm"),
            ("Pitch Velocity", &self.pitch_velo, " mph"),
            ("Hit Distance", &self.hit_distance, " ft"),
            ("Hang Time", &self.hangtime, " sec"),
        ]
        .iter()
        .map(|(label, value, unit)| {
            format!(
                r#"        <div class="metric">
            <span class="metric-label">{label}:</span>
            <span class="metric-value">{value}{unit}</span>
        </div>
"#
            )
        })
        .collect::<String>();

        format!("{HTML_HEAD}{rows}{HTML_TAIL}")
    }
}

const HTML_HEAD: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <meta http-equiv="refresh" content="1">
    <title>Yakker Stream - Live Data</title>
    <style>
        body { background-color: #000000; color: #ffffff; font-family: 'Courier New', Courier, monospace; padding: 40px; margin: 0; }
        .container { max-width: 800px; margin: 0 auto; }
        h1 { font-size: 36px; margin-bottom: 40px; text-align: center; }
        .metric { font-size: 28px; margin: 20px 0; padding: 15px; border: 2px solid #ffffff; }
        .metric-label { display: inline-block; width: 250px; }
        .metric-value { display: inline-block; font-weight: bold; font-size: 32px; }
    </style>
</head>
<body>
    <div class="container">
        <h1>YAKKER STREAM - LIVE DATA</h1>
"#;

const HTML_TAIL: &str = "    </div>
</body>
</html>";

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case(None, 1, EMPTY_PLACEHOLDER => "-- " ; "missing")]
    #[test_case(Some(0.0), 1, EMPTY_PLACEHOLDER => "-- " ; "zero")]
    #[test_case(Some(0.0), 0, EMPTY_SPIN_PLACEHOLDER => "---- " ; "zero spin")]
    #[test_case(Some(87.94), 1, EMPTY_PLACEHOLDER => "87.9" ; "one decimal")]
    #[test_case(Some(1073.3), 0, EMPTY_SPIN_PLACEHOLDER => "1073" ; "no decimals")]
    #[test_case(Some(-2.5), 1, EMPTY_PLACEHOLDER => "-2.5" ; "negative angle")]
    fn formats_metric(value: Option<f64>, decimals: usize, placeholder: &str) -> String {
        format_metric(value, decimals, placeholder)
    }

    fn sample() -> Summary {
        Summary {
            event_id: Some("demo-002".to_string()),
            exit_velocity_mph: Some(95.9),
            launch_angle_deg: Some(21.1),
            pitch_velocity_mph: Some(45.8),
            spin_rate_rpm: Some(1123.6),
            hit_distance_ft: Some(321.8),
            hangtime_sec: Some(3.59),
            updated_at: None,
        }
    }

    #[test]
    fn formats_full_summary() {
        let metrics = ScoreboardMetrics::from_summary(Some(&sample()));
        assert_eq!(metrics.exit_velo, "95.9");
        assert_eq!(metrics.spin_rate, "1124");
        assert_eq!(metrics.hit_distance, "322");
        assert_eq!(metrics.hangtime, "3.6");
    }

    #[test]
    fn absent_summary_renders_placeholders() {
        let metrics = ScoreboardMetrics::from_summary(None);
        assert_eq!(metrics.exit_velo, "-- ");
        assert_eq!(metrics.spin_rate, "---- ");
        assert_eq!(metrics.hangtime, "-- ");
    }

    #[test]
    fn xml_document_shape() {
        let xml = ScoreboardMetrics::from_summary(Some(&sample())).to_xml();
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains("<sportMode>Custom</sportMode>"));
        assert!(xml.contains("<ExitVelo>95.9</ExitVelo>"));
        assert!(xml.contains("<SpinRate>1124</SpinRate>"));
        assert!(xml.ends_with("</scoreboard>"));
    }

    #[test]
    fn html_view_refreshes_and_shows_units() {
        let html = ScoreboardMetrics::from_summary(Some(&sample())).to_html();
        assert!(html.contains(r#"<meta http-equiv="refresh" content="1">"#));
        assert!(html.contains("95.9 mph"));
        assert!(html.contains("21.1\u{b0}"));
        assert!(html.contains("3.6 sec"));
        assert!(html.ends_with("</html>"));
    }
}
