//! Snapshot Writer
//!
//! Periodically renders the latest summary into the `livedata.xml` template
//! and rewrites the output file, for scoreboard software that polls a file
//! rather than an HTTP endpoint.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::domain::aggregator::MetricAggregator;
use crate::domain::metrics::Summary;
use crate::infrastructure::scoreboard::ScoreboardMetrics;

/// Snapshot file errors.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// Template could not be read.
    #[error("failed to read template {path}: {source}")]
    Template {
        /// Template path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Output file could not be written.
    #[error("failed to write {path}: {source}")]
    Write {
        /// Output path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Replace every scoreboard placeholder in `template` with `summary` values.
#[must_use]
pub fn render_template(template: &str, summary: Option<&Summary>) -> String {
    ScoreboardMetrics::from_summary(summary)
        .substitutions()
        .iter()
        .fold(template.to_string(), |acc, (token, value)| {
            acc.replace(token, value)
        })
}

/// Periodic `livedata.xml` writer.
#[derive(Debug)]
pub struct SnapshotWriter {
    aggregator: Arc<MetricAggregator>,
    template: String,
    output_path: PathBuf,
    interval: Duration,
}

impl SnapshotWriter {
    /// Load the template and build a writer.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Template`] if the template cannot be read.
    pub async fn load(
        aggregator: Arc<MetricAggregator>,
        template_path: &Path,
        output_path: PathBuf,
        interval: Duration,
    ) -> Result<Self, SnapshotError> {
        let template = tokio::fs::read_to_string(template_path)
            .await
            .map_err(|source| SnapshotError::Template {
                path: template_path.to_path_buf(),
                source,
            })?;
        tracing::info!(template = %template_path.display(), "Loaded snapshot template");

        Ok(Self {
            aggregator,
            template,
            output_path,
            interval,
        })
    }

    /// Render the current latest summary and write the output file once.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Write`] if the file cannot be written.
    pub async fn write_once(&self) -> Result<(), SnapshotError> {
        let summary = self.aggregator.latest_summary();
        let rendered = render_template(&self.template, summary.as_ref());
        tokio::fs::write(&self.output_path, rendered)
            .await
            .map_err(|source| SnapshotError::Write {
                path: self.output_path.clone(),
                source,
            })
    }

    /// Rewrite the snapshot every interval until cancelled.
    pub async fn run(self, cancel: CancellationToken) {
        tracing::info!(
            path = %self.output_path.display(),
            interval_ms = self.interval.as_millis(),
            "Snapshot writer started"
        );

        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(self.interval) => {}
            }

            if let Err(e) = self.write_once().await {
                tracing::warn!(error = %e, "Snapshot update failed");
            }
        }

        tracing::info!("Snapshot writer stopped");
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::event::Measurement;

    use super::*;

    const TEMPLATE: &str = "<live><ev>XXX-ExitVelo-XXX</ev><la>XXX-LaunchAngle-XXX</la>\
<sr>XXX-SpinRate-XXX</sr><pv>XXX-PitchVelo-XXX</pv><hd>XXX-HitDistance-XXX</hd>\
<ht>XXX-Hangtime-XXX</ht><ev2>XXX-ExitVelo-XXX</ev2></live>";

    #[test]
    fn template_without_summary_gets_placeholders() {
        let rendered = render_template(TEMPLATE, None);
        assert_eq!(
            rendered,
            "<live><ev>-- </ev><la>-- </la><sr>---- </sr><pv>-- </pv><hd>-- </hd>\
<ht>-- </ht><ev2>-- </ev2></live>"
        );
    }

    #[test]
    fn template_replaces_every_occurrence() {
        let summary = Summary {
            exit_velocity_mph: Some(87.9),
            spin_rate_rpm: Some(1031.4),
            ..Summary::default()
        };
        let rendered = render_template(TEMPLATE, Some(&summary));
        assert!(rendered.contains("<ev>87.9</ev>"));
        assert!(rendered.contains("<ev2>87.9</ev2>"));
        assert!(rendered.contains("<sr>1031</sr>"));
        assert!(rendered.contains("<la>-- </la>"));
        assert!(!rendered.contains("XXX-"));
    }

    #[tokio::test]
    async fn missing_template_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = SnapshotWriter::load(
            Arc::new(MetricAggregator::default()),
            &dir.path().join("absent.template"),
            dir.path().join("livedata.xml"),
            Duration::from_secs(1),
        )
        .await;
        assert!(matches!(result, Err(SnapshotError::Template { .. })));
    }

    #[tokio::test]
    async fn writes_latest_summary() {
        let dir = tempfile::tempdir().unwrap();
        let template_path = dir.path().join("livedata.xml.template");
        let output_path = dir.path().join("livedata.xml");
        std::fs::write(&template_path, TEMPLATE).unwrap();

        let aggregator = Arc::new(MetricAggregator::default());
        aggregator.add_measurement(
            Measurement::for_event("demo-002")
                .exit_velocity(95.9)
                .hit_distance(321.8),
        );

        let writer = SnapshotWriter::load(
            aggregator,
            &template_path,
            output_path.clone(),
            Duration::from_secs(1),
        )
        .await
        .unwrap();
        writer.write_once().await.unwrap();

        let written = std::fs::read_to_string(&output_path).unwrap();
        assert!(written.contains("<ev>95.9</ev>"));
        assert!(written.contains("<hd>322</hd>"));
    }

    #[tokio::test]
    async fn unwritable_output_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let template_path = dir.path().join("livedata.xml.template");
        std::fs::write(&template_path, TEMPLATE).unwrap();

        let writer = SnapshotWriter::load(
            Arc::new(MetricAggregator::default()),
            &template_path,
            dir.path().join("missing-dir").join("livedata.xml"),
            Duration::from_secs(1),
        )
        .await
        .unwrap();
        assert!(matches!(
            writer.write_once().await,
            Err(SnapshotError::Write { .. })
        ));
    }

    #[tokio::test]
    async fn run_stops_on_cancel() {
        let dir = tempfile::tempdir().unwrap();
        let template_path = dir.path().join("livedata.xml.template");
        let output_path = dir.path().join("livedata.xml");
        std::fs::write(&template_path, TEMPLATE).unwrap();

        let writer = SnapshotWriter::load(
            Arc::new(MetricAggregator::default()),
            &template_path,
            output_path.clone(),
            Duration::from_millis(10),
        )
        .await
        .unwrap();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(writer.run(cancel.clone()));

        tokio::time::timeout(Duration::from_secs(2), async {
            while !output_path.exists() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
