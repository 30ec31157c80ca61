//! Scoreboard and Health HTTP Server
//!
//! Serves the aggregated metrics to scoreboard software and exposes the
//! usual probe and Prometheus endpoints.
//!
//! # Endpoints
//!
//! - `GET /` - HTML wall view of the rolling summary
//! - `GET /data.xml` - ProScoreboard XML of the rolling summary
//! - `GET /livedata.xml` - the last written snapshot file
//! - `GET /health` - JSON health status
//! - `GET /healthz` - liveness probe (simple OK)
//! - `GET /readyz` - readiness probe (feed connected or demo running)
//! - `GET /metrics` - Prometheus metrics in text format

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use axum::http::header::CONTENT_TYPE;
use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::domain::aggregator::MetricAggregator;
use crate::domain::streaming::{ConnectionState, FeedState};
use crate::infrastructure::metrics::get_metrics_handle;
use crate::infrastructure::scoreboard::ScoreboardMetrics;

// =============================================================================
// Health Response Types
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Overall status.
    pub status: HealthStatus,
    /// Server version.
    pub version: String,
    /// Server uptime in seconds.
    pub uptime_secs: u64,
    /// Current time.
    pub current_time: DateTime<Utc>,
    /// Feed status.
    pub feed: FeedInfo,
    /// Aggregator status.
    pub aggregator: AggregatorInfo,
}

/// Overall health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Feed connected (or demo running).
    Healthy,
    /// Feed is starting or reconnecting.
    Degraded,
}

/// Feed connection status.
#[derive(Debug, Clone, Serialize)]
pub struct FeedInfo {
    /// Connection state.
    pub state: ConnectionState,
    /// Messages received count.
    pub messages_received: u64,
    /// Frames or payloads that could not be used.
    pub malformed_messages: u64,
    /// Reconnect attempts since the last successful connection.
    pub reconnect_attempts: u32,
    /// Last successful connection.
    pub last_connected_at: Option<DateTime<Utc>>,
    /// Reason for the last disconnect.
    pub last_error: Option<String>,
}

/// Aggregator status.
#[derive(Debug, Clone, Serialize)]
pub struct AggregatorInfo {
    /// Event buckets currently retained.
    pub events: usize,
    /// Most recently updated event.
    pub latest_event_id: Option<String>,
}

// =============================================================================
// Server State
// =============================================================================

/// Shared state for the HTTP server.
#[derive(Debug)]
pub struct HttpState {
    version: String,
    started_at: Instant,
    aggregator: Arc<MetricAggregator>,
    feed_state: Arc<FeedState>,
    livedata_path: PathBuf,
}

impl HttpState {
    /// Create new server state.
    #[must_use]
    pub fn new(
        version: String,
        aggregator: Arc<MetricAggregator>,
        feed_state: Arc<FeedState>,
        livedata_path: PathBuf,
    ) -> Self {
        Self {
            version,
            started_at: Instant::now(),
            aggregator,
            feed_state,
            livedata_path,
        }
    }
}

/// Build the application router.
#[must_use]
pub fn router(state: Arc<HttpState>) -> Router {
    Router::new()
        .route("/", get(html_handler))
        .route("/data.xml", get(scoreboard_xml_handler))
        .route("/livedata.xml", get(livedata_handler))
        .route("/health", get(health_handler))
        .route("/healthz", get(liveness_handler))
        .route("/readyz", get(readiness_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

// =============================================================================
// HTTP Server
// =============================================================================

/// Scoreboard HTTP server.
pub struct HttpServer {
    port: u16,
    state: Arc<HttpState>,
    cancel: CancellationToken,
}

impl HttpServer {
    /// Create a new HTTP server.
    #[must_use]
    pub const fn new(port: u16, state: Arc<HttpState>, cancel: CancellationToken) -> Self {
        Self {
            port,
            state,
            cancel,
        }
    }

    /// Run the server until cancelled.
    ///
    /// # Errors
    ///
    /// Returns `HttpServerError` if binding fails or the HTTP server
    /// encounters a fatal error while running.
    pub async fn run(self) -> Result<(), HttpServerError> {
        let app = router(self.state);

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| HttpServerError::BindFailed(self.port, e.to_string()))?;

        tracing::info!(port = self.port, "HTTP server listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(self.cancel.cancelled_owned())
            .await
            .map_err(|e| HttpServerError::ServerFailed(e.to_string()))?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

// =============================================================================
// HTTP Handlers
// =============================================================================

const XML_CONTENT_TYPE: &str = "application/xml";

async fn html_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let summary = state.aggregator.rolling_summary();
    (
        [(CONTENT_TYPE, "text/html; charset=utf-8")],
        ScoreboardMetrics::from_summary(Some(&summary)).to_html(),
    )
}

async fn scoreboard_xml_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let summary = state.aggregator.rolling_summary();
    (
        [(CONTENT_TYPE, XML_CONTENT_TYPE)],
        ScoreboardMetrics::from_summary(Some(&summary)).to_xml(),
    )
}

async fn livedata_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    match tokio::fs::read_to_string(&state.livedata_path).await {
        Ok(body) => (StatusCode::OK, [(CONTENT_TYPE, XML_CONTENT_TYPE)], body),
        Err(e) => {
            tracing::debug!(path = %state.livedata_path.display(), error = %e, "Snapshot unavailable");
            (
                StatusCode::NOT_FOUND,
                [(CONTENT_TYPE, "text/plain; charset=utf-8")],
                "livedata.xml not found".to_string(),
            )
        }
    }
}

async fn health_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    Json(build_health_response(&state))
}

async fn liveness_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn readiness_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    if state.feed_state.state().is_ready() {
        (StatusCode::OK, "READY")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "NOT READY")
    }
}

async fn metrics_handler() -> impl IntoResponse {
    get_metrics_handle().map_or_else(
        || {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                [(CONTENT_TYPE, "text/plain")],
                "Metrics not initialized".to_string(),
            )
        },
        |handle| {
            (
                StatusCode::OK,
                [(CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
                handle.render(),
            )
        },
    )
}

fn build_health_response(state: &HttpState) -> HealthResponse {
    let feed = feed_info(&state.feed_state);
    HealthResponse {
        status: determine_health_status(feed.state),
        version: state.version.clone(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        current_time: Utc::now(),
        feed,
        aggregator: AggregatorInfo {
            events: state.aggregator.event_count(),
            latest_event_id: state.aggregator.latest_event_id(),
        },
    }
}

fn feed_info(feed_state: &FeedState) -> FeedInfo {
    FeedInfo {
        state: feed_state.state(),
        messages_received: feed_state.messages_received(),
        malformed_messages: feed_state.malformed_messages(),
        reconnect_attempts: feed_state.reconnect_attempts(),
        last_connected_at: feed_state.last_connected_at(),
        last_error: feed_state.last_error(),
    }
}

const fn determine_health_status(state: ConnectionState) -> HealthStatus {
    if state.is_ready() {
        HealthStatus::Healthy
    } else {
        HealthStatus::Degraded
    }
}

// =============================================================================
// Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, thiserror::Error)]
pub enum HttpServerError {
    /// Failed to bind to port.
    #[error("failed to bind to port {0}: {1}")]
    BindFailed(u16, String),

    /// Server error.
    #[error("server error: {0}")]
    ServerFailed(String),
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test]
    fn health_status_serialization() {
        assert_eq!(
            serde_json::to_string(&HealthStatus::Healthy).unwrap(),
            "\"healthy\""
        );
        assert_eq!(
            serde_json::to_string(&HealthStatus::Degraded).unwrap(),
            "\"degraded\""
        );
    }

    #[test_case(ConnectionState::Connected => HealthStatus::Healthy ; "connected")]
    #[test_case(ConnectionState::Demo => HealthStatus::Healthy ; "demo")]
    #[test_case(ConnectionState::Starting => HealthStatus::Degraded ; "starting")]
    #[test_case(ConnectionState::Connecting => HealthStatus::Degraded ; "connecting")]
    #[test_case(ConnectionState::Disconnected => HealthStatus::Degraded ; "disconnected")]
    fn status_follows_feed(state: ConnectionState) -> HealthStatus {
        determine_health_status(state)
    }

    #[test]
    fn health_response_reports_feed_counters() {
        let feed_state = Arc::new(FeedState::new());
        feed_state.set_state(ConnectionState::Connecting);
        feed_state.increment_messages();
        feed_state.increment_malformed();
        feed_state.set_disconnected("connection closed".to_string());

        let state = HttpState::new(
            "0.1.0".to_string(),
            Arc::new(MetricAggregator::default()),
            feed_state,
            PathBuf::from("livedata.xml"),
        );
        let response = build_health_response(&state);

        assert_eq!(response.status, HealthStatus::Degraded);
        assert_eq!(response.feed.state, ConnectionState::Disconnected);
        assert_eq!(response.feed.messages_received, 1);
        assert_eq!(response.feed.malformed_messages, 1);
        assert_eq!(response.feed.last_error.as_deref(), Some("connection closed"));
        assert_eq!(response.aggregator.events, 0);
    }
}
