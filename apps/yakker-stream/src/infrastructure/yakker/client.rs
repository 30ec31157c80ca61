//! Yakker WebSocket Client
//!
//! Holds one connection to the Yakker feed and hands every decoded payload
//! to the ingest pipeline.
//!
//! # Lifecycle
//!
//! `Connecting` → `Connected` → `Disconnected` → (fixed delay) → `Connecting`
//!
//! Any failure (connect refused, auth rejected, close frame, transport
//! error, end of stream, heartbeat timeout) takes the same path: mark the
//! feed disconnected, wait the reconnect delay, try again. Only the
//! cancellation token ends the loop.
//!
//! # Protocol
//!
//! One JSON payload per text frame. An undecodable frame is logged and
//! skipped; the connection stays up.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_util::sync::CancellationToken;

use super::codec::{CodecError, JsonCodec};
use super::heartbeat::{HeartbeatConfig, HeartbeatEvent, HeartbeatManager, HeartbeatState};
use super::reconnect::{ReconnectConfig, ReconnectPolicy};
use crate::application::services::IngestPipeline;
use crate::domain::streaming::{ConnectionState, FeedState};
use crate::infrastructure::metrics::{self, MalformedStage};

// =============================================================================
// Error Type
// =============================================================================

/// Errors that end one connection attempt.
#[derive(Debug, thiserror::Error)]
pub enum FeedClientError {
    /// The URL or auth header cannot form a handshake request.
    #[error("invalid handshake request: {0}")]
    InvalidRequest(String),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    /// Server closed the connection or the stream ended.
    #[error("connection closed")]
    ConnectionClosed,

    /// No traffic arrived after a ping.
    #[error("heartbeat timeout")]
    HeartbeatTimeout,
}

// =============================================================================
// Client Configuration
// =============================================================================

/// Configuration for the feed client.
#[derive(Debug, Clone)]
pub struct FeedClientConfig {
    /// WebSocket URL.
    pub url: String,
    /// `Authorization` header value, already stripped of any header name.
    pub auth: Option<String>,
    /// Reconnection configuration.
    pub reconnect: ReconnectConfig,
    /// Heartbeat configuration.
    pub heartbeat: HeartbeatConfig,
}

impl FeedClientConfig {
    /// Create a configuration with default reconnect and heartbeat timing.
    #[must_use]
    pub fn new(url: impl Into<String>, auth: Option<String>) -> Self {
        Self {
            url: url.into(),
            auth,
            reconnect: ReconnectConfig::default(),
            heartbeat: HeartbeatConfig::default(),
        }
    }
}

// =============================================================================
// Client
// =============================================================================

/// Resilient Yakker feed consumer.
pub struct YakkerClient {
    config: FeedClientConfig,
    codec: JsonCodec,
    pipeline: Arc<IngestPipeline>,
    feed_state: Arc<FeedState>,
    cancel: CancellationToken,
}

impl YakkerClient {
    /// Create a new feed client.
    #[must_use]
    pub const fn new(
        config: FeedClientConfig,
        pipeline: Arc<IngestPipeline>,
        feed_state: Arc<FeedState>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            config,
            codec: JsonCodec::new(),
            pipeline,
            feed_state,
            cancel,
        }
    }

    /// Run the connection loop until cancelled.
    pub async fn run(self: Arc<Self>) {
        let mut reconnect_policy = ReconnectPolicy::new(self.config.reconnect);

        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            self.feed_state.set_state(ConnectionState::Connecting);
            match self.connect_and_run(&mut reconnect_policy).await {
                Ok(()) => break,
                Err(e) => {
                    tracing::warn!(error = %e, "Yakker connection lost");
                    self.feed_state.set_disconnected(e.to_string());
                    metrics::set_feed_connected(false);
                }
            }

            let delay = reconnect_policy.next_delay();
            self.feed_state.increment_reconnect_attempts();
            metrics::record_reconnect();
            tracing::info!(
                attempt = reconnect_policy.attempt_count(),
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "Reconnecting to Yakker feed"
            );

            tokio::select! {
                () = self.cancel.cancelled() => break,
                () = tokio::time::sleep(delay) => {}
            }
        }

        metrics::set_feed_connected(false);
        tracing::info!("Yakker client stopped");
    }

    /// Connect and read frames until an error or cancellation.
    ///
    /// Returns `Ok(())` only when cancelled.
    async fn connect_and_run(
        &self,
        reconnect_policy: &mut ReconnectPolicy,
    ) -> Result<(), FeedClientError> {
        tracing::info!(url = %self.config.url, "Connecting to Yakker feed");

        let request = self.handshake_request()?;
        let (ws_stream, _response) = tokio::select! {
            () = self.cancel.cancelled() => return Ok(()),
            connected = tokio_tungstenite::connect_async(request) => connected?,
        };

        self.feed_state.set_state(ConnectionState::Connected);
        metrics::set_feed_connected(true);
        reconnect_policy.reset();
        tracing::info!(url = %self.config.url, "Connected to Yakker feed");

        let (mut write, mut read) = ws_stream.split();

        let heartbeat_state = Arc::new(HeartbeatState::new());
        let (heartbeat_tx, mut heartbeat_rx) = mpsc::channel::<HeartbeatEvent>(10);
        let heartbeat_cancel = self.cancel.child_token();
        let _heartbeat_guard = heartbeat_cancel.clone().drop_guard();
        tokio::spawn(
            HeartbeatManager::new(
                self.config.heartbeat,
                heartbeat_state.clone(),
                heartbeat_tx,
                heartbeat_cancel,
            )
            .run(),
        );

        let mut heartbeat_closed = false;
        loop {
            tokio::select! {
                () = self.cancel.cancelled() => return Ok(()),
                heartbeat_event = heartbeat_rx.recv(), if !heartbeat_closed => {
                    match heartbeat_event {
                        Some(HeartbeatEvent::SendPing) => {
                            heartbeat_state.mark_ping_sent();
                            write.send(Message::Ping(Vec::new().into())).await?;
                        }
                        Some(HeartbeatEvent::Timeout) => {
                            return Err(FeedClientError::HeartbeatTimeout);
                        }
                        None => {
                            tracing::warn!("Heartbeat channel closed, pings disabled");
                            heartbeat_closed = true;
                        }
                    }
                }
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            heartbeat_state.record_traffic();
                            self.handle_text_frame(&text).await;
                        }
                        Some(Ok(Message::Ping(data))) => {
                            heartbeat_state.record_traffic();
                            write.send(Message::Pong(data)).await?;
                        }
                        Some(Ok(Message::Close(frame))) => {
                            tracing::info!(frame = ?frame, "Server sent close frame");
                            return Err(FeedClientError::ConnectionClosed);
                        }
                        Some(Ok(_)) => {
                            // Pong and binary frames only prove liveness.
                            heartbeat_state.record_traffic();
                        }
                        Some(Err(e)) => return Err(e.into()),
                        None => {
                            tracing::info!("WebSocket stream ended");
                            return Err(FeedClientError::ConnectionClosed);
                        }
                    }
                }
            }
        }
    }

    fn handshake_request(
        &self,
    ) -> Result<tungstenite::handshake::client::Request, FeedClientError> {
        let mut request = self
            .config
            .url
            .as_str()
            .into_client_request()
            .map_err(|e| FeedClientError::InvalidRequest(e.to_string()))?;

        if let Some(auth) = self.config.auth.as_deref() {
            let value = HeaderValue::from_str(auth)
                .map_err(|e| FeedClientError::InvalidRequest(format!("auth header: {e}")))?;
            request.headers_mut().insert(AUTHORIZATION, value);
        }
        Ok(request)
    }

    async fn handle_text_frame(&self, text: &str) {
        self.feed_state.increment_messages();

        let raw = match self.codec.decode(text) {
            Ok(raw) => raw,
            Err(e) => {
                self.record_bad_frame(&e);
                return;
            }
        };

        if let Err(e) = self.pipeline.ingest(raw).await {
            self.feed_state.increment_malformed();
            tracing::warn!(error = %e, "Bad payload");
        }
    }

    fn record_bad_frame(&self, error: &CodecError) {
        self.feed_state.increment_malformed();
        metrics::record_payload_malformed(MalformedStage::Decode);
        tracing::warn!(error = %error, "Bad payload");
    }
}

impl std::fmt::Debug for YakkerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YakkerClient")
            .field("url", &self.config.url)
            .field("auth", &self.config.auth.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregator::MetricAggregator;

    fn client(config: FeedClientConfig) -> YakkerClient {
        YakkerClient::new(
            config,
            Arc::new(IngestPipeline::new(Arc::new(MetricAggregator::default()))),
            Arc::new(FeedState::new()),
            CancellationToken::new(),
        )
    }

    #[test]
    fn handshake_carries_auth_header() {
        let client = client(FeedClientConfig::new(
            "wss://feed.example.com/stream",
            Some("Basic dXNlcjpwYXNz".to_string()),
        ));
        let request = client.handshake_request().unwrap();
        assert_eq!(
            request.headers().get(AUTHORIZATION).unwrap(),
            "Basic dXNlcjpwYXNz"
        );
    }

    #[test]
    fn handshake_without_auth() {
        let client = client(FeedClientConfig::new("ws://127.0.0.1:9/feed", None));
        let request = client.handshake_request().unwrap();
        assert!(request.headers().get(AUTHORIZATION).is_none());
    }

    #[test]
    fn invalid_url_is_rejected() {
        let client = client(FeedClientConfig::new("not a url", None));
        assert!(matches!(
            client.handshake_request(),
            Err(FeedClientError::InvalidRequest(_))
        ));
    }

    #[test]
    fn debug_redacts_auth() {
        let client = client(FeedClientConfig::new(
            "wss://feed.example.com",
            Some("Basic secret".to_string()),
        ));
        let rendered = format!("{client:?}");
        assert!(!rendered.contains("secret"));
    }

    #[tokio::test]
    async fn cancelled_client_returns_immediately() {
        let client = Arc::new(client(FeedClientConfig::new("ws://127.0.0.1:9/feed", None)));
        client.cancel.cancel();
        tokio::time::timeout(std::time::Duration::from_secs(1), client.run())
            .await
            .unwrap();
    }
}
