//! Feed Connection State
//!
//! Connection lifecycle and counters for the upstream feed, written by the
//! feed tasks and read by health endpoints and the terminal dashboard.

use std::fmt;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;

/// Where the feed is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// Process started, no feed task has run yet.
    Starting,
    /// Opening the WebSocket.
    Connecting,
    /// Receiving from the live feed.
    Connected,
    /// Connection lost; waiting to retry.
    Disconnected,
    /// Replaying the built-in demo payloads.
    Demo,
}

impl ConnectionState {
    /// Lowercase label used in logs, JSON, and the dashboard header.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::Demo => "demo",
        }
    }

    /// Whether payloads are flowing into the aggregator.
    #[must_use]
    pub const fn is_ready(self) -> bool {
        matches!(self, Self::Connected | Self::Demo)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared feed status.
#[derive(Debug)]
pub struct FeedState {
    state: RwLock<ConnectionState>,
    last_connected_at: RwLock<Option<DateTime<Utc>>>,
    last_error: RwLock<Option<String>>,
    messages_received: AtomicU64,
    malformed_messages: AtomicU64,
    reconnect_attempts: AtomicU32,
}

impl FeedState {
    /// Create a feed state in `Starting`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: RwLock::new(ConnectionState::Starting),
            last_connected_at: RwLock::new(None),
            last_error: RwLock::new(None),
            messages_received: AtomicU64::new(0),
            malformed_messages: AtomicU64::new(0),
            reconnect_attempts: AtomicU32::new(0),
        }
    }

    /// Set the connection state.
    ///
    /// Entering `Connected` records the time, clears the last error, and
    /// resets the reconnect counter.
    pub fn set_state(&self, state: ConnectionState) {
        *self.state.write() = state;
        if state == ConnectionState::Connected {
            *self.last_connected_at.write() = Some(Utc::now());
            *self.last_error.write() = None;
            self.reconnect_attempts.store(0, Ordering::Relaxed);
        }
    }

    /// Mark the feed disconnected with a reason.
    pub fn set_disconnected(&self, reason: impl Into<String>) {
        *self.state.write() = ConnectionState::Disconnected;
        *self.last_error.write() = Some(reason.into());
    }

    /// Count a received frame.
    pub fn increment_messages(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a frame that could not be decoded or ingested.
    pub fn increment_malformed(&self) {
        self.malformed_messages.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a reconnect attempt.
    pub fn increment_reconnect_attempts(&self) {
        self.reconnect_attempts.fetch_add(1, Ordering::Relaxed);
    }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// Time of the last successful connect.
    #[must_use]
    pub fn last_connected_at(&self) -> Option<DateTime<Utc>> {
        *self.last_connected_at.read()
    }

    /// Reason for the last disconnect.
    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().clone()
    }

    /// Frames received.
    #[must_use]
    pub fn messages_received(&self) -> u64 {
        self.messages_received.load(Ordering::Relaxed)
    }

    /// Frames skipped as malformed.
    #[must_use]
    pub fn malformed_messages(&self) -> u64 {
        self.malformed_messages.load(Ordering::Relaxed)
    }

    /// Reconnect attempts since the last successful connect.
    #[must_use]
    pub fn reconnect_attempts(&self) -> u32 {
        self.reconnect_attempts.load(Ordering::Relaxed)
    }
}

impl Default for FeedState {
    fn default() -> Self {
        Self::new()
    }
}
