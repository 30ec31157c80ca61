//! Heartbeat Manager
//!
//! Keeps the feed socket honest with periodic pings. A ping that sees no
//! inbound traffic (pong or otherwise) within the timeout ends the
//! connection so the client reconnects.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Configuration for heartbeat behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatConfig {
    /// Interval between ping messages.
    pub ping_interval: Duration,
    /// How long to wait for traffic after a ping.
    pub pong_timeout: Duration,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            ping_interval: Duration::from_secs(30),
            pong_timeout: Duration::from_secs(15),
        }
    }
}

impl HeartbeatConfig {
    /// Create a new configuration with custom values.
    #[must_use]
    pub const fn new(ping_interval: Duration, pong_timeout: Duration) -> Self {
        Self {
            ping_interval,
            pong_timeout,
        }
    }
}

/// Events emitted by the heartbeat manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatEvent {
    /// Send a ping frame.
    SendPing,
    /// No traffic since the last ping; drop the connection.
    Timeout,
}

/// State shared between the heartbeat manager and the socket reader.
#[derive(Debug)]
pub struct HeartbeatState {
    last_traffic: RwLock<Instant>,
    waiting_for_pong: AtomicBool,
}

impl Default for HeartbeatState {
    fn default() -> Self {
        Self::new()
    }
}

impl HeartbeatState {
    /// Create new heartbeat state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            last_traffic: RwLock::new(Instant::now()),
            waiting_for_pong: AtomicBool::new(false),
        }
    }

    /// Record inbound traffic. Any frame proves the socket is alive.
    pub fn record_traffic(&self) {
        *self.last_traffic.write() = Instant::now();
        self.waiting_for_pong.store(false, Ordering::SeqCst);
    }

    /// Mark that a ping is outstanding.
    pub fn mark_ping_sent(&self) {
        self.waiting_for_pong.store(true, Ordering::SeqCst);
    }

    /// Whether a ping is outstanding.
    #[must_use]
    pub fn is_waiting_for_pong(&self) -> bool {
        self.waiting_for_pong.load(Ordering::SeqCst)
    }

    /// Time since the last inbound frame.
    #[must_use]
    pub fn time_since_traffic(&self) -> Duration {
        self.last_traffic.read().elapsed()
    }
}

/// Drives pings and detects dead connections.
///
/// Emits [`HeartbeatEvent::SendPing`] every ping interval. After each ping
/// it arms a deadline of one pong timeout; if the deadline passes with the
/// ping still outstanding it emits [`HeartbeatEvent::Timeout`] and exits.
pub struct HeartbeatManager {
    config: HeartbeatConfig,
    state: Arc<HeartbeatState>,
    event_tx: mpsc::Sender<HeartbeatEvent>,
    cancel: CancellationToken,
}

impl HeartbeatManager {
    /// Create a new heartbeat manager.
    #[must_use]
    pub const fn new(
        config: HeartbeatConfig,
        state: Arc<HeartbeatState>,
        event_tx: mpsc::Sender<HeartbeatEvent>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            config,
            state,
            event_tx,
            cancel,
        }
    }

    /// Run until cancelled, the event channel closes, or a timeout fires.
    pub async fn run(self) {
        let defaults = HeartbeatConfig::default();
        let period = if self.config.ping_interval.is_zero() {
            tracing::warn!("Zero ping interval, using default");
            defaults.ping_interval
        } else {
            self.config.ping_interval
        };
        let pong_timeout = if self.config.pong_timeout.is_zero() {
            defaults.pong_timeout
        } else {
            self.config.pong_timeout
        };
        let start = tokio::time::Instant::now() + period;
        let mut interval = tokio::time::interval_at(start, period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut deadline: Option<tokio::time::Instant> = None;

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => {
                    tracing::debug!("Heartbeat manager cancelled");
                    break;
                }
                () = sleep_until_deadline(deadline) => {
                    deadline = None;
                    if self.state.is_waiting_for_pong() {
                        tracing::warn!(
                            silent_secs = self.state.time_since_traffic().as_secs(),
                            timeout_secs = pong_timeout.as_secs(),
                            "Heartbeat timeout detected"
                        );
                        let _ = self.event_tx.send(HeartbeatEvent::Timeout).await;
                        break;
                    }
                }
                _ = interval.tick() => {
                    if self.event_tx.send(HeartbeatEvent::SendPing).await.is_err() {
                        tracing::debug!("Event channel closed, stopping heartbeat");
                        break;
                    }
                    if deadline.is_none() {
                        deadline = Some(tokio::time::Instant::now() + pong_timeout);
                    }
                }
            }
        }
    }
}

async fn sleep_until_deadline(deadline: Option<tokio::time::Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
