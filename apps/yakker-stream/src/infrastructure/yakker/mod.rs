//! Yakker Feed Adapters
//!
//! - **Client**: resilient WebSocket consumer of the live feed
//! - **Demo**: offline replay of recorded payloads
//!
//! Both drive the same ingest pipeline.

pub mod client;
pub mod codec;
pub mod demo;
pub mod heartbeat;
pub mod reconnect;

pub use client::{FeedClientConfig, FeedClientError, YakkerClient};
pub use codec::{CodecError, JsonCodec};
pub use demo::{DEFAULT_DEMO_INTERVAL, DemoFeed, demo_payloads};
pub use heartbeat::{HeartbeatConfig, HeartbeatEvent, HeartbeatManager, HeartbeatState};
pub use reconnect::{DEFAULT_RECONNECT_DELAY, ReconnectConfig, ReconnectPolicy};
