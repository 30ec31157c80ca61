#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::items_after_statements
    )
)]

//! Yakker Stream - Live Pitch and Batted-Ball Metrics
//!
//! Holds one connection to the Yakker WebSocket feed, filters out
//! throwbacks and invalid readings, and keeps a per-metric view of the
//! latest good values for scoreboard outputs.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: readings, classification, and the metric aggregator
//!   - `validity`: reading validity, throwback and genuine-hit rules
//!   - `event`: payload decoding and classification into measurements
//!   - `aggregator`: event buckets, latest-metrics table, rolling window
//!   - `streaming`: feed connection status
//!
//! - **Application**: use cases and port definitions
//!   - `ports`: payload hook interface
//!   - `services`: ingest pipeline, raw payload store
//!
//! - **Infrastructure**: adapters and external integrations
//!   - `yakker`: WebSocket client and demo feed
//!   - `http`: scoreboard XML/HTML and health endpoints
//!   - `snapshot`: periodic `livedata.xml` writer
//!   - `terminal`: full-screen dashboard
//!   - `config`, `metrics`, `telemetry`, `runtime`
//!
//! # Data Flow
//!
//! ```text
//!                                            ┌──► HTTP (/data.xml, /)
//! Yakker WS ──┐     ┌────────┐   ┌─────────┐ │
//!             ├────►│ Ingest │──►│Aggregator├─┼──► livedata.xml
//! Demo feed ──┘     └───┬────┘   └─────────┘ │
//!                       │                    └──► Terminal dashboard
//!                       └──► payload hooks (raw store)
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Core metric types with no I/O.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::aggregator::{AggregatorConfig, EventBucket, MetricAggregator};
pub use domain::clock::{Clock, ManualClock, SystemClock};
pub use domain::event::{Classification, FeedPayload, Measurement, classify};
pub use domain::metrics::{Metric, MetricEntry, MetricSample, Summary};
pub use domain::streaming::{ConnectionState, FeedState};
pub use domain::validity::{Reading, is_genuine_hit, is_throwback, is_valid_reading};

// Application
pub use application::ports::{HookError, NoOpPayloadHook, PayloadHook};
pub use application::services::{IngestError, IngestPipeline, RawPayloadStore};

// Infrastructure config
pub use infrastructure::config::{ConfigError, FeedSettings, OutputSettings, StreamConfig};

// HTTP server
pub use infrastructure::http::{HttpServer, HttpServerError, HttpState, router};

// Feed adapters
pub use infrastructure::yakker::{DemoFeed, FeedClientConfig, FeedClientError, YakkerClient};

// Metrics
pub use infrastructure::metrics::init_metrics;

// Telemetry
pub use infrastructure::telemetry::{TelemetryConfig, TelemetryGuard, init as init_telemetry};
