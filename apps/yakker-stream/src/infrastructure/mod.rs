//! Infrastructure Layer - Adapters and external integrations.
//!
//! Feed adapters on the inbound side; HTTP, snapshot file, and terminal
//! consumers on the outbound side.

/// Configuration loaded from the environment.
pub mod config;

/// Scoreboard and health HTTP endpoints.
pub mod http;

/// Prometheus metrics instrumentation.
pub mod metrics;

/// Startup wiring shared by the binaries.
pub mod runtime;

/// ProScoreboard formatting.
pub mod scoreboard;

/// Periodic `livedata.xml` writer.
pub mod snapshot;

/// Tracing and optional OpenTelemetry export.
pub mod telemetry;

/// Full-screen terminal dashboard.
pub mod terminal;

/// Yakker WebSocket client and demo feed.
pub mod yakker;
