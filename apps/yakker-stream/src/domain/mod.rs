//! Domain Layer - Metric reconciliation and feed state.
//!
//! Pure types and logic with no I/O: reading validity, hit classification,
//! the aggregator and its two summary views, and the feed lifecycle record.

/// Metric aggregator with rolling and latest views.
pub mod aggregator;

/// Wall-clock abstraction.
pub mod clock;

/// Feed payloads and measurement extraction.
pub mod event;

/// Tracked metrics and summary records.
pub mod metrics;

/// Feed connection state.
pub mod streaming;

/// Reading validity and hit classification.
pub mod validity;
