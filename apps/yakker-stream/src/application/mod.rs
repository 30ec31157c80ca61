//! Application Layer - Use cases and port definitions.
//!
//! The ingest pipeline every feed source drives, and the hook port raw
//! payload observers implement.

/// Port interfaces for payload observers.
pub mod ports;

/// Ingest pipeline and raw payload store.
pub mod services;
