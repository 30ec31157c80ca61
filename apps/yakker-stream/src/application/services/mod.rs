//! Application Services
//!
//! Services that orchestrate domain logic and coordinate between ports.
//!
//! - `IngestPipeline`: hooks, classification, and aggregation per payload
//! - `RawPayloadStore`: latest raw payload mirror for the dashboard

mod ingest;
mod raw_payload;

pub use ingest::{IngestError, IngestPipeline, format_console_summary};
pub use raw_payload::{
    HIT_SPIN_RATE_KEY, RawPayloadStore, RawSection, RawSnapshot, build_raw_sections,
    format_payload_value,
};
