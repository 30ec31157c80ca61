//! Port Interfaces
//!
//! Contracts between the ingest pipeline and the adapters around it.
//!
//! ## Driven Ports (Outbound)
//!
//! - `PayloadHook`: observer handed every raw decoded payload before
//!   classification (raw payload mirror, debugging taps)

mod payload_hook_port;

pub use payload_hook_port::{HookError, NoOpPayloadHook, PayloadHook};

#[cfg(test)]
pub use payload_hook_port::MockPayloadHook;
