//! Feed Frame Codec
//!
//! Decodes Yakker text frames. Every frame carries exactly one JSON payload;
//! whether it has the payload shape is decided later by the ingest pipeline.

use serde_json::Value;

/// Codec errors.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Frame text is not valid JSON.
    #[error("JSON codec error: {0}")]
    Json(#[from] serde_json::Error),

    /// Frame contained only whitespace.
    #[error("empty frame")]
    Empty,
}

/// JSON codec for Yakker feed frames.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCodec;

impl JsonCodec {
    /// Create a new JSON codec.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Decode a text frame into a raw JSON value.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame is blank or not valid JSON.
    pub fn decode(&self, text: &str) -> Result<Value, CodecError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(CodecError::Empty);
        }
        Ok(serde_json::from_str(trimmed)?)
    }
}
