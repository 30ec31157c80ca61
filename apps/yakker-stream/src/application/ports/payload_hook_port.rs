//! Payload Hook Port (Driven Port)
//!
//! Observers that see each raw feed payload before it is classified.

use async_trait::async_trait;
use serde_json::Value;

/// Payload hook failure.
#[derive(Debug, Clone, thiserror::Error)]
pub enum HookError {
    /// The hook rejected or could not process the payload.
    #[error("Payload hook failed: {message}")]
    Failed {
        /// Failure description.
        message: String,
    },
}

impl HookError {
    /// Build a failure from any message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}

/// Port for raw payload observers.
///
/// Hook failures never affect ingestion; the pipeline logs and drops them.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PayloadHook: Send + Sync {
    /// Observe one raw decoded payload.
    async fn on_payload(&self, payload: &Value) -> Result<(), HookError>;
}

/// Hook that ignores every payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpPayloadHook;

#[async_trait]
impl PayloadHook for NoOpPayloadHook {
    async fn on_payload(&self, _payload: &Value) -> Result<(), HookError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn no_op_hook_accepts_anything() {
        let hook = NoOpPayloadHook;
        assert!(hook.on_payload(&json!({"event_uuid": "x"})).await.is_ok());
        assert!(hook.on_payload(&json!(null)).await.is_ok());
    }

    #[test]
    fn hook_error_message() {
        let err = HookError::failed("store poisoned");
        assert_eq!(err.to_string(), "Payload hook failed: store poisoned");
    }
}
