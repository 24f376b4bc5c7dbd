use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shotgun_core::{Instruction, QueryFilter, Session, Target};

use crate::error::{AdapterError, AdapterResult, ErrorClass};

/// Normalized result of a successful adapter call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdapterResponse {
    /// Human-readable summary, shown in the report line
    pub detail: String,
    /// Raw target payload (order ack, holdings)
    pub payload: Option<Value>,
}

impl AdapterResponse {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
            payload: None,
        }
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// Per-target protocol adapter
///
/// One implementation per remote endpoint, registered explicitly in the
/// gateway's adapter table. Adapters that wrap blocking SDKs must move
/// those calls off the async scheduler themselves.
#[async_trait]
pub trait TargetAdapter: Send + Sync {
    /// Target name this adapter serves
    fn name(&self) -> &str;

    /// Validate credentials and fetch static account data.
    ///
    /// `Ok(None)` means credentials are absent or invalid and the target
    /// should be skipped; `Err` is a genuine initialization failure.
    async fn connect(&self, target: &Target) -> AdapterResult<Option<Session>>;

    /// Place one instruction on every account of the session
    async fn execute(
        &self,
        instruction: &Instruction,
        session: &Session,
    ) -> AdapterResult<AdapterResponse>;

    /// Read-type state lookup (holdings)
    async fn query(&self, filter: &QueryFilter, session: &Session)
    -> AdapterResult<AdapterResponse>;

    /// Decide whether an error from this target is worth retrying.
    ///
    /// Adapters that have nothing target-specific to add can return
    /// `error.default_class()`.
    fn classify_error(&self, error: &AdapterError) -> ErrorClass;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Ensure the trait is object-safe
    fn _assert_adapter_object_safe(_: &dyn TargetAdapter) {}

    #[test]
    fn test_response_builder() {
        let response =
            AdapterResponse::new("order routed").with_payload(serde_json::json!({"id": 7}));
        assert_eq!(response.detail, "order routed");
        assert_eq!(response.payload.unwrap()["id"], 7);
    }
}
