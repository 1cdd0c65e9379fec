//! Order finalizer trait and in-memory implementation.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{Money, SessionId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Evidence handed to the order side once a session settles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizeRequest {
    /// Idempotency key for order creation.
    pub session_id: SessionId,
    /// Provider's terminal reference; absent for cash.
    pub provider_reference: Option<String>,
    pub amount: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FinalizeError {
    #[error("order finalization failed: {0}")]
    Failed(String),
}

/// Creates the order/commitment for a settled session.
#[async_trait]
pub trait OrderFinalizer: Send + Sync {
    async fn finalize(&self, request: FinalizeRequest) -> Result<(), FinalizeError>;
}

#[derive(Debug, Default)]
struct InMemoryFinalizerState {
    requests: Vec<FinalizeRequest>,
    fail_on_finalize: bool,
}

/// In-memory order finalizer recording every call.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderFinalizer {
    state: Arc<RwLock<InMemoryFinalizerState>>,
}

impl InMemoryOrderFinalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_on_finalize(&self, fail: bool) {
        self.state.write().unwrap().fail_on_finalize = fail;
    }

    /// Number of finalize calls received, successful or not.
    pub fn call_count(&self) -> usize {
        self.state.read().unwrap().requests.len()
    }

    /// Number of calls for one session.
    pub fn calls_for(&self, session_id: SessionId) -> usize {
        self.state
            .read()
            .unwrap()
            .requests
            .iter()
            .filter(|r| r.session_id == session_id)
            .count()
    }

    pub fn requests(&self) -> Vec<FinalizeRequest> {
        self.state.read().unwrap().requests.clone()
    }
}

#[async_trait]
impl OrderFinalizer for InMemoryOrderFinalizer {
    async fn finalize(&self, request: FinalizeRequest) -> Result<(), FinalizeError> {
        let mut state = self.state.write().unwrap();
        state.requests.push(request);

        if state.fail_on_finalize {
            return Err(FinalizeError::Failed("order service unavailable".to_string()));
        }
        Ok(())
    }
}
