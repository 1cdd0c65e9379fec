//! Checkout identity resolver trait and in-memory implementation.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Request for a backend-issued checkout id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutIdRequest {
    /// Amount formatted with exactly two decimals, e.g. `"120.00"`.
    pub amount: String,
    /// Brand/type selector, see [`Brand::type_selector`](crate::provider::Brand::type_selector).
    pub type_selector: u8,
}

/// Reasons a checkout id could not be obtained.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("not authenticated")]
    NotAuthenticated,

    #[error("network error: {0}")]
    Network(String),

    #[error("backend rejected checkout: {0}")]
    BackendRejected(String),
}

/// Obtains the opaque checkout id a provider UI is scoped to.
#[async_trait]
pub trait CheckoutIdentityResolver: Send + Sync {
    async fn resolve(&self, request: CheckoutIdRequest) -> Result<String, IdentityError>;
}

#[derive(Debug, Default)]
struct InMemoryIdentityState {
    requests: Vec<CheckoutIdRequest>,
    fixed_id: Option<String>,
    next_id: u32,
    fail_with: Option<IdentityError>,
}

/// In-memory checkout identity resolver for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCheckoutIdentityResolver {
    state: Arc<RwLock<InMemoryIdentityState>>,
}

impl InMemoryCheckoutIdentityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always hands out the given id.
    pub fn with_checkout_id(id: impl Into<String>) -> Self {
        let resolver = Self::default();
        resolver.state.write().unwrap().fixed_id = Some(id.into());
        resolver
    }

    /// Makes every subsequent call fail with the given error.
    pub fn set_fail_with(&self, error: Option<IdentityError>) {
        self.state.write().unwrap().fail_with = error;
    }

    /// Number of resolve calls received, successful or not.
    pub fn call_count(&self) -> usize {
        self.state.read().unwrap().requests.len()
    }

    pub fn requests(&self) -> Vec<CheckoutIdRequest> {
        self.state.read().unwrap().requests.clone()
    }
}

#[async_trait]
impl CheckoutIdentityResolver for InMemoryCheckoutIdentityResolver {
    async fn resolve(&self, request: CheckoutIdRequest) -> Result<String, IdentityError> {
        let mut state = self.state.write().unwrap();
        state.requests.push(request);

        if let Some(error) = state.fail_with.clone() {
            return Err(error);
        }

        if let Some(id) = state.fixed_id.clone() {
            return Ok(id);
        }

        state.next_id += 1;
        Ok(format!("CHK-{:04}", state.next_id))
    }
}
