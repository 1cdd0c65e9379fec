//! BNPL hosted checkout creation trait and in-memory implementation.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::LineItem;

/// Request to create a hosted BNPL checkout page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BnplCheckoutRequest {
    /// Two-decimal amount string.
    pub amount: String,
    pub products: Vec<LineItem>,
}

/// Created hosted checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BnplCheckout {
    pub checkout_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BnplError {
    #[error("network error: {0}")]
    Network(String),

    #[error("BNPL checkout rejected: {0}")]
    Rejected(String),
}

/// Creates hosted checkout pages with the BNPL provider.
#[async_trait]
pub trait BnplCheckoutService: Send + Sync {
    async fn create_checkout(&self, request: BnplCheckoutRequest)
    -> Result<BnplCheckout, BnplError>;
}

#[derive(Debug, Default)]
struct InMemoryBnplState {
    requests: Vec<BnplCheckoutRequest>,
    fail_with: Option<BnplError>,
}

/// In-memory BNPL service for testing; returns
/// `https://bnpl.example.com/checkout/{n}` pages.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBnplCheckoutService {
    state: Arc<RwLock<InMemoryBnplState>>,
}

impl InMemoryBnplCheckoutService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_with(&self, error: Option<BnplError>) {
        self.state.write().unwrap().fail_with = error;
    }

    pub fn call_count(&self) -> usize {
        self.state.read().unwrap().requests.len()
    }

    pub fn requests(&self) -> Vec<BnplCheckoutRequest> {
        self.state.read().unwrap().requests.clone()
    }
}

#[async_trait]
impl BnplCheckoutService for InMemoryBnplCheckoutService {
    async fn create_checkout(
        &self,
        request: BnplCheckoutRequest,
    ) -> Result<BnplCheckout, BnplError> {
        let mut state = self.state.write().unwrap();
        state.requests.push(request);

        if let Some(error) = state.fail_with.clone() {
            return Err(error);
        }

        Ok(BnplCheckout {
            checkout_url: format!("https://bnpl.example.com/checkout/{}", state.requests.len()),
        })
    }
}
