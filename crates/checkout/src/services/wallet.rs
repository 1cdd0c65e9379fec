//! Native wallet platform seams: device eligibility and token submission.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::provider::Brand;

/// Platform query answering whether the device can pay with the wallet
/// using any of the accepted networks.
pub trait WalletEligibility: Send + Sync {
    fn can_make_payments(&self, networks: &[Brand]) -> bool;
}

/// Eligibility answer known up front, e.g. reported by the client device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticWalletEligibility(pub bool);

impl WalletEligibility for StaticWalletEligibility {
    fn can_make_payments(&self, networks: &[Brand]) -> bool {
        self.0 && !networks.is_empty()
    }
}

/// A wallet token to charge against an existing checkout id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSubmission {
    pub checkout_id: String,
    pub brand: Brand,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    /// The submission did not complete; the token may have been charged.
    #[error("network error: {0}")]
    Network(String),

    #[error("payment declined: {0}")]
    Declined(String),

    #[error("submission rejected: {0}")]
    Rejected(String),
}

/// Submits a wallet token to the card gateway. Returns the resource path of
/// the created transaction.
#[async_trait]
pub trait WalletTokenSubmitter: Send + Sync {
    async fn submit_token(&self, submission: TokenSubmission) -> Result<String, SubmissionError>;
}

#[derive(Debug, Default)]
struct InMemoryTokenState {
    submissions: Vec<TokenSubmission>,
    fail_with: Option<SubmissionError>,
}

/// In-memory token submitter for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWalletTokenSubmitter {
    state: Arc<RwLock<InMemoryTokenState>>,
}

impl InMemoryWalletTokenSubmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_with(&self, error: Option<SubmissionError>) {
        self.state.write().unwrap().fail_with = error;
    }

    pub fn call_count(&self) -> usize {
        self.state.read().unwrap().submissions.len()
    }

    pub fn submissions(&self) -> Vec<TokenSubmission> {
        self.state.read().unwrap().submissions.clone()
    }
}

#[async_trait]
impl WalletTokenSubmitter for InMemoryWalletTokenSubmitter {
    async fn submit_token(&self, submission: TokenSubmission) -> Result<String, SubmissionError> {
        let mut state = self.state.write().unwrap();
        let path = format!("/v1/checkouts/{}/payment", submission.checkout_id);
        state.submissions.push(submission);

        match state.fail_with.clone() {
            Some(error) => Err(error),
            None => Ok(path),
        }
    }
}
