//! External collaborator traits and in-memory implementations.

pub mod bnpl;
pub mod finalizer;
pub mod identity;
pub mod status;
pub mod wallet;

use std::sync::Arc;

pub use bnpl::{
    BnplCheckout, BnplCheckoutRequest, BnplCheckoutService, BnplError, InMemoryBnplCheckoutService,
};
pub use finalizer::{FinalizeError, FinalizeRequest, InMemoryOrderFinalizer, OrderFinalizer};
pub use identity::{
    CheckoutIdRequest, CheckoutIdentityResolver, IdentityError, InMemoryCheckoutIdentityResolver,
};
pub use status::{InMemoryStatusBackend, StatusBackend, StatusError, StatusReport, StatusRequest};
pub use wallet::{
    InMemoryWalletTokenSubmitter, StaticWalletEligibility, SubmissionError, TokenSubmission,
    WalletEligibility, WalletTokenSubmitter,
};

/// Handles to every collaborator a session talks to.
///
/// Cloning is cheap; independent sessions share the same handles.
#[derive(Clone)]
pub struct PaymentServices {
    pub identity: Arc<dyn CheckoutIdentityResolver>,
    pub status: Arc<dyn StatusBackend>,
    pub bnpl: Arc<dyn BnplCheckoutService>,
    pub wallet_tokens: Arc<dyn WalletTokenSubmitter>,
    pub wallet_eligibility: Arc<dyn WalletEligibility>,
    pub finalizer: Arc<dyn OrderFinalizer>,
}

impl PaymentServices {
    /// Replaces the wallet eligibility query, e.g. with the answer a client
    /// device reported for one session.
    pub fn with_wallet_eligibility(mut self, eligibility: Arc<dyn WalletEligibility>) -> Self {
        self.wallet_eligibility = eligibility;
        self
    }
}

impl std::fmt::Debug for PaymentServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentServices").finish_non_exhaustive()
    }
}

/// The in-memory collaborators, kept together so tests can both wire a
/// controller and inspect what each collaborator received.
#[derive(Debug, Clone, Default)]
pub struct InMemoryServices {
    pub identity: InMemoryCheckoutIdentityResolver,
    pub status: InMemoryStatusBackend,
    pub bnpl: InMemoryBnplCheckoutService,
    pub wallet_tokens: InMemoryWalletTokenSubmitter,
    pub finalizer: InMemoryOrderFinalizer,
}

impl InMemoryServices {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds service handles backed by these collaborators. Wallet payments
    /// are reported as available.
    pub fn services(&self) -> PaymentServices {
        PaymentServices {
            identity: Arc::new(self.identity.clone()),
            status: Arc::new(self.status.clone()),
            bnpl: Arc::new(self.bnpl.clone()),
            wallet_tokens: Arc::new(self.wallet_tokens.clone()),
            wallet_eligibility: Arc::new(StaticWalletEligibility(true)),
            finalizer: Arc::new(self.finalizer.clone()),
        }
    }

    /// Total calls made to any backend-facing collaborator.
    pub fn backend_calls(&self) -> usize {
        self.identity.call_count()
            + self.status.call_count()
            + self.bnpl.call_count()
            + self.wallet_tokens.call_count()
    }
}
