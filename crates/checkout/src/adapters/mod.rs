//! Provider adapters.
//!
//! An adapter knows how one provider is initiated, what the user is shown
//! and what the provider's raw completion signals mean. Adapters hold no
//! session state; they read the session and report a [`ProviderSignal`].
//! Deciding whether that signal still counts is up to the controller.

pub mod bnpl;
pub mod card;
pub mod cash;
pub mod wallet;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::ProviderSettings;
use crate::provider::{Brand, ProviderKind, SettlementMode};
use crate::services::PaymentServices;
use crate::session::PaymentSession;
use crate::signal::{Initiation, ProviderSignal, RawSignal, Surface};
use crate::state::FailureReason;

pub use bnpl::BnplAdapter;
pub use card::CardAdapter;
pub use cash::CashAdapter;
pub use wallet::WalletAdapter;

/// How one provider takes part in a payment session.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn kind(&self) -> ProviderKind;

    fn settlement_mode(&self) -> SettlementMode;

    /// Whether a backend checkout id must be resolved before presenting.
    fn requires_checkout_id(&self) -> bool;

    /// Checked before anything else, including the checkout id request.
    fn check_eligibility(&self) -> Result<(), FailureReason> {
        Ok(())
    }

    /// Creates whatever the provider needs before its UI can be shown.
    async fn initiate(&self, session: &PaymentSession) -> Result<Initiation, FailureReason>;

    /// Describes the surface to put in front of the user, or the result
    /// when the provider needs no UI.
    fn present(
        &self,
        session: &PaymentSession,
        initiation: &Initiation,
    ) -> Result<Surface, FailureReason>;

    /// Normalizes a raw signal. `None` means the signal carries no decision
    /// for this provider.
    async fn interpret(&self, session: &PaymentSession, raw: RawSignal) -> Option<ProviderSignal>;
}

/// Creates the adapter for a provider choice.
pub fn select(
    kind: ProviderKind,
    brand: Option<Brand>,
    settings: &ProviderSettings,
    services: &PaymentServices,
) -> Arc<dyn ProviderAdapter> {
    match kind {
        ProviderKind::Cash => Arc::new(CashAdapter),
        ProviderKind::Card => Arc::new(CardAdapter::new(
            brand.unwrap_or(Brand::Mada),
            settings.card.clone(),
        )),
        ProviderKind::Wallet => Arc::new(WalletAdapter::new(
            brand.unwrap_or(Brand::ApplePay),
            settings.wallet.clone(),
            services.wallet_eligibility.clone(),
            services.wallet_tokens.clone(),
        )),
        ProviderKind::Bnpl => Arc::new(BnplAdapter::new(
            settings.bnpl.clone(),
            services.bnpl.clone(),
        )),
    }
}

/// Maps an embedded checkout completion to a signal by settlement mode.
pub(crate) fn completion_signal(
    mode: SettlementMode,
    resource_path: Option<String>,
    fallback_reference: Option<&str>,
) -> ProviderSignal {
    match mode {
        SettlementMode::Synchronous => ProviderSignal::Success {
            reference: resource_path.or_else(|| fallback_reference.map(str::to_string)),
        },
        SettlementMode::Asynchronous => ProviderSignal::Pending { resource_path },
    }
}
