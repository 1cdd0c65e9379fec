//! Cash on delivery: settles as soon as it is chosen.

use async_trait::async_trait;

use super::ProviderAdapter;
use crate::provider::{ProviderKind, SettlementMode};
use crate::session::PaymentSession;
use crate::signal::{Initiation, ProviderSignal, RawSignal, Surface};
use crate::state::FailureReason;

#[derive(Debug, Clone, Copy, Default)]
pub struct CashAdapter;

#[async_trait]
impl ProviderAdapter for CashAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Cash
    }

    fn settlement_mode(&self) -> SettlementMode {
        SettlementMode::Synchronous
    }

    fn requires_checkout_id(&self) -> bool {
        false
    }

    async fn initiate(&self, _session: &PaymentSession) -> Result<Initiation, FailureReason> {
        Ok(Initiation::Ready)
    }

    fn present(
        &self,
        _session: &PaymentSession,
        _initiation: &Initiation,
    ) -> Result<Surface, FailureReason> {
        Ok(Surface::Resolved(ProviderSignal::Success { reference: None }))
    }

    async fn interpret(&self, _session: &PaymentSession, raw: RawSignal) -> Option<ProviderSignal> {
        match raw {
            RawSignal::Dismissed => Some(ProviderSignal::Cancelled),
            _ => None,
        }
    }
}
