//! Card gateway presented as an embedded checkout surface.

use async_trait::async_trait;

use super::{ProviderAdapter, completion_signal};
use crate::config::CardConfig;
use crate::provider::{Brand, ProviderKind, SettlementMode};
use crate::redirect::{RedirectOutcome, query_param};
use crate::session::PaymentSession;
use crate::signal::{Initiation, Presentation, ProviderSignal, RawSignal, Surface};
use crate::state::FailureReason;

/// Query parameter carrying the transaction path on a shopper-result redirect.
const RESOURCE_PATH_PARAM: &str = "resourcePath";

#[derive(Debug, Clone)]
pub struct CardAdapter {
    brand: Brand,
    config: CardConfig,
}

impl CardAdapter {
    pub fn new(brand: Brand, config: CardConfig) -> Self {
        Self { brand, config }
    }

    pub fn brand(&self) -> Brand {
        self.brand
    }

    fn interpret_redirect(&self, session: &PaymentSession, url: &str) -> Option<ProviderSignal> {
        let templates = self.config.redirects.as_ref()?;
        match templates.classify(url) {
            RedirectOutcome::Success => {
                let path = query_param(url, RESOURCE_PATH_PARAM)
                    .or_else(|| session.external_resource_path().map(str::to_string));
                Some(completion_signal(
                    self.brand.settlement_mode(),
                    path,
                    session.external_checkout_id(),
                ))
            }
            RedirectOutcome::Failure => Some(ProviderSignal::Failed(FailureReason::ProviderDeclined)),
            RedirectOutcome::Cancelled => Some(ProviderSignal::Cancelled),
            RedirectOutcome::Ignored => None,
        }
    }
}

#[async_trait]
impl ProviderAdapter for CardAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Card
    }

    fn settlement_mode(&self) -> SettlementMode {
        self.brand.settlement_mode()
    }

    fn requires_checkout_id(&self) -> bool {
        true
    }

    async fn initiate(&self, session: &PaymentSession) -> Result<Initiation, FailureReason> {
        match session.external_checkout_id() {
            Some(_) => Ok(Initiation::Ready),
            None => Err(FailureReason::IdentityError),
        }
    }

    fn present(
        &self,
        session: &PaymentSession,
        _initiation: &Initiation,
    ) -> Result<Surface, FailureReason> {
        let checkout_id = session
            .external_checkout_id()
            .ok_or(FailureReason::IdentityError)?;

        Ok(Surface::Show(Presentation::EmbeddedCheckout {
            checkout_id: checkout_id.to_string(),
            brand: self.brand,
            settlement: self.brand.settlement_mode(),
            mode: self.config.mode,
        }))
    }

    async fn interpret(&self, session: &PaymentSession, raw: RawSignal) -> Option<ProviderSignal> {
        match raw {
            RawSignal::Completed { resource_path } => Some(completion_signal(
                self.brand.settlement_mode(),
                resource_path,
                session.external_checkout_id(),
            )),
            RawSignal::Failed { code, message } => {
                tracing::warn!(?code, ?message, brand = %self.brand, "card checkout failed");
                Some(ProviderSignal::Failed(FailureReason::ProviderDeclined))
            }
            RawSignal::Redirect { url } => self.interpret_redirect(session, &url),
            RawSignal::Dismissed => Some(ProviderSignal::Cancelled),
            RawSignal::WalletAuthorized { .. } => None,
        }
    }
}
