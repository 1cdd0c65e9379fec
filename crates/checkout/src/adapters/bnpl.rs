//! Buy-now-pay-later via a hosted page in the external browser.
//!
//! The outcome only ever arrives as a redirect to one of the configured
//! result URLs; in-process completion callbacks are not trusted.

use std::sync::Arc;

use async_trait::async_trait;

use super::ProviderAdapter;
use crate::config::BnplConfig;
use crate::provider::{ProviderKind, SettlementMode};
use crate::redirect::{RedirectOutcome, query_param};
use crate::services::bnpl::{BnplCheckoutRequest, BnplCheckoutService, BnplError};
use crate::session::PaymentSession;
use crate::signal::{Initiation, Presentation, ProviderSignal, RawSignal, Surface};
use crate::state::FailureReason;

const PAYMENT_ID_PARAM: &str = "payment_id";

pub struct BnplAdapter {
    config: BnplConfig,
    service: Arc<dyn BnplCheckoutService>,
}

impl BnplAdapter {
    pub fn new(config: BnplConfig, service: Arc<dyn BnplCheckoutService>) -> Self {
        Self { config, service }
    }
}

impl std::fmt::Debug for BnplAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BnplAdapter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ProviderAdapter for BnplAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Bnpl
    }

    fn settlement_mode(&self) -> SettlementMode {
        SettlementMode::Asynchronous
    }

    fn requires_checkout_id(&self) -> bool {
        false
    }

    async fn initiate(&self, session: &PaymentSession) -> Result<Initiation, FailureReason> {
        let request = BnplCheckoutRequest {
            amount: session.amount().to_amount_string(),
            products: session.line_items().to_vec(),
        };

        match self.service.create_checkout(request).await {
            Ok(checkout) => Ok(Initiation::HostedPage {
                checkout_url: checkout.checkout_url,
            }),
            Err(e) => {
                tracing::warn!(error = %e, "BNPL checkout creation failed");
                Err(match e {
                    BnplError::Network(_) => FailureReason::Network,
                    BnplError::Rejected(_) => FailureReason::BackendRejected,
                })
            }
        }
    }

    fn present(
        &self,
        _session: &PaymentSession,
        initiation: &Initiation,
    ) -> Result<Surface, FailureReason> {
        match initiation {
            Initiation::HostedPage { checkout_url } => {
                Ok(Surface::Show(Presentation::ExternalBrowser {
                    url: checkout_url.clone(),
                }))
            }
            Initiation::Ready => Err(FailureReason::BackendRejected),
        }
    }

    async fn interpret(&self, session: &PaymentSession, raw: RawSignal) -> Option<ProviderSignal> {
        match raw {
            RawSignal::Redirect { url } => match self.config.redirects.classify(&url) {
                RedirectOutcome::Success => Some(ProviderSignal::Success {
                    reference: query_param(&url, PAYMENT_ID_PARAM)
                        .or_else(|| session.hosted_checkout_url().map(str::to_string)),
                }),
                RedirectOutcome::Failure => {
                    Some(ProviderSignal::Failed(FailureReason::ProviderDeclined))
                }
                RedirectOutcome::Cancelled => Some(ProviderSignal::Cancelled),
                RedirectOutcome::Ignored => None,
            },
            RawSignal::Dismissed => Some(ProviderSignal::Cancelled),
            RawSignal::Completed { .. }
            | RawSignal::Failed { .. }
            | RawSignal::WalletAuthorized { .. } => None,
        }
    }
}
