//! Native wallet (tap-to-pay) routed through the card gateway.

use std::sync::Arc;

use async_trait::async_trait;

use super::{ProviderAdapter, completion_signal};
use crate::config::WalletConfig;
use crate::provider::{Brand, ProviderKind, SettlementMode};
use crate::services::wallet::{
    SubmissionError, TokenSubmission, WalletEligibility, WalletTokenSubmitter,
};
use crate::session::PaymentSession;
use crate::signal::{Initiation, Presentation, ProviderSignal, RawSignal, Surface};
use crate::state::FailureReason;

pub struct WalletAdapter {
    brand: Brand,
    config: WalletConfig,
    eligibility: Arc<dyn WalletEligibility>,
    submitter: Arc<dyn WalletTokenSubmitter>,
}

impl WalletAdapter {
    pub fn new(
        brand: Brand,
        config: WalletConfig,
        eligibility: Arc<dyn WalletEligibility>,
        submitter: Arc<dyn WalletTokenSubmitter>,
    ) -> Self {
        Self {
            brand,
            config,
            eligibility,
            submitter,
        }
    }

    async fn submit(&self, session: &PaymentSession, token: String) -> ProviderSignal {
        let Some(checkout_id) = session.external_checkout_id() else {
            return ProviderSignal::Failed(FailureReason::IdentityError);
        };

        let submission = TokenSubmission {
            checkout_id: checkout_id.to_string(),
            brand: self.brand,
            token,
        };

        match self.submitter.submit_token(submission).await {
            Ok(resource_path) => {
                completion_signal(self.brand.settlement_mode(), Some(resource_path), None)
            }
            Err(e) => {
                tracing::warn!(error = %e, "wallet token submission failed");
                ProviderSignal::Failed(match e {
                    SubmissionError::Network(_) => FailureReason::AmbiguousTimeout,
                    SubmissionError::Declined(_) => FailureReason::ProviderDeclined,
                    SubmissionError::Rejected(_) => FailureReason::BackendRejected,
                })
            }
        }
    }
}

impl std::fmt::Debug for WalletAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletAdapter")
            .field("brand", &self.brand)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ProviderAdapter for WalletAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Wallet
    }

    fn settlement_mode(&self) -> SettlementMode {
        self.brand.settlement_mode()
    }

    fn requires_checkout_id(&self) -> bool {
        true
    }

    fn check_eligibility(&self) -> Result<(), FailureReason> {
        if self.eligibility.can_make_payments(&self.config.networks) {
            Ok(())
        } else {
            Err(FailureReason::NotSupported)
        }
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

        Ok(Surface::Show(Presentation::WalletSheet {
            checkout_id: checkout_id.to_string(),
            merchant_id: self.config.merchant_id.clone(),
            country_code: self.config.country_code.clone(),
            currency: session.currency().code().to_string(),
            amount: session.amount().to_amount_string(),
            networks: self.config.networks.clone(),
            mode: self.config.mode,
        }))
    }

    async fn interpret(&self, session: &PaymentSession, raw: RawSignal) -> Option<ProviderSignal> {
        match raw {
            RawSignal::WalletAuthorized { token } => Some(self.submit(session, token).await),
            RawSignal::Completed { resource_path } => Some(completion_signal(
                self.brand.settlement_mode(),
                resource_path,
                session.external_checkout_id(),
            )),
            RawSignal::Failed { .. } => Some(ProviderSignal::Failed(FailureReason::ProviderDeclined)),
            RawSignal::Dismissed => Some(ProviderSignal::Cancelled),
            RawSignal::Redirect { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::SessionEvent;
    use crate::services::wallet::{InMemoryWalletTokenSubmitter, StaticWalletEligibility};
    use crate::session::SessionRequest;
    use common::{Currency, Money};

    fn adapter(eligible: bool, submitter: &InMemoryWalletTokenSubmitter) -> WalletAdapter {
        WalletAdapter::new(
            Brand::ApplePay,
            WalletConfig::default(),
            Arc::new(StaticWalletEligibility(eligible)),
            Arc::new(submitter.clone()),
        )
    }

    fn session() -> PaymentSession {
        let mut session = PaymentSession::new(
            SessionRequest::new(
                Money::from_minor(4999),
                Currency::new("SAR").unwrap(),
                ProviderKind::Wallet,
            )
            .with_brand(Brand::ApplePay),
        );
        session.apply(SessionEvent::checkout_id_resolved("abc123"));
        session
    }

    #[test]
    fn test_ineligible_device_not_supported() {
        let submitter = InMemoryWalletTokenSubmitter::new();
        assert_eq!(
            adapter(false, &submitter).check_eligibility(),
            Err(FailureReason::NotSupported)
        );
        assert_eq!(adapter(true, &submitter).check_eligibility(), Ok(()));
    }

    #[test]
    fn test_wallet_sheet_presentation() {
        let submitter = InMemoryWalletTokenSubmitter::new();
        let presentation = adapter(true, &submitter)
            .present(&session(), &Initiation::Ready)
            .unwrap();
        match presentation {
            Surface::Show(Presentation::WalletSheet {
                checkout_id,
                currency,
                amount,
                networks,
                ..
            }) => {
                assert_eq!(checkout_id, "abc123");
                assert_eq!(currency, "SAR");
                assert_eq!(amount, "49.99");
                assert_eq!(networks, vec![Brand::Mada, Brand::Visa, Brand::Mastercard]);
            }
            other => panic!("unexpected presentation: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_authorized_token_submitted_to_checkout() {
        let submitter = InMemoryWalletTokenSubmitter::new();
        let signal = adapter(true, &submitter)
            .interpret(
                &session(),
                RawSignal::WalletAuthorized {
                    token: "pk-token".into(),
                },
            )
            .await;

        assert_eq!(
            signal,
            Some(ProviderSignal::Success {
                reference: Some("/v1/checkouts/abc123/payment".into())
            })
        );
        let submissions = submitter.submissions();
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0].checkout_id, "abc123");
        assert_eq!(submissions[0].token, "pk-token");
    }

    #[tokio::test]
    async fn test_submission_errors() {
        let submitter = InMemoryWalletTokenSubmitter::new();
        let wallet = adapter(true, &submitter);
        let cases = [
            (
                SubmissionError::Network("reset".into()),
                FailureReason::AmbiguousTimeout,
            ),
            (
                SubmissionError::Declined("do not honor".into()),
                FailureReason::ProviderDeclined,
            ),
            (
                SubmissionError::Rejected("bad token".into()),
                FailureReason::BackendRejected,
            ),
        ];

        for (error, reason) in cases {
            submitter.set_fail_with(Some(error));
            let signal = wallet
                .interpret(&session(), RawSignal::WalletAuthorized { token: "t".into() })
                .await;
            assert_eq!(signal, Some(ProviderSignal::Failed(reason)));
        }
    }
}
