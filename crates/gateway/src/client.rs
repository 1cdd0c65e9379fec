//! `reqwest` implementation of the backend collaborators.

use std::sync::Arc;

use async_trait::async_trait;
use checkout::PaymentServices;
use checkout::services::{
    BnplCheckout, BnplCheckoutRequest, BnplCheckoutService, BnplError, CheckoutIdRequest,
    CheckoutIdentityResolver, FinalizeError, FinalizeRequest, IdentityError, OrderFinalizer,
    StatusBackend, StatusError, StatusReport, StatusRequest, SubmissionError, TokenSubmission,
    WalletEligibility, WalletTokenSubmitter,
};
use reqwest::{Client, Response, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::BackendConfig;
use crate::error::{GatewayError, Result};
use crate::wire::{
    BnplCheckoutBody, BnplCheckoutResponse, BnplProduct, CheckoutIdBody, CheckoutIdResponse,
    FinalizeBody, StatusBody, StatusResponse, WalletTokenBody, WalletTokenResponse,
};

/// HTTP client for every backend endpoint a payment session consumes.
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: Client,
    config: Arc<BackendConfig>,
}

impl BackendClient {
    pub fn new(config: BackendConfig) -> Result<Self> {
        Url::parse(&config.base_url).map_err(|e| GatewayError::InvalidUrl(e.to_string()))?;

        let client = Client::builder()
            .user_agent(concat!("payment-gateway/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Service handles backed by this client.
    pub fn payment_services(&self, wallet_eligibility: Arc<dyn WalletEligibility>) -> PaymentServices {
        let client = Arc::new(self.clone());
        PaymentServices {
            identity: client.clone(),
            status: client.clone(),
            bnpl: client.clone(),
            wallet_tokens: client.clone(),
            wallet_eligibility,
            finalizer: client,
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        let url = format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&url).map_err(|e| GatewayError::InvalidUrl(e.to_string()))
    }

    async fn send<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Response> {
        let mut request = self.client.post(self.endpoint(path)?).json(body);
        if let Some(token) = self.config.token() {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(GatewayError::Unauthorized);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(path, status = status.as_u16(), "backend returned error status");
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }

    async fn post<B: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R> {
        let response = self.send(path, body).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| GatewayError::Decode(e.to_string()))
    }
}

#[async_trait]
impl CheckoutIdentityResolver for BackendClient {
    #[tracing::instrument(skip(self), fields(type_selector = request.type_selector))]
    async fn resolve(&self, request: CheckoutIdRequest) -> std::result::Result<String, IdentityError> {
        if self.config.token().is_none() {
            return Err(IdentityError::NotAuthenticated);
        }

        let body = CheckoutIdBody {
            amount: &request.amount,
            type_selector: request.type_selector,
        };
        let response: CheckoutIdResponse = self.post(&self.config.paths.checkout_id, &body).await?;

        match response.id.filter(|id| !id.is_empty()) {
            Some(id) if response.status => Ok(id),
            _ => Err(IdentityError::BackendRejected(
                response
                    .message
                    .unwrap_or_else(|| "no checkout id returned".to_string()),
            )),
        }
    }
}

#[async_trait]
impl StatusBackend for BackendClient {
    #[tracing::instrument(skip(self))]
    async fn check_status(
        &self,
        request: StatusRequest,
    ) -> std::result::Result<StatusReport, StatusError> {
        let body = StatusBody {
            resource_path: &request.resource_path,
            type_selector: request.type_selector,
        };
        let response: StatusResponse = self.post(&self.config.paths.status, &body).await?;

        Ok(StatusReport {
            status: response.status,
            code: response.result.code,
            description: response.result.description,
        })
    }
}

#[async_trait]
impl BnplCheckoutService for BackendClient {
    #[tracing::instrument(skip(self, request), fields(products = request.products.len()))]
    async fn create_checkout(
        &self,
        request: BnplCheckoutRequest,
    ) -> std::result::Result<BnplCheckout, BnplError> {
        let body = BnplCheckoutBody {
            amount: request.amount,
            products: request.products.iter().map(BnplProduct::from).collect(),
        };
        let response: BnplCheckoutResponse =
            self.post(&self.config.paths.bnpl_checkout, &body).await?;

        match response.checkout_url.filter(|url| !url.is_empty()) {
            Some(checkout_url) => Ok(BnplCheckout { checkout_url }),
            None => Err(BnplError::Rejected("no checkout url returned".to_string())),
        }
    }
}

#[async_trait]
impl WalletTokenSubmitter for BackendClient {
    #[tracing::instrument(skip(self, submission), fields(checkout_id = %submission.checkout_id))]
    async fn submit_token(
        &self,
        submission: TokenSubmission,
    ) -> std::result::Result<String, SubmissionError> {
        let body = WalletTokenBody {
            checkout_id: &submission.checkout_id,
            brand: submission.brand.code(),
            token: &submission.token,
        };
        let response: WalletTokenResponse =
            self.post(&self.config.paths.wallet_token, &body).await?;

        if !response.status {
            return Err(SubmissionError::Declined(
                response
                    .message
                    .unwrap_or_else(|| "payment declined".to_string()),
            ));
        }

        response
            .resource_path
            .filter(|path| !path.is_empty())
            .ok_or_else(|| SubmissionError::Rejected("no resource path returned".to_string()))
    }
}

#[async_trait]
impl OrderFinalizer for BackendClient {
    #[tracing::instrument(skip(self, request), fields(session_id = %request.session_id))]
    async fn finalize(&self, request: FinalizeRequest) -> std::result::Result<(), FinalizeError> {
        let body = FinalizeBody {
            session_id: request.session_id.to_string(),
            provider_reference: request.provider_reference,
            amount: request.amount.to_amount_string(),
        };
        self.send(&self.config.paths.finalize, &body).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_base_url() {
        let result = BackendClient::new(BackendConfig::new("not a url"));
        assert!(matches!(result, Err(GatewayError::InvalidUrl(_))));
    }

    #[test]
    fn test_endpoint_joins_base_path() {
        let client = BackendClient::new(BackendConfig::new("https://api.example.com/v1/")).unwrap();
        assert_eq!(
            client.endpoint("/payments/status").unwrap().as_str(),
            "https://api.example.com/v1/payments/status"
        );
    }
}
