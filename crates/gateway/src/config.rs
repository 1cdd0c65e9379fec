//! Backend connection settings.

use std::time::Duration;

/// Endpoint paths, relative to the base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendPaths {
    pub checkout_id: String,
    pub status: String,
    pub bnpl_checkout: String,
    pub wallet_token: String,
    pub finalize: String,
}

impl Default for BackendPaths {
    fn default() -> Self {
        Self {
            checkout_id: "/payments/checkout-id".to_string(),
            status: "/payments/status".to_string(),
            bnpl_checkout: "/payments/bnpl/checkout".to_string(),
            wallet_token: "/payments/wallet/token".to_string(),
            finalize: "/orders/finalize".to_string(),
        }
    }
}

/// Session-scoped backend configuration handed to the client at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    pub base_url: String,
    /// Bearer token of the signed-in user. Checkout ids are never requested
    /// without one.
    pub auth_token: Option<String>,
    pub timeout: Duration,
    pub paths: BackendPaths,
}

impl BackendConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            auth_token: None,
            timeout: Duration::from_secs(30),
            paths: BackendPaths::default(),
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_paths(mut self, paths: BackendPaths) -> Self {
        self.paths = paths;
        self
    }

    /// The token, if one is set and non-blank.
    pub fn token(&self) -> Option<&str> {
        self.auth_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }
}
