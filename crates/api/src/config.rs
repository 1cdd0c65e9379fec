//! Application configuration loaded from environment variables.

use std::time::Duration;

use checkout::{ProviderMode, ProviderSettings, RedirectTemplates};
use gateway::BackendConfig;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `BACKEND_URL`: payment backend base URL; in-memory collaborators when unset
/// - `BACKEND_TOKEN`: bearer token for the backend
/// - `BACKEND_TIMEOUT_SECS`: per-request timeout (default: `30`)
/// - `SESSION_TTL_SECS`: age at which an unfinished session is cancelled (default: `900`)
/// - `SESSION_SWEEP_SECS`: how often stale sessions are looked for (default: `60`)
/// - `PAYMENT_MODE`: `sandbox` or `live` for every provider (default: `sandbox`)
/// - `WALLET_MERCHANT_ID`: wallet merchant identifier
/// - `CARD_REDIRECT_SUCCESS`, `CARD_REDIRECT_FAILURE`, `CARD_REDIRECT_CANCEL`
/// - `BNPL_SUCCESS_URL`, `BNPL_FAILURE_URL`, `BNPL_CANCEL_URL`
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub backend_url: Option<String>,
    pub backend_token: Option<String>,
    pub backend_timeout_secs: u64,
    pub session_ttl_secs: u64,
    pub session_sweep_secs: u64,
    pub providers: ProviderSettings,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let mode = match var("PAYMENT_MODE").map(|m| m.parse::<ProviderMode>()) {
            Some(Ok(mode)) => mode,
            Some(Err(e)) => {
                tracing::warn!(error = %e, "ignoring PAYMENT_MODE");
                ProviderMode::default()
            }
            None => ProviderMode::default(),
        };

        let mut providers = defaults.providers;
        providers.card.mode = mode;
        providers.wallet.mode = mode;
        providers.bnpl.mode = mode;

        if let Some(merchant_id) = var("WALLET_MERCHANT_ID") {
            providers.wallet.merchant_id = merchant_id;
        }

        if let (Some(success), Some(failure), Some(cancel)) = (
            var("CARD_REDIRECT_SUCCESS"),
            var("CARD_REDIRECT_FAILURE"),
            var("CARD_REDIRECT_CANCEL"),
        ) {
            providers.card.redirects = Some(RedirectTemplates::new(success, failure, cancel));
        }

        let bnpl = &mut providers.bnpl.redirects;
        if let Some(url) = var("BNPL_SUCCESS_URL") {
            bnpl.success = url;
        }
        if let Some(url) = var("BNPL_FAILURE_URL") {
            bnpl.failure = url;
        }
        if let Some(url) = var("BNPL_CANCEL_URL") {
            bnpl.cancel = url;
        }

        Self {
            host: var("HOST").unwrap_or(defaults.host),
            port: var("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: var("RUST_LOG").unwrap_or(defaults.log_level),
            backend_url: var("BACKEND_URL"),
            backend_token: var("BACKEND_TOKEN"),
            backend_timeout_secs: var("BACKEND_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.backend_timeout_secs),
            session_ttl_secs: var("SESSION_TTL_SECS")
                .and_then(|s| s.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults.session_ttl_secs),
            session_sweep_secs: var("SESSION_SWEEP_SECS")
                .and_then(|s| s.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults.session_sweep_secs),
            providers,
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    pub fn session_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.session_sweep_secs)
    }

    /// Backend client configuration, when a backend URL is configured.
    pub fn backend_config(&self) -> Option<BackendConfig> {
        let url = self.backend_url.as_ref()?;
        let mut config = BackendConfig::new(url.clone())
            .with_timeout(Duration::from_secs(self.backend_timeout_secs));
        if let Some(token) = &self.backend_token {
            config = config.with_token(token.clone());
        }
        Some(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            backend_url: None,
            backend_token: None,
            backend_timeout_secs: 30,
            session_ttl_secs: 900,
            session_sweep_secs: 60,
            providers: ProviderSettings::default(),
        }
    }
}
