//! Static provider configuration shared read-only across sessions.

use serde::{Deserialize, Serialize};

use crate::provider::Brand;
use crate::redirect::RedirectTemplates;

/// Whether providers run against their sandbox or live environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProviderMode {
    #[default]
    Sandbox,
    Live,
}

impl std::str::FromStr for ProviderMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sandbox" | "test" => Ok(ProviderMode::Sandbox),
            "live" | "production" => Ok(ProviderMode::Live),
            other => Err(format!("unknown provider mode '{other}'")),
        }
    }
}

/// Card gateway configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CardConfig {
    pub mode: ProviderMode,
    /// Shopper-result redirects for brands that complete in a browser.
    #[serde(default)]
    pub redirects: Option<RedirectTemplates>,
}

/// Native wallet configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletConfig {
    pub merchant_id: String,
    pub country_code: String,
    /// Card networks the merchant accepts inside the wallet.
    pub networks: Vec<Brand>,
    pub mode: ProviderMode,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            merchant_id: "merchant.com.example.sandbox".to_string(),
            country_code: "SA".to_string(),
            networks: vec![Brand::Mada, Brand::Visa, Brand::Mastercard],
            mode: ProviderMode::Sandbox,
        }
    }
}

/// Buy-now-pay-later configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BnplConfig {
    pub redirects: RedirectTemplates,
    pub mode: ProviderMode,
}

impl Default for BnplConfig {
    fn default() -> Self {
        Self {
            redirects: RedirectTemplates::new(
                "https://checkout.example.com/bnpl/success",
                "https://checkout.example.com/bnpl/failure",
                "https://checkout.example.com/bnpl/cancel",
            ),
            mode: ProviderMode::Sandbox,
        }
    }
}

/// Configuration for every provider, handed explicitly to each adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProviderSettings {
    #[serde(default)]
    pub card: CardConfig,
    #[serde(default)]
    pub wallet: WalletConfig,
    #[serde(default)]
    pub bnpl: BnplConfig,
}
