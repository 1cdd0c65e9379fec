//! Provider kinds and card/wallet brands.

use serde::{Deserialize, Serialize};

/// Which provider family a session is paid through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Cash,
    Card,
    Wallet,
    Bnpl,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Cash => "cash",
            ProviderKind::Card => "card",
            ProviderKind::Wallet => "wallet",
            ProviderKind::Bnpl => "bnpl",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a brand reports its result before the provider UI closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementMode {
    /// Result is known when the embedded surface completes.
    Synchronous,
    /// The surface hands off to an external browser; the result must be
    /// confirmed by a status check or a redirect.
    Asynchronous,
}

/// Card network or wallet rail selected within the card/wallet provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Brand {
    /// Domestic debit network.
    Mada,
    Visa,
    #[serde(rename = "MASTER")]
    Mastercard,
    /// Wallet brand routed through the card provider.
    ApplePay,
    /// Redirect-based brand completed in an external browser.
    StcPay,
}

impl Brand {
    /// Numeric selector the backend uses to pick the merchant entity for a
    /// checkout or status request.
    pub fn type_selector(&self) -> u8 {
        match self {
            Brand::Mada => 1,
            Brand::Visa | Brand::Mastercard => 2,
            Brand::ApplePay => 3,
            Brand::StcPay => 4,
        }
    }

    pub fn settlement_mode(&self) -> SettlementMode {
        match self {
            Brand::StcPay => SettlementMode::Asynchronous,
            Brand::Mada | Brand::Visa | Brand::Mastercard | Brand::ApplePay => {
                SettlementMode::Synchronous
            }
        }
    }

    /// Returns true for brands that can be selected on the card surface.
    pub fn is_card_brand(&self) -> bool {
        !matches!(self, Brand::ApplePay)
    }

    /// Gateway brand code, e.g. `"MASTER"`.
    pub fn code(&self) -> &'static str {
        match self {
            Brand::Mada => "MADA",
            Brand::Visa => "VISA",
            Brand::Mastercard => "MASTER",
            Brand::ApplePay => "APPLE_PAY",
            Brand::StcPay => "STC_PAY",
        }
    }
}

impl std::fmt::Display for Brand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}
