//! Signals flowing between provider UIs, adapters and the controller.

use serde::{Deserialize, Serialize};

use crate::config::ProviderMode;
use crate::provider::{Brand, SettlementMode};
use crate::state::FailureReason;

/// A raw completion signal as reported by a presented provider UI.
///
/// Each adapter decides what a raw signal means for its provider; the
/// controller only ever sees the normalized [`ProviderSignal`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RawSignal {
    /// The embedded checkout surface finished a transaction.
    Completed {
        #[serde(default)]
        resource_path: Option<String>,
    },
    /// The provider surface reported an error.
    Failed {
        #[serde(default)]
        code: Option<String>,
        #[serde(default)]
        message: Option<String>,
    },
    /// The native wallet sheet authorized a payment and produced a token.
    WalletAuthorized { token: String },
    /// The external browser navigated to a URL.
    Redirect { url: String },
    /// The user closed the presented UI.
    Dismissed,
}

impl RawSignal {
    /// Short name used in logs and the session history.
    pub fn name(&self) -> &'static str {
        match self {
            RawSignal::Completed { .. } => "completed",
            RawSignal::Failed { .. } => "failed",
            RawSignal::WalletAuthorized { .. } => "wallet_authorized",
            RawSignal::Redirect { .. } => "redirect",
            RawSignal::Dismissed => "dismissed",
        }
    }
}

/// The closed set of normalized outcomes an adapter can report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderSignal {
    /// Definitive success with the provider's terminal reference.
    Success { reference: Option<String> },
    /// Transaction exists but needs confirmation.
    Pending { resource_path: Option<String> },
    /// Definitive failure.
    Failed(FailureReason),
    /// User walked away.
    Cancelled,
}

/// Result of an adapter's initiation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Initiation {
    /// Nothing else to create; the UI can be presented.
    Ready,
    /// A hosted page was created and must be opened in a browser.
    HostedPage { checkout_url: String },
}

/// Result of an adapter's presentation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Surface {
    /// A UI the user has to interact with.
    Show(Presentation),
    /// No UI; the adapter already knows the result.
    Resolved(ProviderSignal),
}

/// What the caller must put on screen for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "surface", rename_all = "snake_case")]
pub enum Presentation {
    /// Embedded card checkout scoped to one brand.
    EmbeddedCheckout {
        checkout_id: String,
        brand: Brand,
        settlement: SettlementMode,
        mode: ProviderMode,
    },
    /// Native tap-to-pay sheet.
    WalletSheet {
        checkout_id: String,
        merchant_id: String,
        country_code: String,
        currency: String,
        amount: String,
        networks: Vec<Brand>,
        mode: ProviderMode,
    },
    /// External browser opened on a hosted page.
    ExternalBrowser { url: String },
}

impl Presentation {
    /// Returns true for surfaces whose result only arrives through the
    /// external browser.
    pub fn is_external(&self) -> bool {
        matches!(self, Presentation::ExternalBrowser { .. })
    }
}
