//! Payment orchestration core.
//!
//! This crate drives one purchase through exactly one of several
//! heterogeneous payment providers to a single terminal outcome:
//! 1. Resolve a backend checkout id (providers that need one)
//! 2. Initiate and present the provider
//! 3. Interpret its completion signals, reconciling pending transactions
//!    against the backend status endpoint
//!
//! The first terminal signal wins. Order finalization runs once, only for
//! settled sessions.

pub mod adapters;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod provider;
pub mod reconciler;
pub mod redirect;
pub mod result_codes;
pub mod services;
pub mod session;
pub mod signal;
pub mod state;

pub use adapters::ProviderAdapter;
pub use config::{BnplConfig, CardConfig, ProviderMode, ProviderSettings, WalletConfig};
pub use controller::{PaymentSessionController, Progress};
pub use error::CheckoutError;
pub use events::SessionEvent;
pub use provider::{Brand, ProviderKind, SettlementMode};
pub use reconciler::{StatusReconciler, Verdict};
pub use redirect::{RedirectOutcome, RedirectTemplates};
pub use result_codes::{CodeCategory, is_success_code, match_success_code};
pub use services::{InMemoryServices, PaymentServices};
pub use session::{LineItem, PaymentSession, SessionRequest};
pub use signal::{Presentation, ProviderSignal, RawSignal, Surface};
pub use state::{FailureReason, SessionState, TerminalOutcome};
