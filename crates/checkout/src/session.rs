//! Payment session: the unit of work driven by the controller.

use chrono::{DateTime, Utc};
use common::{Currency, Money, SessionId};
use serde::{Deserialize, Serialize};

use crate::events::SessionEvent;
use crate::provider::{Brand, ProviderKind};
use crate::state::{SessionState, TerminalOutcome};

/// One purchased line forwarded to providers that need the basket
/// (the BNPL hosted checkout).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: String,
    pub variation_name: String,
    pub variation_sku: String,
    pub quantity: u32,
}

impl LineItem {
    pub fn new(
        product_id: impl Into<String>,
        variation_name: impl Into<String>,
        variation_sku: impl Into<String>,
        quantity: u32,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            variation_name: variation_name.into(),
            variation_sku: variation_sku.into(),
            quantity,
        }
    }
}

/// What the caller wants to pay for, and how.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRequest {
    pub amount: Money,
    pub currency: Currency,
    pub provider: ProviderKind,
    #[serde(default)]
    pub brand: Option<Brand>,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
}

impl SessionRequest {
    pub fn new(amount: Money, currency: Currency, provider: ProviderKind) -> Self {
        Self {
            amount,
            currency,
            provider,
            brand: None,
            line_items: Vec::new(),
        }
    }

    pub fn with_brand(mut self, brand: Brand) -> Self {
        self.brand = Some(brand);
        self
    }

    pub fn with_line_items(mut self, items: Vec<LineItem>) -> Self {
        self.line_items = items;
        self
    }
}

/// A payment session.
///
/// Fields are only changed by [`apply`](Self::apply), so the state, the
/// terminal outcome and the `settled_once` guard always move together.
/// Amount and currency are fixed at construction.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentSession {
    id: SessionId,
    amount: Money,
    currency: Currency,
    provider_kind: ProviderKind,
    brand: Option<Brand>,
    line_items: Vec<LineItem>,
    external_checkout_id: Option<String>,
    external_resource_path: Option<String>,
    hosted_checkout_url: Option<String>,
    state: SessionState,
    terminal_outcome: Option<TerminalOutcome>,
    settled_once: bool,
    dropped_signals: u32,
    created_at: DateTime<Utc>,
    history: Vec<SessionEvent>,
}

impl PaymentSession {
    /// Creates an idle session for a validated request.
    pub fn new(request: SessionRequest) -> Self {
        Self {
            id: SessionId::new(),
            amount: request.amount,
            currency: request.currency,
            provider_kind: request.provider,
            brand: request.brand,
            line_items: request.line_items,
            external_checkout_id: None,
            external_resource_path: None,
            hosted_checkout_url: None,
            state: SessionState::Idle,
            terminal_outcome: None,
            settled_once: false,
            dropped_signals: 0,
            created_at: Utc::now(),
            history: Vec::new(),
        }
    }

    /// Applies an event and records it in the history.
    ///
    /// Returns `false` (and changes nothing) for any event other than
    /// `SignalDropped` once a terminal event has been applied. Only the
    /// first dropped signal is kept in the history; later ones are counted.
    pub fn apply(&mut self, event: SessionEvent) -> bool {
        if self.settled_once && !matches!(event, SessionEvent::SignalDropped(_)) {
            return false;
        }

        match &event {
            SessionEvent::SessionStarted(_) => {}
            SessionEvent::CheckoutIdRequested(_) => {
                self.state = SessionState::AwaitingCheckoutId;
            }
            SessionEvent::CheckoutIdResolved(data) => {
                if self.external_checkout_id.is_none() {
                    self.external_checkout_id = Some(data.checkout_id.clone());
                }
            }
            SessionEvent::ProviderPresented(data) => {
                self.state = SessionState::AwaitingProviderUi;
                if let Some(url) = &data.hosted_checkout_url {
                    self.hosted_checkout_url = Some(url.clone());
                }
            }
            SessionEvent::ConfirmationPending(data) => {
                self.state = SessionState::AwaitingAsyncConfirmation;
                if let Some(path) = &data.resource_path {
                    self.external_resource_path = Some(path.clone());
                }
            }
            SessionEvent::StatusChecked(_) => {}
            SessionEvent::SignalDropped(_) => {
                self.dropped_signals = self.dropped_signals.saturating_add(1);
                if self.dropped_signals > 1 {
                    return true;
                }
            }
            SessionEvent::SessionSettled(_)
            | SessionEvent::SessionFailed(_)
            | SessionEvent::SessionCancelled(_) => {
                if let Some(outcome) = event.terminal_outcome() {
                    self.state = outcome.state();
                    self.terminal_outcome = Some(outcome);
                    self.settled_once = true;
                }
            }
        }

        self.history.push(event);
        true
    }
}

// Query methods
impl PaymentSession {
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Signals that arrived after the terminal outcome.
    pub fn dropped_signals(&self) -> u32 {
        self.dropped_signals
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    pub fn provider_kind(&self) -> ProviderKind {
        self.provider_kind
    }

    pub fn brand(&self) -> Option<Brand> {
        self.brand
    }

    pub fn line_items(&self) -> &[LineItem] {
        &self.line_items
    }

    /// Checkout id issued by the backend, once resolved.
    pub fn external_checkout_id(&self) -> Option<&str> {
        self.external_checkout_id.as_deref()
    }

    /// Provider transaction reference used for status checks.
    pub fn external_resource_path(&self) -> Option<&str> {
        self.external_resource_path.as_deref()
    }

    pub fn hosted_checkout_url(&self) -> Option<&str> {
        self.hosted_checkout_url.as_deref()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn terminal_outcome(&self) -> Option<&TerminalOutcome> {
        self.terminal_outcome.as_ref()
    }

    /// True once the first terminal transition has been applied.
    pub fn settled_once(&self) -> bool {
        self.settled_once
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn history(&self) -> &[SessionEvent] {
        &self.history
    }

    /// Number of recorded events of the given type.
    pub fn count_events(&self, event_type: &str) -> usize {
        self.history
            .iter()
            .filter(|e| e.event_type() == event_type)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::FailureReason;

    fn card_session() -> PaymentSession {
        PaymentSession::new(
            SessionRequest::new(
                Money::from_minor(12000),
                Currency::new("SAR").unwrap(),
                ProviderKind::Card,
            )
            .with_brand(Brand::Visa),
        )
    }

    #[test]
    fn test_new_session_is_idle() {
        let session = card_session();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.terminal_outcome().is_none());
        assert!(!session.settled_once());
        assert!(session.history().is_empty());
        assert_eq!(session.amount(), Money::from_minor(12000));
        assert_eq!(session.currency().code(), "SAR");
    }

    #[test]
    fn test_happy_path_events() {
        let mut session = card_session();
        assert!(session.apply(SessionEvent::session_started(session.id())));
        assert!(session.apply(SessionEvent::checkout_id_requested()));
        assert_eq!(session.state(), SessionState::AwaitingCheckoutId);

        session.apply(SessionEvent::checkout_id_resolved("abc123"));
        assert_eq!(session.external_checkout_id(), Some("abc123"));

        session.apply(SessionEvent::provider_presented(None));
        assert_eq!(session.state(), SessionState::AwaitingProviderUi);

        session.apply(SessionEvent::session_settled(Some("ref-1".into())));
        assert_eq!(session.state(), SessionState::Settled);
        assert!(session.settled_once());
        assert_eq!(
            session.terminal_outcome(),
            Some(&TerminalOutcome::Settled {
                reference: Some("ref-1".into())
            })
        );
        assert_eq!(session.history().len(), 5);
    }

    #[test]
    fn test_checkout_id_is_cached_once() {
        let mut session = card_session();
        session.apply(SessionEvent::checkout_id_resolved("first"));
        session.apply(SessionEvent::checkout_id_resolved("second"));
        assert_eq!(session.external_checkout_id(), Some("first"));
    }

    #[test]
    fn test_pending_keeps_known_resource_path() {
        let mut session = card_session();
        session.apply(SessionEvent::provider_presented(None));
        session.apply(SessionEvent::confirmation_pending(Some("xyz".into())));
        session.apply(SessionEvent::confirmation_pending(None));
        assert_eq!(session.state(), SessionState::AwaitingAsyncConfirmation);
        assert_eq!(session.external_resource_path(), Some("xyz"));
    }

    #[test]
    fn test_terminal_outcome_is_never_overwritten() {
        let mut session = card_session();
        session.apply(SessionEvent::provider_presented(None));
        assert!(session.apply(SessionEvent::session_cancelled()));

        assert!(!session.apply(SessionEvent::session_settled(None)));
        assert!(!session.apply(SessionEvent::session_failed(
            FailureReason::ProviderDeclined
        )));
        assert!(!session.apply(SessionEvent::confirmation_pending(Some("late".into()))));

        assert_eq!(session.state(), SessionState::Cancelled);
        assert_eq!(session.terminal_outcome(), Some(&TerminalOutcome::Cancelled));
        assert!(session.external_resource_path().is_none());
    }

    #[test]
    fn test_dropped_signals_are_recorded_after_terminal() {
        let mut session = card_session();
        session.apply(SessionEvent::session_failed(FailureReason::Network));
        assert!(session.apply(SessionEvent::signal_dropped("completed")));
        assert_eq!(session.count_events("SignalDropped"), 1);
        assert_eq!(session.state(), SessionState::Failed);
    }

    #[test]
    fn test_repeated_dropped_signals_are_counted_not_stored() {
        let mut session = card_session();
        session.apply(SessionEvent::session_cancelled());
        let before = session.history().len();

        for _ in 0..1_000 {
            assert!(session.apply(SessionEvent::signal_dropped("completed")));
        }

        assert_eq!(session.dropped_signals(), 1_000);
        assert_eq!(session.count_events("SignalDropped"), 1);
        assert_eq!(session.history().len(), before + 1);
    }

    #[test]
    fn test_outcome_present_iff_terminal() {
        let mut session = card_session();
        let events = vec![
            SessionEvent::session_started(session.id()),
            SessionEvent::checkout_id_requested(),
            SessionEvent::checkout_id_resolved("abc"),
            SessionEvent::provider_presented(None),
            SessionEvent::confirmation_pending(Some("p".into())),
            SessionEvent::status_checked(true, "000.000.000", true),
            SessionEvent::session_settled(Some("p".into())),
        ];
        for event in events {
            session.apply(event);
            assert_eq!(
                session.terminal_outcome().is_some(),
                session.state().is_terminal()
            );
        }
    }
}
