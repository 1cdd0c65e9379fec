//! Payment session events.
//!
//! A session's state is never assigned directly; the controller records one
//! of these events and [`PaymentSession::apply`](crate::session::PaymentSession::apply)
//! derives the new state from it. The recorded list doubles as an audit
//! trail of how the session reached its outcome.

use chrono::{DateTime, Utc};
use common::SessionId;
use serde::{Deserialize, Serialize};

use crate::state::{FailureReason, TerminalOutcome};

/// Events that can occur during a payment session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum SessionEvent {
    /// `start()` accepted.
    SessionStarted(SessionStartedData),

    /// Checkout id requested from the backend.
    CheckoutIdRequested(TimestampData),

    /// Checkout id issued by the backend.
    CheckoutIdResolved(CheckoutIdData),

    /// Provider UI presented to the user.
    ProviderPresented(PresentedData),

    /// Provider reported a pending transaction.
    ConfirmationPending(PendingData),

    /// Backend status check answered.
    StatusChecked(StatusCheckedData),

    /// Session reached `Settled`.
    SessionSettled(SettledData),

    /// Session reached `Failed`.
    SessionFailed(FailedData),

    /// Session reached `Cancelled`.
    SessionCancelled(TimestampData),

    /// A signal arrived after the terminal transition and was discarded.
    SignalDropped(DroppedData),
}

impl SessionEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            SessionEvent::SessionStarted(_) => "SessionStarted",
            SessionEvent::CheckoutIdRequested(_) => "CheckoutIdRequested",
            SessionEvent::CheckoutIdResolved(_) => "CheckoutIdResolved",
            SessionEvent::ProviderPresented(_) => "ProviderPresented",
            SessionEvent::ConfirmationPending(_) => "ConfirmationPending",
            SessionEvent::StatusChecked(_) => "StatusChecked",
            SessionEvent::SessionSettled(_) => "SessionSettled",
            SessionEvent::SessionFailed(_) => "SessionFailed",
            SessionEvent::SessionCancelled(_) => "SessionCancelled",
            SessionEvent::SignalDropped(_) => "SignalDropped",
        }
    }

    /// Returns the terminal outcome carried by this event, if it is one of
    /// the three terminal events.
    pub fn terminal_outcome(&self) -> Option<TerminalOutcome> {
        match self {
            SessionEvent::SessionSettled(data) => Some(TerminalOutcome::Settled {
                reference: data.reference.clone(),
            }),
            SessionEvent::SessionFailed(data) => Some(TerminalOutcome::Failed {
                reason: data.reason,
            }),
            SessionEvent::SessionCancelled(_) => Some(TerminalOutcome::Cancelled),
            _ => None,
        }
    }
}

/// Data for SessionStarted event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStartedData {
    pub session_id: SessionId,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimestampData {
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutIdData {
    pub checkout_id: String,
    pub resolved_at: DateTime<Utc>,
}

/// Data for ProviderPresented event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresentedData {
    /// Hosted page URL for providers presented in an external browser.
    pub hosted_checkout_url: Option<String>,
    pub presented_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingData {
    pub resource_path: Option<String>,
    pub at: DateTime<Utc>,
}

/// Data for StatusChecked event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusCheckedData {
    /// Backend's own boolean flag.
    pub status: bool,
    /// Provider result code.
    pub code: String,
    /// Combined verdict.
    pub settled: bool,
    pub checked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettledData {
    pub reference: Option<String>,
    pub settled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedData {
    pub reason: FailureReason,
    pub failed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroppedData {
    /// Short description of the discarded signal.
    pub signal: String,
    pub dropped_at: DateTime<Utc>,
}

// Convenience constructors
impl SessionEvent {
    pub fn session_started(session_id: SessionId) -> Self {
        SessionEvent::SessionStarted(SessionStartedData {
            session_id,
            started_at: Utc::now(),
        })
    }

    pub fn checkout_id_requested() -> Self {
        SessionEvent::CheckoutIdRequested(TimestampData { at: Utc::now() })
    }

    pub fn checkout_id_resolved(checkout_id: impl Into<String>) -> Self {
        SessionEvent::CheckoutIdResolved(CheckoutIdData {
            checkout_id: checkout_id.into(),
            resolved_at: Utc::now(),
        })
    }

    pub fn provider_presented(hosted_checkout_url: Option<String>) -> Self {
        SessionEvent::ProviderPresented(PresentedData {
            hosted_checkout_url,
            presented_at: Utc::now(),
        })
    }

    pub fn confirmation_pending(resource_path: Option<String>) -> Self {
        SessionEvent::ConfirmationPending(PendingData {
            resource_path,
            at: Utc::now(),
        })
    }

    pub fn status_checked(status: bool, code: impl Into<String>, settled: bool) -> Self {
        SessionEvent::StatusChecked(StatusCheckedData {
            status,
            code: code.into(),
            settled,
            checked_at: Utc::now(),
        })
    }

    pub fn session_settled(reference: Option<String>) -> Self {
        SessionEvent::SessionSettled(SettledData {
            reference,
            settled_at: Utc::now(),
        })
    }

    pub fn session_failed(reason: FailureReason) -> Self {
        SessionEvent::SessionFailed(FailedData {
            reason,
            failed_at: Utc::now(),
        })
    }

    pub fn session_cancelled() -> Self {
        SessionEvent::SessionCancelled(TimestampData { at: Utc::now() })
    }

    pub fn signal_dropped(signal: impl Into<String>) -> Self {
        SessionEvent::SignalDropped(DroppedData {
            signal: signal.into(),
            dropped_at: Utc::now(),
        })
    }
}
