//! Payment session state machine.

use serde::{Deserialize, Serialize};

/// The state of a payment session in its lifecycle.
///
/// State transitions:
/// ```text
/// Idle ──► AwaitingCheckoutId ──► AwaitingProviderUi ──┬──► Settled
///  │              │                      │             └──► AwaitingAsyncConfirmation ──┬──► Settled
///  │              │                      │                                              └──► Failed
///  └──────────────┴──────────────────────┴──► Failed | Cancelled (from any non-terminal state)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SessionState {
    /// Session created, `start()` not yet called.
    #[default]
    Idle,

    /// Waiting for the backend to issue a checkout id.
    AwaitingCheckoutId,

    /// Provider UI has been presented; waiting for its signal.
    AwaitingProviderUi,

    /// Provider reported a pending transaction; waiting for a redirect
    /// verdict or a status check.
    AwaitingAsyncConfirmation,

    /// Funds confirmed (terminal state).
    Settled,

    /// Payment did not go through (terminal state).
    Failed,

    /// User dismissed the provider UI (terminal state).
    Cancelled,
}

impl SessionState {
    /// Returns true if the session can be started.
    pub fn can_start(&self) -> bool {
        matches!(self, SessionState::Idle)
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::Settled | SessionState::Failed | SessionState::Cancelled
        )
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "Idle",
            SessionState::AwaitingCheckoutId => "AwaitingCheckoutId",
            SessionState::AwaitingProviderUi => "AwaitingProviderUi",
            SessionState::AwaitingAsyncConfirmation => "AwaitingAsyncConfirmation",
            SessionState::Settled => "Settled",
            SessionState::Failed => "Failed",
            SessionState::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a session ended in `Failed`.
///
/// Every provider- or backend-specific error is folded into one of these
/// kinds before it leaves the core; callers map them to localized text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// No checkout id could be obtained (auth or network).
    IdentityError,
    /// The provider is unavailable on this device or configuration.
    NotSupported,
    /// The provider reported a hard failure.
    ProviderDeclined,
    /// The backend refused the request.
    BackendRejected,
    /// A request failed before the provider was charged.
    Network,
    /// The status check failed; the charge may or may not have happened.
    AmbiguousTimeout,
}

impl FailureReason {
    /// Returns the reason as its wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::IdentityError => "identity_error",
            FailureReason::NotSupported => "not_supported",
            FailureReason::ProviderDeclined => "provider_declined",
            FailureReason::BackendRejected => "backend_rejected",
            FailureReason::Network => "network",
            FailureReason::AmbiguousTimeout => "ambiguous_timeout",
        }
    }

    /// Returns true if the payment may still have gone through and the
    /// caller should offer a manual status check instead of a failure.
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, FailureReason::AmbiguousTimeout)
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single outcome a session ends with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TerminalOutcome {
    /// Payment confirmed. `reference` is the provider's terminal reference
    /// (resource path, BNPL payment id), absent for cash.
    Settled { reference: Option<String> },
    /// Payment failed for the given reason.
    Failed { reason: FailureReason },
    /// User walked away. Not an error.
    Cancelled,
}

impl TerminalOutcome {
    /// Returns the terminal state this outcome corresponds to.
    pub fn state(&self) -> SessionState {
        match self {
            TerminalOutcome::Settled { .. } => SessionState::Settled,
            TerminalOutcome::Failed { .. } => SessionState::Failed,
            TerminalOutcome::Cancelled => SessionState::Cancelled,
        }
    }

    /// Returns true if the outcome is `Settled`.
    pub fn is_settled(&self) -> bool {
        matches!(self, TerminalOutcome::Settled { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_idle() {
        assert_eq!(SessionState::default(), SessionState::Idle);
    }

    #[test]
    fn test_can_start() {
        assert!(SessionState::Idle.can_start());
        assert!(!SessionState::AwaitingCheckoutId.can_start());
        assert!(!SessionState::AwaitingProviderUi.can_start());
        assert!(!SessionState::Settled.can_start());
    }

    #[test]
    fn test_terminal_states() {
        assert!(!SessionState::Idle.is_terminal());
        assert!(!SessionState::AwaitingCheckoutId.is_terminal());
        assert!(!SessionState::AwaitingProviderUi.is_terminal());
        assert!(!SessionState::AwaitingAsyncConfirmation.is_terminal());
        assert!(SessionState::Settled.is_terminal());
        assert!(SessionState::Failed.is_terminal());
        assert!(SessionState::Cancelled.is_terminal());
    }

    #[test]
    fn test_outcome_maps_to_state() {
        let settled = TerminalOutcome::Settled { reference: None };
        assert_eq!(settled.state(), SessionState::Settled);
        assert!(settled.is_settled());
        assert_eq!(
            TerminalOutcome::Failed {
                reason: FailureReason::Network
            }
            .state(),
            SessionState::Failed
        );
        assert_eq!(TerminalOutcome::Cancelled.state(), SessionState::Cancelled);
    }

    #[test]
    fn test_failure_reason_wire_names() {
        let json = serde_json::to_string(&FailureReason::AmbiguousTimeout).unwrap();
        assert_eq!(json, "\"ambiguous_timeout\"");
        assert_eq!(FailureReason::IdentityError.to_string(), "identity_error");
        assert!(FailureReason::AmbiguousTimeout.is_ambiguous());
        assert!(!FailureReason::ProviderDeclined.is_ambiguous());
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome = TerminalOutcome::Failed {
            reason: FailureReason::ProviderDeclined,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["outcome"], "failed");
        assert_eq!(json["reason"], "provider_declined");
        let back: TerminalOutcome = serde_json::from_value(json).unwrap();
        assert_eq!(back, outcome);
    }
}
