//! Checkout error types.

use thiserror::Error;

use crate::state::SessionState;

/// Errors returned when the controller API is misused.
///
/// Payment failures are not errors: they end the session in
/// `Failed(reason)` and are reported through the outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    /// The session has already been started.
    #[error("Payment session has already been started")]
    AlreadyStarted,

    /// The session request cannot be paid as given.
    #[error("Invalid payment request: {0}")]
    InvalidRequest(String),

    /// Session is in an invalid state for the requested operation.
    #[error("Invalid session state: expected {expected}, actual {actual}")]
    InvalidState {
        expected: String,
        actual: SessionState,
    },
}

/// Convenience type alias for checkout results.
pub type Result<T> = std::result::Result<T, CheckoutError>;
