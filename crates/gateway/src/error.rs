//! Gateway error types and their mapping onto collaborator errors.

use checkout::services::{BnplError, FinalizeError, IdentityError, StatusError, SubmissionError};
use thiserror::Error;

/// Errors that can occur talking to the backend.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The request did not complete (connect, timeout, reset).
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend refused the credentials.
    #[error("Not authenticated")]
    Unauthorized,

    /// The backend answered with a non-success HTTP status.
    #[error("Backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body could not be decoded.
    #[error("Invalid response body: {0}")]
    Decode(String),

    /// The configured base URL is not a valid URL.
    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),
}

/// Convenience type alias for gateway results.
pub type Result<T> = std::result::Result<T, GatewayError>;

impl GatewayError {
    /// Returns true when the backend may have acted on the request without
    /// us seeing its answer: transport failures, gateway and throttling
    /// statuses, and truncated or garbled bodies.
    pub fn is_indeterminate(&self) -> bool {
        match self {
            GatewayError::Transport(_) | GatewayError::Decode(_) => true,
            GatewayError::Status { status, .. } => matches!(status, 408 | 429 | 500..=599),
            GatewayError::Unauthorized | GatewayError::InvalidUrl(_) => false,
        }
    }
}

impl From<GatewayError> for IdentityError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::Unauthorized => IdentityError::NotAuthenticated,
            GatewayError::Transport(e) => IdentityError::Network(e.to_string()),
            other => IdentityError::BackendRejected(other.to_string()),
        }
    }
}

impl From<GatewayError> for StatusError {
    fn from(e: GatewayError) -> Self {
        if e.is_indeterminate() {
            StatusError::Network(e.to_string())
        } else {
            StatusError::Rejected(e.to_string())
        }
    }
}

impl From<GatewayError> for BnplError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::Transport(e) => BnplError::Network(e.to_string()),
            other => BnplError::Rejected(other.to_string()),
        }
    }
}

impl From<GatewayError> for SubmissionError {
    fn from(e: GatewayError) -> Self {
        if e.is_indeterminate() {
            SubmissionError::Network(e.to_string())
        } else {
            SubmissionError::Rejected(e.to_string())
        }
    }
}

impl From<GatewayError> for FinalizeError {
    fn from(e: GatewayError) -> Self {
        FinalizeError::Failed(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_mapping() {
        assert_eq!(
            IdentityError::from(GatewayError::Unauthorized),
            IdentityError::NotAuthenticated
        );
        assert!(matches!(
            IdentityError::from(GatewayError::Status {
                status: 500,
                body: String::new()
            }),
            IdentityError::BackendRejected(_)
        ));
    }

    fn status(code: u16) -> GatewayError {
        GatewayError::Status {
            status: code,
            body: String::new(),
        }
    }

    #[test]
    fn test_indeterminate_statuses() {
        for code in [408, 429, 500, 502, 503, 504] {
            assert!(status(code).is_indeterminate(), "HTTP {code}");
        }
        for code in [400, 404, 409, 422] {
            assert!(!status(code).is_indeterminate(), "HTTP {code}");
        }
        assert!(GatewayError::Decode("eof".into()).is_indeterminate());
        assert!(!GatewayError::Unauthorized.is_indeterminate());
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            StatusError::from(GatewayError::Decode("eof".into())),
            StatusError::Network(_)
        ));
        assert!(matches!(
            StatusError::from(status(504)),
            StatusError::Network(_)
        ));
        assert!(matches!(
            StatusError::from(status(400)),
            StatusError::Rejected(_)
        ));
    }

    #[test]
    fn test_token_submission_mapping() {
        assert!(matches!(
            SubmissionError::from(status(503)),
            SubmissionError::Network(_)
        ));
        assert!(matches!(
            SubmissionError::from(GatewayError::Unauthorized),
            SubmissionError::Rejected(_)
        ));
    }
}
