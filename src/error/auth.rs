//! Authentication-related error types.
//!
//! Errors raised when the backend rejects a credential or account
//! operation (sign in/up/out, password reset/update). The backend's
//! message text is passed through largely unclassified; mapping it to a
//! user-facing reason is the job of [`crate::error::classify`].

use std::fmt;

/// An auth operation failed.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthError {
    /// The backend rejected the operation (bad credentials, unconfirmed
    /// account, duplicate registration, invalid attributes).
    Rejected {
        /// HTTP status reported by the backend.
        status: u16,
        /// Backend-supplied message, passed through verbatim.
        message: String,
    },
    /// The request never produced a backend verdict (connect, DNS,
    /// timeout).
    Transport(String),
    /// The backend answered but the response body could not be decoded.
    Decode(String),
}

impl AuthError {
    /// The backend's message text, when one exists.
    ///
    /// This is the input to [`crate::error::classify`]; transport and
    /// decode failures carry their own description instead.
    pub fn message(&self) -> &str {
        match self {
            AuthError::Rejected { message, .. } => message,
            AuthError::Transport(msg) => msg,
            AuthError::Decode(msg) => msg,
        }
    }

    /// True when the backend itself refused the operation, as opposed to
    /// the request failing in transit.
    pub fn is_rejection(&self) -> bool {
        matches!(self, AuthError::Rejected { .. })
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::Rejected { status, message } => {
                write!(f, "Auth request rejected ({}): {}", status, message)
            }
            AuthError::Transport(msg) => write!(f, "Auth request failed: {}", msg),
            AuthError::Decode(msg) => write!(f, "Invalid auth response: {}", msg),
        }
    }
}

impl std::error::Error for AuthError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_display() {
        let err = AuthError::Rejected {
            status: 400,
            message: "Invalid login credentials".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Auth request rejected (400): Invalid login credentials"
        );
        assert!(err.is_rejection());
        assert_eq!(err.message(), "Invalid login credentials");
    }

    #[test]
    fn test_transport_display() {
        let err = AuthError::Transport("connection refused".to_string());
        assert_eq!(err.to_string(), "Auth request failed: connection refused");
        assert!(!err.is_rejection());
    }

    #[test]
    fn test_decode_display() {
        let err = AuthError::Decode("missing field `access_token`".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid auth response: missing field `access_token`"
        );
        assert!(!err.is_rejection());
    }

    #[test]
    fn test_clone_and_eq() {
        let err = AuthError::Rejected {
            status: 422,
            message: "weak password".to_string(),
        };
        assert_eq!(err.clone(), err);
    }
}
