//! Record-store error types.
//!
//! Raised by [`ProfileStore`] operations when a fetch or upsert fails for
//! a reason other than "record absent". A missing record is a valid
//! resolution (`Ok(None)` from a fetch), never an error.
//!
//! [`ProfileStore`]: crate::traits::ProfileStore

use std::fmt;

/// A record-store operation failed.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// The store rejected the request (constraint violation, bad payload,
    /// denied row access).
    Rejected {
        /// HTTP status reported by the store.
        status: u16,
        /// Store-supplied message.
        message: String,
    },
    /// The request never produced a store verdict.
    Transport(String),
    /// The row payload could not be decoded.
    Decode(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Rejected { status, message } => {
                write!(f, "Store request rejected ({}): {}", status, message)
            }
            StoreError::Transport(msg) => write!(f, "Store request failed: {}", msg),
            StoreError::Decode(msg) => write!(f, "Invalid store response: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = StoreError::Rejected {
            status: 409,
            message: "duplicate key".to_string(),
        };
        assert_eq!(err.to_string(), "Store request rejected (409): duplicate key");

        let err = StoreError::Transport("timed out".to_string());
        assert_eq!(err.to_string(), "Store request failed: timed out");

        let err = StoreError::Decode("expected object".to_string());
        assert_eq!(err.to_string(), "Invalid store response: expected object");
    }

    #[test]
    fn test_clone_and_eq() {
        let err = StoreError::Transport("reset".to_string());
        assert_eq!(err.clone(), err);
    }
}
