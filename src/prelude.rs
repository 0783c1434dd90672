//! Prelude module for convenient imports.
//!
//! Re-exports the types an application screen typically needs to read
//! authentication state and call account operations.
//!
//! # Usage
//!
//! ```ignore
//! use swapdeck::prelude::*;
//! ```

// Synchronizer and its observable state
pub use crate::sync::{AuthState, SessionSynchronizer};

// Domain types
pub use crate::domain::{
    Profile, ProfilePatch, Session, SessionChange, SessionEventKind, UserIdentity,
};

// Error kinds and user-facing classification
pub use crate::error::{
    classify_sign_in, classify_sign_up, AuthError, SignInFailure, SignUpFailure, StoreError,
    SyncError,
};

// Backend wiring
pub use crate::adapters::RestBackend;
pub use crate::config::BackendConfig;
pub use crate::traits::{AuthBackend, ProfileStore};
