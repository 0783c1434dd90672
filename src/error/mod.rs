//! Error types for the client.
//!
//! Three failure classes cross the public API:
//!
//! - [`AuthError`] - the backend rejected a credential or account
//!   operation, or the request never reached a verdict
//! - [`StoreError`] - a record-store operation failed for a reason other
//!   than "record absent" (a missing record is `Ok(None)`, not an error)
//! - [`SyncError`] - a profile mutation failed, either on a local
//!   precondition (no signed-in user) or on the store write
//!
//! [`classify`] turns raw backend messages into user-facing reasons; it
//! is the only place substring matching on backend text is allowed.

mod auth;
pub mod classify;
mod store;
mod sync;

pub use auth::AuthError;
pub use classify::{classify_sign_in, classify_sign_up, SignInFailure, SignUpFailure};
pub use store::StoreError;
pub use sync::SyncError;
