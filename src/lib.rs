//! Swapdeck client - session and profile synchronization
//!
//! The account layer of the Swapdeck mobile app: owns the signed-in
//! session, keeps the user's profile record in step with it, and exposes
//! the asynchronous account operations the screens call.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod prelude;
pub mod sync;
pub mod traits;
