//! Trait abstractions for dependency injection and testability.
//!
//! The synchronizer is generic over these traits, so production wiring
//! (REST adapter) and test wiring (mock backend) differ only in
//! construction.
//!
//! # Traits
//!
//! - [`AuthBackend`] - session-based authentication API plus the
//!   session-change subscription
//! - [`ProfileStore`] - fetch/upsert of profile records

pub mod backend;

pub use backend::{
    AuthBackend, ProfileStore, SessionEvents, UserUpdate, SESSION_EVENT_BUFFER,
};
