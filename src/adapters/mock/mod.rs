//! Mock implementations for testing.
//!
//! Test doubles for the backend traits, enabling unit and integration
//! testing without network access.
//!
//! # Available Mocks
//!
//! - [`MockBackend`] - scripted auth backend and profile store with
//!   recorded calls and injectable session-change events

pub mod backend;

pub use backend::{MockBackend, RecordedCall};
