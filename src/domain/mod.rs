//! Domain objects shared across the client.
//!
//! These types mirror the records the backend issues and stores; they
//! carry no behavior beyond construction and (de)serialization.
//!
//! ## Domain Objects
//!
//! - [`Session`] / [`UserIdentity`] - Backend-issued authentication state
//! - [`SessionChange`] - Session-change notifications pushed by the backend
//! - [`Profile`] / [`ProfilePatch`] / [`ProfileUpsert`] - The mutable user record

pub mod profile;
pub mod session;

pub use profile::{Profile, ProfilePatch, ProfileUpsert};
pub use session::{Session, SessionChange, SessionEventKind, UserIdentity};
