//! Session/profile synchronization.
//!
//! [`SessionSynchronizer`] owns the process-wide [`AuthState`] and is the
//! only writer to it; every screen reads the state and calls the account
//! operations through a synchronizer handle.

pub mod state;
pub mod synchronizer;

pub use state::AuthState;
pub use synchronizer::SessionSynchronizer;
