//! Observable authentication state.

use crate::domain::{Profile, Session, UserIdentity};

/// Snapshot of the client's authentication state.
///
/// One instance exists per [`SessionSynchronizer`]; everything else in
/// the application observes it read-only through the synchronizer's watch
/// channel. The identity is derived from the session, so "identity
/// without session" is unrepresentable.
///
/// [`SessionSynchronizer`]: crate::sync::SessionSynchronizer
#[derive(Debug, Clone, PartialEq)]
pub struct AuthState {
    /// The current session, if signed in.
    pub session: Option<Session>,
    /// The signed-in user's profile. May be absent even while
    /// authenticated (not created yet).
    pub profile: Option<Profile>,
    /// True from process start until the initial session lookup has
    /// resolved and, if a session exists, the first profile fetch has
    /// been attempted. Also true while a session change is being
    /// followed by its profile fetch.
    pub loading: bool,
}

impl AuthState {
    /// The state a synchronizer starts in, before the initial session
    /// lookup resolves.
    pub fn startup() -> Self {
        Self {
            session: None,
            profile: None,
            loading: true,
        }
    }

    /// The identity tied to the current session, if any.
    pub fn user(&self) -> Option<&UserIdentity> {
        self.session.as_ref().map(|s| &s.user)
    }

    /// True when a session (and therefore an identity) is present.
    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }
}

impl Default for AuthState {
    fn default() -> Self {
        Self::startup()
    }
}
