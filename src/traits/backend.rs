//! Backend trait abstractions.
//!
//! The synchronizer never talks to the network directly; it is handed an
//! implementation of these traits. Production code uses the REST adapter,
//! tests use the mock, and both stay swappable behind the same contract.

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::domain::{Profile, ProfileUpsert, Session, SessionChange};
use crate::error::{AuthError, StoreError};

/// Buffer size for the session-change channel.
///
/// Session changes are rare (sign in/out, token rotation); a small buffer
/// only has to absorb bursts while the consumer is awaiting a profile
/// fetch.
pub const SESSION_EVENT_BUFFER: usize = 16;

/// Receiving half of a session-change subscription.
///
/// Dropping it ends the subscription; the backend stops delivering.
#[derive(Debug)]
pub struct SessionEvents {
    rx: mpsc::Receiver<SessionChange>,
}

impl SessionEvents {
    /// Wrap a channel receiver handed out by a backend.
    pub fn new(rx: mpsc::Receiver<SessionChange>) -> Self {
        Self { rx }
    }

    /// Create a connected (sender, subscription) pair.
    pub fn channel() -> (mpsc::Sender<SessionChange>, Self) {
        let (tx, rx) = mpsc::channel(SESSION_EVENT_BUFFER);
        (tx, Self::new(rx))
    }

    /// Receive the next session change.
    ///
    /// Returns `None` once the backend has dropped its sending half.
    pub async fn recv(&mut self) -> Option<SessionChange> {
        self.rx.recv().await
    }
}

/// Attribute changes for the currently signed-in user.
///
/// Only the fields that are `Some` are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl UserUpdate {
    /// An update that only changes the password.
    pub fn password(new_password: impl Into<String>) -> Self {
        Self {
            password: Some(new_password.into()),
            email: None,
        }
    }
}

/// Session-based authentication API.
///
/// Credential operations return `Ok(())` on acceptance; the resulting
/// state change arrives through the session-change subscription, never as
/// a return value. That keeps the event stream the single source of truth
/// and avoids racing an operation's completion against event delivery.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// The session the backend currently holds for this client, if any.
    async fn current_session(&self) -> Result<Option<Session>, AuthError>;

    /// Subscribe to session changes.
    ///
    /// A backend supports one active subscription at a time; subscribing
    /// again replaces the previous one.
    fn subscribe_session_changes(&self) -> SessionEvents;

    /// Exchange email/password credentials for a session.
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<(), AuthError>;

    /// Register a new account.
    ///
    /// Succeeds even though the account is unusable until the user
    /// completes the confirmation email. No redirect target is sent; this
    /// client has no web callback surface.
    async fn sign_up(&self, email: &str, password: &str) -> Result<(), AuthError>;

    /// End the current session.
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Trigger a password-reset email. No redirect target is sent.
    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError>;

    /// Update attributes of the currently signed-in user.
    async fn update_current_user(&self, update: &UserUpdate) -> Result<(), AuthError>;
}

/// Record store for profile rows.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetch the profile owned by `id`.
    ///
    /// `Ok(None)` means no profile exists yet; that is a valid resolution,
    /// distinct from every transport or server failure.
    async fn fetch_profile(&self, id: &str) -> Result<Option<Profile>, StoreError>;

    /// Insert or update a profile row.
    async fn upsert_profile(&self, record: &ProfileUpsert) -> Result<(), StoreError>;
}
