//! Session and identity types issued by the auth backend.
//!
//! A [`Session`] is an opaque token bundle: the client stores and forwards
//! it but never refreshes or inspects the tokens. Token lifetime (refresh,
//! expiry) is controlled entirely by the backend.

use serde::{Deserialize, Serialize};

/// Minimal identity record for the authenticated user.
///
/// Backend-assigned and tied 1:1 to a [`Session`]: it exists only while
/// a session exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Stable unique id assigned by the backend.
    pub id: String,
    /// Email address the account was registered with.
    pub email: Option<String>,
}

/// Backend-issued proof of authentication.
///
/// The embedded [`UserIdentity`] guarantees that an identity is never
/// present without a session or vice versa.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token sent with authenticated requests.
    pub access_token: String,
    /// Token used by the backend to mint new access tokens.
    #[serde(default)]
    pub refresh_token: String,
    /// Token scheme, normally `"bearer"`.
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Expiry as a Unix timestamp (seconds), when the backend reports one.
    #[serde(default)]
    pub expires_at: Option<i64>,
    /// The identity this session authenticates.
    pub user: UserIdentity,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// Kind of session-change notification pushed by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionEventKind {
    /// Existing session restored at startup.
    InitialSession,
    /// A sign-in completed and a session was issued.
    SignedIn,
    /// The session ended (explicit sign-out or expiry).
    SignedOut,
    /// The backend rotated the session tokens.
    TokenRefreshed,
    /// Account attributes changed (e.g. password update).
    UserUpdated,
    /// A password-recovery session was opened from a reset link.
    PasswordRecovery,
}

impl SessionEventKind {
    /// Short name used in log output.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionEventKind::InitialSession => "INITIAL_SESSION",
            SessionEventKind::SignedIn => "SIGNED_IN",
            SessionEventKind::SignedOut => "SIGNED_OUT",
            SessionEventKind::TokenRefreshed => "TOKEN_REFRESHED",
            SessionEventKind::UserUpdated => "USER_UPDATED",
            SessionEventKind::PasswordRecovery => "PASSWORD_RECOVERY",
        }
    }
}

/// A session-change notification.
///
/// Handling is keyed off `session` presence, not `kind`, so delivery
/// order mistakes by the backend cannot wedge the client: replaying the
/// same change is idempotent.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionChange {
    /// What the backend says happened.
    pub kind: SessionEventKind,
    /// The session after the change, or `None` when it ended.
    pub session: Option<Session>,
}

impl SessionChange {
    /// Convenience constructor.
    pub fn new(kind: SessionEventKind, session: Option<Session>) -> Self {
        Self { kind, session }
    }
}
