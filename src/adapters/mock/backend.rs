//! Mock backend for testing.
//!
//! A scripted implementation of [`AuthBackend`] and [`ProfileStore`]:
//! tests configure results and failures, drive session-change events by
//! hand, and verify the calls the code under test made. Clones share
//! state, so a test can keep a handle while the synchronizer owns
//! another.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::mpsc;

use crate::domain::{Profile, ProfileUpsert, Session, SessionChange, SessionEventKind, UserIdentity};
use crate::error::{AuthError, StoreError};
use crate::traits::{AuthBackend, ProfileStore, SessionEvents, UserUpdate};

/// A recorded backend call for verification in tests.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    CurrentSession,
    SignIn { email: String },
    SignUp { email: String },
    SignOut,
    PasswordReset { email: String },
    UpdateUser { password_changed: bool },
    FetchProfile { id: String },
    UpsertProfile { id: String },
}

#[derive(Default)]
struct MockState {
    current_session: Option<Session>,
    current_session_error: Option<AuthError>,
    session_on_sign_in: Option<Session>,
    sign_in_error: Option<AuthError>,
    sign_up_error: Option<AuthError>,
    sign_out_error: Option<AuthError>,
    reset_error: Option<AuthError>,
    update_user_error: Option<AuthError>,
    fetch_error: Option<StoreError>,
    upsert_error: Option<StoreError>,
    fetch_delay: Option<Duration>,
    profiles: HashMap<String, Profile>,
    calls: Vec<RecordedCall>,
    events_tx: Option<mpsc::Sender<SessionChange>>,
}

/// Configurable mock backend.
#[derive(Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    /// Create a mock with nothing configured: no session, an empty
    /// profile store, and every operation succeeding.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a session for test scenarios.
    pub fn session(user_id: &str, email: &str) -> Session {
        Session {
            access_token: format!("at-{}", user_id),
            refresh_token: format!("rt-{}", user_id),
            token_type: "bearer".to_string(),
            expires_at: Some(Utc::now().timestamp() + 3600),
            user: UserIdentity {
                id: user_id.to_string(),
                email: Some(email.to_string()),
            },
        }
    }

    /// Session returned by `current_session` (the startup lookup).
    pub fn set_current_session(&self, session: Option<Session>) {
        self.state.lock().unwrap().current_session = session;
    }

    /// Make the startup lookup fail.
    pub fn set_current_session_error(&self, error: Option<AuthError>) {
        self.state.lock().unwrap().current_session_error = error;
    }

    /// Session to issue (and announce) when a sign-in succeeds.
    pub fn set_session_on_sign_in(&self, session: Session) {
        self.state.lock().unwrap().session_on_sign_in = Some(session);
    }

    /// Make sign-in fail.
    pub fn set_sign_in_error(&self, error: Option<AuthError>) {
        self.state.lock().unwrap().sign_in_error = error;
    }

    /// Make sign-up fail.
    pub fn set_sign_up_error(&self, error: Option<AuthError>) {
        self.state.lock().unwrap().sign_up_error = error;
    }

    /// Make sign-out fail.
    pub fn set_sign_out_error(&self, error: Option<AuthError>) {
        self.state.lock().unwrap().sign_out_error = error;
    }

    /// Make the password-reset trigger fail.
    pub fn set_reset_error(&self, error: Option<AuthError>) {
        self.state.lock().unwrap().reset_error = error;
    }

    /// Make user updates fail.
    pub fn set_update_user_error(&self, error: Option<AuthError>) {
        self.state.lock().unwrap().update_user_error = error;
    }

    /// Make profile fetches fail.
    pub fn set_fetch_profile_error(&self, error: Option<StoreError>) {
        self.state.lock().unwrap().fetch_error = error;
    }

    /// Make profile upserts fail.
    pub fn set_upsert_profile_error(&self, error: Option<StoreError>) {
        self.state.lock().unwrap().upsert_error = error;
    }

    /// Delay every profile fetch, for exercising in-flight races.
    pub fn set_fetch_delay(&self, delay: Option<Duration>) {
        self.state.lock().unwrap().fetch_delay = delay;
    }

    /// Seed a profile row.
    pub fn insert_profile(&self, profile: Profile) {
        self.state
            .lock()
            .unwrap()
            .profiles
            .insert(profile.id.clone(), profile);
    }

    /// Read a profile row straight out of the store.
    pub fn stored_profile(&self, id: &str) -> Option<Profile> {
        self.state.lock().unwrap().profiles.get(id).cloned()
    }

    /// Delete a profile row, as if removed by another client.
    pub fn remove_profile(&self, id: &str) {
        self.state.lock().unwrap().profiles.remove(id);
    }

    /// All recorded calls, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Forget recorded calls.
    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    /// Push a session-change event to the subscriber, as the real
    /// backend would on sign-in, sign-out, or token rotation.
    pub async fn push_event(&self, change: SessionChange) {
        {
            let mut state = self.state.lock().unwrap();
            state.current_session = change.session.clone();
        }
        self.send(change).await;
    }

    fn record(&self, call: RecordedCall) {
        self.state.lock().unwrap().calls.push(call);
    }

    async fn send(&self, change: SessionChange) {
        let tx = self.state.lock().unwrap().events_tx.clone();
        if let Some(tx) = tx {
            // The subscriber may have shut down already; that's fine.
            let _ = tx.send(change).await;
        }
    }
}

#[async_trait]
impl AuthBackend for MockBackend {
    async fn current_session(&self) -> Result<Option<Session>, AuthError> {
        self.record(RecordedCall::CurrentSession);
        let (error, session) = {
            let state = self.state.lock().unwrap();
            (state.current_session_error.clone(), state.current_session.clone())
        };
        match error {
            Some(err) => Err(err),
            None => Ok(session),
        }
    }

    fn subscribe_session_changes(&self) -> SessionEvents {
        let (tx, events) = SessionEvents::channel();
        self.state.lock().unwrap().events_tx = Some(tx);
        events
    }

    async fn sign_in_with_password(&self, email: &str, _password: &str) -> Result<(), AuthError> {
        self.record(RecordedCall::SignIn {
            email: email.to_string(),
        });
        let (error, session) = {
            let state = self.state.lock().unwrap();
            (state.sign_in_error.clone(), state.session_on_sign_in.clone())
        };
        if let Some(err) = error {
            return Err(err);
        }
        if let Some(session) = session {
            self.state.lock().unwrap().current_session = Some(session.clone());
            self.send(SessionChange::new(SessionEventKind::SignedIn, Some(session)))
                .await;
        }
        Ok(())
    }

    async fn sign_up(&self, email: &str, _password: &str) -> Result<(), AuthError> {
        self.record(RecordedCall::SignUp {
            email: email.to_string(),
        });
        match self.state.lock().unwrap().sign_up_error.clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.record(RecordedCall::SignOut);
        if let Some(err) = self.state.lock().unwrap().sign_out_error.clone() {
            return Err(err);
        }
        self.state.lock().unwrap().current_session = None;
        self.send(SessionChange::new(SessionEventKind::SignedOut, None))
            .await;
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError> {
        self.record(RecordedCall::PasswordReset {
            email: email.to_string(),
        });
        match self.state.lock().unwrap().reset_error.clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn update_current_user(&self, update: &UserUpdate) -> Result<(), AuthError> {
        self.record(RecordedCall::UpdateUser {
            password_changed: update.password.is_some(),
        });
        match self.state.lock().unwrap().update_user_error.clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ProfileStore for MockBackend {
    async fn fetch_profile(&self, id: &str) -> Result<Option<Profile>, StoreError> {
        self.record(RecordedCall::FetchProfile { id: id.to_string() });

        let delay = self.state.lock().unwrap().fetch_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let (error, profile) = {
            let state = self.state.lock().unwrap();
            (state.fetch_error.clone(), state.profiles.get(id).cloned())
        };
        match error {
            Some(err) => Err(err),
            None => Ok(profile),
        }
    }

    async fn upsert_profile(&self, record: &ProfileUpsert) -> Result<(), StoreError> {
        self.record(RecordedCall::UpsertProfile {
            id: record.id.clone(),
        });

        let mut state = self.state.lock().unwrap();
        if let Some(err) = state.upsert_error.clone() {
            return Err(err);
        }

        let row = state
            .profiles
            .entry(record.id.clone())
            .or_insert_with(|| {
                let mut fresh = Profile::new(record.id.clone());
                fresh.created_at = Some(record.updated_at);
                fresh
            });
        record.fields.apply_to(row);
        row.updated_at = Some(record.updated_at);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ProfilePatch;

    #[tokio::test]
    async fn test_calls_are_recorded_in_order() {
        let mock = MockBackend::new();
        mock.sign_in_with_password("a@x.com", "pw").await.unwrap();
        mock.fetch_profile("u1").await.unwrap();

        assert_eq!(
            mock.calls(),
            vec![
                RecordedCall::SignIn {
                    email: "a@x.com".to_string()
                },
                RecordedCall::FetchProfile {
                    id: "u1".to_string()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_sign_in_announces_configured_session() {
        let mock = MockBackend::new();
        let mut events = mock.subscribe_session_changes();
        mock.set_session_on_sign_in(MockBackend::session("u2", "b@x.com"));

        mock.sign_in_with_password("b@x.com", "pw").await.unwrap();

        let change = events.recv().await.unwrap();
        assert_eq!(change.kind, SessionEventKind::SignedIn);
        assert_eq!(change.session.unwrap().user.id, "u2");
        assert!(mock.current_session().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_sign_in_error_emits_nothing() {
        let mock = MockBackend::new();
        mock.set_session_on_sign_in(MockBackend::session("u2", "b@x.com"));
        mock.set_sign_in_error(Some(AuthError::Rejected {
            status: 400,
            message: "Invalid login credentials".to_string(),
        }));

        let err = mock.sign_in_with_password("b@x.com", "pw").await.unwrap_err();
        assert!(err.is_rejection());
        assert!(mock.current_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_then_fetch_roundtrip() {
        let mock = MockBackend::new();
        let record = ProfileUpsert {
            id: "u3".to_string(),
            updated_at: Utc::now(),
            fields: ProfilePatch {
                full_name: Some("A B".to_string()),
                ..Default::default()
            },
        };
        mock.upsert_profile(&record).await.unwrap();

        let profile = mock.fetch_profile("u3").await.unwrap().unwrap();
        assert_eq!(profile.id, "u3");
        assert_eq!(profile.full_name.as_deref(), Some("A B"));
        assert!(profile.created_at.is_some());
        assert!(profile.updated_at.is_some());
    }

    #[tokio::test]
    async fn test_upsert_merges_into_existing_row() {
        let mock = MockBackend::new();
        let mut existing = Profile::new("u3");
        existing.language = Some("en".to_string());
        mock.insert_profile(existing);

        let record = ProfileUpsert {
            id: "u3".to_string(),
            updated_at: Utc::now(),
            fields: ProfilePatch {
                country: Some("NG".to_string()),
                ..Default::default()
            },
        };
        mock.upsert_profile(&record).await.unwrap();

        let profile = mock.stored_profile("u3").unwrap();
        assert_eq!(profile.language.as_deref(), Some("en"));
        assert_eq!(profile.country.as_deref(), Some("NG"));
    }

    #[tokio::test]
    async fn test_fetch_error_injection() {
        let mock = MockBackend::new();
        mock.set_fetch_profile_error(Some(StoreError::Transport("reset".to_string())));

        let err = mock.fetch_profile("u1").await.unwrap_err();
        assert_eq!(err, StoreError::Transport("reset".to_string()));
    }
}
