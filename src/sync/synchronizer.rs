//! The session/profile synchronizer.
//!
//! Owns the application's authentication state and keeps it consistent
//! with the backend: it restores the session at startup, follows the
//! backend's session-change events, and fetches the matching profile
//! record whenever the session changes. Account mutations (sign in/up/
//! out, password operations, profile writes) are exposed as async
//! operations that forward to the backend.
//!
//! Sign-in and sign-out deliberately do not touch state themselves; the
//! session-change event stream is the single source of truth, so an
//! operation's local completion can never race its own event delivery.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::domain::{ProfilePatch, ProfileUpsert, Session};
use crate::error::{AuthError, SyncError};
use crate::traits::{AuthBackend, ProfileStore, SessionEvents, UserUpdate};

use super::state::AuthState;

/// Client-side owner of authentication state.
///
/// Construct one per process with [`start`], share it (it is cheap to
/// clone), and read state through [`state`] or [`subscribe`]. The
/// background event task is shut down when the last handle is dropped.
///
/// [`start`]: SessionSynchronizer::start
/// [`state`]: SessionSynchronizer::state
/// [`subscribe`]: SessionSynchronizer::subscribe
pub struct SessionSynchronizer<B> {
    inner: Arc<Inner<B>>,
    state_rx: watch::Receiver<AuthState>,
    shutdown_tx: Arc<watch::Sender<bool>>,
}

impl<B> Clone for SessionSynchronizer<B> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            state_rx: self.state_rx.clone(),
            shutdown_tx: self.shutdown_tx.clone(),
        }
    }
}

struct Inner<B> {
    backend: Arc<B>,
    state_tx: watch::Sender<AuthState>,
    /// Bumped on every session transition. Profile fetches carry the
    /// generation that started them; a fetch whose generation no longer
    /// matches at resolution time is stale and its result is discarded.
    generation: AtomicU64,
}

impl<B> SessionSynchronizer<B>
where
    B: AuthBackend + ProfileStore + Send + Sync + 'static,
{
    /// Start the synchronizer.
    ///
    /// Subscribes to the backend's session-change events, then spawns the
    /// background task that performs the initial session lookup and
    /// processes events in arrival order. Returns immediately; observe
    /// `loading` through [`subscribe`] to know when the initial lookup
    /// has resolved.
    ///
    /// [`subscribe`]: SessionSynchronizer::subscribe
    pub fn start(backend: Arc<B>) -> Self {
        let (state_tx, state_rx) = watch::channel(AuthState::startup());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let inner = Arc::new(Inner {
            backend,
            state_tx,
            generation: AtomicU64::new(0),
        });

        // Subscribe before the initial lookup so a change arriving while
        // the lookup is in flight is queued, not missed.
        let events = inner.backend.subscribe_session_changes();
        tokio::spawn(run_event_loop(inner.clone(), events, shutdown_rx));

        Self {
            inner,
            state_rx,
            shutdown_tx: Arc::new(shutdown_tx),
        }
    }

    /// A snapshot of the current state.
    pub fn state(&self) -> AuthState {
        self.state_rx.borrow().clone()
    }

    /// Subscribe to state changes.
    ///
    /// The receiver always holds the latest snapshot; use
    /// `Receiver::changed` or `Receiver::wait_for` to follow updates.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state_rx.clone()
    }

    /// True when a session is present.
    pub fn is_authenticated(&self) -> bool {
        self.state_rx.borrow().is_authenticated()
    }

    /// Sign in with email/password credentials.
    ///
    /// Returns once the backend has accepted the credentials. State is
    /// not mutated here; it updates when the resulting session-change
    /// event is processed.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<(), AuthError> {
        debug!(email, "signing in");
        self.inner.backend.sign_in_with_password(email, password).await
    }

    /// Register a new account.
    ///
    /// Succeeds even though the account stays unusable until the user
    /// confirms their email out of band. No profile is created here.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<(), AuthError> {
        debug!(email, "signing up");
        self.inner.backend.sign_up(email, password).await
    }

    /// Sign out.
    ///
    /// State is cleared by the resulting session-change event, not here.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        debug!("signing out");
        self.inner.backend.sign_out().await
    }

    /// Trigger a password-reset email. Does not change state.
    pub async fn reset_password(&self, email: &str) -> Result<(), AuthError> {
        debug!(email, "requesting password reset");
        self.inner.backend.send_password_reset(email).await
    }

    /// Change the signed-in user's password.
    ///
    /// Password strength rules are entirely the backend's; this forwards
    /// and reports its verdict.
    pub async fn update_password(&self, new_password: &str) -> Result<(), AuthError> {
        self.inner
            .backend
            .update_current_user(&UserUpdate::password(new_password))
            .await
    }

    /// Write a partial profile update for the signed-in user.
    ///
    /// Upserts `{id: current user, ..patch, updated_at: now}` and then
    /// re-fetches the row so state reflects what the store actually
    /// holds (read-after-write, no optimistic merge). On upsert failure
    /// the stored profile is left unchanged.
    pub async fn update_profile(&self, patch: ProfilePatch) -> Result<(), SyncError> {
        let (user_id, generation) = self
            .current_user_and_generation()
            .ok_or(SyncError::NotAuthenticated)?;

        let record = ProfileUpsert {
            id: user_id.clone(),
            updated_at: Utc::now(),
            fields: patch,
        };
        self.inner.backend.upsert_profile(&record).await?;

        debug!(user_id = %user_id, "profile upserted, re-fetching");
        self.inner.fetch_and_store_profile(&user_id, generation).await;
        Ok(())
    }

    /// Re-fetch the signed-in user's profile.
    ///
    /// No-op while unauthenticated. A missing row stores `None`; any
    /// other store failure keeps the previous profile and is only logged
    /// (this is a fire-and-forget consistency recovery path).
    pub async fn refresh_profile(&self) {
        let Some((user_id, generation)) = self.current_user_and_generation() else {
            return;
        };
        self.inner.fetch_and_store_profile(&user_id, generation).await;
    }

    fn current_user_and_generation(&self) -> Option<(String, u64)> {
        let state = self.state_rx.borrow();
        let user_id = state.user()?.id.clone();
        Some((user_id, self.inner.generation.load(Ordering::SeqCst)))
    }
}

impl<B> SessionSynchronizer<B> {
    /// Stop the background event task explicitly.
    ///
    /// Dropping every handle has the same effect; this exists for
    /// deterministic teardown in tests and shutdown paths.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

impl<B> Inner<B>
where
    B: AuthBackend + ProfileStore + Send + Sync + 'static,
{
    /// Apply a session value (from the initial lookup or an event).
    ///
    /// Keyed off session presence, so replays and out-of-order deliveries
    /// converge on the same state.
    async fn apply_session(&self, session: Option<Session>) {
        match session {
            Some(session) => {
                let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
                let user_id = session.user.id.clone();
                self.state_tx.send_modify(|state| {
                    state.session = Some(session);
                    state.loading = true;
                });
                self.fetch_and_store_profile(&user_id, generation).await;
            }
            None => {
                self.generation.fetch_add(1, Ordering::SeqCst);
                self.state_tx.send_modify(|state| {
                    state.session = None;
                    state.profile = None;
                    state.loading = false;
                });
            }
        }
    }

    /// Fetch the profile for `user_id` and store the result, unless the
    /// session generation moved on while the fetch was in flight.
    async fn fetch_and_store_profile(&self, user_id: &str, generation: u64) {
        match self.backend.fetch_profile(user_id).await {
            Ok(profile) => {
                if profile.is_none() {
                    debug!(user_id, "no profile record yet");
                }
                self.store_if_current(generation, |state| {
                    state.profile = profile;
                    state.loading = false;
                });
            }
            Err(err) => {
                // Keep whatever we had; the next session change or
                // refresh will try again.
                warn!(user_id, error = %err, "profile fetch failed");
                self.store_if_current(generation, |state| {
                    state.loading = false;
                });
            }
        }
    }

    /// Run a state mutation only if `generation` is still current.
    ///
    /// The check happens inside the watch critical section, so a stale
    /// fetch can never clobber the state a newer session change produced.
    fn store_if_current(&self, generation: u64, mutate: impl FnOnce(&mut AuthState)) {
        self.state_tx.send_modify(|state| {
            if self.generation.load(Ordering::SeqCst) == generation {
                mutate(state);
            } else {
                debug!(generation, "discarding stale profile fetch result");
            }
        });
    }
}

/// Background task: initial session lookup, then the event loop.
async fn run_event_loop<B>(
    inner: Arc<Inner<B>>,
    mut events: SessionEvents,
    mut shutdown_rx: watch::Receiver<bool>,
) where
    B: AuthBackend + ProfileStore + Send + Sync + 'static,
{
    match inner.backend.current_session().await {
        Ok(session) => {
            debug!(restored = session.is_some(), "initial session lookup resolved");
            inner.apply_session(session).await;
        }
        Err(err) => {
            // Startup must not wedge the loading flag: treat a failed
            // lookup as "no session" and move on.
            warn!(error = %err, "initial session lookup failed");
            inner.apply_session(None).await;
        }
    }

    loop {
        tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    debug!("synchronizer shutting down");
                    break;
                }
            }
            change = events.recv() => {
                match change {
                    Some(change) => {
                        info!(
                            kind = change.kind.as_str(),
                            email = change
                                .session
                                .as_ref()
                                .and_then(|s| s.user.email.as_deref())
                                .unwrap_or(""),
                            "session changed"
                        );
                        inner.apply_session(change.session).await;
                    }
                    None => {
                        debug!("session event channel closed");
                        break;
                    }
                }
            }
        }
    }
}
