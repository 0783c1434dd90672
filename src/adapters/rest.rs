//! REST backend adapter.
//!
//! Production implementation of [`AuthBackend`] and [`ProfileStore`] over
//! a Supabase-style REST service: GoTrue-shaped auth endpoints under
//! `/auth/v1` and a PostgREST-shaped table API under `/rest/v1`.
//!
//! The adapter holds the current session client-side (the auth API is
//! stateless between calls), persists it via [`FileSessionStore`], and
//! pushes [`SessionChange`] notifications to its single subscriber
//! whenever the session it holds changes.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::BackendConfig;
use crate::domain::{
    Profile, ProfileUpsert, Session, SessionChange, SessionEventKind, UserIdentity,
};
use crate::error::{AuthError, StoreError};
use crate::traits::{AuthBackend, ProfileStore, SessionEvents, UserUpdate};

use super::file_session::FileSessionStore;

/// The profiles table name.
const PROFILES_TABLE: &str = "profiles";

/// Session payload as the auth API serves it.
#[derive(Debug, Deserialize)]
struct WireSession {
    access_token: String,
    #[serde(default)]
    refresh_token: String,
    #[serde(default = "default_token_type")]
    token_type: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: WireUser,
}

#[derive(Debug, Deserialize)]
struct WireUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl WireSession {
    fn into_session(self) -> Session {
        // The API reports expiry either absolutely or as a TTL.
        let expires_at = self
            .expires_at
            .or_else(|| self.expires_in.map(|ttl| Utc::now().timestamp() + ttl));
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            token_type: self.token_type,
            expires_at,
            user: UserIdentity {
                id: self.user.id,
                email: self.user.email,
            },
        }
    }
}

/// Pull a human-readable message out of an auth/store error body.
///
/// The API answers in a few shapes ({"error_description": ...},
/// {"msg": ...}, {"message": ...}, {"error": ...}); fall back to the raw
/// body when none match.
fn error_message(text: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(text) {
        for key in ["error_description", "msg", "message", "error"] {
            if let Some(message) = value.get(key).and_then(|v| v.as_str()) {
                return message.to_string();
            }
        }
    }
    let trimmed = text.trim();
    if trimmed.is_empty() {
        "Unknown error".to_string()
    } else {
        trimmed[..trimmed.len().min(200)].to_string()
    }
}

fn auth_transport(err: reqwest::Error) -> AuthError {
    AuthError::Transport(err.to_string())
}

fn store_transport(err: reqwest::Error) -> StoreError {
    StoreError::Transport(err.to_string())
}

/// REST implementation of the backend contract.
pub struct RestBackend {
    config: BackendConfig,
    client: reqwest::Client,
    /// The session this client currently holds. The auth API is
    /// stateless, so the bundle lives here between calls.
    session: Mutex<Option<Session>>,
    /// Sending half of the active session-change subscription.
    events_tx: Mutex<Option<mpsc::Sender<SessionChange>>>,
    /// Where the session survives restarts, if anywhere.
    session_store: Option<FileSessionStore>,
}

impl RestBackend {
    /// Create a backend with session persistence.
    ///
    /// The session file lives at `config.session_file` when set,
    /// otherwise at the default location under the home directory. A
    /// previously persisted session is restored immediately.
    pub fn new(config: BackendConfig) -> Self {
        let session_store = match &config.session_file {
            Some(path) => Some(FileSessionStore::at_path(path.clone())),
            None => FileSessionStore::in_home_dir(),
        };
        Self::with_store(config, session_store)
    }

    /// Create a backend that keeps the session in memory only.
    pub fn without_persistence(config: BackendConfig) -> Self {
        Self::with_store(config, None)
    }

    fn with_store(config: BackendConfig, session_store: Option<FileSessionStore>) -> Self {
        let restored = session_store.as_ref().and_then(|store| store.load());
        if restored.is_some() {
            debug!("restored persisted session");
        }
        Self {
            config,
            client: reqwest::Client::new(),
            session: Mutex::new(restored),
            events_tx: Mutex::new(None),
            session_store,
        }
    }

    /// The config this backend was built with.
    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Non-blocking startup connectivity check.
    ///
    /// Only logs; a failure here never prevents the app from starting.
    /// Returns `true` when the auth service answered. Skipped (and
    /// `false`) under a placeholder configuration.
    pub async fn probe(&self) -> bool {
        if self.config.is_placeholder() {
            warn!("placeholder backend configuration, skipping connection probe");
            return false;
        }

        let url = format!("{}/auth/v1/health", self.config.base_url);
        match self.with_headers(self.client.get(&url)).send().await {
            Ok(response) if response.status().is_success() => {
                info!("backend connection verified");
                true
            }
            Ok(response) => {
                warn!(status = response.status().as_u16(), "backend health check failed");
                false
            }
            Err(err) => {
                warn!(error = %err, "backend unreachable");
                false
            }
        }
    }

    /// Add the `apikey`, application-name, and bearer headers.
    ///
    /// The bearer token is the session's access token when signed in and
    /// the publishable key otherwise.
    fn with_headers(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let bearer = self
            .session
            .lock()
            .unwrap()
            .as_ref()
            .map(|s| s.access_token.clone())
            .unwrap_or_else(|| self.config.anon_key.clone());
        builder
            .header("apikey", &self.config.anon_key)
            .header("Authorization", format!("Bearer {}", bearer))
            .header("x-application-name", &self.config.app_name)
    }

    /// Store a new session value in memory and on disk.
    fn remember_session(&self, session: Option<Session>) {
        *self.session.lock().unwrap() = session.clone();
        if let Some(store) = &self.session_store {
            let ok = match &session {
                Some(session) => store.save(session),
                None => store.clear(),
            };
            if !ok {
                warn!("failed to persist session state");
            }
        }
    }

    /// Deliver a session change to the subscriber, if one is listening.
    async fn emit(&self, change: SessionChange) {
        let tx = self.events_tx.lock().unwrap().clone();
        if let Some(tx) = tx {
            if tx.send(change).await.is_err() {
                debug!("session event subscriber dropped");
            }
        }
    }
}

#[async_trait]
impl AuthBackend for RestBackend {
    async fn current_session(&self) -> Result<Option<Session>, AuthError> {
        Ok(self.session.lock().unwrap().clone())
    }

    fn subscribe_session_changes(&self) -> SessionEvents {
        let (tx, events) = SessionEvents::channel();
        *self.events_tx.lock().unwrap() = Some(tx);
        events
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let url = format!("{}/auth/v1/token?grant_type=password", self.config.base_url);
        let body = serde_json::json!({ "email": email, "password": password });

        let response = self
            .with_headers(self.client.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(auth_transport)?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(auth_transport)?;
        if !(200..300).contains(&status) {
            return Err(AuthError::Rejected {
                status,
                message: error_message(&text),
            });
        }

        let wire: WireSession =
            serde_json::from_str(&text).map_err(|e| AuthError::Decode(e.to_string()))?;
        let session = wire.into_session();

        self.remember_session(Some(session.clone()));
        self.emit(SessionChange::new(SessionEventKind::SignedIn, Some(session)))
            .await;
        Ok(())
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let url = format!("{}/auth/v1/signup", self.config.base_url);
        let body = serde_json::json!({ "email": email, "password": password });

        let response = self
            .with_headers(self.client.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(auth_transport)?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(auth_transport)?;
        if !(200..300).contains(&status) {
            return Err(AuthError::Rejected {
                status,
                message: error_message(&text),
            });
        }

        // With email confirmation enabled the response is just the new
        // user record and no session exists until the link is clicked.
        // An auto-confirming backend returns a session right away.
        if let Ok(wire) = serde_json::from_str::<WireSession>(&text) {
            let session = wire.into_session();
            self.remember_session(Some(session.clone()));
            self.emit(SessionChange::new(SessionEventKind::SignedIn, Some(session)))
                .await;
        } else {
            debug!(email, "account created, awaiting email confirmation");
        }
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        if self.session.lock().unwrap().is_none() {
            debug!("sign-out with no session held");
            return Ok(());
        }

        let url = format!("{}/auth/v1/logout", self.config.base_url);
        let response = self
            .with_headers(self.client.post(&url))
            .send()
            .await
            .map_err(auth_transport)?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let text = response.text().await.unwrap_or_default();
            return Err(AuthError::Rejected {
                status,
                message: error_message(&text),
            });
        }

        self.remember_session(None);
        self.emit(SessionChange::new(SessionEventKind::SignedOut, None))
            .await;
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let url = format!("{}/auth/v1/recover", self.config.base_url);
        let body = serde_json::json!({ "email": email });

        let response = self
            .with_headers(self.client.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(auth_transport)?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let text = response.text().await.unwrap_or_default();
            return Err(AuthError::Rejected {
                status,
                message: error_message(&text),
            });
        }
        Ok(())
    }

    async fn update_current_user(&self, update: &UserUpdate) -> Result<(), AuthError> {
        let url = format!("{}/auth/v1/user", self.config.base_url);

        let response = self
            .with_headers(self.client.put(&url))
            .json(update)
            .send()
            .await
            .map_err(auth_transport)?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(auth_transport)?;
        if !(200..300).contains(&status) {
            return Err(AuthError::Rejected {
                status,
                message: error_message(&text),
            });
        }

        // Keep the embedded identity in step with what the backend now
        // holds, then notify so the synchronizer can re-fetch.
        let session = {
            let mut guard = self.session.lock().unwrap();
            if let Some(session) = guard.as_mut() {
                if let Ok(user) = serde_json::from_str::<WireUser>(&text) {
                    session.user.email = user.email;
                }
            }
            guard.clone()
        };
        if let Some(session) = session {
            self.remember_session(Some(session.clone()));
            self.emit(SessionChange::new(
                SessionEventKind::UserUpdated,
                Some(session),
            ))
            .await;
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for RestBackend {
    async fn fetch_profile(&self, id: &str) -> Result<Option<Profile>, StoreError> {
        let url = format!("{}/rest/v1/{}", self.config.base_url, PROFILES_TABLE);
        let id_filter = format!("eq.{}", id);

        let response = self
            .with_headers(self.client.get(&url))
            .query(&[("id", id_filter.as_str()), ("select", "*")])
            .header("Accept", "application/vnd.pgrst.object+json")
            .send()
            .await
            .map_err(store_transport)?;

        let status = response.status().as_u16();
        // With the single-object representation the store answers 406
        // when the row does not exist. That is "no profile yet".
        if status == 406 {
            return Ok(None);
        }

        let text = response.text().await.map_err(store_transport)?;
        if !(200..300).contains(&status) {
            return Err(StoreError::Rejected {
                status,
                message: error_message(&text),
            });
        }

        let profile: Profile =
            serde_json::from_str(&text).map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(Some(profile))
    }

    async fn upsert_profile(&self, record: &ProfileUpsert) -> Result<(), StoreError> {
        let url = format!("{}/rest/v1/{}", self.config.base_url, PROFILES_TABLE);

        let response = self
            .with_headers(self.client.post(&url))
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(record)
            .send()
            .await
            .map_err(store_transport)?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let text = response.text().await.unwrap_or_default();
            return Err(StoreError::Rejected {
                status,
                message: error_message(&text),
            });
        }
        Ok(())
    }
}
