//! Integration tests for the REST backend adapter.
//!
//! Drives the adapter against a scripted HTTP server and verifies the
//! endpoint shapes, header conventions, error mapping, and session
//! persistence.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use swapdeck::adapters::RestBackend;
use swapdeck::config::BackendConfig;
use swapdeck::domain::{ProfilePatch, ProfileUpsert, SessionEventKind};
use swapdeck::error::{classify_sign_in, AuthError, SignInFailure, StoreError};
use swapdeck::traits::{AuthBackend, ProfileStore, SessionEvents, UserUpdate};

fn config_for(server: &MockServer) -> BackendConfig {
    BackendConfig::new(server.uri(), "sb-publishable-test").with_app_name("swapdeck-test")
}

fn session_body() -> serde_json::Value {
    json!({
        "access_token": "at-live",
        "refresh_token": "rt-live",
        "token_type": "bearer",
        "expires_in": 3600,
        "user": { "id": "U1", "email": "a@x.com" }
    })
}

async fn recv_event(events: &mut SessionEvents) -> swapdeck::domain::SessionChange {
    tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("timed out waiting for session event")
        .expect("event channel closed")
}

/// Password sign-in hits the token endpoint with the standard headers,
/// stores the session, and announces it.
#[tokio::test]
async fn test_sign_in_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .and(header("apikey", "sb-publishable-test"))
        .and(header("x-application-name", "swapdeck-test"))
        .and(body_partial_json(json!({
            "email": "a@x.com",
            "password": "secret"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_body()))
        .expect(1)
        .mount(&server)
        .await;

    let backend = RestBackend::without_persistence(config_for(&server));
    let mut events = backend.subscribe_session_changes();

    backend.sign_in_with_password("a@x.com", "secret").await.unwrap();

    let change = recv_event(&mut events).await;
    assert_eq!(change.kind, SessionEventKind::SignedIn);
    let session = change.session.unwrap();
    assert_eq!(session.user.id, "U1");
    assert!(session.expires_at.is_some());

    let held = backend.current_session().await.unwrap().unwrap();
    assert_eq!(held.access_token, "at-live");
}

/// A rejection passes the backend's message through, classifiable by the
/// adapter function, and holds no session.
#[tokio::test]
async fn test_sign_in_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid login credentials"
        })))
        .mount(&server)
        .await;

    let backend = RestBackend::without_persistence(config_for(&server));
    let err = backend
        .sign_in_with_password("a@x.com", "wrong")
        .await
        .unwrap_err();

    assert_eq!(
        err,
        AuthError::Rejected {
            status: 400,
            message: "Invalid login credentials".to_string()
        }
    );
    assert_eq!(classify_sign_in(&err), SignInFailure::InvalidCredentials);
    assert!(backend.current_session().await.unwrap().is_none());
}

/// Sign-up with confirmation pending returns a bare user record: the
/// call succeeds but no session exists yet.
#[tokio::test]
async fn test_sign_up_pending_confirmation_holds_no_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "U9",
            "email": "new@x.com",
            "confirmation_sent_at": "2026-08-06T00:00:00Z"
        })))
        .mount(&server)
        .await;

    let backend = RestBackend::without_persistence(config_for(&server));
    backend.sign_up("new@x.com", "secret").await.unwrap();
    assert!(backend.current_session().await.unwrap().is_none());
}

/// Sign-out calls the logout endpoint with the session's bearer token,
/// clears the held session, and announces the end.
#[tokio::test]
async fn test_sign_out_clears_and_announces() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_body()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .and(header("Authorization", "Bearer at-live"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let backend = RestBackend::without_persistence(config_for(&server));
    let mut events = backend.subscribe_session_changes();

    backend.sign_in_with_password("a@x.com", "secret").await.unwrap();
    recv_event(&mut events).await;

    backend.sign_out().await.unwrap();
    let change = recv_event(&mut events).await;
    assert_eq!(change.kind, SessionEventKind::SignedOut);
    assert!(change.session.is_none());
    assert!(backend.current_session().await.unwrap().is_none());
}

/// Password reset posts to the recover endpoint and changes nothing.
#[tokio::test]
async fn test_send_password_reset() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/recover"))
        .and(body_partial_json(json!({ "email": "a@x.com" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let backend = RestBackend::without_persistence(config_for(&server));
    backend.send_password_reset("a@x.com").await.unwrap();
    assert!(backend.current_session().await.unwrap().is_none());
}

/// A password update without a session is the backend's call to refuse.
#[tokio::test]
async fn test_update_user_rejected_when_signed_out() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/auth/v1/user"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "msg": "invalid claim: missing sub claim"
        })))
        .mount(&server)
        .await;

    let backend = RestBackend::without_persistence(config_for(&server));
    let err = backend
        .update_current_user(&UserUpdate::password("next"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Rejected { status: 401, .. }));
}

/// Fetch returns the row under the single-object representation.
#[tokio::test]
async fn test_fetch_profile_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .and(query_param("id", "eq.U1"))
        .and(query_param("select", "*"))
        .and(header("Accept", "application/vnd.pgrst.object+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "U1",
            "full_name": "Uma One",
            "is_verified": true
        })))
        .mount(&server)
        .await;

    let backend = RestBackend::without_persistence(config_for(&server));
    let profile = backend.fetch_profile("U1").await.unwrap().unwrap();
    assert_eq!(profile.id, "U1");
    assert_eq!(profile.full_name.as_deref(), Some("Uma One"));
    assert!(profile.is_verified);
}

/// A 406 from the object representation means "no row": a valid
/// resolution, not an error.
#[tokio::test]
async fn test_fetch_profile_missing_row_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .respond_with(ResponseTemplate::new(406).set_body_json(json!({
            "code": "PGRST116",
            "message": "JSON object requested, multiple (or no) rows returned"
        })))
        .mount(&server)
        .await;

    let backend = RestBackend::without_persistence(config_for(&server));
    assert_eq!(backend.fetch_profile("U1").await.unwrap(), None);
}

/// Server failures map to a store error, distinct from "no row".
#[tokio::test]
async fn test_fetch_profile_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "message": "connection to database failed"
        })))
        .mount(&server)
        .await;

    let backend = RestBackend::without_persistence(config_for(&server));
    let err = backend.fetch_profile("U1").await.unwrap_err();
    assert_eq!(
        err,
        StoreError::Rejected {
            status: 500,
            message: "connection to database failed".to_string()
        }
    );
}

/// Upserts ask the store to merge duplicates and carry the row id and
/// patch fields.
#[tokio::test]
async fn test_upsert_profile_shape() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/profiles"))
        .and(header("Prefer", "resolution=merge-duplicates,return=minimal"))
        .and(body_partial_json(json!({
            "id": "U3",
            "full_name": "A B"
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let backend = RestBackend::without_persistence(config_for(&server));
    let record = ProfileUpsert {
        id: "U3".to_string(),
        updated_at: chrono::Utc::now(),
        fields: ProfilePatch {
            full_name: Some("A B".to_string()),
            ..Default::default()
        },
    };
    backend.upsert_profile(&record).await.unwrap();
}

/// A signed-in backend persists the session; a new instance over the
/// same file restores it.
#[tokio::test]
async fn test_session_persists_across_instances() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_body()))
        .mount(&server)
        .await;

    let temp_dir = tempfile::TempDir::new().unwrap();
    let session_file = temp_dir.path().join(".session.json");
    let config = config_for(&server).with_session_file(&session_file);

    let backend = RestBackend::new(config.clone());
    backend.sign_in_with_password("a@x.com", "secret").await.unwrap();
    assert!(session_file.exists());

    let restored = RestBackend::new(config);
    let session = restored.current_session().await.unwrap().unwrap();
    assert_eq!(session.user.id, "U1");
    assert_eq!(session.access_token, "at-live");
}
