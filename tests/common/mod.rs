//! Common test utilities for integration tests.

use std::time::Duration;

use swapdeck::sync::AuthState;
use tokio::sync::watch;

/// How long a test is willing to wait for a state transition.
pub const WAIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Wait until the observed state satisfies `predicate`, then return it.
///
/// Panics on timeout so a missed transition fails the test instead of
/// hanging it.
pub async fn wait_until(
    rx: &mut watch::Receiver<AuthState>,
    predicate: impl FnMut(&AuthState) -> bool,
) -> AuthState {
    let state = tokio::time::timeout(WAIT_TIMEOUT, rx.wait_for(predicate))
        .await
        .expect("timed out waiting for auth state transition")
        .expect("synchronizer state channel closed");
    state.clone()
}

/// Wait until the initial session lookup (and any profile fetch it
/// started) has resolved.
pub async fn wait_until_ready(rx: &mut watch::Receiver<AuthState>) -> AuthState {
    wait_until(rx, |state| !state.loading).await
}
