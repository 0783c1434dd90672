//! Backend connection configuration.
//!
//! Mirrors how the mobile builds are configured: the backend URL and
//! publishable key come from the environment, with placeholder fallbacks
//! so a development build still constructs (and loudly logs) instead of
//! crashing at startup.

use std::env;
use std::path::PathBuf;

use tracing::warn;

/// Environment variable holding the backend base URL.
pub const BACKEND_URL_ENV: &str = "SWAPDECK_BACKEND_URL";

/// Environment variable holding the publishable (anon) API key.
pub const ANON_KEY_ENV: &str = "SWAPDECK_ANON_KEY";

/// Fallback URL used when the environment is not configured.
pub const PLACEHOLDER_URL: &str = "https://placeholder.swapdeck.app";

/// Fallback key used when the environment is not configured.
pub const PLACEHOLDER_ANON_KEY: &str = "sb-publishable-placeholder";

/// Application name sent as `x-application-name` on every request.
const DEFAULT_APP_NAME: &str = "swapdeck-mobile-app";

/// Connection settings for the REST backend.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendConfig {
    /// Base URL of the backend, without a trailing slash.
    pub base_url: String,
    /// Publishable API key, sent as the `apikey` header and as the bearer
    /// token for unauthenticated requests.
    pub anon_key: String,
    /// Value of the `x-application-name` header.
    pub app_name: String,
    /// Where to persist the session bundle, if anywhere.
    pub session_file: Option<PathBuf>,
}

impl BackendConfig {
    /// Build a config from explicit values.
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            anon_key: anon_key.into(),
            app_name: DEFAULT_APP_NAME.to_string(),
            session_file: None,
        }
    }

    /// Build a config from `SWAPDECK_BACKEND_URL` / `SWAPDECK_ANON_KEY`.
    ///
    /// Missing variables fall back to placeholder values so construction
    /// never fails; the condition is logged and [`is_placeholder`] lets
    /// callers skip network work.
    ///
    /// [`is_placeholder`]: BackendConfig::is_placeholder
    pub fn from_env() -> Self {
        let base_url = env::var(BACKEND_URL_ENV).unwrap_or_else(|_| {
            warn!("{} not set, using placeholder backend URL", BACKEND_URL_ENV);
            PLACEHOLDER_URL.to_string()
        });
        let anon_key = env::var(ANON_KEY_ENV).unwrap_or_else(|_| {
            warn!("{} not set, using placeholder key", ANON_KEY_ENV);
            PLACEHOLDER_ANON_KEY.to_string()
        });
        Self::new(base_url, anon_key)
    }

    /// Set the application name header value.
    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = app_name.into();
        self
    }

    /// Persist the session bundle at the given path.
    pub fn with_session_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_file = Some(path.into());
        self
    }

    /// True when the config still carries a placeholder value.
    pub fn is_placeholder(&self) -> bool {
        self.base_url == PLACEHOLDER_URL || self.anon_key == PLACEHOLDER_ANON_KEY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_new_strips_trailing_slash() {
        let config = BackendConfig::new("https://api.example.com/", "key");
        assert_eq!(config.base_url, "https://api.example.com");

        let config = BackendConfig::new("https://api.example.com", "key");
        assert_eq!(config.base_url, "https://api.example.com");
    }

    #[test]
    fn test_builders() {
        let config = BackendConfig::new("https://api.example.com", "key")
            .with_app_name("swapdeck-test")
            .with_session_file("/tmp/session.json");

        assert_eq!(config.app_name, "swapdeck-test");
        assert_eq!(
            config.session_file.as_deref(),
            Some(std::path::Path::new("/tmp/session.json"))
        );
    }

    #[test]
    #[serial]
    fn test_from_env_reads_variables() {
        env::set_var(BACKEND_URL_ENV, "https://live.example.com");
        env::set_var(ANON_KEY_ENV, "sb-publishable-live");

        let config = BackendConfig::from_env();
        assert_eq!(config.base_url, "https://live.example.com");
        assert_eq!(config.anon_key, "sb-publishable-live");
        assert!(!config.is_placeholder());

        env::remove_var(BACKEND_URL_ENV);
        env::remove_var(ANON_KEY_ENV);
    }

    #[test]
    #[serial]
    fn test_from_env_falls_back_to_placeholders() {
        env::remove_var(BACKEND_URL_ENV);
        env::remove_var(ANON_KEY_ENV);

        let config = BackendConfig::from_env();
        assert_eq!(config.base_url, PLACEHOLDER_URL);
        assert_eq!(config.anon_key, PLACEHOLDER_ANON_KEY);
        assert!(config.is_placeholder());
    }
}
