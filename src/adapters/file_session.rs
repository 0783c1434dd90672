//! File-backed session persistence.
//!
//! Stores the current session bundle as JSON under `~/.swapdeck/` so a
//! restarted process resumes the signed-in state without a fresh sign-in.
//! The file holds tokens only; profile data is always fetched from the
//! backend.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::domain::Session;

/// The session directory name.
const SESSION_DIR: &str = ".swapdeck";

/// The session file name.
const SESSION_FILE: &str = ".session.json";

/// Loads, saves, and clears the persisted session.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    session_path: PathBuf,
}

impl FileSessionStore {
    /// Create a store at the default location under the home directory.
    ///
    /// Returns `None` if the home directory cannot be determined.
    pub fn in_home_dir() -> Option<Self> {
        let home = dirs::home_dir()?;
        Some(Self {
            session_path: home.join(SESSION_DIR).join(SESSION_FILE),
        })
    }

    /// Create a store at an explicit path.
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self {
            session_path: path.into(),
        }
    }

    /// Path of the session file.
    pub fn path(&self) -> &Path {
        &self.session_path
    }

    /// Load the persisted session.
    ///
    /// Returns `None` if the file is missing or unreadable; a corrupt
    /// file is treated as "no session" rather than an error.
    pub fn load(&self) -> Option<Session> {
        if !self.session_path.exists() {
            return None;
        }

        let file = File::open(&self.session_path).ok()?;
        let reader = BufReader::new(file);
        match serde_json::from_reader(reader) {
            Ok(session) => Some(session),
            Err(err) => {
                debug!(error = %err, "ignoring unreadable session file");
                None
            }
        }
    }

    /// Save a session, creating the parent directory if needed.
    ///
    /// Returns `true` on success.
    pub fn save(&self, session: &Session) -> bool {
        if let Some(parent) = self.session_path.parent() {
            if !parent.exists() && fs::create_dir_all(parent).is_err() {
                return false;
            }
        }

        let file = match File::create(&self.session_path) {
            Ok(f) => f,
            Err(_) => return false,
        };

        let mut writer = BufWriter::new(file);
        if serde_json::to_writer_pretty(&mut writer, session).is_err() {
            return false;
        }
        writer.flush().is_ok()
    }

    /// Remove the session file if it exists.
    ///
    /// Returns `true` if the file is gone afterwards.
    pub fn clear(&self) -> bool {
        if !self.session_path.exists() {
            return true;
        }
        fs::remove_file(&self.session_path).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserIdentity;
    use tempfile::TempDir;

    fn store_in(temp_dir: &TempDir) -> FileSessionStore {
        FileSessionStore::at_path(temp_dir.path().join(SESSION_DIR).join(SESSION_FILE))
    }

    fn sample_session() -> Session {
        Session {
            access_token: "at-1".to_string(),
            refresh_token: "rt-1".to_string(),
            token_type: "bearer".to_string(),
            expires_at: Some(1_800_000_000),
            user: UserIdentity {
                id: "u1".to_string(),
                email: Some("a@x.com".to_string()),
            },
        }
    }

    #[test]
    fn test_load_nonexistent() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        assert!(store.load().is_none());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);

        let session = sample_session();
        assert!(store.save(&session));
        assert_eq!(store.load(), Some(session));
    }

    #[test]
    fn test_save_creates_parent_dir() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);

        assert!(!store.path().parent().unwrap().exists());
        assert!(store.save(&sample_session()));
        assert!(store.path().parent().unwrap().exists());
    }

    #[test]
    fn test_clear() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);

        assert!(store.save(&sample_session()));
        assert!(store.path().exists());

        assert!(store.clear());
        assert!(!store.path().exists());
        assert!(store.load().is_none());

        // Clearing again is fine.
        assert!(store.clear());
    }

    #[test]
    fn test_load_invalid_json() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);

        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "not valid json").unwrap();

        assert!(store.load().is_none());
    }
}
