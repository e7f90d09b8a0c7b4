//! Persisted session flags
//!
//! Remembers "stay signed in" state across runs: `rememberMe`, `savedEmail`,
//! `loggedIn` and `userType`, stored as JSON in the data directory. The
//! file is read once when a page mounts and written on explicit changes.
//! There is a single writer, so no locking is done.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name inside the data directory
pub const SESSION_FILE: &str = "session.json";

/// Errors from the session store
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("IO error on {path:?}: {error}")]
    Io {
        path: PathBuf,
        error: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Role the backend assigned to the signed-in user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserType {
    Administrator,
    Employee,
    Patient,
}

impl UserType {
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim().to_lowercase().as_str() {
            "administrador" | "admin" => Some(UserType::Administrator),
            "empleado" | "employee" => Some(UserType::Employee),
            "paciente" | "patient" => Some(UserType::Patient),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Administrator => "administrador",
            UserType::Employee => "empleado",
            UserType::Patient => "paciente",
        }
    }
}

/// Stored keys
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    #[serde(default)]
    pub remember_me: bool,
    #[serde(default)]
    pub saved_email: Option<String>,
    #[serde(default)]
    pub logged_in: bool,
    #[serde(default)]
    pub user_type: Option<String>,
}

/// Session flags backed by a JSON file
#[derive(Debug)]
pub struct SessionStore {
    path: Option<PathBuf>,
    data: SessionData,
}

impl SessionStore {
    /// Open the store in `dir`, reading any saved state
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, SessionError> {
        let path = dir.as_ref().join(SESSION_FILE);

        let data = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(data) => data,
                Err(e) => {
                    tracing::warn!(path = ?path, error = %e, "Discarding unreadable session file");
                    SessionData::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => SessionData::default(),
            Err(error) => return Err(SessionError::Io { path, error }),
        };

        Ok(Self {
            path: Some(path),
            data,
        })
    }

    /// A store that never touches disk
    pub fn in_memory() -> Self {
        Self {
            path: None,
            data: SessionData::default(),
        }
    }

    pub fn data(&self) -> &SessionData {
        &self.data
    }

    /// Email to prefill on the login form, if the user asked to be remembered
    pub fn remembered_email(&self) -> Option<&str> {
        if self.data.remember_me {
            self.data.saved_email.as_deref()
        } else {
            None
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.data.logged_in
    }

    pub fn user_type(&self) -> Option<UserType> {
        self.data.user_type.as_deref().and_then(UserType::parse)
    }

    /// Toggle "remember me"; turning it off forgets the email
    pub fn set_remember_me(&mut self, remember: bool, email: &str) -> Result<(), SessionError> {
        self.data.remember_me = remember;
        self.data.saved_email = if remember && !email.trim().is_empty() {
            Some(email.trim().to_string())
        } else {
            None
        };
        self.persist()
    }

    /// Mark the session as signed in
    pub fn record_login(&mut self, user_type: Option<&str>) -> Result<(), SessionError> {
        self.data.logged_in = true;
        self.data.user_type = user_type.map(str::to_string);
        self.persist()
    }

    /// Clear sign-in flags, keeping "remember me"
    pub fn logout(&mut self) -> Result<(), SessionError> {
        self.data.logged_in = false;
        self.data.user_type = None;
        self.persist()
    }

    fn persist(&self) -> Result<(), SessionError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|error| SessionError::Io {
                path: parent.to_path_buf(),
                error,
            })?;
        }

        let content = serde_json::to_string_pretty(&self.data)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, content).map_err(|error| SessionError::Io {
            path: tmp.clone(),
            error,
        })?;
        std::fs::rename(&tmp, path).map_err(|error| SessionError::Io {
            path: path.clone(),
            error,
        })?;

        tracing::debug!(path = ?path, "Session saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let store = SessionStore::open(dir.path()).unwrap();
        assert_eq!(store.data(), &SessionData::default());
        assert_eq!(store.remembered_email(), None);
    }

    #[test]
    fn test_remember_me_round_trip_uses_browser_keys() {
        let dir = tempdir().unwrap();
        let mut store = SessionStore::open(dir.path()).unwrap();
        store.set_remember_me(true, "ana@clinica.mx").unwrap();
        store.record_login(Some("paciente")).unwrap();

        let raw = std::fs::read_to_string(dir.path().join(SESSION_FILE)).unwrap();
        assert!(raw.contains("\"rememberMe\": true"));
        assert!(raw.contains("\"savedEmail\""));
        assert!(raw.contains("\"loggedIn\": true"));
        assert!(raw.contains("\"userType\": \"paciente\""));

        let reopened = SessionStore::open(dir.path()).unwrap();
        assert_eq!(reopened.remembered_email(), Some("ana@clinica.mx"));
        assert_eq!(reopened.user_type(), Some(UserType::Patient));
    }

    #[test]
    fn test_forget_and_logout() {
        let dir = tempdir().unwrap();
        let mut store = SessionStore::open(dir.path()).unwrap();
        store.set_remember_me(true, "ana@clinica.mx").unwrap();
        store.set_remember_me(false, "ana@clinica.mx").unwrap();
        assert_eq!(store.data().saved_email, None);

        store.record_login(Some("administrador")).unwrap();
        store.logout().unwrap();
        assert!(!store.is_logged_in());
        assert_eq!(store.user_type(), None);
    }

    #[test]
    fn test_corrupt_file_is_discarded() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(SESSION_FILE), "{not json").unwrap();
        let store = SessionStore::open(dir.path()).unwrap();
        assert!(!store.is_logged_in());
    }

    #[test]
    fn test_in_memory_store() {
        let mut store = SessionStore::in_memory();
        store.set_remember_me(true, "x@y.com").unwrap();
        assert_eq!(store.remembered_email(), Some("x@y.com"));
    }

    #[test]
    fn test_user_type_parse() {
        assert_eq!(UserType::parse("Administrador"), Some(UserType::Administrator));
        assert_eq!(UserType::parse("empleado"), Some(UserType::Employee));
        assert_eq!(UserType::parse("visitante"), None);
    }
}
