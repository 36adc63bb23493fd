//! Persisted session state.
//!
//! The session lives in a flat string key/value namespace, one fixed key per
//! field. [`SessionStore`] is the raw namespace; [`SessionState`] is the typed
//! view the client and views depend on.
//!
//! Writes are not transactional. A store cleared halfway (or edited by hand)
//! can yield a session with an unexpected role; reads never validate.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use bidii_core::{Session, SessionKey, Viewer};
use secrecy::SecretString;
use thiserror::Error;
use tracing::{debug, instrument};

/// Errors from a session backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Session file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session file is not a JSON object: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("Session store lock poisoned")]
    Poisoned,
}

/// A raw key/value namespace for the session.
pub trait SessionStore: Send + Sync {
    /// # Errors
    ///
    /// Returns `StoreError` if the backend cannot be read.
    fn get(&self, key: SessionKey) -> Result<Option<String>, StoreError>;

    /// # Errors
    ///
    /// Returns `StoreError` if the backend cannot be written.
    fn set(&self, key: SessionKey, value: &str) -> Result<(), StoreError>;

    /// # Errors
    ///
    /// Returns `StoreError` if the backend cannot be written.
    fn remove(&self, key: SessionKey) -> Result<(), StoreError>;
}

// =============================================================================
// In-memory backend
// =============================================================================

/// Session store held in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<SessionKey, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: SessionKey) -> Result<Option<String>, StoreError> {
        let values = self.values.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(values.get(&key).cloned())
    }

    fn set(&self, key: SessionKey, value: &str) -> Result<(), StoreError> {
        let mut values = self.values.lock().map_err(|_| StoreError::Poisoned)?;
        values.insert(key, value.to_owned());
        Ok(())
    }

    fn remove(&self, key: SessionKey) -> Result<(), StoreError> {
        let mut values = self.values.lock().map_err(|_| StoreError::Poisoned)?;
        values.remove(&key);
        Ok(())
    }
}

// =============================================================================
// File backend
// =============================================================================

/// Session store persisted as a flat JSON object.
///
/// Keys this crate does not know are kept untouched, so the file can be shared
/// with other tools. Every write rewrites the whole file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`, reading it if it exists.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the file exists but cannot be read, or
    /// `StoreError::Corrupt` if it is not a flat JSON object of strings.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), keys = values.len(), "Opened session file");
        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(values)?;
        fs::write(&self.path, raw)?;
        Ok(())
    }
}

impl SessionStore for FileStore {
    fn get(&self, key: SessionKey) -> Result<Option<String>, StoreError> {
        let values = self.values.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(values.get(key.as_str()).cloned())
    }

    fn set(&self, key: SessionKey, value: &str) -> Result<(), StoreError> {
        let mut values = self.values.lock().map_err(|_| StoreError::Poisoned)?;
        values.insert(key.as_str().to_owned(), value.to_owned());
        self.persist(&values)
    }

    fn remove(&self, key: SessionKey) -> Result<(), StoreError> {
        let mut values = self.values.lock().map_err(|_| StoreError::Poisoned)?;
        if values.remove(key.as_str()).is_some() {
            self.persist(&values)?;
        }
        Ok(())
    }
}

// =============================================================================
// Typed view
// =============================================================================

/// Typed access to the session namespace.
#[derive(Clone)]
pub struct SessionState {
    store: Arc<dyn SessionStore>,
}

impl std::fmt::Debug for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionState").finish_non_exhaustive()
    }
}

impl SessionState {
    #[must_use]
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// A state backed by a fresh [`MemoryStore`].
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Write every session field, one key at a time.
    ///
    /// # Errors
    ///
    /// Returns the first `StoreError`; earlier keys stay written.
    #[instrument(skip_all, fields(user_id = %session.user_id))]
    pub fn save(&self, session: &Session) -> Result<(), StoreError> {
        for (key, value) in session.entries() {
            self.store.set(key, &value)?;
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `StoreError` if the backend cannot be read.
    pub fn read(&self, key: SessionKey) -> Result<Option<String>, StoreError> {
        self.store.get(key)
    }

    /// # Errors
    ///
    /// Returns `StoreError` if the backend cannot be written.
    pub fn write(&self, key: SessionKey, value: &str) -> Result<(), StoreError> {
        self.store.set(key, value)
    }

    /// Remove every session key.
    ///
    /// # Errors
    ///
    /// Returns the first `StoreError`.
    #[instrument(skip_all)]
    pub fn clear(&self) -> Result<(), StoreError> {
        for key in SessionKey::ALL {
            self.store.remove(key)?;
        }
        Ok(())
    }

    /// The stored access token, if any (empty counts as none).
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backend cannot be read.
    pub fn access_token(&self) -> Result<Option<SecretString>, StoreError> {
        self.secret(SessionKey::AccessToken)
    }

    /// # Errors
    ///
    /// Returns `StoreError` if the backend cannot be read.
    pub fn refresh_token(&self) -> Result<Option<SecretString>, StoreError> {
        self.secret(SessionKey::RefreshToken)
    }

    /// Overwrite the access token after a refresh.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backend cannot be written.
    pub fn set_access_token(&self, token: &str) -> Result<(), StoreError> {
        self.store.set(SessionKey::AccessToken, token)
    }

    /// The stored session, if both tokens and the user ID are present.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backend cannot be read.
    pub fn load(&self) -> Result<Option<Session>, StoreError> {
        let mut failure = None;
        let session = Session::from_lookup(|key| match self.store.get(key) {
            Ok(value) => value,
            Err(e) => {
                failure.get_or_insert(e);
                None
            }
        });
        match failure {
            Some(e) => Err(e),
            None => Ok(session),
        }
    }

    /// The viewer context for whatever is stored.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backend cannot be read.
    pub fn viewer(&self) -> Result<Viewer, StoreError> {
        Ok(self
            .load()?
            .map_or_else(Viewer::anonymous, |session| Viewer::from_session(&session)))
    }

    fn secret(&self, key: SessionKey) -> Result<Option<SecretString>, StoreError> {
        Ok(self
            .store
            .get(key)?
            .filter(|value| !value.is_empty())
            .map(SecretString::from))
    }
}

#[cfg(test)]
mod tests {
    use bidii_core::{LoginResponse, Role};
    use secrecy::ExposeSecret;

    use super::*;

    fn session() -> Session {
        let response: LoginResponse = serde_json::from_value(serde_json::json!({
            "access_token": "acc-1",
            "refresh_token": "ref-1",
            "user_id": 3,
            "user_email": "mzazi@bidii.ac.ke",
            "first_letter": "M",
            "is_parent": true,
            "parent_profile_picture": "/media/parent_profile/m.png"
        }))
        .expect("login body");
        Session::from(response)
    }

    #[test]
    fn test_save_writes_all_eleven_keys() {
        let store = Arc::new(MemoryStore::new());
        let state = SessionState::new(store.clone());
        state.save(&session()).expect("save");

        for key in SessionKey::ALL {
            assert!(store.get(key).expect("read").is_some(), "{key} missing");
        }
        assert_eq!(state.viewer().expect("viewer").role, Role::Parent);
    }

    #[test]
    fn test_clear_removes_every_key() {
        let state = SessionState::in_memory();
        state.save(&session()).expect("save");
        state.clear().expect("clear");

        for key in SessionKey::ALL {
            assert_eq!(state.read(key).expect("read"), None);
        }
        assert!(!state.viewer().expect("viewer").is_authenticated());
    }

    #[test]
    fn test_partial_clear_yields_inconsistent_role() {
        let state = SessionState::in_memory();
        state.save(&session()).expect("save");
        state.write(SessionKey::IsParent, "false").expect("write");
        state.write(SessionKey::IsStudent, "true").expect("write");

        // No validation on read: whatever flags remain decide the role.
        assert_eq!(state.viewer().expect("viewer").role, Role::Student);
    }

    #[test]
    fn test_file_store_round_trips_and_keeps_foreign_keys() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("session.json");
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(&path, r#"{"theme":"dark"}"#).expect("seed");

        {
            let state = SessionState::new(Arc::new(FileStore::open(&path).expect("open")));
            state.save(&session()).expect("save");
            state.set_access_token("acc-2").expect("refresh");
        }

        let reopened = SessionState::new(Arc::new(FileStore::open(&path).expect("reopen")));
        let token = reopened.access_token().expect("read").expect("token");
        assert_eq!(token.expose_secret(), "acc-2");

        reopened.clear().expect("clear");
        let raw: BTreeMap<String, String> =
            serde_json::from_str(&fs::read_to_string(&path).expect("read file")).expect("json");
        assert_eq!(raw.len(), 1);
        assert_eq!(raw.get("theme").map(String::as_str), Some("dark"));
    }

    #[test]
    fn test_file_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("session.json");
        fs::write(&path, "[1,2,3]").expect("seed");
        assert!(matches!(FileStore::open(&path), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn test_empty_token_counts_as_absent() {
        let state = SessionState::in_memory();
        state.write(SessionKey::AccessToken, "").expect("write");
        assert!(state.access_token().expect("read").is_none());
    }
}
