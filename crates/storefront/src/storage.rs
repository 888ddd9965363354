//! Local key/value store for session state.
//!
//! Plays the role of the browser's `localStorage`: string keys, JSON string
//! values, no versioning. Two backends are provided:
//!
//! - [`MemoryStorage`] - process-local, used by tests and one-shot commands
//! - [`FileStorage`] - a single JSON document on disk, rewritten on every change

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use fastbite_core::UserId;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Well-known storage keys.
pub mod keys {
    use super::UserId;

    /// Raw JWT of the signed-in user.
    pub const TOKEN: &str = "token";

    /// Cached user record of the signed-in user.
    pub const USER: &str = "user";

    /// Cart of a visitor who is not signed in.
    pub const GUEST_CART: &str = "cart_guest";

    /// Anonymous visitor identifier used for behavior tracking.
    pub const SESSION_ID: &str = "session_id";

    /// Per-user cart mirror, `cart_<userId>`.
    ///
    /// IDs that would land on [`GUEST_CART`] (or on another escaped key) are
    /// written as `cart_~<userId>`.
    #[must_use]
    pub fn user_cart(user_id: &UserId) -> String {
        let id = user_id.as_str();
        if id.starts_with("guest") || id.starts_with('~') {
            format!("cart_~{id}")
        } else {
            format!("cart_{id}")
        }
    }

    /// Recently viewed product IDs for a user ID or guest session ID.
    #[must_use]
    pub fn recently_viewed(owner: &str) -> String {
        format!("recently_viewed_{owner}")
    }

    /// Category view counts for a user ID or guest session ID.
    #[must_use]
    pub fn viewed_categories(owner: &str) -> String {
        format!("viewed_categories_{owner}")
    }
}

/// Errors raised by storage backends.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored value for '{key}' is not valid JSON: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode value for '{0}'")]
    Encode(String),
    #[error("storage lock poisoned")]
    Poisoned,
}

/// A string key/value store.
pub trait Storage: Send + Sync {
    /// Read a raw value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a raw value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn set(&self, key: &str, value: String) -> Result<(), StorageError>;

    /// Delete a key. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// All keys currently stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn keys(&self) -> Result<Vec<String>, StorageError>;
}

/// Typed JSON helpers over any [`Storage`].
pub trait StorageExt: Storage {
    /// Read and decode a JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Corrupt`] if the stored value does not decode.
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        self.get(key)?
            .map(|raw| {
                serde_json::from_str(&raw).map_err(|source| StorageError::Corrupt {
                    key: key.to_string(),
                    source,
                })
            })
            .transpose()
    }

    /// Encode and write a JSON value.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or writing fails.
    fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value).map_err(|_| StorageError::Encode(key.to_string()))?;
        self.set(key, raw)
    }
}

impl<S: Storage + ?Sized> StorageExt for S {}

// =============================================================================
// MemoryStorage
// =============================================================================

/// In-memory storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, String>>, StorageError> {
        self.entries.lock().map_err(|_| StorageError::Poisoned)
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.lock()?.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.lock()?.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.lock()?.keys().cloned().collect())
    }
}

// =============================================================================
// FileStorage
// =============================================================================

/// Storage persisted as one JSON object in `<dir>/storage.json`.
///
/// The whole map is loaded on open and written back (via a temp file and
/// rename) after each mutation.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    const FILE_NAME: &'static str = "storage.json";

    /// Open (or create) the store inside `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the existing
    /// file is unreadable or not a JSON object of strings.
    pub fn open(dir: &Path) -> Result<Self, StorageError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(Self::FILE_NAME);

        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw).map_err(|source| StorageError::Corrupt {
                key: Self::FILE_NAME.to_string(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(path = %path.display(), keys = entries.len(), "Opened file storage");

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, String>>, StorageError> {
        self.entries.lock().map_err(|_| StorageError::Poisoned)
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let raw = serde_json::to_string_pretty(entries)
            .map_err(|_| StorageError::Encode(Self::FILE_NAME.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, raw)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        let mut entries = self.lock()?;
        let mut next = entries.clone();
        next.insert(key.to_string(), value);
        self.flush(&next)?;
        *entries = next;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.lock()?;
        if !entries.contains_key(key) {
            return Ok(());
        }
        let mut next = entries.clone();
        next.remove(key);
        self.flush(&next)?;
        *entries = next;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.lock()?.keys().cloned().collect())
    }
}
