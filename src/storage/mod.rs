//! Key-value persistence boundary
//!
//! Every store serializes itself as one JSON record under its own namespaced
//! key. Writes that fail are logged and swallowed here so that a full disk or
//! a read-only profile degrades the app to session-only state instead of
//! taking it down.

pub mod file;
pub mod memory;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Storage key of the progress record
pub const PROGRESS_KEY: &str = "agentic-progress";

/// Storage key of the exercise record
pub const EXERCISES_KEY: &str = "agentic-exercises";

/// Storage key of the preferences record
pub const PREFERENCES_KEY: &str = "agentic-preferences";

/// Prefix of per-module note keys
pub const NOTES_KEY_PREFIX: &str = "agentic-notes-";

/// Errors raised by a storage backend
#[derive(Debug, Error)]
pub enum StorageError {
    /// Key contains characters the backend cannot address
    #[error("Invalid storage key: {0:?}")]
    InvalidKey(String),

    /// Underlying filesystem failure
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Record could not be encoded or decoded
    #[error("Storage JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A durable string-to-string map scoped to one profile
pub trait KeyValueStore: Send + Sync {
    /// Read the raw value stored under `key`
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Overwrite the value stored under `key`
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`, succeeding if it was absent
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// List every key currently stored
    fn keys(&self) -> Result<Vec<String>, StorageError>;
}

/// Check that a key only uses characters every backend can address
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid { Ok(()) } else { Err(StorageError::InvalidKey(key.to_string())) }
}

/// Load a record, falling back to its default when missing or unreadable
pub fn load_record<T>(store: &dyn KeyValueStore, key: &str) -> T
where
    T: DeserializeOwned + Default,
{
    match store.get(key) {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("Discarding unparsable record {}: {}", key, e);
                T::default()
            }
        },
        Ok(None) => T::default(),
        Err(e) => {
            tracing::warn!("Failed to read record {}: {}", key, e);
            T::default()
        }
    }
}

/// Serialize and write a record, logging instead of failing
pub fn save_record<T: Serialize>(store: &dyn KeyValueStore, key: &str, record: &T) {
    if let Err(e) = try_save_record(store, key, record) {
        tracing::warn!("Failed to persist {}: {}", key, e);
    }
}

/// Serialize and write a record, returning any failure to the caller
pub fn try_save_record<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    record: &T,
) -> Result<(), StorageError> {
    let contents = serde_json::to_string(record)?;
    store.set(key, &contents)?;
    tracing::debug!("Persisted {} ({} bytes)", key, contents.len());
    Ok(())
}
