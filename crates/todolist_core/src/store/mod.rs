//! Key-value persistence for the todo model.
//!
//! # Responsibility
//! - Define the adapter contract the model persists through.
//! - Keep backend failures inside the persistence boundary.
//!
//! # Invariants
//! - Every logical key is physically stored as `<prefix>_<key>`.
//! - Adapter writes never propagate errors to model callers.

pub mod backend;
pub mod storage_service;

pub use backend::{MemoryBackend, SqliteBackend, StorageBackend};
pub use storage_service::{StorageService, DEFAULT_STORAGE_PREFIX};

use crate::config::AppConfig;
use log::info;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Backend-level failure. Never escapes `StorageService`.
#[derive(Debug)]
pub enum StoreError {
    Sqlite(rusqlite::Error),
    /// The store file was written by a newer build.
    UnsupportedSchema {
        store_version: u32,
        latest_supported: u32,
    },
    Serialization(serde_json::Error),
    QuotaExceeded {
        limit_bytes: usize,
        required_bytes: usize,
    },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite error: {err}"),
            Self::UnsupportedSchema {
                store_version,
                latest_supported,
            } => write!(
                f,
                "store schema version {store_version} is newer than supported {latest_supported}"
            ),
            Self::Serialization(err) => write!(f, "serialization failed: {err}"),
            Self::QuotaExceeded {
                limit_bytes,
                required_bytes,
            } => write!(
                f,
                "storage quota exceeded: {required_bytes} bytes required, limit is {limit_bytes}"
            ),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::Serialization(err) => Some(err),
            Self::UnsupportedSchema { .. } | Self::QuotaExceeded { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

/// Opens the backend selected by `config` behind a namespaced service.
///
/// A `db_path` selects the SQLite file backend; otherwise state lives in
/// memory for the lifetime of the returned service.
///
/// # Errors
/// - Returns `StoreError::Sqlite` when the SQLite file cannot be opened
///   or migrated.
/// - Returns `StoreError::UnsupportedSchema` for a file from a newer build.
pub fn open_storage(config: &AppConfig) -> StoreResult<StorageService<Box<dyn StorageBackend>>> {
    let backend: Box<dyn StorageBackend> = match &config.db_path {
        Some(path) => Box::new(SqliteBackend::open(path)?),
        None => Box::new(MemoryBackend::new()),
    };
    info!(
        "event=storage_open module=store status=ok prefix={} durable={}",
        config.storage_prefix,
        config.db_path.is_some()
    );
    Ok(StorageService::with_prefix(
        backend,
        config.storage_prefix.as_str(),
    ))
}

/// Persistence contract consumed by `TodoModel`.
///
/// Implementations swallow and log their own failures; callers only ever
/// see the default value on a failed load.
pub trait PersistenceAdapter {
    /// Stores `value` under the namespaced `key`.
    fn save(&mut self, key: &str, value: &Value);

    /// Stores several keys as one unit where the backend supports it.
    fn save_all(&mut self, entries: &[(&str, Value)]) {
        for (key, value) in entries {
            self.save(key, value);
        }
    }

    /// Returns the stored value, or `default` when absent or undecodable.
    fn load(&self, key: &str, default: Value) -> Value;

    /// Removes one namespaced key.
    fn remove(&mut self, key: &str);

    /// Removes every key of this namespace.
    fn clear(&mut self);
}

impl<T: PersistenceAdapter + ?Sized> PersistenceAdapter for &mut T {
    fn save(&mut self, key: &str, value: &Value) {
        (**self).save(key, value);
    }

    fn save_all(&mut self, entries: &[(&str, Value)]) {
        (**self).save_all(entries);
    }

    fn load(&self, key: &str, default: Value) -> Value {
        (**self).load(key, default)
    }

    fn remove(&mut self, key: &str) {
        (**self).remove(key);
    }

    fn clear(&mut self) {
        (**self).clear();
    }
}
