//! Namespaced JSON storage over a raw backend.
//!
//! # Responsibility
//! - Map logical keys to `<prefix>_<key>` physical keys.
//! - Encode/decode JSON values.
//! - Contain backend failures: log them and fall back.
//!
//! # Invariants
//! - No method returns or panics on a backend failure.
//! - `clear` only touches keys under this service's own namespace.

use super::{PersistenceAdapter, StorageBackend, StoreResult};
use log::{error, warn};
use serde_json::Value;

/// Namespace used when no prefix is configured.
pub const DEFAULT_STORAGE_PREFIX: &str = "todos";

/// JSON persistence adapter bound to one namespace.
pub struct StorageService<B: StorageBackend> {
    backend: B,
    prefix: String,
}

impl<B: StorageBackend> StorageService<B> {
    /// Creates a service using the default `todos` namespace.
    pub fn new(backend: B) -> Self {
        Self::with_prefix(backend, DEFAULT_STORAGE_PREFIX)
    }

    /// Creates a service storing keys as `<prefix>_<key>`.
    pub fn with_prefix(backend: B, prefix: impl Into<String>) -> Self {
        Self {
            backend,
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        self.prefix.as_str()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Physical key for a logical `key`.
    pub fn full_key(&self, key: &str) -> String {
        format!("{}_{key}", self.prefix)
    }

    fn try_save_all(&mut self, entries: &[(&str, Value)]) -> StoreResult<()> {
        let mut encoded = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            encoded.push((self.full_key(key), serde_json::to_string(value)?));
        }
        self.backend.set_many(&encoded)
    }

    fn try_clear(&mut self) -> StoreResult<usize> {
        let keys = self.backend.keys_with_prefix(&format!("{}_", self.prefix))?;
        for key in &keys {
            self.backend.remove(key)?;
        }
        Ok(keys.len())
    }
}

impl<B: StorageBackend> PersistenceAdapter for StorageService<B> {
    fn save(&mut self, key: &str, value: &Value) {
        self.save_all(&[(key, value.clone())]);
    }

    fn save_all(&mut self, entries: &[(&str, Value)]) {
        if let Err(err) = self.try_save_all(entries) {
            let keys = entries
                .iter()
                .map(|(key, _)| *key)
                .collect::<Vec<_>>()
                .join(",");
            error!(
                "event=storage_save module=store status=error prefix={} keys={keys} error={err}",
                self.prefix
            );
        }
    }

    fn load(&self, key: &str, default: Value) -> Value {
        let full_key = self.full_key(key);
        let raw = match self.backend.get(&full_key) {
            Ok(Some(raw)) if !raw.is_empty() => raw,
            Ok(_) => return default,
            Err(err) => {
                error!(
                    "event=storage_load module=store status=error key={full_key} error={err}"
                );
                return default;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(err) => {
                warn!(
                    "event=storage_load module=store status=error key={full_key} error_code=invalid_json error={err}"
                );
                default
            }
        }
    }

    fn remove(&mut self, key: &str) {
        let full_key = self.full_key(key);
        if let Err(err) = self.backend.remove(&full_key) {
            error!("event=storage_remove module=store status=error key={full_key} error={err}");
        }
    }

    fn clear(&mut self) {
        if let Err(err) = self.try_clear() {
            error!(
                "event=storage_clear module=store status=error prefix={} error={err}",
                self.prefix
            );
        }
    }
}
