//! Raw string key-value backends.
//!
//! # Responsibility
//! - Provide fallible get/set/remove primitives over physical keys.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - `set_many` applies all entries or none.
//! - Keys are compared byte-for-byte; prefix scans never match partially
//!   escaped patterns.

use super::{StoreError, StoreResult};
use crate::db::{open_db, open_db_in_memory};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::path::Path;

/// Physical key-value storage used by `StorageService`.
pub trait StorageBackend {
    fn get(&self, key: &str) -> StoreResult<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> StoreResult<()>;
    fn set_many(&mut self, entries: &[(String, String)]) -> StoreResult<()>;
    fn remove(&mut self, key: &str) -> StoreResult<()>;
    fn keys_with_prefix(&self, prefix: &str) -> StoreResult<Vec<String>>;
}

impl<T: StorageBackend + ?Sized> StorageBackend for Box<T> {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> StoreResult<()> {
        (**self).set(key, value)
    }

    fn set_many(&mut self, entries: &[(String, String)]) -> StoreResult<()> {
        (**self).set_many(entries)
    }

    fn remove(&mut self, key: &str) -> StoreResult<()> {
        (**self).remove(key)
    }

    fn keys_with_prefix(&self, prefix: &str) -> StoreResult<Vec<String>> {
        (**self).keys_with_prefix(prefix)
    }
}

/// Process-local backend with an optional byte quota.
///
/// The quota counts key and value bytes, mirroring how browser storage
/// limits are accounted.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    entries: BTreeMap<String, String>,
    quota_bytes: Option<usize>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend that rejects writes growing past `limit_bytes`.
    pub fn with_quota(limit_bytes: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            quota_bytes: Some(limit_bytes),
        }
    }

    /// Raw read access for tests and diagnostics.
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn used_bytes(&self) -> usize {
        self.entries
            .iter()
            .map(|(key, value)| key.len() + value.len())
            .sum()
    }

    fn check_quota(&self, entries: &[(String, String)]) -> StoreResult<()> {
        let Some(limit_bytes) = self.quota_bytes else {
            return Ok(());
        };

        let mut required_bytes = self.used_bytes();
        for (key, value) in entries {
            if let Some(previous) = self.entries.get(key) {
                required_bytes = required_bytes.saturating_sub(key.len() + previous.len());
            }
            required_bytes += key.len() + value.len();
        }

        if required_bytes > limit_bytes {
            return Err(StoreError::QuotaExceeded {
                limit_bytes,
                required_bytes,
            });
        }
        Ok(())
    }
}

impl StorageBackend for MemoryBackend {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> StoreResult<()> {
        self.set_many(&[(key.to_string(), value.to_string())])
    }

    fn set_many(&mut self, entries: &[(String, String)]) -> StoreResult<()> {
        self.check_quota(entries)?;
        for (key, value) in entries {
            self.entries.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StoreResult<()> {
        self.entries.remove(key);
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> StoreResult<Vec<String>> {
        Ok(self
            .entries
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }
}

/// SQLite-backed durable backend over the `kv_entries` table.
pub struct SqliteBackend {
    conn: Connection,
}

impl SqliteBackend {
    /// Wraps a connection that already went through `open_db*`.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Opens (or creates) a store file with migrations applied.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Ok(Self::new(open_db(path)?))
    }

    /// Opens a throwaway store; contents drop with the backend.
    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self::new(open_db_in_memory()?))
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

const UPSERT_SQL: &str = "INSERT INTO kv_entries (key, value) VALUES (?1, ?2)
     ON CONFLICT(key) DO UPDATE SET
        value = excluded.value,
        updated_at = (strftime('%s', 'now') * 1000);";

impl StorageBackend for SqliteBackend {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> StoreResult<()> {
        self.conn.execute(UPSERT_SQL, params![key, value])?;
        Ok(())
    }

    fn set_many(&mut self, entries: &[(String, String)]) -> StoreResult<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(UPSERT_SQL)?;
            for (key, value) in entries {
                stmt.execute(params![key, value])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StoreResult<()> {
        self.conn
            .execute("DELETE FROM kv_entries WHERE key = ?1;", [key])?;
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT key FROM kv_entries
             WHERE substr(key, 1, length(?1)) = ?1
             ORDER BY key ASC;",
        )?;
        let mut rows = stmt.query([prefix])?;
        let mut keys = Vec::new();
        while let Some(row) = rows.next()? {
            keys.push(row.get::<_, String>(0)?);
        }
        Ok(keys)
    }
}
