//! Ordered schema steps for the `kv_entries` table.
//!
//! # Invariants
//! - Step `n` (1-based) brings a store to `PRAGMA user_version = n`.
//! - Steps are append-only; an existing step is never edited.

use crate::store::{StoreError, StoreResult};
use log::info;
use rusqlite::{Connection, TransactionBehavior};

const KV_SCHEMA_STEPS: &[&str] = &[include_str!("0001_kv_entries.sql")];

/// Schema version a fully migrated store reports.
pub fn latest_schema_version() -> u32 {
    KV_SCHEMA_STEPS.len() as u32
}

/// Brings the store up to `latest_schema_version` and returns how many
/// steps ran.
///
/// All pending steps share one immediate transaction, so a failed step
/// leaves the store at its previous version.
///
/// # Errors
/// - `UnsupportedSchema` when the file was written by a newer build.
/// - `Sqlite` when a step fails.
pub fn migrate(conn: &mut Connection) -> StoreResult<u32> {
    let latest = latest_schema_version();
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let store_version: u32 = tx.pragma_query_value(None, "user_version", |row| row.get(0))?;

    if store_version > latest {
        return Err(StoreError::UnsupportedSchema {
            store_version,
            latest_supported: latest,
        });
    }

    let pending = &KV_SCHEMA_STEPS[store_version as usize..];
    for (offset, step) in pending.iter().enumerate() {
        tx.execute_batch(step)?;
        tx.pragma_update(None, "user_version", store_version + offset as u32 + 1)?;
    }
    tx.commit()?;

    let applied = pending.len() as u32;
    if applied > 0 {
        info!(
            "event=db_migrate module=db status=ok from_version={store_version} to_version={latest} steps={applied}"
        );
    }
    Ok(applied)
}
