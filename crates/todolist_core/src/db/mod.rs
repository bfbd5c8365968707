//! SQLite bootstrap for the durable key-value backend.
//!
//! Opening a store file runs every pending `kv_entries` schema step before
//! the connection is handed to `SqliteBackend`. Failures surface as
//! `StoreError` like every other storage failure.

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};
