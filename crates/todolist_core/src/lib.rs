//! Core domain logic for the todo list.
//! This crate is the single source of truth for todo invariants.

pub mod config;
pub mod controller;
pub mod db;
pub mod logging;
pub mod model;
pub mod service;
pub mod store;

pub use config::AppConfig;
pub use controller::{dispatch, DispatchOutcome, TodoEvent};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::todo::{Importance, Todo, TodoId, TodoSnapshot, FIRST_TODO_ID, LEGACY_UNSET_TAG};
pub use service::todo_model::{SubscriptionId, TodoFilter, TodoModel, ITEMS_KEY, NEXT_ID_KEY};
pub use store::{
    open_storage, MemoryBackend, PersistenceAdapter, SqliteBackend, StorageBackend,
    StorageService, StoreError, StoreResult, DEFAULT_STORAGE_PREFIX,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
