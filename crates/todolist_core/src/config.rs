//! Runtime configuration for hosts embedding the core.
//!
//! # Responsibility
//! - Collect storage and logging settings in one place.
//! - Normalize them before any store is opened.
//!
//! # Invariants
//! - A normalized config has a non-empty prefix without a trailing `_`.
//! - `log_dir`, when set, is absolute.

use crate::logging::{default_log_level, normalize_level};
use crate::store::DEFAULT_STORAGE_PREFIX;
use std::path::PathBuf;

/// Storage and logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Namespace for every persisted key.
    pub storage_prefix: String,
    /// SQLite store file. `None` keeps state in memory only.
    pub db_path: Option<PathBuf>,
    pub log_level: String,
    /// Rolling log directory. `None` disables file logging.
    pub log_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_prefix: DEFAULT_STORAGE_PREFIX.to_string(),
            db_path: None,
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl AppConfig {
    /// Returns a validated copy with canonical values.
    ///
    /// # Errors
    /// - Returns an error when the prefix is blank.
    /// - Returns an error when the log level is unsupported.
    /// - Returns an error when `log_dir` is relative.
    pub fn normalized(&self) -> Result<Self, String> {
        let prefix = self.storage_prefix.trim().trim_end_matches('_');
        if prefix.is_empty() {
            return Err("storage prefix cannot be empty".to_string());
        }

        let log_level = normalize_level(&self.log_level)?;

        if let Some(dir) = &self.log_dir {
            if !dir.is_absolute() {
                return Err(format!(
                    "log_dir must be an absolute path, got `{}`",
                    dir.display()
                ));
            }
        }

        Ok(Self {
            storage_prefix: prefix.to_string(),
            db_path: self.db_path.clone(),
            log_level: log_level.to_string(),
            log_dir: self.log_dir.clone(),
        })
    }
}
