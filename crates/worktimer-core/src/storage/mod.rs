mod config;
pub mod database;
pub mod entry_store;
pub mod migrations;
mod registry;

pub use config::{Config, LoggingConfig, NotificationsConfig, StorageConfig};
pub use database::Database;
pub use entry_store::{EntryStore, TimeEntryStore};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Environment variable that overrides the database location.
pub const DB_PATH_ENV: &str = "WORKTIMER_DB";

/// Returns `~/.config/worktimer[-dev]/` based on WORKTIMER_ENV.
///
/// Set WORKTIMER_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("WORKTIMER_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("worktimer-dev")
    } else {
        base_dir.join("worktimer")
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir(e.to_string()))?;
    Ok(dir)
}

/// Resolve the database file: `WORKTIMER_DB`, then `storage.database_path`,
/// then `<data_dir>/worktimer.db`.
pub fn database_path(config: &Config) -> Result<PathBuf, ConfigError> {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        if !path.trim().is_empty() {
            return Ok(PathBuf::from(path));
        }
    }
    if let Some(path) = &config.storage.database_path {
        return Ok(path.clone());
    }
    Ok(data_dir()?.join("worktimer.db"))
}
