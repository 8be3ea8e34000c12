//! Core error types for worktimer-core.
//!
//! `TimerError` is the result taxonomy the timer engine reasons about; the
//! rest of the hierarchy covers storage and configuration plumbing and folds
//! into `CoreError` for callers that do not care about the distinction.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for worktimer-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Timer operation failures
    #[error(transparent)]
    Timer(#[from] TimerError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Which kind of external reference failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Subject,
    Activity,
}

impl std::fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReferenceKind::Subject => f.write_str("subject"),
            ReferenceKind::Activity => f.write_str("activity"),
        }
    }
}

/// Failures of the time entry store operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimerError {
    /// pause/stop with nothing running or pausable
    #[error("No active session")]
    NoActiveSession,

    /// resume with nothing paused
    #[error("No paused session")]
    NoPausedSession,

    /// Persistence or transport failure
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Unknown subject/activity, or an activity that belongs to another subject
    #[error("Unknown {kind} '{id}'")]
    ReferentialError { kind: ReferenceKind, id: String },
}

impl TimerError {
    pub fn subject(id: impl Into<String>) -> Self {
        TimerError::ReferentialError {
            kind: ReferenceKind::Subject,
            id: id.into(),
        }
    }

    pub fn activity(id: impl Into<String>) -> Self {
        TimerError::ReferentialError {
            kind: ReferenceKind::Activity,
            id: id.into(),
        }
    }

    /// Whether the state machine should undo an optimistic start.
    pub fn is_referential(&self) -> bool {
        matches!(self, TimerError::ReferentialError { .. })
    }
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Stored value could not be decoded
    #[error("Corrupt value in column {column}: {message}")]
    CorruptRow { column: usize, message: String },

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// Home/config directory could not be determined or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg)
                if e.code == rusqlite::ErrorCode::DatabaseLocked
                    || e.code == rusqlite::ErrorCode::DatabaseBusy =>
            {
                DatabaseError::Locked
            }
            rusqlite::Error::FromSqlConversionFailure(column, _, source) => {
                DatabaseError::CorruptRow {
                    column: *column,
                    message: source.to_string(),
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<DatabaseError> for TimerError {
    fn from(err: DatabaseError) -> Self {
        TimerError::StoreUnavailable(err.to_string())
    }
}

impl From<rusqlite::Error> for TimerError {
    fn from(err: rusqlite::Error) -> Self {
        DatabaseError::from(err).into()
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
