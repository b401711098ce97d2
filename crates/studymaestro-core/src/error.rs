//! Core error types for studymaestro-core.
//!
//! Store and validation failures never escape a screen command: the screen
//! models catch them at the command boundary and turn them into
//! [`UiEvent`](crate::events::UiEvent)s. The types here are what the layers
//! beneath the commands return.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for studymaestro-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Store-related errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The stopwatch task has exited
    #[error("Timer is not running")]
    TimerUnavailable,
}

/// Errors raised by a repository implementation.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open the database file
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

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// An update or delete was issued for an entity that was never persisted
    #[error("{entity} has no id")]
    MissingId { entity: &'static str },

    /// The blocking worker running a store call died
    #[error("Store task failed: {0}")]
    TaskFailed(String),
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

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Draft rejected before any store call.
///
/// The `Display` text of each variant is the message shown to the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Single session can not be less than {min_secs} seconds")]
    SessionTooShort { duration_secs: i64, min_secs: i64 },

    #[error("Please select subject related to the session.")]
    SessionWithoutSubject,

    #[error("Please select a subject related to the task.")]
    TaskWithoutSubject,

    #[error("Please enter task title.")]
    BlankTitle,

    #[error("Task title is too short.")]
    TitleTooShort,

    #[error("Task title is too long.")]
    TitleTooLong,
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(inner, _msg) => {
                if inner.code == rusqlite::ErrorCode::DatabaseLocked
                    || inner.code == rusqlite::ErrorCode::DatabaseBusy
                {
                    StoreError::Locked
                } else {
                    StoreError::QueryFailed(err.to_string())
                }
            }
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for StoreError {
    fn from(err: tokio::task::JoinError) -> Self {
        StoreError::TaskFailed(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

/// Result type alias used by every repository call.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_messages_are_user_facing() {
        let err = ValidationError::SessionTooShort {
            duration_secs: 10,
            min_secs: 36,
        };
        assert_eq!(
            err.to_string(),
            "Single session can not be less than 36 seconds"
        );
        assert_eq!(
            ValidationError::TitleTooShort.to_string(),
            "Task title is too short."
        );
    }

    #[test]
    fn store_error_wraps_into_core_error() {
        let err: CoreError = StoreError::MissingId { entity: "Task" }.into();
        assert_eq!(err.to_string(), "Store error: Task has no id");
    }
}
