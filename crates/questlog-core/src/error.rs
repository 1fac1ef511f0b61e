//! Core error types for questlog-core.
//!
//! Invalid input fails fast with one of these errors. Stale identifiers are
//! not errors: mutations against an id that is no longer present return the
//! profile unchanged.

use thiserror::Error;

/// Core error type for questlog-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Missing required configuration key
    #[error("Missing required configuration key: {0}")]
    MissingKey(String),

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// Failed to serialize configuration
    #[error("Failed to serialize configuration: {0}")]
    SerializeFailed(String),
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Difficulty string not recognised
    #[error("Invalid difficulty '{0}': expected easy, medium or hard")]
    InvalidDifficulty(String),

    /// Recurrence interval not recognised
    #[error("Invalid recurrence interval '{0}': expected daily, weekly, monthly or custom")]
    InvalidRecurrence(String),

    /// Custom recurrence needs at least one day
    #[error("Custom recurrence must span at least 1 day (got {0})")]
    InvalidRecurrenceDays(i64),

    /// Duration deadline needs at least one minute
    #[error("Deadline duration must be at least 1 minute (got {0})")]
    InvalidDuration(i64),

    /// Feature key not present in the unlock table
    #[error("Unknown feature key: {0}")]
    UnknownFeature(String),

    /// Badge kind not recognised
    #[error("Unknown badge kind: {0}")]
    UnknownBadge(String),

    /// Theme not recognised
    #[error("Invalid theme '{0}': expected light or dark")]
    InvalidTheme(String),

    /// Empty or whitespace-only name
    #[error("{0} name must not be empty")]
    EmptyName(&'static str),

    /// Group template without sub-tasks
    #[error("Task group '{0}' has no sub-tasks")]
    EmptyGroup(String),

    /// Avatar option outside the configured range
    #[error("Invalid avatar {field}: {message}")]
    InvalidAvatar { field: &'static str, message: String },
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
