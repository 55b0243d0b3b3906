//! Core error types for chaoscontrol-core.
//!
//! Hard failures (bad input, broken config, unreadable storage) are `CoreError`.
//! "This task could not be placed" is not an error: the scheduler reports it
//! per task via [`PlacementFailure`] and keeps going with the rest of the batch.

use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Core error type for chaoscontrol-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A single placement was refused (manual move, single-task operations)
    #[error("Placement refused: {0}")]
    Placement(#[from] PlacementFailure),

    /// Unknown task id
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
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

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Validation errors, rejected before a task ever reaches the scheduler.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Task title is empty or whitespace
    #[error("Task title must not be empty")]
    EmptyTitle,

    /// Duration must be a positive number of minutes
    #[error("Duration must be greater than zero (got {0})")]
    NonPositiveDuration(i64),

    /// Malformed HH:MM time string
    #[error("Malformed time '{0}', expected HH:MM")]
    MalformedTime(String),

    /// Malformed date string
    #[error("Malformed date '{0}', expected YYYY-MM-DD")]
    MalformedDate(String),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Why a task stayed (or became) Unplaced.
///
/// Carried in the batch report of an auto-schedule run; never raised as a
/// panic or a hard error for batch operations.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlacementFailure {
    /// Fixed request landed on a non-working day
    #[error("{date} is a holiday")]
    HolidayConflict { date: NaiveDate },

    /// Placing would exceed the daily capacity.
    ///
    /// `needs_confirmation` is set for fixed requests: the caller may re-run
    /// with the overbook override after confirming with the user.
    #[error("Day {date} is at capacity")]
    CapacityExceeded {
        date: NaiveDate,
        needs_confirmation: bool,
    },

    /// No free interval of sufficient length anywhere in the search window
    #[error("No free slot of {duration_minutes} min found")]
    SlotUnavailable { duration_minutes: u32 },

    /// Would-be placement precedes the predecessor's end
    #[error("Placement would precede the end of predecessor {predecessor}")]
    DependencyViolation { predecessor: String },

    /// Predecessor is not placed, so this task was skipped
    #[error("Predecessor {predecessor} is not placed")]
    PredecessorUnplaced { predecessor: String },

    /// Requested start does not fit inside the workday
    #[error("Start {start_minute} + {duration_minutes} min falls outside the workday")]
    OutsideWorkday {
        start_minute: u32,
        duration_minutes: u32,
    },

    /// Requested span overlaps an existing placement (manual moves)
    #[error("Requested span overlaps task {other}")]
    Overlap { other: String },
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
