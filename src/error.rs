//! Error types for Cogniscore

use thiserror::Error;

/// Errors that can occur while scoring a session
#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid telemetry session: {0}")]
    Validation(#[from] ValidationError),

    #[error("Invalid scoring configuration: {0}")]
    ConfigError(String),

    #[error("Session {0} is already finalized")]
    SessionFinalized(String),
}

/// Reasons a telemetry session is rejected before any computation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Malformed session: {0}")]
    Malformed(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Session {0} has not been finalized (no end reason)")]
    NotFinalized(String),

    #[error("Assessment {assessment} requires {counters} counters")]
    MissingCounters {
        assessment: String,
        counters: String,
    },

    #[error("Field {field} must be a finite, non-negative number (got {value})")]
    InvalidNumber { field: String, value: f64 },

    #[error("Session ended at {ended_at} before it started at {started_at}")]
    EndBeforeStart { started_at: String, ended_at: String },

    #[error("Duplicate item index {0}")]
    DuplicateItem(u32),

    #[error("Item {0} is marked correct but has no selected answer")]
    CorrectWithoutAnswer(u32),
}
