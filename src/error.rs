//! Unified error handling for the workout tracker.
//!
//! Invalid command sequences (marking a lap outside the laps phase, ending
//! laps twice, ...) are deliberately *not* errors: the engine ignores them.
//! Only the cases a caller must react to surface here.

use thiserror::Error;

/// Error type for workout tracker operations.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// `start` was called while a workout is already being tracked.
    #[error("workout '{workout_id}' is already active")]
    AlreadyActive { workout_id: String },

    /// An operation that needs an active workout was called while idle.
    #[error("no workout is active")]
    NotActive,

    /// Configuration values are out of range.
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Configuration could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// Result type alias for workout tracker operations.
pub type Result<T> = std::result::Result<T, TrackerError>;

impl TrackerError {
    pub(crate) fn invalid_config(message: impl Into<String>) -> Self {
        TrackerError::InvalidConfig {
            message: message.into(),
        }
    }
}
