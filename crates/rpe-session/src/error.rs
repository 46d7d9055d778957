//! Error types for rpe-session.

use thiserror::Error;

/// Session classification and calendar errors.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Holiday entry failed to parse as a `YYYY-MM-DD` date.
    #[error("Invalid holiday entry '{0}': expected YYYY-MM-DD")]
    InvalidHoliday(String),

    /// Holiday already present in the calendar.
    #[error("Duplicate holiday entry: {0}")]
    DuplicateHoliday(String),
}

/// Result type alias for session operations.
pub type SessionResult<T> = Result<T, SessionError>;
