//! Error types for rpe-toxicity.

use thiserror::Error;

/// Toxicity estimator errors.
#[derive(Debug, Error)]
pub enum ToxicityError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for toxicity operations.
pub type ToxicityResult<T> = Result<T, ToxicityError>;
