//! Error types for rpe-consensus.

use thiserror::Error;

/// Price source and aggregation errors.
///
/// These surface only from individual source fetches; the consensus
/// computation itself degrades instead of failing.
#[derive(Debug, Error)]
pub enum ConsensusError {
    #[error("Source request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Source returned malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Source timed out after {0}ms")]
    Timeout(u64),
}

/// Result type alias for consensus operations.
pub type ConsensusResult<T> = Result<T, ConsensusError>;
