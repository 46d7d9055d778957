//! Error types for rpe-publisher.

use thiserror::Error;

/// Publication and key-handling errors.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("Failed to decode hex: {0}")]
    HexDecode(#[from] hex::FromHexError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] rmp_serde::encode::Error),

    #[error("Signing failed: {0}")]
    Signing(#[from] alloy::signers::Error),

    #[error("Signature verification failed: {0}")]
    BadSignature(String),

    #[error("Transport failure: {0}")]
    Transport(String),
}

/// Result type alias for publisher operations.
pub type PublishResult<T> = Result<T, PublishError>;
