//! Publisher key loading.

use std::path::PathBuf;

use alloy::signers::local::PrivateKeySigner;
use zeroize::Zeroizing;

use crate::error::{PublishError, PublishResult};

/// Source of the publisher's private key.
///
/// Keys are loaded once at startup; no runtime rotation. Never log key
/// material.
#[derive(Debug, Clone)]
pub enum KeySource {
    /// Load from environment variable (development).
    EnvVar { var_name: String },
    /// Load from file (production, recommend 0600 permissions).
    File { path: PathBuf },
}

/// Load and parse the publisher signing key.
///
/// Accepts a hex string with or without `0x` prefix; surrounding
/// whitespace is trimmed. The decoded bytes are held in a zeroizing
/// buffer.
pub fn load_signer(source: &KeySource) -> PublishResult<PrivateKeySigner> {
    fn parse_hex_key(hex_str: &str) -> PublishResult<Zeroizing<Vec<u8>>> {
        let trimmed = hex_str.trim().trim_start_matches("0x");
        Ok(Zeroizing::new(hex::decode(trimmed)?))
    }

    let secret_bytes: Zeroizing<Vec<u8>> = match source {
        KeySource::EnvVar { var_name } => {
            let hex = std::env::var(var_name)
                .map_err(|_| PublishError::EnvVarNotFound(var_name.clone()))?;
            parse_hex_key(&hex)?
        }
        KeySource::File { path } => {
            let content = std::fs::read_to_string(path)?;
            parse_hex_key(&content)?
        }
    };

    PrivateKeySigner::from_slice(&secret_bytes)
        .map_err(|e| PublishError::InvalidKey(e.to_string()))
}
