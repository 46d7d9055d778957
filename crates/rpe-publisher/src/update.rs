//! Signed parameter updates.

use alloy::primitives::{keccak256, Address, PrimitiveSignature, B256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer as AlloySigner;
use rpe_core::Price;
use rpe_engine::EngineSnapshot;
use rpe_session::Regime;
use serde::{Deserialize, Serialize};

use crate::error::{PublishError, PublishResult};

/// One parameter update as consumers receive it.
///
/// Field order is part of the signed payload: the digest is keccak256
/// over the msgpack encoding, so reordering fields breaks existing
/// signatures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterUpdate {
    pub channel_id: String,
    pub timestamp_ms: i64,
    pub toxicity: f64,
    pub regime: Regime,
    pub recommended_fee_bps: f64,
    pub breaker_level: u8,
    pub oracle_price: Option<Price>,
    pub oracle_confidence: Option<f64>,
    pub seq: u64,
}

impl ParameterUpdate {
    /// Build an update from an engine snapshot.
    #[must_use]
    pub fn from_snapshot(channel_id: impl Into<String>, snapshot: &EngineSnapshot) -> Self {
        Self {
            channel_id: channel_id.into(),
            timestamp_ms: snapshot.sampled_at.timestamp_millis(),
            toxicity: snapshot.toxicity,
            regime: snapshot.regime,
            recommended_fee_bps: snapshot.recommended_fee_bps,
            breaker_level: snapshot.breaker_level,
            oracle_price: snapshot.oracle_price,
            oracle_confidence: snapshot.oracle_confidence,
            seq: snapshot.seq,
        }
    }

    /// Signing digest: keccak256 over the msgpack encoding.
    pub fn digest(&self) -> PublishResult<B256> {
        let bytes = rmp_serde::to_vec(self)?;
        Ok(keccak256(&bytes))
    }
}

/// A parameter update with its publisher signature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedParameterUpdate {
    pub update: ParameterUpdate,
    /// Address of the publishing key.
    pub signer: Address,
    /// 65-byte signature over the update digest, hex encoded.
    pub signature: String,
}

impl SignedParameterUpdate {
    /// Sign an update with the publisher key.
    pub async fn sign(
        update: ParameterUpdate,
        signer: &PrivateKeySigner,
    ) -> PublishResult<Self> {
        let digest = update.digest()?;
        let signature = signer.sign_hash(&digest).await?;

        Ok(Self {
            update,
            signer: signer.address(),
            signature: hex::encode(signature.as_bytes()),
        })
    }

    /// Verify the signature and that it recovers the claimed signer.
    pub fn verify(&self) -> PublishResult<()> {
        let digest = self.update.digest()?;
        let bytes = hex::decode(&self.signature)?;
        let signature = PrimitiveSignature::try_from(bytes.as_slice())
            .map_err(|e| PublishError::BadSignature(e.to_string()))?;

        let recovered = signature
            .recover_address_from_prehash(&digest)
            .map_err(|e| PublishError::BadSignature(e.to_string()))?;

        if recovered != self.signer {
            return Err(PublishError::BadSignature(format!(
                "recovered {recovered}, claimed {}",
                self.signer
            )));
        }
        Ok(())
    }
}
