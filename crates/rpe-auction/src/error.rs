//! Error types for rpe-auction.

use alloy::primitives::B256;
use rpe_core::Price;
use thiserror::Error;
use uuid::Uuid;

use crate::auction::AuctionPhase;

/// Auction protocol and validation errors.
///
/// Protocol violations (wrong phase, bad hash, duplicate commitment)
/// leave the auction state untouched. `BidBelowMinimum` is the one
/// exception: the reveal is recorded for audit before the error is
/// returned, so the bid is visible but can never win.
#[derive(Debug, Error)]
pub enum AuctionError {
    #[error("Gap {gap}% is below the {min}% auction threshold")]
    GapBelowMinimum { gap: rust_decimal::Decimal, min: rust_decimal::Decimal },

    #[error("Liquidity value must be positive, got {0}")]
    InvalidLiquidity(Price),

    #[error("Unknown auction: {0}")]
    UnknownAuction(Uuid),

    #[error("Operation requires phase {expected}, auction is in {actual}")]
    PhaseViolation {
        expected: AuctionPhase,
        actual: AuctionPhase,
    },

    #[error("Bidder {0} has already committed")]
    DuplicateCommitment(String),

    #[error("Bidder {0} has already revealed")]
    DuplicateReveal(String),

    #[error("Reveal from {bidder} does not match commitment {committed}")]
    CommitmentMismatch { bidder: String, committed: B256 },

    #[error("Bid {offered} is below the current minimum {required}")]
    BidBelowMinimum { offered: Price, required: Price },
}

/// Result type alias for auction operations.
pub type AuctionResult<T> = Result<T, AuctionError>;
