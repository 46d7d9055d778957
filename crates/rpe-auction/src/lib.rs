//! Commit-reveal gap auction engine.
//!
//! When a pool reopens far from its prior close, the right to arbitrage
//! the gap is auctioned instead of being won by latency. Bidders commit
//! to hashed bids, reveal after the commit window closes, and the floor
//! price decays exponentially so an unclaimed gap eventually clears at
//! any price.

pub mod auction;
pub mod engine;
pub mod error;

pub use auction::{
    commitment_hash, min_bid, AuctionConfig, AuctionPhase, GapAuction, Reveal, CAPTURE_RATE,
    DECAY_CUTOFF_MINS, DECAY_RATE_PER_MIN, MIN_GAP_PERCENT,
};
pub use engine::{AuctionEngine, AuctionStatus};
pub use error::{AuctionError, AuctionResult};
