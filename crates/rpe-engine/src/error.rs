//! Error types for rpe-engine.

use rpe_session::Regime;
use thiserror::Error;

/// Engine-level errors.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Gap auctions only open during SoftOpen, current regime is {0}")]
    AuctionOutsideSoftOpen(Regime),

    #[error(transparent)]
    Auction(#[from] rpe_auction::AuctionError),
}

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
