//! Multi-source price consensus.
//!
//! Aggregates independent price sources into one observation with a
//! confidence weight and provenance tag. Degraded inputs (stale or
//! missing sources) resolve to documented fallbacks with reduced
//! confidence rather than an error.

pub mod aggregator;
pub mod error;
pub mod source;
pub mod twap;

pub use aggregator::{consensus, ConsensusConfig};
pub use error::{ConsensusError, ConsensusResult};
pub use source::{fetch_all, BoxFuture, HttpPriceSource, PriceSource};
pub use twap::ReserveTwap;
