//! Core domain types for the risk parameter engine.
//!
//! This crate provides the fundamental types shared across the engine:
//! - `Price`, `Volume`: precision-safe numeric types
//! - `PoolId`: identifier for the venue pool a subject belongs to
//! - `PriceObservation`: a timestamped price with provenance and confidence

pub mod decimal;
pub mod error;
pub mod observation;

pub use decimal::{Price, Volume};
pub use error::{CoreError, Result};
pub use observation::{PoolId, PriceObservation, PriceSourceKind};
