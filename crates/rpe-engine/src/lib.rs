//! Risk formula engine.
//!
//! Combines the session regime, flow toxicity, realized volatility and
//! inventory imbalance into a recommended fee and a circuit breaker
//! level, and exposes one consistent snapshot for the publisher.

pub mod breaker;
pub mod engine;
pub mod error;
pub mod fee;

pub use breaker::{breaker_level, BreakerInputs, HALT_LEVEL};
pub use engine::{EngineSnapshot, RiskEngine};
pub use error::{EngineError, EngineResult};
pub use fee::{fee_bps, FeeInputs};
