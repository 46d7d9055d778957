//! Flow toxicity estimation.
//!
//! A VPIN-style [0, 1] measure of one-sided (informed) order flow over a
//! rolling window of equal-capacity volume buckets. High toxicity means
//! the venue is likely trading against informed flow and should charge
//! for it.

pub mod bucket;
pub mod error;
pub mod estimator;

pub use bucket::VolumeBucket;
pub use error::{ToxicityError, ToxicityResult};
pub use estimator::{FlowToxicity, ToxicityConfig, ToxicityHandle, ToxicityMetrics};
