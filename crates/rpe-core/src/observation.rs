//! Price observations and pool identifiers.

use crate::decimal::Price;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier for a venue pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoolId(pub u32);

impl PoolId {
    #[inline]
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    #[inline]
    pub fn inner(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pool-{}", self.0)
    }
}

/// Provenance of a price observation.
///
/// Downstream consumers use this to distinguish a degraded read
/// (TWAP-derived fallback) from a healthy multi-source consensus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceSourceKind {
    /// Primary external price feed.
    Primary,
    /// Secondary external price feed.
    Secondary,
    /// Derived locally (time-weighted fallback from pool reserves).
    Derived,
    /// Aggregated from two or more fresh sources.
    Consensus,
}

impl fmt::Display for PriceSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => write!(f, "primary"),
            Self::Secondary => write!(f, "secondary"),
            Self::Derived => write!(f, "derived"),
            Self::Consensus => write!(f, "consensus"),
        }
    }
}

/// A timestamped price with provenance and a confidence weight in [0, 1].
///
/// Raw observations come from external sources; consensus observations
/// are derived and never persisted as input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    /// Observed price.
    pub price: Price,
    /// When the price was observed (publisher-side timestamp).
    pub observed_at: DateTime<Utc>,
    /// Where the observation came from.
    pub source: PriceSourceKind,
    /// Confidence weight in [0, 1].
    pub confidence: f64,
}

impl PriceObservation {
    pub fn new(
        price: Price,
        observed_at: DateTime<Utc>,
        source: PriceSourceKind,
        confidence: f64,
    ) -> Self {
        Self {
            price,
            observed_at,
            source,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// Age of the observation in whole seconds at `now`.
    ///
    /// Observations from the future (clock skew) age as zero.
    #[must_use]
    pub fn age_secs(&self, now: DateTime<Utc>) -> i64 {
        (now - self.observed_at).num_seconds().max(0)
    }

    /// Whether the observation is older than `staleness_secs` at `now`.
    #[must_use]
    pub fn is_stale(&self, now: DateTime<Utc>, staleness_secs: i64) -> bool {
        self.age_secs(now) > staleness_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn utc(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_age_and_staleness() {
        let obs = PriceObservation::new(
            Price::new(dec!(100)),
            utc(0),
            PriceSourceKind::Primary,
            0.9,
        );

        assert_eq!(obs.age_secs(utc(45)), 45);
        assert!(!obs.is_stale(utc(60), 60));
        assert!(obs.is_stale(utc(61), 60));
    }

    #[test]
    fn test_future_observation_age_clamped() {
        let obs = PriceObservation::new(
            Price::new(dec!(100)),
            utc(30),
            PriceSourceKind::Secondary,
            1.0,
        );
        // Observed "in the future" relative to now: treated as fresh, not negative.
        assert_eq!(obs.age_secs(utc(0)), 0);
    }

    #[test]
    fn test_confidence_clamped_on_construction() {
        let obs = PriceObservation::new(Price::new(dec!(1)), utc(0), PriceSourceKind::Derived, 1.7);
        assert_eq!(obs.confidence, 1.0);
    }

    #[test]
    fn test_source_kind_serde() {
        let json = serde_json::to_string(&PriceSourceKind::Consensus).unwrap();
        assert_eq!(json, "\"consensus\"");
    }
}
