//! Consensus computation over price observations.

use chrono::{DateTime, Utc};
use rpe_core::{Price, PriceObservation, PriceSourceKind};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::twap::ReserveTwap;

/// Aggregator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusConfig {
    /// Observations older than this are discarded.
    #[serde(default = "default_staleness_secs")]
    pub staleness_secs: i64,

    /// Sources expected for full confidence; fewer scales by 0.8.
    #[serde(default = "default_min_sources")]
    pub min_sources: usize,

    /// Confidence cap when exactly one source survives.
    #[serde(default = "default_single_source_cap")]
    pub single_source_cap: f64,

    /// Confidence assigned to the time-weighted fallback.
    #[serde(default = "default_fallback_confidence")]
    pub fallback_confidence: f64,

    /// Max relative deviation for full confidence.
    #[serde(default = "default_tight_deviation")]
    pub tight_deviation: f64,

    /// Max relative deviation for 0.8 confidence.
    #[serde(default = "default_loose_deviation")]
    pub loose_deviation: f64,

    /// Time-weighted fallback window.
    #[serde(default = "default_twap_window_secs")]
    pub twap_window_secs: i64,

    /// Per-source fetch timeout.
    #[serde(default = "default_source_timeout_ms")]
    pub source_timeout_ms: u64,
}

fn default_staleness_secs() -> i64 {
    60
}
fn default_min_sources() -> usize {
    2
}
fn default_single_source_cap() -> f64 {
    0.6
}
fn default_fallback_confidence() -> f64 {
    0.3
}
fn default_tight_deviation() -> f64 {
    0.01
}
fn default_loose_deviation() -> f64 {
    0.05
}
fn default_twap_window_secs() -> i64 {
    1800
}
fn default_source_timeout_ms() -> u64 {
    500
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            staleness_secs: default_staleness_secs(),
            min_sources: default_min_sources(),
            single_source_cap: default_single_source_cap(),
            fallback_confidence: default_fallback_confidence(),
            tight_deviation: default_tight_deviation(),
            loose_deviation: default_loose_deviation(),
            twap_window_secs: default_twap_window_secs(),
            source_timeout_ms: default_source_timeout_ms(),
        }
    }
}

/// Compute a consensus observation from raw source observations.
///
/// Always returns an observation. Zero fresh sources degrade to the
/// time-weighted fallback (confidence 0.3, provenance `Derived`); one
/// fresh source is passed through with capped confidence; two or more
/// produce the median with deviation-tiered confidence. The provenance
/// tag lets downstream consumers distinguish a degraded read from a
/// healthy one.
#[must_use]
pub fn consensus(
    observations: &[PriceObservation],
    fallback: Option<&ReserveTwap>,
    cfg: &ConsensusConfig,
    now: DateTime<Utc>,
) -> PriceObservation {
    let mut fresh: Vec<&PriceObservation> = observations
        .iter()
        .filter(|o| !o.is_stale(now, cfg.staleness_secs) && o.price.is_positive())
        .collect();

    match fresh.len() {
        0 => degraded_fallback(fallback, cfg, now),
        1 => {
            let single = fresh[0];
            debug!(source = %single.source, "single-source consensus, capping confidence");
            PriceObservation::new(
                single.price,
                single.observed_at,
                single.source,
                single.confidence.min(cfg.single_source_cap),
            )
        }
        n => {
            fresh.sort_by(|a, b| a.price.cmp(&b.price));
            let median = median_price(&fresh);
            let deviation = max_relative_deviation(&fresh);

            let mut confidence = if deviation <= cfg.tight_deviation {
                1.0
            } else if deviation <= cfg.loose_deviation {
                0.8
            } else {
                0.5
            };
            if n < cfg.min_sources {
                confidence *= 0.8;
            }

            PriceObservation::new(median, now, PriceSourceKind::Consensus, confidence)
        }
    }
}

fn degraded_fallback(
    fallback: Option<&ReserveTwap>,
    cfg: &ConsensusConfig,
    now: DateTime<Utc>,
) -> PriceObservation {
    match fallback.and_then(|t| t.price(now)) {
        Some(price) => {
            warn!(%price, "no fresh price source, using time-weighted fallback");
            PriceObservation::new(price, now, PriceSourceKind::Derived, cfg.fallback_confidence)
        }
        None => {
            warn!("no fresh price source and no fallback samples");
            PriceObservation::new(Price::ZERO, now, PriceSourceKind::Derived, 0.0)
        }
    }
}

/// Median of a price-sorted observation slice. Even counts take the
/// mean of the middle pair.
fn median_price(sorted: &[&PriceObservation]) -> Price {
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2].price
    } else {
        let lo = sorted[n / 2 - 1].price.inner();
        let hi = sorted[n / 2].price.inner();
        Price::new((lo + hi) / Decimal::TWO)
    }
}

/// Max pairwise relative deviation, computed against the minimum price.
fn max_relative_deviation(sorted: &[&PriceObservation]) -> f64 {
    let min = sorted.first().map(|o| o.price);
    let max = sorted.last().map(|o| o.price);
    match (min, max) {
        (Some(min), Some(max)) => max.relative_deviation_from(min).unwrap_or(f64::MAX),
        _ => 0.0,
    }
}
