//! Prometheus metrics for the risk parameter engine.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()` intentionally. If registration
//! fails, it indicates a fatal configuration error (e.g., duplicate
//! metric names) that should cause an immediate crash at startup rather
//! than silent failure. These panics only occur during static
//! initialization, never at runtime.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter, register_counter_vec, register_gauge, register_int_gauge, Counter,
    CounterVec, Gauge, IntGauge,
};

/// Total trades fed into the toxicity estimator.
pub static TRADES_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!("rpe_trades_total", "Total trades processed").unwrap()
});

/// Total volume buckets sealed.
pub static BUCKETS_SEALED_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!("rpe_buckets_sealed_total", "Total volume buckets sealed").unwrap()
});

/// Current flow toxicity score (0.0-1.0).
pub static TOXICITY_SCORE: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!("rpe_toxicity_score", "Current flow toxicity score").unwrap()
});

/// Current recommended fee in basis points.
pub static FEE_BPS: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!("rpe_fee_bps", "Current recommended fee in basis points").unwrap()
});

/// Current circuit breaker level (0-4).
pub static BREAKER_LEVEL: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("rpe_breaker_level", "Current circuit breaker level (0-4)").unwrap()
});

/// Confidence of the latest consensus price.
pub static CONSENSUS_CONFIDENCE: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!(
        "rpe_consensus_confidence",
        "Confidence of the latest consensus price"
    )
    .unwrap()
});

/// Auction commitments by outcome.
/// Labels: outcome (accepted/rejected)
pub static AUCTION_COMMITS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "rpe_auction_commits_total",
        "Total auction commitments by outcome",
        &["outcome"]
    )
    .unwrap()
});

/// Auction reveals by outcome.
/// Labels: outcome (valid/below_min/rejected)
pub static AUCTION_REVEALS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "rpe_auction_reveals_total",
        "Total auction reveals by outcome",
        &["outcome"]
    )
    .unwrap()
});

/// Parameter publishes by outcome.
/// Labels: outcome (sent/skipped/failed)
pub static PUBLISHES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "rpe_publishes_total",
        "Total parameter publishes by outcome",
        &["outcome"]
    )
    .unwrap()
});

/// Metrics facade for easy access.
pub struct Metrics;

impl Metrics {
    /// Record a trade processed by the toxicity estimator.
    pub fn trade_processed() {
        TRADES_TOTAL.inc();
    }

    /// Record a sealed volume bucket.
    pub fn bucket_sealed() {
        BUCKETS_SEALED_TOTAL.inc();
    }

    /// Update the toxicity score gauge.
    pub fn toxicity_score(score: f64) {
        TOXICITY_SCORE.set(score);
    }

    /// Update the recommended fee gauge.
    pub fn fee_bps(bps: f64) {
        FEE_BPS.set(bps);
    }

    /// Update the breaker level gauge.
    pub fn breaker_level(level: u8) {
        BREAKER_LEVEL.set(i64::from(level));
    }

    /// Update the consensus confidence gauge.
    pub fn consensus_confidence(confidence: f64) {
        CONSENSUS_CONFIDENCE.set(confidence);
    }

    /// Record an auction commitment outcome.
    pub fn auction_commit(outcome: &str) {
        AUCTION_COMMITS_TOTAL.with_label_values(&[outcome]).inc();
    }

    /// Record an auction reveal outcome.
    pub fn auction_reveal(outcome: &str) {
        AUCTION_REVEALS_TOTAL.with_label_values(&[outcome]).inc();
    }

    /// Record a publish outcome.
    pub fn publish(outcome: &str) {
        PUBLISHES_TOTAL.with_label_values(&[outcome]).inc();
    }
}
