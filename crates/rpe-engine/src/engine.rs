//! The risk engine: one consistent read surface over all estimators.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rpe_auction::{AuctionEngine, AuctionStatus};
use rpe_core::{PoolId, Price, PriceObservation};
use rpe_session::{Regime, SessionClassifier};
use rpe_telemetry::Metrics;
use rpe_toxicity::{ToxicityHandle, ToxicityMetrics};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::breaker::{breaker_level, BreakerInputs};
use crate::error::{EngineError, EngineResult};
use crate::fee::{fee_bps, FeeInputs};

/// Live inputs that arrive from the venue's own feeds. Grouped under
/// one lock so a snapshot reads them in one acquisition.
#[derive(Debug, Default)]
struct LiveInputs {
    volatility: f64,
    inventory_imbalance: f64,
    pool_price: Option<Price>,
}

/// One consistent parameter sample for downstream consumers.
///
/// `seq` increases with every snapshot taken; the publisher uses it to
/// drop stale samples instead of re-ordering them.
#[derive(Debug, Clone, Serialize)]
pub struct EngineSnapshot {
    pub sampled_at: DateTime<Utc>,
    pub regime: Regime,
    pub toxicity: f64,
    pub recommended_fee_bps: f64,
    pub breaker_level: u8,
    pub oracle_price: Option<Price>,
    pub oracle_confidence: Option<f64>,
    pub seq: u64,
}

/// Central risk parameter engine.
///
/// Owns the toxicity estimator, the session classifier, the auction
/// engine, and the latest consensus observation. Every read takes time
/// as an explicit parameter and is side-effect-free apart from metric
/// gauges; no method ever holds two locks at once.
pub struct RiskEngine {
    toxicity: ToxicityHandle,
    classifier: SessionClassifier,
    auctions: AuctionEngine,
    last_consensus: RwLock<Option<PriceObservation>>,
    inputs: RwLock<LiveInputs>,
    seq: AtomicU64,
}

impl RiskEngine {
    #[must_use]
    pub fn new(
        toxicity: ToxicityHandle,
        classifier: SessionClassifier,
        auctions: AuctionEngine,
    ) -> Self {
        Self {
            toxicity,
            classifier,
            auctions,
            last_consensus: RwLock::new(None),
            inputs: RwLock::new(LiveInputs::default()),
            seq: AtomicU64::new(0),
        }
    }

    // --- mutation surface ---

    /// Feed one trade execution into the toxicity estimator.
    pub fn record_trade(
        &self,
        volume: rpe_core::Volume,
        is_buy: bool,
        now: DateTime<Utc>,
    ) -> ToxicityMetrics {
        let metrics = self.toxicity.process_trade(volume, is_buy, now);
        Metrics::toxicity_score(metrics.score);
        metrics
    }

    /// Install the latest consensus observation.
    pub fn apply_consensus(&self, observation: PriceObservation) {
        Metrics::consensus_confidence(observation.confidence);
        debug!(
            price = %observation.price,
            confidence = observation.confidence,
            source = %observation.source,
            "consensus applied"
        );
        *self.last_consensus.write() = Some(observation);
    }

    /// Update the realized volatility estimate (per-unit fraction).
    pub fn set_volatility(&self, volatility: f64) {
        self.inputs.write().volatility = volatility;
    }

    /// Update the maker inventory imbalance in [-1, 1].
    pub fn set_inventory_imbalance(&self, imbalance: f64) {
        self.inputs.write().inventory_imbalance = imbalance;
    }

    /// Update the venue's own pool price, used for the breaker's
    /// deviation-from-consensus flag.
    pub fn set_pool_price(&self, price: Price) {
        self.inputs.write().pool_price = Some(price);
    }

    /// Open a gap auction. Only permitted while the reference market is
    /// in its soft-open window; outside it a gap is not an auctionable
    /// event.
    pub fn start_gap_auction(
        &self,
        pool: PoolId,
        gap_percent: Decimal,
        liquidity_value: Price,
        now: DateTime<Utc>,
    ) -> EngineResult<Uuid> {
        let regime = self.classifier.classify(now);
        if regime != Regime::SoftOpen {
            return Err(EngineError::AuctionOutsideSoftOpen(regime));
        }

        let id = self.auctions.start(pool, gap_percent, liquidity_value, now)?;
        info!(%id, pool = pool.0, gap = %gap_percent, "gap auction opened by engine");
        Ok(id)
    }

    // --- read surface ---

    #[must_use]
    pub fn current_regime(&self, now: DateTime<Utc>) -> Regime {
        self.classifier.classify(now)
    }

    #[must_use]
    pub fn current_fee_bps(&self, now: DateTime<Utc>) -> f64 {
        let regime = self.classifier.classify(now);
        fee_bps(regime, self.fee_inputs())
    }

    #[must_use]
    pub fn current_breaker(&self, now: DateTime<Utc>) -> u8 {
        let regime = self.classifier.classify(now);
        breaker_level(self.breaker_inputs(regime, now))
    }

    pub fn auction_status(&self, id: Uuid, now: DateTime<Utc>) -> EngineResult<AuctionStatus> {
        Ok(self.auctions.status(id, now)?)
    }

    /// Auctions a bidder can still act on, with current phase and floor.
    #[must_use]
    pub fn active_auctions(&self, now: DateTime<Utc>) -> Vec<AuctionStatus> {
        self.auctions.active(now)
    }

    /// Direct access to the auction engine for commit/reveal traffic
    /// and background sweeping.
    #[must_use]
    pub fn auctions(&self) -> &AuctionEngine {
        &self.auctions
    }

    /// One consistent sample of every published parameter.
    pub fn snapshot(&self, now: DateTime<Utc>) -> EngineSnapshot {
        let regime = self.classifier.classify(now);
        let toxicity = self.toxicity.metrics().score;
        let fee = fee_bps(regime, self.fee_inputs());
        let breaker = breaker_level(self.breaker_inputs(regime, now));
        let consensus = *self.last_consensus.read();

        Metrics::fee_bps(fee);
        Metrics::breaker_level(breaker);

        EngineSnapshot {
            sampled_at: now,
            regime,
            toxicity,
            recommended_fee_bps: fee,
            breaker_level: breaker,
            oracle_price: consensus.map(|o| o.price),
            oracle_confidence: consensus.map(|o| o.confidence),
            seq: self.seq.fetch_add(1, Ordering::SeqCst) + 1,
        }
    }

    fn fee_inputs(&self) -> FeeInputs {
        let toxicity = self.toxicity.metrics().score;
        let inputs = self.inputs.read();
        FeeInputs {
            volatility: inputs.volatility,
            toxicity,
            inventory_imbalance: inputs.inventory_imbalance,
        }
    }

    fn breaker_inputs(&self, regime: Regime, now: DateTime<Utc>) -> BreakerInputs {
        let toxicity = self.toxicity.metrics().score;
        let consensus = *self.last_consensus.read();
        let inputs = self.inputs.read();

        // Missing consensus reads as maximally stale; missing either
        // price reads as zero deviation.
        let oracle_age_secs = consensus.map_or(i64::MAX, |o| o.age_secs(now));
        let price_deviation = match (inputs.pool_price, consensus) {
            (Some(pool), Some(oracle)) => {
                pool.relative_deviation_from(oracle.price).unwrap_or(0.0)
            }
            _ => 0.0,
        };

        BreakerInputs {
            oracle_age_secs,
            price_deviation,
            toxicity,
            inventory_imbalance: inputs.inventory_imbalance,
            is_core: regime == Regime::CoreSession,
        }
    }
}
