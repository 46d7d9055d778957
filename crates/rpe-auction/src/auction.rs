//! Single-auction state: phases, commitments, reveals, decayed floor.

use std::collections::HashMap;
use std::fmt;

use alloy::primitives::{keccak256, B256};
use chrono::{DateTime, Duration, Utc};
use rpe_core::{PoolId, Price};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AuctionError, AuctionResult};

/// Smallest overnight gap worth auctioning, in percent.
pub const MIN_GAP_PERCENT: Decimal = Decimal::from_parts(5, 0, 0, false, 1);

/// Fraction of the theoretical arbitrage value the venue captures.
pub const CAPTURE_RATE: Decimal = Decimal::from_parts(70, 0, 0, false, 2);

/// Exponential decay rate of the bid floor, per minute since start.
pub const DECAY_RATE_PER_MIN: f64 = 0.4;

/// From this many minutes onward the floor is exactly zero.
pub const DECAY_CUTOFF_MINS: f64 = 5.0;

/// Auction lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuctionPhase {
    Commit,
    Reveal,
    Settled,
}

impl fmt::Display for AuctionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Commit => write!(f, "commit"),
            Self::Reveal => write!(f, "reveal"),
            Self::Settled => write!(f, "settled"),
        }
    }
}

/// Phase timings. The on-chain mirror of this auction runs 120s/60s;
/// the demo default is 30s/30s. Config, not code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuctionConfig {
    #[serde(default = "default_commit_secs")]
    pub commit_secs: i64,

    #[serde(default = "default_reveal_secs")]
    pub reveal_secs: i64,

    /// Settled auctions older than this are garbage-collected by sweep.
    #[serde(default = "default_retention_secs")]
    pub settled_retention_secs: i64,
}

fn default_commit_secs() -> i64 {
    30
}
fn default_reveal_secs() -> i64 {
    30
}
fn default_retention_secs() -> i64 {
    3600
}

impl Default for AuctionConfig {
    fn default() -> Self {
        Self {
            commit_secs: default_commit_secs(),
            reveal_secs: default_reveal_secs(),
            settled_retention_secs: default_retention_secs(),
        }
    }
}

/// Minimum acceptable bid at `elapsed` since auction start.
///
/// `gap/100 * liquidity * CAPTURE_RATE * e^(-DECAY_RATE * minutes)`,
/// exactly zero from the cutoff onward. Always recomputed at reveal
/// time, never cached: two reveals of the same amount can differ in
/// validity purely by when they arrive.
#[must_use]
pub fn min_bid(gap_percent: Decimal, liquidity_value: Price, elapsed: Duration) -> Price {
    let minutes = elapsed.num_milliseconds().max(0) as f64 / 60_000.0;
    if minutes >= DECAY_CUTOFF_MINS {
        return Price::ZERO;
    }

    let base = liquidity_value * (gap_percent / Decimal::ONE_HUNDRED) * CAPTURE_RATE;
    let decay = (-DECAY_RATE_PER_MIN * minutes).exp();
    base * Decimal::from_f64(decay).unwrap_or(Decimal::ZERO)
}

/// Binding commitment to a bid: `keccak256("{bidder}:{amount}:{salt}")`
/// with the amount normalized so `1.50` and `1.5` hash identically.
#[must_use]
pub fn commitment_hash(bidder: &str, amount: Price, salt: &str) -> B256 {
    let preimage = format!("{}:{}:{}", bidder, amount.inner().normalize(), salt);
    keccak256(preimage.as_bytes())
}

/// A revealed bid. `valid` is judged against the floor at reveal time;
/// invalid reveals stay recorded for audit but can never win.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reveal {
    pub amount: Price,
    pub salt: String,
    pub revealed_at: DateTime<Utc>,
    pub valid: bool,
}

/// One commit-reveal auction for an overnight gap on one pool.
#[derive(Debug, Clone)]
pub struct GapAuction {
    pub id: Uuid,
    pub pool: PoolId,
    /// Gap size in percent of the prior close, e.g. `20.00`.
    pub gap_percent: Decimal,
    /// Floor at t=0; the decayed floor scales down from this.
    pub min_bid_base: Price,
    pub started_at: DateTime<Utc>,
    pub phase: AuctionPhase,
    pub commitments: HashMap<String, B256>,
    pub reveals: HashMap<String, Reveal>,
    pub winner: Option<String>,
    pub settled_at: Option<DateTime<Utc>>,
    liquidity_value: Price,
}

impl GapAuction {
    pub(crate) fn new(
        pool: PoolId,
        gap_percent: Decimal,
        liquidity_value: Price,
        now: DateTime<Utc>,
    ) -> AuctionResult<Self> {
        if gap_percent < MIN_GAP_PERCENT {
            return Err(AuctionError::GapBelowMinimum {
                gap: gap_percent,
                min: MIN_GAP_PERCENT,
            });
        }
        if !liquidity_value.is_positive() {
            return Err(AuctionError::InvalidLiquidity(liquidity_value));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            pool,
            gap_percent,
            min_bid_base: min_bid(gap_percent, liquidity_value, Duration::zero()),
            started_at: now,
            phase: AuctionPhase::Commit,
            commitments: HashMap::new(),
            reveals: HashMap::new(),
            winner: None,
            settled_at: None,
            liquidity_value,
        })
    }

    pub fn commit_deadline(&self, cfg: &AuctionConfig) -> DateTime<Utc> {
        self.started_at + Duration::seconds(cfg.commit_secs)
    }

    pub fn reveal_deadline(&self, cfg: &AuctionConfig) -> DateTime<Utc> {
        self.commit_deadline(cfg) + Duration::seconds(cfg.reveal_secs)
    }

    /// Floor at `now`.
    #[must_use]
    pub fn current_min_bid(&self, now: DateTime<Utc>) -> Price {
        min_bid(self.gap_percent, self.liquidity_value, now - self.started_at)
    }

    /// Phase as it stands at `now`, without mutating.
    ///
    /// Past the reveal deadline the auction reads as `Settled` even
    /// before `settle` has computed the winner: deadline passage alone
    /// determines the phase, so timer-driven and lazy callers see the
    /// same thing.
    #[must_use]
    pub fn phase_at(&self, cfg: &AuctionConfig, now: DateTime<Utc>) -> AuctionPhase {
        if self.phase == AuctionPhase::Settled {
            return AuctionPhase::Settled;
        }
        if now < self.commit_deadline(cfg) {
            AuctionPhase::Commit
        } else if now < self.reveal_deadline(cfg) {
            AuctionPhase::Reveal
        } else {
            AuctionPhase::Settled
        }
    }

    /// Lazily advance the stored phase to match the deadlines.
    /// Settlement (winner selection) only happens through `settle`.
    pub(crate) fn advance(&mut self, cfg: &AuctionConfig, now: DateTime<Utc>) {
        if self.phase == AuctionPhase::Commit && now >= self.commit_deadline(cfg) {
            self.phase = AuctionPhase::Reveal;
        }
    }
}
