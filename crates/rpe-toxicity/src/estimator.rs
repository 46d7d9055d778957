//! Rolling-window flow toxicity estimator.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::Mutex;
use rpe_core::Volume;
use rpe_telemetry::Metrics;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::bucket::VolumeBucket;
use crate::error::{ToxicityError, ToxicityResult};

/// Estimator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToxicityConfig {
    /// Number of sealed buckets in the rolling window.
    #[serde(default = "default_window_buckets")]
    pub window_buckets: usize,

    /// Score returned until the window is full. A partial window gives
    /// noisy extremes; the fixed baseline avoids spurious readings on
    /// cold start.
    #[serde(default = "default_baseline_score")]
    pub baseline_score: f64,

    /// Bucket capacity before the first recalibration.
    #[serde(default = "default_initial_capacity")]
    pub initial_capacity: Volume,

    /// Recalibration floor.
    #[serde(default = "default_min_capacity")]
    pub min_capacity: Volume,

    /// Recalibration ceiling.
    #[serde(default = "default_max_capacity")]
    pub max_capacity: Volume,

    /// Trailing daily volumes kept for recalibration.
    #[serde(default = "default_daily_history")]
    pub daily_history: usize,

    /// Target capacity = trailing mean daily volume / this divisor.
    #[serde(default = "default_capacity_divisor")]
    pub capacity_divisor: Decimal,
}

fn default_window_buckets() -> usize {
    50
}
fn default_baseline_score() -> f64 {
    0.3
}
fn default_initial_capacity() -> Volume {
    Volume(Decimal::from(10_000))
}
fn default_min_capacity() -> Volume {
    Volume(Decimal::from(1_000))
}
fn default_max_capacity() -> Volume {
    Volume(Decimal::from(1_000_000))
}
fn default_daily_history() -> usize {
    20
}
fn default_capacity_divisor() -> Decimal {
    Decimal::from(50)
}

impl ToxicityConfig {
    /// Reject configurations the estimator cannot run on. A
    /// non-positive capacity would keep `process_trade` spilling
    /// forever, and a non-positive divisor has no usable target.
    pub fn validate(&self) -> ToxicityResult<()> {
        if self.window_buckets == 0 {
            return Err(ToxicityError::InvalidConfig(
                "window_buckets must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.baseline_score) {
            return Err(ToxicityError::InvalidConfig(format!(
                "baseline_score {} outside [0, 1]",
                self.baseline_score
            )));
        }
        if !self.initial_capacity.is_positive() {
            return Err(ToxicityError::InvalidConfig(format!(
                "initial_capacity {} must be positive",
                self.initial_capacity
            )));
        }
        if !self.min_capacity.is_positive() {
            return Err(ToxicityError::InvalidConfig(format!(
                "min_capacity {} must be positive",
                self.min_capacity
            )));
        }
        if self.max_capacity < self.min_capacity {
            return Err(ToxicityError::InvalidConfig(format!(
                "max_capacity {} below min_capacity {}",
                self.max_capacity, self.min_capacity
            )));
        }
        if self.daily_history == 0 {
            return Err(ToxicityError::InvalidConfig(
                "daily_history must be at least 1".to_string(),
            ));
        }
        if self.capacity_divisor <= Decimal::ZERO {
            return Err(ToxicityError::InvalidConfig(format!(
                "capacity_divisor {} must be positive",
                self.capacity_divisor
            )));
        }
        Ok(())
    }
}

impl Default for ToxicityConfig {
    fn default() -> Self {
        Self {
            window_buckets: default_window_buckets(),
            baseline_score: default_baseline_score(),
            initial_capacity: default_initial_capacity(),
            min_capacity: default_min_capacity(),
            max_capacity: default_max_capacity(),
            daily_history: default_daily_history(),
            capacity_divisor: default_capacity_divisor(),
        }
    }
}

/// Derived toxicity metrics. Recomputed from the window on demand,
/// never stored independently.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToxicityMetrics {
    /// Toxicity score in [0, 1].
    pub score: f64,
    /// Sealed buckets currently in the window.
    pub buckets_filled: usize,
    /// Capacity new buckets open with.
    pub bucket_capacity: Volume,
}

/// VPIN-style flow toxicity over a rolling volume-bucket window.
///
/// Single logical owner per subject; wrap in [`ToxicityHandle`] when
/// multiple network-facing handlers feed the same subject.
#[derive(Debug)]
pub struct FlowToxicity {
    config: ToxicityConfig,
    /// Sealed buckets, oldest first.
    window: VecDeque<VolumeBucket>,
    /// The bucket currently accumulating.
    open: VolumeBucket,
    /// Capacity the open bucket was opened with. Recalibration only
    /// affects buckets opened afterwards.
    open_capacity: Volume,
    /// Capacity for the next bucket.
    capacity: Volume,
    /// Trailing daily volumes for recalibration.
    daily_volumes: VecDeque<Volume>,
    /// UTC date of the last applied recalibration.
    last_recalibration: Option<NaiveDate>,
}

impl FlowToxicity {
    pub fn new(config: ToxicityConfig) -> ToxicityResult<Self> {
        config.validate()?;
        let capacity = config.initial_capacity;
        Ok(Self {
            config,
            window: VecDeque::new(),
            open: VolumeBucket::open(),
            open_capacity: capacity,
            capacity,
            daily_volumes: VecDeque::new(),
            last_recalibration: None,
        })
    }

    /// Process one trade execution and return the updated metrics.
    ///
    /// A single large trade may seal several buckets: the volume spills
    /// across bucket boundaries until exhausted. Non-positive volumes are
    /// ignored (logged rather than errored; the feed occasionally reports
    /// zero-volume corrections).
    pub fn process_trade(
        &mut self,
        volume: Volume,
        is_buy: bool,
        now: DateTime<Utc>,
    ) -> ToxicityMetrics {
        if !volume.is_positive() {
            debug!(%volume, "ignoring non-positive trade volume");
            return self.metrics();
        }
        Metrics::trade_processed();

        let mut rest = volume;
        while rest.is_positive() {
            let remaining = self.open.remaining(self.open_capacity);
            if rest < remaining {
                self.open.add(rest, is_buy);
                break;
            }

            self.open.add(remaining, is_buy);
            self.seal_open(now);
            rest = rest - remaining;
        }

        self.metrics()
    }

    /// Seal the open bucket into the window and start a fresh one.
    fn seal_open(&mut self, now: DateTime<Utc>) {
        let mut sealed = std::mem::replace(&mut self.open, VolumeBucket::open());
        sealed.seal(now);
        trace!(
            buy = %sealed.buy_volume,
            sell = %sealed.sell_volume,
            "volume bucket sealed"
        );

        self.window.push_back(sealed);
        while self.window.len() > self.config.window_buckets {
            self.window.pop_front();
        }
        self.open_capacity = self.capacity;
        Metrics::bucket_sealed();
    }

    /// Current metrics, recomputed from the window.
    #[must_use]
    pub fn metrics(&self) -> ToxicityMetrics {
        ToxicityMetrics {
            score: self.score(),
            buckets_filled: self.window.len(),
            bucket_capacity: self.capacity,
        }
    }

    /// Σ|buy − sell| / Σtotal over the window, or the baseline while the
    /// window is not yet full.
    fn score(&self) -> f64 {
        if self.window.len() < self.config.window_buckets {
            return self.config.baseline_score;
        }

        let mut imbalance = Decimal::ZERO;
        let mut total = Decimal::ZERO;
        for bucket in &self.window {
            imbalance += bucket.imbalance().inner();
            total += bucket.total_volume.inner();
        }

        if total.is_zero() {
            return self.config.baseline_score;
        }

        (imbalance / total).to_f64().unwrap_or(self.config.baseline_score)
    }

    /// Recalibrate bucket capacity from a trailing mean of daily volumes.
    ///
    /// Applies at most once per UTC calendar day; returns the new
    /// capacity when a recalibration was applied. The open bucket keeps
    /// the capacity it was opened with.
    pub fn recalibrate(&mut self, daily_volume: Volume, now: DateTime<Utc>) -> Option<Volume> {
        let today = now.date_naive();
        if self.last_recalibration == Some(today) {
            trace!("recalibration already applied today");
            return None;
        }

        self.daily_volumes.push_back(daily_volume);
        while self.daily_volumes.len() > self.config.daily_history {
            self.daily_volumes.pop_front();
        }

        let sum: Decimal = self.daily_volumes.iter().map(|v| v.inner()).sum();
        let mean = sum / Decimal::from(self.daily_volumes.len() as u64);
        let target = Volume::new(mean / self.config.capacity_divisor)
            .clamp(self.config.min_capacity, self.config.max_capacity);

        debug!(
            old = %self.capacity,
            new = %target,
            samples = self.daily_volumes.len(),
            "bucket capacity recalibrated"
        );

        self.capacity = target;
        self.last_recalibration = Some(today);
        Some(target)
    }

    #[must_use]
    pub fn config(&self) -> &ToxicityConfig {
        &self.config
    }
}

/// Shared handle for concurrent callers.
///
/// One lockable unit per subject: trade events arrive from independent
/// handlers, but cross-subject operations never need two locks at once.
#[derive(Debug, Clone)]
pub struct ToxicityHandle {
    inner: Arc<Mutex<FlowToxicity>>,
}

impl ToxicityHandle {
    pub fn new(config: ToxicityConfig) -> ToxicityResult<Self> {
        Ok(Self {
            inner: Arc::new(Mutex::new(FlowToxicity::new(config)?)),
        })
    }

    pub fn process_trade(&self, volume: Volume, is_buy: bool, now: DateTime<Utc>) -> ToxicityMetrics {
        self.inner.lock().process_trade(volume, is_buy, now)
    }

    pub fn recalibrate(&self, daily_volume: Volume, now: DateTime<Utc>) -> Option<Volume> {
        self.inner.lock().recalibrate(daily_volume, now)
    }

    #[must_use]
    pub fn metrics(&self) -> ToxicityMetrics {
        self.inner.lock().metrics()
    }
}
