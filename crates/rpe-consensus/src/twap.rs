//! Time-weighted fallback price from pool-reserve observations.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use rpe_core::Price;
use rust_decimal::Decimal;
use tracing::trace;

/// Trapezoidal time-weighted average over sequential reserve-ratio
/// samples.
///
/// The venue feeds this with its own pool reserve ratios; when every
/// external source is stale, the aggregator falls back to this local
/// estimate at reduced confidence. Samples outside the window are
/// evicted on every insert and skipped on every read.
#[derive(Debug, Clone)]
pub struct ReserveTwap {
    window: Duration,
    samples: VecDeque<(DateTime<Utc>, Decimal)>,
}

impl ReserveTwap {
    #[must_use]
    pub fn new(window_secs: i64) -> Self {
        Self {
            window: Duration::seconds(window_secs),
            samples: VecDeque::new(),
        }
    }

    /// Record a reserve-ratio sample.
    ///
    /// Out-of-order samples (timestamp before the newest held sample)
    /// are dropped: the trapezoidal sum needs a monotone sequence.
    pub fn record(&mut self, now: DateTime<Utc>, ratio: Decimal) {
        if let Some(&(last, _)) = self.samples.back() {
            if now < last {
                trace!(%ratio, "dropping out-of-order reserve sample");
                return;
            }
        }

        self.samples.push_back((now, ratio));
        self.evict(now);
    }

    fn evict(&mut self, now: DateTime<Utc>) {
        let cutoff = now - self.window;
        while let Some(&(ts, _)) = self.samples.front() {
            if ts < cutoff {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    /// Time-weighted average price over the samples still inside the
    /// window at `now`.
    ///
    /// `None` when no sample is recent enough. A single sample (or
    /// samples at identical timestamps) degrades to the plain mean.
    /// Held-but-aged samples are skipped here and physically evicted on
    /// the next insert.
    #[must_use]
    pub fn price(&self, now: DateTime<Utc>) -> Option<Price> {
        let cutoff = now - self.window;
        let held: Vec<(DateTime<Utc>, Decimal)> = self
            .samples
            .iter()
            .filter(|&&(ts, _)| ts >= cutoff)
            .copied()
            .collect();

        let first = held.first()?;
        if held.len() == 1 {
            return Some(Price::new(first.1));
        }

        // Trapezoid per adjacent pair, weighted by the pair's dt.
        let mut weighted = Decimal::ZERO;
        let mut total_secs = Decimal::ZERO;
        for pair in held.iter().zip(held.iter().skip(1)) {
            let (&(t0, r0), &(t1, r1)) = pair;
            let dt = Decimal::from((t1 - t0).num_milliseconds());
            weighted += (r0 + r1) / Decimal::TWO * dt;
            total_secs += dt;
        }

        if total_secs.is_zero() {
            // All samples coincident: fall back to the mean.
            let sum: Decimal = held.iter().map(|&(_, r)| r).sum();
            return Some(Price::new(sum / Decimal::from(held.len() as u64)));
        }

        Some(Price::new(weighted / total_secs))
    }

    /// Number of samples currently held.
    #[must_use]
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }
}
