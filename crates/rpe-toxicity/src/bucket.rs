//! Volume buckets.

use chrono::{DateTime, Utc};
use rpe_core::Volume;
use serde::{Deserialize, Serialize};

/// A fixed-capacity volume bucket.
///
/// Accumulates trade volume on the buy and sell sides until the total
/// reaches the bucket capacity, at which point it is sealed and pushed
/// into the rolling window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeBucket {
    /// Volume executed on the buy side.
    pub buy_volume: Volume,
    /// Volume executed on the sell side.
    pub sell_volume: Volume,
    /// Total volume accumulated.
    pub total_volume: Volume,
    /// When the bucket was sealed. `None` while still open.
    pub closed_at: Option<DateTime<Utc>>,
}

impl VolumeBucket {
    /// A fresh, empty, open bucket.
    #[must_use]
    pub fn open() -> Self {
        Self {
            buy_volume: Volume::ZERO,
            sell_volume: Volume::ZERO,
            total_volume: Volume::ZERO,
            closed_at: None,
        }
    }

    /// Add volume to the appropriate side.
    pub fn add(&mut self, volume: Volume, is_buy: bool) {
        if is_buy {
            self.buy_volume += volume;
        } else {
            self.sell_volume += volume;
        }
        self.total_volume += volume;
    }

    /// Remaining capacity given the configured bucket capacity.
    #[must_use]
    pub fn remaining(&self, capacity: Volume) -> Volume {
        if self.total_volume >= capacity {
            Volume::ZERO
        } else {
            capacity - self.total_volume
        }
    }

    /// Whether the bucket has reached capacity.
    #[must_use]
    pub fn is_full(&self, capacity: Volume) -> bool {
        self.total_volume >= capacity
    }

    /// Seal the bucket at `now`.
    pub fn seal(&mut self, now: DateTime<Utc>) {
        self.closed_at = Some(now);
    }

    /// Absolute buy/sell imbalance of this bucket.
    #[must_use]
    pub fn imbalance(&self) -> Volume {
        if self.buy_volume >= self.sell_volume {
            self.buy_volume - self.sell_volume
        } else {
            self.sell_volume - self.buy_volume
        }
    }
}
