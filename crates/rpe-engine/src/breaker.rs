//! Additive circuit breaker.

use serde::{Deserialize, Serialize};

/// Oracle staleness threshold during core hours, in seconds.
pub const ORACLE_STALE_SECS: i64 = 60;
/// Price deviation threshold (fraction).
pub const DEVIATION_THRESHOLD: f64 = 0.03;
/// Toxicity threshold.
pub const TOXICITY_THRESHOLD: f64 = 0.7;
/// Inventory imbalance threshold (fraction).
pub const IMBALANCE_THRESHOLD: f64 = 0.4;

/// Halt level: consumers reject all trading at this level.
pub const HALT_LEVEL: u8 = 4;

/// Inputs to the breaker evaluation, sampled at one instant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BreakerInputs {
    pub oracle_age_secs: i64,
    pub price_deviation: f64,
    pub toxicity: f64,
    pub inventory_imbalance: f64,
    /// Whether the reference market is in core hours. Oracle staleness
    /// only counts against the breaker when it is: off-hours staleness
    /// is expected, not a fault.
    pub is_core: bool,
}

/// Additive breaker level in `[0, 4]`, one flag per tripped condition.
///
/// Levels 1-3 pass through to consumers unchanged (graduated caution);
/// 4 is a halt. The deviation flag fires on the consensus price alone,
/// regardless of its confidence: a confident-but-wrong oracle and an
/// unconfident one both warrant the same caution.
#[must_use]
pub fn breaker_level(inputs: BreakerInputs) -> u8 {
    let mut flags: u8 = 0;

    if inputs.is_core && inputs.oracle_age_secs > ORACLE_STALE_SECS {
        flags += 1;
    }
    if inputs.price_deviation.abs() > DEVIATION_THRESHOLD {
        flags += 1;
    }
    if inputs.toxicity > TOXICITY_THRESHOLD {
        flags += 1;
    }
    if inputs.inventory_imbalance.abs() > IMBALANCE_THRESHOLD {
        flags += 1;
    }

    flags.min(HALT_LEVEL)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calm() -> BreakerInputs {
        BreakerInputs {
            oracle_age_secs: 5,
            price_deviation: 0.0,
            toxicity: 0.3,
            inventory_imbalance: 0.0,
            is_core: true,
        }
    }

    #[test]
    fn test_calm_market_level_zero() {
        assert_eq!(breaker_level(calm()), 0);
    }

    #[test]
    fn test_each_flag_individually() {
        assert_eq!(
            breaker_level(BreakerInputs {
                oracle_age_secs: 61,
                ..calm()
            }),
            1
        );
        assert_eq!(
            breaker_level(BreakerInputs {
                price_deviation: 0.04,
                ..calm()
            }),
            1
        );
        assert_eq!(
            breaker_level(BreakerInputs {
                toxicity: 0.71,
                ..calm()
            }),
            1
        );
        assert_eq!(
            breaker_level(BreakerInputs {
                inventory_imbalance: 0.41,
                ..calm()
            }),
            1
        );
    }

    #[test]
    fn test_thresholds_are_strict() {
        // At the threshold exactly, nothing fires.
        let edge = BreakerInputs {
            oracle_age_secs: 60,
            price_deviation: 0.03,
            toxicity: 0.7,
            inventory_imbalance: 0.4,
            is_core: true,
        };
        assert_eq!(breaker_level(edge), 0);
    }

    #[test]
    fn test_stale_oracle_ignored_off_hours() {
        let inputs = BreakerInputs {
            oracle_age_secs: 3600,
            is_core: false,
            ..calm()
        };
        assert_eq!(breaker_level(inputs), 0);
    }

    #[test]
    fn test_all_flags_is_halt() {
        let bad = BreakerInputs {
            oracle_age_secs: 120,
            price_deviation: -0.10,
            toxicity: 0.9,
            inventory_imbalance: -0.8,
            is_core: true,
        };
        assert_eq!(breaker_level(bad), HALT_LEVEL);
    }

    #[test]
    fn test_deviation_and_imbalance_sign_agnostic() {
        let neg = BreakerInputs {
            price_deviation: -0.05,
            inventory_imbalance: -0.5,
            ..calm()
        };
        assert_eq!(breaker_level(neg), 2);
    }

    #[test]
    fn test_monotone_in_each_flag() {
        // Adding a tripped condition never lowers the level.
        let base = calm();
        let one = BreakerInputs {
            toxicity: 0.9,
            ..base
        };
        let two = BreakerInputs {
            price_deviation: 0.05,
            ..one
        };
        assert!(breaker_level(one) >= breaker_level(base));
        assert!(breaker_level(two) >= breaker_level(one));
        assert!(breaker_level(two) <= HALT_LEVEL);
    }
}
