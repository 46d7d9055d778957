//! Trading regimes and their static fee parameters.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete trading regime of the reference market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Regime {
    /// Regular trading hours, after the soft open window.
    CoreSession,
    /// Narrow window immediately after the open. Gates the gap auction.
    SoftOpen,
    /// Weekday pre-market hours.
    PreMarket,
    /// Weekday extended hours after the close.
    AfterHours,
    /// Weekday overnight, no reference-market liquidity.
    Overnight,
    /// Friday evening through Monday pre-market.
    Weekend,
    /// Reference-market holiday.
    Holiday,
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CoreSession => write!(f, "CoreSession"),
            Self::SoftOpen => write!(f, "SoftOpen"),
            Self::PreMarket => write!(f, "PreMarket"),
            Self::AfterHours => write!(f, "AfterHours"),
            Self::Overnight => write!(f, "Overnight"),
            Self::Weekend => write!(f, "Weekend"),
            Self::Holiday => write!(f, "Holiday"),
        }
    }
}

/// Coarse risk tier attached to a regime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Low,
    Elevated,
    High,
}

/// Static fee parameters for a regime.
///
/// Immutable configuration: loaded once, never mutated at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegimeParams {
    /// Base fee in basis points.
    pub base_fee_bps: f64,
    /// Regime risk multiplier applied to the volatility+toxicity terms.
    pub multiplier: f64,
    /// Hard cap on the computed fee in basis points.
    pub max_fee_bps: f64,
    /// Coarse risk tier for consumers.
    pub risk_tier: RiskTier,
}

impl Regime {
    /// Static fee parameters for this regime.
    #[must_use]
    pub const fn params(self) -> RegimeParams {
        match self {
            Self::CoreSession => RegimeParams {
                base_fee_bps: 10.0,
                multiplier: 1.0,
                max_fee_bps: 100.0,
                risk_tier: RiskTier::Low,
            },
            Self::SoftOpen => RegimeParams {
                base_fee_bps: 50.0,
                multiplier: 2.5,
                max_fee_bps: 300.0,
                risk_tier: RiskTier::Elevated,
            },
            Self::PreMarket => RegimeParams {
                base_fee_bps: 30.0,
                multiplier: 1.5,
                max_fee_bps: 200.0,
                risk_tier: RiskTier::Elevated,
            },
            Self::AfterHours => RegimeParams {
                base_fee_bps: 30.0,
                multiplier: 1.5,
                max_fee_bps: 200.0,
                risk_tier: RiskTier::Elevated,
            },
            Self::Overnight => RegimeParams {
                base_fee_bps: 60.0,
                multiplier: 2.0,
                max_fee_bps: 400.0,
                risk_tier: RiskTier::High,
            },
            Self::Weekend => RegimeParams {
                base_fee_bps: 80.0,
                multiplier: 3.0,
                max_fee_bps: 500.0,
                risk_tier: RiskTier::High,
            },
            Self::Holiday => RegimeParams {
                base_fee_bps: 80.0,
                multiplier: 3.0,
                max_fee_bps: 500.0,
                risk_tier: RiskTier::High,
            },
        }
    }

    /// All regime variants, for exhaustive property checks.
    pub const ALL: [Regime; 7] = [
        Regime::CoreSession,
        Regime::SoftOpen,
        Regime::PreMarket,
        Regime::AfterHours,
        Regime::Overnight,
        Regime::Weekend,
        Regime::Holiday,
    ];
}
