//! Dynamic fee formula.

use rpe_session::Regime;
use serde::{Deserialize, Serialize};

/// Volatility weight on the squared term.
pub const ALPHA: f64 = 0.5;
/// Toxicity weight.
pub const BETA: f64 = 0.3;
/// Weight on the regime-amplified risk term.
pub const GAMMA: f64 = 1.0;
/// Inventory imbalance weight, in bps at full imbalance.
pub const DELTA_BPS: f64 = 200.0;

/// Live inputs to the fee formula. Volatility and imbalance are
/// per-unit fractions (0.02 = 2%), toxicity is the estimator score.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FeeInputs {
    pub volatility: f64,
    pub toxicity: f64,
    pub inventory_imbalance: f64,
}

/// Recommended fee in basis points for a regime and live inputs.
///
/// `f0 + core + R*core + 200*|imb|` with
/// `core = 0.5*vol^2*10_000 + 0.3*tox*100`, clamped to the regime's
/// `[base, max]` band. The risk terms appear once raw and once scaled
/// by the regime multiplier, so riskier regimes amplify the same
/// market conditions twice over. That double-counting is intentional;
/// do not factor it out.
#[must_use]
pub fn fee_bps(regime: Regime, inputs: FeeInputs) -> f64 {
    let params = regime.params();

    let core = ALPHA * inputs.volatility * inputs.volatility * 10_000.0
        + BETA * inputs.toxicity * 100.0;
    let imbalance_term = DELTA_BPS * inputs.inventory_imbalance.abs();

    let raw = params.base_fee_bps + core + GAMMA * params.multiplier * core + imbalance_term;
    raw.clamp(params.base_fee_bps, params.max_fee_bps)
}
