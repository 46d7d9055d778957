//! Trading session classification for the reference market.
//!
//! The reference market (US equities, Eastern time) has fixed trading
//! hours that do not match the venue's continuous availability. This
//! crate maps any instant to a discrete trading regime and exposes the
//! static per-regime fee parameters the risk formulas consume.
//!
//! Classification is a pure function of the timestamp: time is always
//! an explicit input, never read from a global clock.

pub mod calendar;
pub mod classifier;
pub mod error;
pub mod regime;

pub use calendar::{eastern_offset_hours, MarketCalendar};
pub use classifier::{RegimeTransition, SessionClassifier};
pub use error::{SessionError, SessionResult};
pub use regime::{Regime, RegimeParams, RiskTier};
