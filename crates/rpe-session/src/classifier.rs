//! Session classification: timestamp → trading regime.

use chrono::{DateTime, Duration, Timelike, Utc, Weekday};
use chrono::{Datelike, NaiveDateTime};

use crate::calendar::MarketCalendar;
use crate::regime::Regime;

/// Minute-of-day boundaries for the weekday sub-windows (Eastern time).
const PRE_MARKET_START_MIN: u32 = 4 * 60; // 04:00
const OPEN_MIN: u32 = 9 * 60 + 30; // 09:30
const SOFT_OPEN_END_MIN: u32 = 9 * 60 + 35; // 09:35
const CLOSE_MIN: u32 = 16 * 60; // 16:00
const AFTER_HOURS_END_MIN: u32 = 20 * 60; // 20:00

/// Scan horizon for `time_until_next_regime`, in minutes.
const HORIZON_MINS: i64 = 24 * 60;

/// The next regime and the seconds until it takes effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegimeTransition {
    pub next: Regime,
    pub seconds_until: i64,
}

/// Pure classifier over a market calendar.
///
/// The calendar (holiday table) is the only state, and it is immutable
/// here; holiday additions happen on the calendar before construction or
/// behind the owner's lock.
#[derive(Debug, Clone)]
pub struct SessionClassifier {
    calendar: MarketCalendar,
}

impl SessionClassifier {
    #[must_use]
    pub fn new(calendar: MarketCalendar) -> Self {
        Self { calendar }
    }

    #[must_use]
    pub fn calendar(&self) -> &MarketCalendar {
        &self.calendar
    }

    /// Classify an instant into exactly one regime.
    ///
    /// Evaluation order: holiday exact-date match, then the weekend
    /// window (Friday 20:00 through Monday 04:00 local), then the five
    /// contiguous weekday sub-windows.
    #[must_use]
    pub fn classify(&self, ts: DateTime<Utc>) -> Regime {
        let local = self.calendar.local_datetime(ts);

        if self.calendar.is_holiday(local.date()) {
            return Regime::Holiday;
        }

        if is_weekend_window(local) {
            return Regime::Weekend;
        }

        let minute = local.time().hour() * 60 + local.time().minute();

        if minute < PRE_MARKET_START_MIN {
            Regime::Overnight
        } else if minute < OPEN_MIN {
            Regime::PreMarket
        } else if minute < SOFT_OPEN_END_MIN {
            Regime::SoftOpen
        } else if minute < CLOSE_MIN {
            Regime::CoreSession
        } else if minute < AFTER_HOURS_END_MIN {
            Regime::AfterHours
        } else {
            Regime::Overnight
        }
    }

    /// Scan forward for the next regime change, at minute resolution,
    /// bounded by a 24-hour horizon.
    ///
    /// All regime boundaries fall on whole local minutes, so stepping
    /// minute-aligned timestamps cannot skip a window.
    #[must_use]
    pub fn time_until_next_regime(&self, ts: DateTime<Utc>) -> RegimeTransition {
        let current = self.classify(ts);
        let base = ts - Duration::seconds(i64::from(ts.second()));

        for step in 1..=HORIZON_MINS + 1 {
            let probe = base + Duration::minutes(step);
            let regime = self.classify(probe);
            if regime != current {
                return RegimeTransition {
                    next: regime,
                    seconds_until: (probe - ts).num_seconds(),
                };
            }
        }

        // No change within the horizon (long holiday runs). Report the
        // horizon rather than scanning unboundedly.
        RegimeTransition {
            next: current,
            seconds_until: HORIZON_MINS * 60,
        }
    }
}

/// Weekend window in local civil time: Friday 20:00 through Monday 04:00.
fn is_weekend_window(local: NaiveDateTime) -> bool {
    let minute = local.time().hour() * 60 + local.time().minute();
    match local.weekday() {
        Weekday::Sat | Weekday::Sun => true,
        Weekday::Fri => minute >= AFTER_HOURS_END_MIN,
        Weekday::Mon => minute < PRE_MARKET_START_MIN,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(year: i32, month: u32, day: u32, hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, hour, min, 0)
            .unwrap()
    }

    fn classifier() -> SessionClassifier {
        SessionClassifier::new(MarketCalendar::default())
    }

    // 2026-01-14 is a Wednesday; EST applies (UTC-5).

    #[test]
    fn test_core_session() {
        let c = classifier();
        // 10:00 ET = 15:00 UTC
        assert_eq!(c.classify(utc(2026, 1, 14, 15, 0)), Regime::CoreSession);
        // 15:59 ET
        assert_eq!(c.classify(utc(2026, 1, 14, 20, 59)), Regime::CoreSession);
    }

    #[test]
    fn test_soft_open_window() {
        let c = classifier();
        // 09:30 ET = 14:30 UTC
        assert_eq!(c.classify(utc(2026, 1, 14, 14, 30)), Regime::SoftOpen);
        assert_eq!(c.classify(utc(2026, 1, 14, 14, 34)), Regime::SoftOpen);
        // 09:35 ET: soft open over
        assert_eq!(c.classify(utc(2026, 1, 14, 14, 35)), Regime::CoreSession);
        // 09:29 ET: still pre-market
        assert_eq!(c.classify(utc(2026, 1, 14, 14, 29)), Regime::PreMarket);
    }

    #[test]
    fn test_pre_market_and_after_hours() {
        let c = classifier();
        // 04:00 ET = 09:00 UTC
        assert_eq!(c.classify(utc(2026, 1, 14, 9, 0)), Regime::PreMarket);
        // 03:59 ET
        assert_eq!(c.classify(utc(2026, 1, 14, 8, 59)), Regime::Overnight);
        // 16:00 ET = 21:00 UTC
        assert_eq!(c.classify(utc(2026, 1, 14, 21, 0)), Regime::AfterHours);
        // 19:59 ET
        assert_eq!(c.classify(utc(2026, 1, 15, 0, 59)), Regime::AfterHours);
        // 20:00 ET Wednesday → overnight (not weekend)
        assert_eq!(c.classify(utc(2026, 1, 15, 1, 0)), Regime::Overnight);
    }

    #[test]
    fn test_weekend_span() {
        let c = classifier();
        // Friday 2026-01-16 20:00 ET = Sat 01:00 UTC
        assert_eq!(c.classify(utc(2026, 1, 17, 1, 0)), Regime::Weekend);
        // Friday 19:59 ET is still after-hours
        assert_eq!(c.classify(utc(2026, 1, 17, 0, 59)), Regime::AfterHours);
        // Saturday midday ET
        assert_eq!(c.classify(utc(2026, 1, 17, 17, 0)), Regime::Weekend);
        // Sunday evening ET
        assert_eq!(c.classify(utc(2026, 1, 19, 2, 0)), Regime::Weekend);
        // Monday 03:59 ET = 08:59 UTC: still weekend window (2026-01-26
        // is a regular Monday; the 19th is MLK day and classifies Holiday)
        assert_eq!(c.classify(utc(2026, 1, 19, 9, 0)), Regime::Holiday);
        assert_eq!(c.classify(utc(2026, 1, 26, 8, 59)), Regime::Weekend);
        // Monday 04:00 ET → pre-market
        assert_eq!(c.classify(utc(2026, 1, 26, 9, 0)), Regime::PreMarket);
    }

    #[test]
    fn test_holiday_precedes_weekday_windows() {
        let c = classifier();
        // Christmas 2026-12-25 (a Friday), 10:00 ET = 15:00 UTC
        assert_eq!(c.classify(utc(2026, 12, 25, 15, 0)), Regime::Holiday);
    }

    #[test]
    fn test_dst_shifts_utc_boundaries() {
        let c = classifier();
        // Summer: open is 09:30 EDT = 13:30 UTC. 2026-07-15 is a Wednesday.
        assert_eq!(c.classify(utc(2026, 7, 15, 13, 30)), Regime::SoftOpen);
        // 14:30 UTC in summer is already core session, not the open.
        assert_eq!(c.classify(utc(2026, 7, 15, 14, 30)), Regime::CoreSession);
    }

    #[test]
    fn test_classify_total_over_a_week() {
        // Every minute of a full synthetic week maps to exactly one regime.
        let c = classifier();
        let start = utc(2026, 2, 9, 0, 0); // Monday
        for i in 0..(7 * 24 * 60) {
            let ts = start + Duration::minutes(i);
            // classify returns a value for every input; exhaustiveness is
            // the enum match itself. Sanity-check window contiguity: the
            // regime at each minute is one of the seven variants.
            let regime = c.classify(ts);
            assert!(Regime::ALL.contains(&regime));
        }
    }

    #[test]
    fn test_next_regime_from_pre_market() {
        let c = classifier();
        // Wednesday 09:00 ET = 14:00 UTC, pre-market. Next: soft open in 30 min.
        let t = c.time_until_next_regime(utc(2026, 1, 14, 14, 0));
        assert_eq!(t.next, Regime::SoftOpen);
        assert_eq!(t.seconds_until, 30 * 60);
    }

    #[test]
    fn test_next_regime_soft_open_is_short() {
        let c = classifier();
        let t = c.time_until_next_regime(utc(2026, 1, 14, 14, 30));
        assert_eq!(t.next, Regime::CoreSession);
        assert_eq!(t.seconds_until, 5 * 60);
    }

    #[test]
    fn test_next_regime_subminute_offset() {
        let c = classifier();
        // 30 seconds into 09:29 ET: transition lands on the minute boundary.
        let ts = utc(2026, 1, 14, 14, 29) + Duration::seconds(30);
        let t = c.time_until_next_regime(ts);
        assert_eq!(t.next, Regime::SoftOpen);
        assert_eq!(t.seconds_until, 30);
    }

    #[test]
    fn test_next_regime_horizon_capped() {
        // A calendar where every day is a holiday never changes regime.
        let mut cal = MarketCalendar::empty();
        for day in 1..=28 {
            cal.add_holiday(&format!("2026-02-{day:02}")).unwrap();
        }
        let c = SessionClassifier::new(cal);
        let t = c.time_until_next_regime(utc(2026, 2, 10, 12, 0));
        assert_eq!(t.next, Regime::Holiday);
        assert_eq!(t.seconds_until, 24 * 60 * 60);
    }
}
