//! Reference-market calendar: time zone conversion and holidays.
//!
//! The reference market runs on US Eastern time. Rather than pulling in a
//! full tz database, the US DST rule is applied per calendar date: EDT
//! (UTC-4) from the second Sunday of March through the first Sunday of
//! November, EST (UTC-5) otherwise. The regime windows this feeds are
//! minutes wide, so per-date resolution matches the classification
//! contract.

use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Utc, Weekday};
use tracing::debug;

use crate::error::{SessionError, SessionResult};

/// Date of the nth Sunday of a month (1-based).
fn nth_sunday(year: i32, month: u32, n: u32) -> NaiveDate {
    let first = NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN);
    let days_to_sunday = (7 - first.weekday().num_days_from_sunday()) % 7;
    first + Duration::days(i64::from(days_to_sunday) + i64::from(n - 1) * 7)
}

/// UTC offset of US Eastern time in hours for a given local date.
///
/// Negative (west of Greenwich): -4 during daylight saving, -5 otherwise.
#[must_use]
pub fn eastern_offset_hours(date: NaiveDate) -> i64 {
    let dst_start = nth_sunday(date.year(), 3, 2); // second Sunday of March
    let dst_end = nth_sunday(date.year(), 11, 1); // first Sunday of November

    if date >= dst_start && date < dst_end {
        -4
    } else {
        -5
    }
}

/// Holiday table plus time-zone conversion for the reference market.
///
/// The holiday set is injected at construction and only mutated through
/// `add_holiday`, which validates the entry before touching state.
#[derive(Debug, Clone)]
pub struct MarketCalendar {
    holidays: BTreeSet<NaiveDate>,
}

impl MarketCalendar {
    /// Build a calendar from an explicit holiday set.
    #[must_use]
    pub fn new(holidays: BTreeSet<NaiveDate>) -> Self {
        Self { holidays }
    }

    /// Calendar with no holidays. Useful in tests.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            holidays: BTreeSet::new(),
        }
    }

    /// Convert a UTC instant to reference-market local civil time.
    ///
    /// The offset is resolved for the local date, so a date's full
    /// session runs under a single offset.
    #[must_use]
    pub fn local_datetime(&self, ts: DateTime<Utc>) -> NaiveDateTime {
        // Resolve the local date with the standard-time offset first,
        // then apply the offset that date actually carries.
        let approx_local = ts.naive_utc() - Duration::hours(5);
        let offset = eastern_offset_hours(approx_local.date());
        ts.naive_utc() + Duration::hours(offset)
    }

    /// Whether the given local date is a holiday.
    #[must_use]
    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains(&date)
    }

    /// Add a holiday from a `YYYY-MM-DD` string.
    ///
    /// Malformed entries are rejected with no state mutation. Duplicates
    /// are rejected so a double-loaded config is surfaced, not absorbed.
    pub fn add_holiday(&mut self, entry: &str) -> SessionResult<()> {
        let date = NaiveDate::parse_from_str(entry.trim(), "%Y-%m-%d")
            .map_err(|_| SessionError::InvalidHoliday(entry.to_string()))?;

        if !self.holidays.insert(date) {
            return Err(SessionError::DuplicateHoliday(entry.to_string()));
        }

        debug!(holiday = %date, "holiday added to market calendar");
        Ok(())
    }

    /// Number of holidays loaded.
    #[must_use]
    pub fn holiday_count(&self) -> usize {
        self.holidays.len()
    }
}

impl Default for MarketCalendar {
    /// NYSE full-closure holidays for 2026 and 2027.
    fn default() -> Self {
        let dates = [
            // 2026
            (2026, 1, 1),   // New Year's Day
            (2026, 1, 19),  // Martin Luther King Jr. Day
            (2026, 2, 16),  // Washington's Birthday
            (2026, 4, 3),   // Good Friday
            (2026, 5, 25),  // Memorial Day
            (2026, 6, 19),  // Juneteenth
            (2026, 7, 3),   // Independence Day (observed)
            (2026, 9, 7),   // Labor Day
            (2026, 11, 26), // Thanksgiving
            (2026, 12, 25), // Christmas
            // 2027
            (2027, 1, 1),
            (2027, 1, 18),
            (2027, 2, 15),
            (2027, 3, 26),
            (2027, 5, 31),
            (2027, 6, 18),
            (2027, 7, 5),
            (2027, 9, 6),
            (2027, 11, 25),
            (2027, 12, 24),
        ];

        let holidays = dates
            .iter()
            .filter_map(|&(y, m, d)| NaiveDate::from_ymd_opt(y, m, d))
            .collect();

        Self { holidays }
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

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn test_nth_sunday() {
        // 2026-03-08 is the second Sunday of March 2026
        assert_eq!(nth_sunday(2026, 3, 2), date(2026, 3, 8));
        // 2026-11-01 is the first Sunday of November 2026
        assert_eq!(nth_sunday(2026, 11, 1), date(2026, 11, 1));
        // 2027-03-14 is the second Sunday of March 2027
        assert_eq!(nth_sunday(2027, 3, 2), date(2027, 3, 14));
    }

    #[test]
    fn test_eastern_offset_winter_summer() {
        assert_eq!(eastern_offset_hours(date(2026, 1, 15)), -5); // EST
        assert_eq!(eastern_offset_hours(date(2026, 7, 15)), -4); // EDT
        assert_eq!(eastern_offset_hours(date(2026, 12, 15)), -5);
    }

    #[test]
    fn test_eastern_offset_transition_days() {
        // DST starts 2026-03-08, ends 2026-11-01
        assert_eq!(eastern_offset_hours(date(2026, 3, 7)), -5);
        assert_eq!(eastern_offset_hours(date(2026, 3, 8)), -4);
        assert_eq!(eastern_offset_hours(date(2026, 10, 31)), -4);
        assert_eq!(eastern_offset_hours(date(2026, 11, 1)), -5);
    }

    #[test]
    fn test_local_datetime_winter() {
        let cal = MarketCalendar::empty();
        // 2026-01-15 14:30 UTC = 09:30 EST
        let local = cal.local_datetime(utc(2026, 1, 15, 14, 30));
        assert_eq!(local.date(), date(2026, 1, 15));
        assert_eq!(local.time().to_string(), "09:30:00");
    }

    #[test]
    fn test_local_datetime_summer() {
        let cal = MarketCalendar::empty();
        // 2026-07-15 13:30 UTC = 09:30 EDT
        let local = cal.local_datetime(utc(2026, 7, 15, 13, 30));
        assert_eq!(local.time().to_string(), "09:30:00");
    }

    #[test]
    fn test_add_holiday_valid() {
        let mut cal = MarketCalendar::empty();
        cal.add_holiday("2026-12-25").unwrap();
        assert!(cal.is_holiday(date(2026, 12, 25)));
        assert_eq!(cal.holiday_count(), 1);
    }

    #[test]
    fn test_add_holiday_malformed_no_mutation() {
        let mut cal = MarketCalendar::empty();
        let err = cal.add_holiday("25/12/2026").unwrap_err();
        assert!(matches!(err, SessionError::InvalidHoliday(_)));
        assert_eq!(cal.holiday_count(), 0);
    }

    #[test]
    fn test_add_holiday_duplicate_rejected() {
        let mut cal = MarketCalendar::empty();
        cal.add_holiday("2026-12-25").unwrap();
        let err = cal.add_holiday("2026-12-25").unwrap_err();
        assert!(matches!(err, SessionError::DuplicateHoliday(_)));
        assert_eq!(cal.holiday_count(), 1);
    }

    #[test]
    fn test_default_calendar_has_major_holidays() {
        let cal = MarketCalendar::default();
        assert!(cal.is_holiday(date(2026, 12, 25)));
        assert!(cal.is_holiday(date(2026, 11, 26)));
        assert!(cal.is_holiday(date(2027, 1, 1)));
        assert!(!cal.is_holiday(date(2026, 6, 1)));
    }
}
