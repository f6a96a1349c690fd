//! Calendar date addressing and date-key derivation.
//!
//! # Responsibility
//! - Map `(year, month, day)` to the persisted date-key string.
//! - Normalize overflowed months/days into real calendar dates.
//!
//! # Invariants
//! - Months are 0-based (`0 = January`).
//! - `date_key` never pads and never normalizes: `2024-1-5 != 2024-01-05`.
//! - Keys built from overflowed months (`-1`, `12`) are transient; persisted
//!   keys always come from a [`CalendarDate::canonical`] date.

use chrono::{Datelike, Duration, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::{Display, Formatter};

static DATE_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(-?\d+)-(-?\d+)-(-?\d+)$").expect("valid date key regex"));

/// Builds the date key `{year}-{month}-{day}`.
pub fn date_key(year: i32, month: i32, day: i32) -> String {
    format!("{year}-{month}-{day}")
}

/// Parses a date key back into its raw components.
///
/// Returns `None` for strings that are not three dash-separated integers.
pub fn parse_date_key(key: &str) -> Option<CalendarDate> {
    let caps = DATE_KEY_RE.captures(key)?;
    let year = caps.get(1)?.as_str().parse().ok()?;
    let month = caps.get(2)?.as_str().parse().ok()?;
    let day = caps.get(3)?.as_str().parse().ok()?;
    Some(CalendarDate::new(year, month, day))
}

/// Resolves possibly out-of-range components to a real date.
///
/// Month overflow rolls the year; day overflow rolls the month, so
/// `(2024, 1, 30)` is March 1st 2024 and `(2024, 12, 1)` is January 1st 2025.
pub fn normalize_ymd(year: i32, month: i32, day: i32) -> Option<NaiveDate> {
    let year = year.checked_add(month.div_euclid(12))?;
    let month0 = u32::try_from(month.rem_euclid(12)).ok()?;
    let first = NaiveDate::from_ymd_opt(year, month0 + 1, 1)?;
    first.checked_add_signed(Duration::days(i64::from(day) - 1))
}

/// A date addressed the way the calendar UI addresses it.
///
/// Components are raw: `month` may be `-1` or `12` while a grid cell points
/// into an adjacent month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarDate {
    pub year: i32,
    /// 0-based month.
    pub month: i32,
    pub day: i32,
}

impl CalendarDate {
    pub fn new(year: i32, month: i32, day: i32) -> Self {
        Self { year, month, day }
    }

    /// Converts a real date into 0-based calendar components.
    pub fn from_naive(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month0() as i32,
            day: date.day() as i32,
        }
    }

    /// Raw date key of these components.
    pub fn key(&self) -> String {
        date_key(self.year, self.month, self.day)
    }

    /// Real date these components resolve to.
    pub fn to_naive(&self) -> Option<NaiveDate> {
        normalize_ymd(self.year, self.month, self.day)
    }

    /// Same date with components normalized into their canonical ranges.
    pub fn canonical(&self) -> Option<Self> {
        self.to_naive().map(Self::from_naive)
    }

    pub fn is_canonical(&self) -> bool {
        self.canonical() == Some(*self)
    }
}

impl Display for CalendarDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::{date_key, normalize_ymd, parse_date_key, CalendarDate};
    use chrono::NaiveDate;
    use std::collections::HashSet;

    #[test]
    fn key_is_unpadded_and_uses_zero_based_month() {
        assert_eq!(date_key(2024, 0, 15), "2024-0-15");
        assert_eq!(date_key(2024, 1, 5), "2024-1-5");
        assert_ne!(date_key(2024, 1, 5), "2024-01-05");
    }

    #[test]
    fn key_is_injective_over_canonical_range() {
        let mut seen = HashSet::new();
        for month in 0..12 {
            for day in 1..=31 {
                assert!(seen.insert(date_key(2023, month, day)));
                assert_eq!(date_key(2023, month, day), date_key(2023, month, day));
            }
        }
        assert_eq!(seen.len(), 12 * 31);
    }

    #[test]
    fn overflowed_month_keys_do_not_collide_with_canonical_keys() {
        assert_eq!(date_key(2023, 12, 1), "2023-12-1");
        assert_ne!(date_key(2023, 12, 1), date_key(2024, 0, 1));
        assert_eq!(date_key(2024, -1, 31), "2024--1-31");
    }

    #[test]
    fn parse_round_trips_raw_components() {
        assert_eq!(
            parse_date_key("2024-0-15"),
            Some(CalendarDate::new(2024, 0, 15))
        );
        assert_eq!(
            parse_date_key("2024--1-31"),
            Some(CalendarDate::new(2024, -1, 31))
        );
        assert_eq!(parse_date_key("2024-01"), None);
        assert_eq!(parse_date_key("today"), None);
    }

    #[test]
    fn normalize_rolls_months_and_days() {
        assert_eq!(
            normalize_ymd(2023, 12, 1),
            NaiveDate::from_ymd_opt(2024, 1, 1)
        );
        assert_eq!(
            normalize_ymd(2024, -1, 31),
            NaiveDate::from_ymd_opt(2023, 12, 31)
        );
        assert_eq!(
            normalize_ymd(2024, 1, 30),
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
        assert_eq!(
            normalize_ymd(2024, 2, 0),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
    }

    #[test]
    fn canonical_only_changes_overflowed_components() {
        let raw = CalendarDate::new(2023, 12, 3);
        assert!(!raw.is_canonical());
        assert_eq!(raw.canonical(), Some(CalendarDate::new(2024, 0, 3)));
        assert!(CalendarDate::new(2024, 0, 15).is_canonical());
    }
}
