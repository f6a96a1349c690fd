//! Month grid model.
//!
//! # Responsibility
//! - Build the fixed 6x7 grid shown for one month.
//! - Tag cells as leading/current/trailing, today and has-note.
//!
//! # Invariants
//! - Every grid has exactly [`GRID_CELLS`] cells and
//!   `leading + current + trailing == GRID_CELLS`.
//! - Only current-month cells open notes; other-month cells navigate.
//! - `YearMonth` always holds a month in `0..=11`.
//! - Months outside chrono's date range yield [`CalendarError`], never a
//!   partial grid.

use crate::model::date_key::CalendarDate;
use chrono::{Datelike, NaiveDate};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Cells per month grid (6 weeks of 7 days).
pub const GRID_CELLS: usize = 42;

/// English month names indexed by 0-based month.
pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// A displayed month; `month` is 0-based and always in `0..=11`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: i32,
}

impl YearMonth {
    /// Builds a month, rolling out-of-range months into adjacent years.
    pub fn new(year: i32, month: i32) -> Self {
        Self {
            year: year.saturating_add(month.div_euclid(12)),
            month: month.rem_euclid(12),
        }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self::new(date.year(), date.month0() as i32)
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> i32 {
        self.month
    }

    pub fn previous(&self) -> Self {
        Self::new(self.year, self.month - 1)
    }

    pub fn next(&self) -> Self {
        Self::new(self.year, self.month + 1)
    }

    /// Header text such as `January 2024`.
    pub fn title(&self) -> String {
        format!("{} {}", MONTH_NAMES[self.month as usize], self.year)
    }

    fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month as u32 + 1, 1)
    }

    /// Weekday of day 1, `0 = Sunday`.
    pub fn first_weekday(&self) -> Option<u32> {
        Some(self.first_day()?.weekday().num_days_from_sunday())
    }

    /// `None` when this month or the following one is outside chrono's range.
    pub fn days_in_month(&self) -> Option<u32> {
        let first = self.first_day()?;
        let next = self.next().first_day()?;
        u32::try_from(next.signed_duration_since(first).num_days()).ok()
    }
}

/// Month grid failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarError {
    /// The month, or a neighbour shown in its grid, cannot be represented.
    UnsupportedMonth(YearMonth),
}

impl Display for CalendarError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedMonth(month) => write!(
                f,
                "month {}-{} is outside the supported calendar range",
                month.year(),
                month.month()
            ),
        }
    }
}

impl Error for CalendarError {}

/// What activating a cell does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellAction {
    /// Open the note view for a current-month date.
    OpenNotes(CalendarDate),
    /// Switch the displayed month.
    Navigate(YearMonth),
}

/// One rendered day cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarCell {
    /// Day-of-month label.
    pub day: u32,
    /// Canonical date of this cell.
    pub date: CalendarDate,
    pub other_month: bool,
    pub today: bool,
    pub has_note: bool,
}

impl CalendarCell {
    pub fn action(&self) -> CellAction {
        if self.other_month {
            CellAction::Navigate(YearMonth::new(self.date.year, self.date.month))
        } else {
            CellAction::OpenNotes(self.date)
        }
    }
}

/// Rendered month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthGrid {
    pub month: YearMonth,
    pub title: String,
    pub cells: Vec<CalendarCell>,
    pub leading: usize,
    pub current: usize,
    pub trailing: usize,
}

/// Builds the 42-cell grid for `month`.
///
/// `has_note` receives canonical date keys.
pub fn build_month_grid(
    month: YearMonth,
    today: NaiveDate,
    has_note: impl Fn(&str) -> bool,
) -> Result<MonthGrid, CalendarError> {
    let unsupported = CalendarError::UnsupportedMonth(month);
    let previous = month.previous();
    let next = month.next();
    let first_weekday = month.first_weekday().ok_or(unsupported)? as usize;
    let days_in_month = month.days_in_month().ok_or(unsupported)? as usize;
    let days_in_previous = previous.days_in_month().ok_or(unsupported)? as usize;
    let trailing = GRID_CELLS
        .checked_sub(first_weekday + days_in_month)
        .ok_or(unsupported)?;

    let mut cells = Vec::with_capacity(GRID_CELLS);
    let mut push = |target: YearMonth, day: usize, other_month: bool| {
        let date = CalendarDate::new(target.year(), target.month(), day as i32);
        let is_today = !other_month && date.to_naive() == Some(today);
        cells.push(CalendarCell {
            day: day as u32,
            date,
            other_month,
            today: is_today,
            has_note: has_note(date.key().as_str()),
        });
    };

    for offset in (0..first_weekday).rev() {
        push(previous, days_in_previous - offset, true);
    }
    for day in 1..=days_in_month {
        push(month, day, false);
    }
    for day in 1..=trailing {
        push(next, day, true);
    }

    Ok(MonthGrid {
        month,
        title: month.title(),
        cells,
        leading: first_weekday,
        current: days_in_month,
        trailing,
    })
}

#[cfg(test)]
mod tests {
    use super::{build_month_grid, CalendarError, CellAction, YearMonth, GRID_CELLS};
    use crate::model::date_key::CalendarDate;
    use chrono::{Datelike, NaiveDate};

    fn day(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
    }

    #[test]
    fn every_month_has_exactly_42_cells() {
        for year in [1999, 2000, 2023, 2024, 2100] {
            for month in 0..12 {
                let grid = build_month_grid(YearMonth::new(year, month), day(2024, 1, 1), |_| false)
                    .expect("supported month");
                assert_eq!(grid.cells.len(), GRID_CELLS);
                assert_eq!(grid.leading + grid.current + grid.trailing, GRID_CELLS);
            }
        }
    }

    #[test]
    fn january_2024_starts_on_monday() {
        let grid = build_month_grid(YearMonth::new(2024, 0), day(2024, 1, 15), |_| false)
            .expect("supported month");
        assert_eq!(grid.title, "January 2024");
        assert_eq!(grid.leading, 1);
        assert_eq!(grid.current, 31);
        assert_eq!(grid.trailing, 10);

        let first = &grid.cells[0];
        assert!(first.other_month);
        assert_eq!(first.day, 31);
        assert_eq!(first.date, CalendarDate::new(2023, 11, 31));
        assert_eq!(first.action(), CellAction::Navigate(YearMonth::new(2023, 11)));

        let last = grid.cells.last().expect("grid has cells");
        assert_eq!(last.date, CalendarDate::new(2024, 1, 10));
    }

    #[test]
    fn marks_today_and_note_cells_only_in_current_month() {
        let grid = build_month_grid(YearMonth::new(2024, 1), day(2024, 2, 29), |key| {
            key == "2024-1-14" || key == "2024-0-31"
        })
        .expect("supported month");
        let today: Vec<_> = grid.cells.iter().filter(|cell| cell.today).collect();
        assert_eq!(today.len(), 1);
        assert_eq!(today[0].day, 29);

        let noted: Vec<_> = grid.cells.iter().filter(|cell| cell.has_note).collect();
        assert_eq!(noted.len(), 2);
        assert!(noted.iter().any(|cell| cell.other_month && cell.day == 31));
        assert_eq!(
            noted
                .iter()
                .find(|cell| !cell.other_month)
                .map(|cell| cell.action()),
            Some(CellAction::OpenNotes(CalendarDate::new(2024, 1, 14)))
        );
    }

    #[test]
    fn navigation_rolls_year_boundaries() {
        let january = YearMonth::new(2024, 0);
        assert_eq!(january.previous(), YearMonth::new(2023, 11));
        assert_eq!(YearMonth::new(2023, 11).next(), january);
        assert_eq!(YearMonth::new(2023, 12), january);
        assert_eq!(YearMonth::new(2024, -1).month(), 11);
    }

    #[test]
    fn days_in_month_handles_leap_years() {
        assert_eq!(YearMonth::new(2024, 1).days_in_month(), Some(29));
        assert_eq!(YearMonth::new(2023, 1).days_in_month(), Some(28));
        assert_eq!(YearMonth::new(2023, 11).days_in_month(), Some(31));
    }

    #[test]
    fn months_outside_the_date_range_are_rejected() {
        let today = day(2024, 1, 1);
        let last = NaiveDate::MAX;
        let edge = YearMonth::new(last.year(), 11);
        assert_eq!(edge.days_in_month(), None);
        assert_eq!(
            build_month_grid(edge, today, |_| false),
            Err(CalendarError::UnsupportedMonth(edge))
        );

        for month in [
            YearMonth::new(NaiveDate::MIN.year(), 0),
            YearMonth::new(i32::MAX, 11),
            YearMonth::new(i32::MIN, 0),
            YearMonth::new(2024, i32::MAX),
        ] {
            assert!(build_month_grid(month, today, |_| false).is_err(), "{month:?}");
        }
    }
}
