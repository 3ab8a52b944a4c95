//! Date arithmetic behind the calendar grids.
//!
//! Weeks run Monday to Sunday and are numbered per ISO 8601. The month grid is
//! always six full weeks so every month, however it falls, fits the same shape.

use chrono::{Datelike, Duration, NaiveDate};

pub const WEEK_LEN: usize = 7;
pub const MONTH_GRID_LEN: usize = 42;

/// The Monday on or before `date`. A Sunday rolls back six days.
pub fn monday_on_or_before(date: NaiveDate) -> Option<NaiveDate> {
    let back = i64::from(date.weekday().num_days_from_monday());
    date.checked_sub_signed(Duration::days(back))
}

/// Monday of the week containing `today`, moved by `week_offset` whole weeks.
/// `None` when the result falls outside the representable date range.
pub fn week_start(today: NaiveDate, week_offset: i32) -> Option<NaiveDate> {
    monday_on_or_before(today)?.checked_add_signed(Duration::days(i64::from(week_offset) * 7))
}

/// ISO week-numbering year and week of `date`.
pub fn iso_week(date: NaiveDate) -> (i32, u32) {
    let week = date.iso_week();
    (week.year(), week.week())
}

/// First and last (inclusive) day of the 42-day grid for the month of `today`.
pub fn month_grid_range(today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    let first_of_month = NaiveDate::from_ymd_opt(today.year(), today.month(), 1)?;
    let start = monday_on_or_before(first_of_month)?;
    let end = start.checked_add_signed(Duration::days(MONTH_GRID_LEN as i64 - 1))?;
    Some((start, end))
}

/// `len` consecutive days starting at `start`.
pub fn days_from(start: NaiveDate, len: usize) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take(len)
}

pub fn same_month(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year() && a.month() == b.month()
}
