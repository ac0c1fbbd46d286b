//! Islamic-day boundary and calendar horizons.

use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};

use crate::error::{Result, VakitError};

/// Before this hour the liturgical day still belongs to the previous date.
pub const DAY_BOUNDARY_HOUR: u32 = 4;

/// Storage and API date format.
pub const DATE_FORMAT: &str = "%d-%m-%Y";

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).map_err(|_| VakitError::InvalidDate(s.to_string()))
}

pub fn is_late_night_window(now: NaiveDateTime) -> bool {
    now.hour() < DAY_BOUNDARY_HOUR
}

/// The date whose obligations are being marked at `now`. A Yatsı prayed at
/// 00:30 still belongs to yesterday.
pub fn effective_prayer_date(now: NaiveDateTime) -> NaiveDate {
    if is_late_night_window(now) {
        now.date() - Duration::days(1)
    } else {
        now.date()
    }
}

/// `start, start+1, ..., start+(n-1)` by calendar day.
pub fn next_n_dates(start: NaiveDate, n: usize) -> Vec<NaiveDate> {
    start.iter_days().take(n).collect()
}
