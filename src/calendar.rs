//! pure calendar helpers: weekday enumeration and the holiday predicate
//!
//! the real holiday calendar (region-specific, potentially looked up from a
//! service or a maintained table) is an external collaborator; this module
//! ships a small fixed-date stand-in so the engine is runnable standalone.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use std::collections::BTreeSet;

/// enumerate every date in `[start, end]` that falls on one of `weekdays`
pub fn dates_in_range(start: NaiveDate, end: NaiveDate, weekdays: &[Weekday]) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut current = start;

    while current <= end {
        if weekdays.contains(&current.weekday()) {
            dates.push(current);
        }
        current += Duration::days(1);
    }

    dates
}

/// enumerate every date in `[start, start + horizon_days)`
pub fn horizon(start: NaiveDate, horizon_days: u32) -> Vec<NaiveDate> {
    (0..horizon_days)
        .map(|i| start + Duration::days(i64::from(i)))
        .collect()
}

/// fixed-date public holidays, month/day only (year-independent)
const FIXED_HOLIDAYS: &[(u32, u32)] = &[
    (1, 1),   // New Year's Day
    (5, 1),   // Labour Day
    (12, 25), // Christmas Day
    (12, 26), // Boxing Day
];

/// is `date` a holiday?
///
/// stand-in for the real calendar lookup named out of scope by the spec;
/// callers that need an authoritative calendar should inject one instead of
/// relying on this table.
pub fn is_holiday(date: NaiveDate) -> bool {
    FIXED_HOLIDAYS.contains(&(date.month(), date.day()))
}

/// an explicit set of extra holiday dates, layered on top of [`is_holiday`]
#[derive(Debug, Clone, Default)]
pub struct HolidayCalendar {
    extra: BTreeSet<NaiveDate>,
}

impl HolidayCalendar {
    pub fn new(extra: BTreeSet<NaiveDate>) -> Self {
        Self { extra }
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        is_holiday(date) || self.extra.contains(&date)
    }
}
