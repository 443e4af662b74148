//! ISO-week helpers used for day-off accounting and request validation.

use chrono::{Datelike, Days, IsoWeek, NaiveDate, Weekday};

pub fn is_week_start(date: NaiveDate) -> bool {
    date.weekday() == Weekday::Mon
}

pub fn is_week_end(date: NaiveDate) -> bool {
    date.weekday() == Weekday::Sun
}

pub fn iso_week(date: NaiveDate) -> IsoWeek {
    date.iso_week()
}

/// Number of days covered by a period of `weeks` weeks.
pub fn period_days(weeks: u32) -> u64 {
    u64::from(weeks) * 7
}

/// Last date of a period of `weeks` weeks starting at `begin`, or `None`
/// when the period is empty or runs past the supported calendar.
pub fn period_end(begin: NaiveDate, weeks: u32) -> Option<NaiveDate> {
    let days = period_days(weeks).checked_sub(1)?;
    begin.checked_add_days(Days::new(days))
}
