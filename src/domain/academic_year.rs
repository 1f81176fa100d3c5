//! Academic year arithmetic.
//!
//! An academic year is identified by its starting calendar year; the
//! rollover happens on September 15.

use chrono::{Datelike, NaiveDate, Utc};

const ROLLOVER_MONTH: u32 = 9;
const ROLLOVER_DAY: u32 = 15;

/// Academic year a given date falls in.
pub fn academic_year_of(date: NaiveDate) -> i32 {
    let rollover = NaiveDate::from_ymd_opt(date.year(), ROLLOVER_MONTH, ROLLOVER_DAY)
        .unwrap_or(date);
    if date >= rollover {
        date.year()
    } else {
        date.year() - 1
    }
}

/// Academic year as of today.
pub fn current_academic_year() -> i32 {
    academic_year_of(Utc::now().date_naive())
}
