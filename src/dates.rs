//! Calendar-month arithmetic on `NaiveDate`
//!
//! Every offset is taken from the origin date rather than stepped cumulatively, so a
//! schedule starting on the 31st lands on the 31st whenever the month has one.

use chrono::{Datelike, Months, NaiveDate};

use crate::error::{CalculatorError, Result};

/// Date `months` calendar months after `origin`, clamped to the last day of the target month
pub fn add_months(origin: NaiveDate, months: u32) -> Result<NaiveDate> {
    origin.checked_add_months(Months::new(months)).ok_or_else(|| {
        CalculatorError::DateOutOfRange(format!("{} + {} months", origin, months))
    })
}

/// First day of the month containing `date`
pub fn month_start(date: NaiveDate) -> NaiveDate {
    // Day 1 exists in every month
    date.with_day(1).unwrap_or(date)
}

/// Last day of the month containing `date`
pub fn month_end(date: NaiveDate) -> Result<NaiveDate> {
    let next = add_months(month_start(date), 1)?;
    next.pred_opt()
        .ok_or_else(|| CalculatorError::DateOutOfRange(format!("end of month for {}", date)))
}

/// Whether two dates fall in the same calendar month
pub fn same_month(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

/// Number of whole calendar months from `from`'s month to `to`'s month (negative if `to` is earlier)
pub fn months_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to.year() as i64 - from.year() as i64) * 12 + (to.month0() as i64 - from.month0() as i64)
}
