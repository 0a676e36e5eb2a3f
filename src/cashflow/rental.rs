//! Fortnightly rent cadence
//!
//! Rent is paid every 14 days from the rental start date, independent of calendar
//! months, so a month receives two or three payments.

use chrono::{Days, NaiveDate};

pub const RENT_CYCLE_DAYS: u64 = 14;

/// Payment dates of a 14-day cycle anchored at `anchor` inside [month_start, month_end]
///
/// Dates before the anchor are never produced.
pub fn fortnightly_payments_in_month(
    anchor: NaiveDate,
    month_start: NaiveDate,
    month_end: NaiveDate,
) -> Vec<NaiveDate> {
    let offset = month_start.signed_duration_since(anchor).num_days();
    let first_cycle = if offset <= 0 {
        0
    } else {
        (offset as u64).div_ceil(RENT_CYCLE_DAYS)
    };

    let first = anchor.checked_add_days(Days::new(first_cycle * RENT_CYCLE_DAYS));
    std::iter::successors(first, |d| d.checked_add_days(Days::new(RENT_CYCLE_DAYS)))
        .take_while(|d| *d <= month_end)
        .collect()
}

/// Rent received in a month: each fortnightly payment is two weeks of rent
pub fn rent_for_payments(weekly_rent: f64, payments: usize) -> f64 {
    weekly_rent * 2.0 * payments as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_anchor_month_counts_from_anchor() {
        // 1, 15, 29 January
        let payments = fortnightly_payments_in_month(d(2024, 1, 1), d(2024, 1, 1), d(2024, 1, 31));
        assert_eq!(payments, vec![d(2024, 1, 1), d(2024, 1, 15), d(2024, 1, 29)]);

        // Anchor mid-month: nothing before it
        let payments = fortnightly_payments_in_month(d(2024, 1, 20), d(2024, 1, 1), d(2024, 1, 31));
        assert_eq!(payments, vec![d(2024, 1, 20)]);
    }

    #[test]
    fn test_cadence_continues_across_months() {
        let anchor = d(2024, 1, 1);
        // 29 Jan + 14 = 12 Feb, 26 Feb
        let feb = fortnightly_payments_in_month(anchor, d(2024, 2, 1), d(2024, 2, 29));
        assert_eq!(feb, vec![d(2024, 2, 12), d(2024, 2, 26)]);

        let mut total = 0;
        let mut month_start = d(2024, 1, 1);
        for _ in 0..12 {
            let month_end = crate::dates::month_end(month_start).unwrap();
            let n = fortnightly_payments_in_month(anchor, month_start, month_end).len();
            assert!(n == 2 || n == 3);
            total += n;
            month_start = month_end.succ_opt().unwrap();
        }
        // 366 days in 2024 hold 27 fortnightly dates from 1 January
        assert_eq!(total, 27);
    }

    #[test]
    fn test_month_before_anchor_is_empty() {
        let payments = fortnightly_payments_in_month(d(2024, 3, 10), d(2024, 2, 1), d(2024, 2, 29));
        assert!(payments.is_empty());
        assert_eq!(rent_for_payments(400.0, 3), 2_400.0);
    }
}
