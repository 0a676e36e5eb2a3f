//! Expansion of staged (recurring) extra payments into dated one-off payments

use super::types::{ExtraPayment, StagedExtraPayment};
use crate::dates;
use crate::error::Result;

/// Merge staged payments into the one-off list, one payment per month of each stage
///
/// A staged amount landing in a month that already holds an extra payment for the
/// same loan is added to that payment, so exact-date de-duplication in the
/// scheduler can never drop it. Output is sorted by date.
pub fn expand_staged_payments(
    extra_payments: &[ExtraPayment],
    staged: &[StagedExtraPayment],
) -> Result<Vec<ExtraPayment>> {
    let mut expanded = extra_payments.to_vec();

    for stage in staged {
        let months = dates::months_between(stage.start_date, stage.end_date);
        if months < 0 {
            continue;
        }

        for offset in 0..=months as u32 {
            let date = dates::add_months(stage.start_date, offset)?;
            let existing = expanded
                .iter_mut()
                .find(|p| p.target == stage.target && dates::same_month(p.date, date));

            match existing {
                Some(payment) => payment.amount += stage.amount,
                None => expanded.push(ExtraPayment {
                    date,
                    amount: stage.amount,
                    description: stage.description.clone(),
                    target: stage.target,
                }),
            }
        }
    }

    expanded.sort_by_key(|p| p.date);
    Ok(expanded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loan::LoanTarget;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn stage(start: NaiveDate, end: NaiveDate, amount: f64, target: LoanTarget) -> StagedExtraPayment {
        StagedExtraPayment {
            start_date: start,
            end_date: end,
            amount,
            description: "Bonus".to_string(),
            target,
        }
    }

    #[test]
    fn test_stage_expands_one_payment_per_month() {
        let expanded =
            expand_staged_payments(&[], &[stage(d(2024, 1, 20), d(2024, 6, 1), 500.0, LoanTarget::Primary)])
                .unwrap();

        assert_eq!(expanded.len(), 6);
        assert_eq!(expanded[0].date, d(2024, 1, 20));
        assert_eq!(expanded[5].date, d(2024, 6, 20));
        assert!(expanded.iter().all(|p| p.amount == 500.0 && p.description == "Bonus"));
    }

    #[test]
    fn test_stage_adds_to_existing_payment_for_same_loan() {
        let one_off = ExtraPayment {
            date: d(2024, 3, 5),
            amount: 10_000.0,
            description: "Tax refund".to_string(),
            target: LoanTarget::Primary,
        };
        let staged = [
            stage(d(2024, 2, 1), d(2024, 4, 1), 200.0, LoanTarget::Primary),
            stage(d(2024, 3, 1), d(2024, 3, 1), 300.0, LoanTarget::Equity),
        ];
        let expanded = expand_staged_payments(&[one_off], &staged).unwrap();

        // Feb, Mar (merged), Apr for primary plus one equity payment
        assert_eq!(expanded.len(), 4);
        let march_primary = expanded
            .iter()
            .find(|p| p.target == LoanTarget::Primary && p.date == d(2024, 3, 5))
            .unwrap();
        assert_eq!(march_primary.amount, 10_200.0);
        assert_eq!(march_primary.description, "Tax refund");
        assert!(expanded.windows(2).all(|w| w[0].date <= w[1].date));
    }

    #[test]
    fn test_inverted_stage_is_ignored() {
        let expanded =
            expand_staged_payments(&[], &[stage(d(2024, 6, 1), d(2024, 1, 1), 500.0, LoanTarget::Primary)])
                .unwrap();
        assert!(expanded.is_empty());
    }
}
