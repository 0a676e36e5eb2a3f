//! Combine independently scheduled loans into one reporting view
//!
//! Entries are joined on their exact payment date. Monetary fields are summed;
//! the rate is the simple mean of the two rates, which is not balance-weighted and
//! misstates the blended rate when the loan balances differ a lot.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::types::{AmortizationEntry, LoanResult};

/// Merge two schedules by date, output sorted ascending by date
pub fn merge_schedules(a: &[AmortizationEntry], b: &[AmortizationEntry]) -> Vec<AmortizationEntry> {
    let mut by_date: BTreeMap<NaiveDate, AmortizationEntry> =
        a.iter().map(|e| (e.date, e.clone())).collect();

    for entry in b {
        by_date
            .entry(entry.date)
            .and_modify(|existing| *existing = combine_entries(existing, entry))
            .or_insert_with(|| entry.clone());
    }

    by_date.into_values().collect()
}

/// Merge any number of schedules by repeated pairwise merge
pub fn merge_all<'a, I>(schedules: I) -> Vec<AmortizationEntry>
where
    I: IntoIterator<Item = &'a [AmortizationEntry]>,
{
    schedules
        .into_iter()
        .fold(Vec::new(), |acc, schedule| merge_schedules(&acc, schedule))
}

fn combine_entries(a: &AmortizationEntry, b: &AmortizationEntry) -> AmortizationEntry {
    let description = if a.extra_payment_description.is_empty() {
        b.extra_payment_description.clone()
    } else {
        a.extra_payment_description.clone()
    };

    AmortizationEntry {
        month_index: a.month_index.min(b.month_index),
        date: a.date,
        scheduled_payment: a.scheduled_payment + b.scheduled_payment,
        principal: a.principal + b.principal,
        interest: a.interest + b.interest,
        ending_balance: a.ending_balance + b.ending_balance,
        rate_percent: (a.rate_percent + b.rate_percent) / 2.0,
        extra_payment: a.extra_payment + b.extra_payment,
        extra_payment_description: description,
        total_payment: a.total_payment + b.total_payment,
    }
}

impl LoanResult {
    /// Combined result of two loans: merged schedule and summed totals
    pub fn combine(&self, other: &LoanResult) -> LoanResult {
        LoanResult {
            schedule: merge_schedules(&self.schedule, &other.schedule),
            total_interest: self.total_interest + other.total_interest,
            total_principal: self.total_principal + other.total_principal,
            monthly_payment: self.monthly_payment + other.monthly_payment,
            term_months: self.term_months.max(other.term_months),
        }
    }
}
