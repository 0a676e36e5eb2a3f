//! Month-by-month amortization of a single loan
//!
//! The origination payment is the standard amortizing payment
//! PMT = P * r(1 + r)^n / ((1 + r)^n - 1), or P / n when the rate is zero.
//! Each month the active rate is the latest rate change on or before the payment
//! date; interest accrues on the opening balance and the remainder of the
//! payment reduces principal.

use std::collections::HashSet;

use chrono::NaiveDate;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::types::{AmortizationEntry, ExtraPayment, LoanParameters, LoanResult, RateChange};
use crate::dates;
use crate::error::Result;

/// Residual balance below which the loan is treated as repaid
pub const PAYOFF_TOLERANCE: f64 = 1e-6;

/// How the scheduled payment reacts to a rate change
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentPolicy {
    /// Payment fixed at origination; rate changes only shift the interest/principal split
    #[default]
    FixedPayment,
    /// Payment recomputed against the remaining balance and remaining term
    RecalculateOnRateChange,
}

/// Convert an annual percentage rate to a monthly decimal rate
pub fn monthly_rate(annual_rate_percent: f64) -> f64 {
    annual_rate_percent / 100.0 / 12.0
}

/// Level payment that amortizes `principal` over `months` at `monthly_rate`
pub fn amortizing_payment(principal: f64, monthly_rate: f64, months: u32) -> f64 {
    if months == 0 {
        return principal;
    }
    if monthly_rate == 0.0 {
        return principal / months as f64;
    }
    let growth = (1.0 + monthly_rate).powi(months as i32);
    principal * monthly_rate * growth / (growth - 1.0)
}

/// Running balances carried from one month to the next
#[derive(Debug, Clone)]
struct ScheduleState {
    balance: f64,
    rate_percent: f64,
    payment: f64,
}

/// Produces amortization schedules under a payment policy
#[derive(Debug, Clone, Default)]
pub struct LoanScheduler {
    policy: PaymentPolicy,
}

impl LoanScheduler {
    pub fn new(policy: PaymentPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> PaymentPolicy {
        self.policy
    }

    /// Build the full schedule for one loan
    ///
    /// A non-positive principal (or zero term) yields an empty result. Errors are a
    /// term beyond `MAX_TERM_YEARS` and a payment date outside the supported
    /// calendar range.
    pub fn schedule(&self, params: &LoanParameters) -> Result<LoanResult> {
        if !(params.principal > 0.0) || params.term_years == 0 {
            return Ok(LoanResult::empty());
        }

        let term_months = params.term_months()?;
        let monthly_payment = amortizing_payment(
            params.principal,
            monthly_rate(params.annual_rate_percent),
            term_months,
        );

        // Stable sort: changes sharing a date keep input order, so the last listed wins
        let mut rate_changes = params.rate_changes.clone();
        rate_changes.sort_by_key(|rc| rc.effective_date);

        let mut state = ScheduleState {
            balance: params.principal,
            rate_percent: params.annual_rate_percent,
            payment: monthly_payment,
        };
        let mut applied: HashSet<NaiveDate> = HashSet::new();
        let mut schedule = Vec::new();
        let mut total_interest = 0.0;

        for month in 1..=term_months {
            let date = dates::add_months(params.start_date, month - 1)?;

            let rate = active_rate(&rate_changes, date).unwrap_or(params.annual_rate_percent);
            if (rate - state.rate_percent).abs() > f64::EPSILON {
                if self.policy == PaymentPolicy::RecalculateOnRateChange {
                    let remaining = term_months - month + 1;
                    state.payment = amortizing_payment(state.balance, monthly_rate(rate), remaining);
                }
                debug!(
                    "Rate change at month {} ({}): {:.3}% -> {:.3}%, payment {:.2}",
                    month, date, state.rate_percent, rate, state.payment
                );
                state.rate_percent = rate;
            }

            let entry = self.calculate_month(month, date, &mut state, &params.extra_payments, &mut applied);
            total_interest += entry.interest;
            let paid_off = entry.ending_balance <= 0.0;
            schedule.push(entry);

            if paid_off {
                if month < term_months {
                    debug!("Loan repaid at month {} of {}", month, term_months);
                }
                break;
            }
        }

        for payment in &params.extra_payments {
            if payment.amount > 0.0 && !applied.contains(&payment.date) {
                warn!(
                    "Extra payment of {:.2} on {} ({}) does not fall in any scheduled month",
                    payment.amount, payment.date, payment.description
                );
            }
        }

        Ok(LoanResult {
            schedule,
            total_interest,
            total_principal: params.principal,
            monthly_payment,
            term_months,
        })
    }

    /// Split one month's payment and apply any extra payments due in it
    fn calculate_month(
        &self,
        month: u32,
        date: NaiveDate,
        state: &mut ScheduleState,
        extra_payments: &[ExtraPayment],
        applied: &mut HashSet<NaiveDate>,
    ) -> AmortizationEntry {
        let interest = state.balance * monthly_rate(state.rate_percent);
        let mut principal = state.payment - interest;
        let mut scheduled_payment = state.payment;

        // Final month: pay exactly what is left
        if principal > state.balance - PAYOFF_TOLERANCE {
            principal = state.balance;
            scheduled_payment = principal + interest;
        }

        let (requested, description) = extra_due(extra_payments, date, applied);
        let extra = requested.min(state.balance - principal).max(0.0);

        let ending_balance = (state.balance - principal - extra).max(0.0);
        state.balance = ending_balance;

        AmortizationEntry {
            month_index: month,
            date,
            scheduled_payment,
            principal,
            interest,
            ending_balance,
            rate_percent: state.rate_percent,
            extra_payment: extra,
            extra_payment_description: if extra > 0.0 { description } else { String::new() },
            total_payment: principal + interest + extra,
        }
    }
}

/// Latest rate change effective on or before `date`; `changes` must be sorted by date
fn active_rate(changes: &[RateChange], date: NaiveDate) -> Option<f64> {
    let idx = changes.partition_point(|rc| rc.effective_date <= date);
    idx.checked_sub(1).map(|i| changes[i].annual_rate_percent)
}

/// Sum the extra payments dated in `date`'s month that have not been applied yet
///
/// Payments are keyed by their exact date, so a repeated entry is applied once.
fn extra_due(
    extra_payments: &[ExtraPayment],
    date: NaiveDate,
    applied: &mut HashSet<NaiveDate>,
) -> (f64, String) {
    let mut amount = 0.0;
    let mut description = String::new();
    for payment in extra_payments {
        if dates::same_month(payment.date, date) && applied.insert(payment.date) {
            amount += payment.amount;
            description = payment.description.clone();
        }
    }
    (amount, description)
}
