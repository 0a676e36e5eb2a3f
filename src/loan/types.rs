//! Loan inputs and amortization output structures

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{CalculatorError, Result};

/// Longest loan term the scheduler accepts
pub const MAX_TERM_YEARS: u32 = 100;

/// Which loan of a property scenario an event applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanTarget {
    Primary,
    Split1,
    Split2,
    Equity,
}

impl LoanTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanTarget::Primary => "primary",
            LoanTarget::Split1 => "split1",
            LoanTarget::Split2 => "split2",
            LoanTarget::Equity => "equity",
        }
    }
}

/// A change to the annual interest rate effective from a date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateChange {
    pub effective_date: NaiveDate,

    /// New annual rate as a percentage (e.g. 6.25 for 6.25%)
    pub annual_rate_percent: f64,

    /// Loan the change applies to; `None` applies it to every loan
    #[serde(default)]
    pub target: Option<LoanTarget>,
}

impl RateChange {
    pub fn applies_to(&self, loan: LoanTarget) -> bool {
        self.target.map_or(true, |t| t == loan)
    }
}

/// An out-of-schedule principal reduction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtraPayment {
    pub date: NaiveDate,
    pub amount: f64,
    #[serde(default = "default_extra_description")]
    pub description: String,
    #[serde(default = "default_target")]
    pub target: LoanTarget,
}

/// A recurring monthly extra payment over an inclusive range of months
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagedExtraPayment {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub amount: f64,
    #[serde(default = "default_staged_description")]
    pub description: String,
    #[serde(default = "default_target")]
    pub target: LoanTarget,
}

fn default_extra_description() -> String {
    "Extra Payment".to_string()
}

fn default_staged_description() -> String {
    "Staged Extra Payment".to_string()
}

fn default_target() -> LoanTarget {
    LoanTarget::Primary
}

/// Everything needed to schedule one loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanParameters {
    pub principal: f64,
    pub annual_rate_percent: f64,
    pub term_years: u32,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub rate_changes: Vec<RateChange>,
    #[serde(default)]
    pub extra_payments: Vec<ExtraPayment>,
}

impl LoanParameters {
    pub fn new(principal: f64, annual_rate_percent: f64, term_years: u32, start_date: NaiveDate) -> Self {
        Self {
            principal,
            annual_rate_percent,
            term_years,
            start_date,
            rate_changes: Vec::new(),
            extra_payments: Vec::new(),
        }
    }

    pub fn with_rate_changes(mut self, rate_changes: Vec<RateChange>) -> Self {
        self.rate_changes = rate_changes;
        self
    }

    pub fn with_extra_payments(mut self, extra_payments: Vec<ExtraPayment>) -> Self {
        self.extra_payments = extra_payments;
        self
    }

    /// Contractual term in months; terms over `MAX_TERM_YEARS` are rejected
    pub fn term_months(&self) -> Result<u32> {
        if self.term_years > MAX_TERM_YEARS {
            return Err(CalculatorError::invalid(
                "term_years",
                format!("{} exceeds the {}-year maximum", self.term_years, MAX_TERM_YEARS),
            ));
        }
        self.term_years
            .checked_mul(12)
            .ok_or_else(|| CalculatorError::invalid("term_years", format!("{} overflows", self.term_years)))
    }
}

/// One month of an amortization schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationEntry {
    /// Payment number (1-indexed)
    pub month_index: u32,
    pub date: NaiveDate,

    /// Scheduled payment; only differs from the origination payment in the payoff month
    /// or after a recalculation under `PaymentPolicy::RecalculateOnRateChange`
    pub scheduled_payment: f64,

    /// Scheduled principal, excluding any extra payment
    pub principal: f64,
    pub interest: f64,
    pub ending_balance: f64,
    pub rate_percent: f64,

    pub extra_payment: f64,
    pub extra_payment_description: String,

    /// principal + interest + extra_payment
    pub total_payment: f64,
}

/// Complete schedule for one loan
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoanResult {
    pub schedule: Vec<AmortizationEntry>,
    pub total_interest: f64,
    pub total_principal: f64,

    /// Origination payment
    pub monthly_payment: f64,

    /// Contractual term in months (0 for an empty result)
    pub term_months: u32,
}

impl LoanResult {
    /// Zero-valued result for a loan that does not exist in the scenario
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.schedule.is_empty()
    }

    /// Date of the last scheduled payment
    pub fn end_date(&self) -> Option<NaiveDate> {
        self.schedule.last().map(|e| e.date)
    }

    /// Entry for calendar `month` (1-12) of `year`
    pub fn entry_for_month(&self, year: i32, month: u32) -> Option<&AmortizationEntry> {
        self.schedule
            .iter()
            .find(|e| e.date.year() == year && e.date.month() == month)
    }

    /// Summary statistics for the schedule
    pub fn summary(&self) -> LoanSummary {
        let actual_months = self.schedule.len() as u32;
        let total_extra_payments: f64 = self.schedule.iter().map(|e| e.extra_payment).sum();
        let scheduled_interest =
            self.monthly_payment * self.term_months as f64 - self.total_principal;

        LoanSummary {
            scheduled_months: self.term_months,
            actual_months,
            months_saved: self.term_months.saturating_sub(actual_months),
            total_interest: self.total_interest,
            total_extra_payments,
            interest_saved: scheduled_interest - self.total_interest,
            total_amount_paid: self.total_principal + self.total_interest,
        }
    }

    /// First month plus every month in which the active rate changed
    pub fn rate_periods(&self) -> Vec<RatePeriod> {
        let mut periods: Vec<RatePeriod> = Vec::new();
        for entry in &self.schedule {
            let changed = periods
                .last()
                .map_or(true, |p| (p.rate_percent - entry.rate_percent).abs() > f64::EPSILON);
            if changed {
                periods.push(RatePeriod {
                    month_index: entry.month_index,
                    date: entry.date,
                    rate_percent: entry.rate_percent,
                    scheduled_payment: entry.scheduled_payment,
                });
            }
        }
        periods
    }
}

/// Summary statistics for a loan schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanSummary {
    pub scheduled_months: u32,
    pub actual_months: u32,
    pub months_saved: u32,
    pub total_interest: f64,
    pub total_extra_payments: f64,
    /// Interest saved against carrying the origination payment for the full term
    pub interest_saved: f64,
    pub total_amount_paid: f64,
}

/// A run of months at one interest rate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatePeriod {
    pub month_index: u32,
    pub date: NaiveDate,
    pub rate_percent: f64,
    pub scheduled_payment: f64,
}
