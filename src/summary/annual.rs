//! Fiscal-year regrouping of the monthly cash flow with depreciation and tax benefit

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::depreciation::DepreciationItem;
use crate::cashflow::CashFlowMap;
use crate::dates;
use crate::error::{CalculatorError, Result};
use crate::loan::LoanResult;

/// Marginal tax rate applied to a negatively geared loss
pub const DEFAULT_TAX_RATE: f64 = 0.45;

/// A fiscal year identified by the calendar year it starts in
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FiscalYear {
    pub start_year: i32,
    /// 0 = January .. 11 = December
    pub start_month: u32,
}

impl FiscalYear {
    /// Fiscal year containing `year`/`month` (month 1-12)
    pub fn containing(year: i32, month: u32, start_month: u32) -> Self {
        let start_year = if month.saturating_sub(1) >= start_month { year } else { year - 1 };
        Self {
            start_year,
            start_month,
        }
    }

    pub fn label(&self) -> String {
        format!("FY{}-{}", self.start_year, self.start_year + 1)
    }

    pub fn start_date(&self) -> Result<NaiveDate> {
        NaiveDate::from_ymd_opt(self.start_year, self.start_month + 1, 1).ok_or_else(|| {
            CalculatorError::DateOutOfRange(format!("start of {}", self.label()))
        })
    }

    /// Last day of the fiscal year
    pub fn end_date(&self) -> Result<NaiveDate> {
        let next = dates::add_months(self.start_date()?, 12)?;
        next.pred_opt()
            .ok_or_else(|| CalculatorError::DateOutOfRange(format!("end of {}", self.label())))
    }
}

/// Totals for one fiscal year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnualSummaryEntry {
    pub fiscal_year: String,
    pub start_year: i32,
    pub end_year: i32,
    pub total_expenses: f64,
    pub total_income: f64,
    pub interest_paid: f64,
    /// Scheduled principal plus extra payments
    pub principal_paid: f64,
    pub depreciation: f64,
    pub tax_benefit: f64,
    pub net_position: f64,

    /// Purchase value grown once per fiscal year since the first one
    pub property_value: f64,
    /// Closing balance across all loans at the last payment on or before year end
    pub remaining_balance: f64,
    pub equity: f64,
    /// Cash result (income less expenses and loan payments) over the amount borrowed
    pub roi_percent: f64,
}

impl AnnualSummaryEntry {
    fn new(fiscal_year: &FiscalYear) -> Self {
        Self {
            fiscal_year: fiscal_year.label(),
            start_year: fiscal_year.start_year,
            end_year: fiscal_year.start_year + 1,
            total_expenses: 0.0,
            total_income: 0.0,
            interest_paid: 0.0,
            principal_paid: 0.0,
            depreciation: 0.0,
            tax_benefit: 0.0,
            net_position: 0.0,
            property_value: 0.0,
            remaining_balance: 0.0,
            equity: 0.0,
            roi_percent: 0.0,
        }
    }

    /// A loss after depreciation is refunded at `tax_rate`
    fn finalize(&mut self, tax_rate: f64) {
        let negative_gearing = (self.total_expenses + self.depreciation - self.total_income).max(0.0);
        self.tax_benefit = negative_gearing * tax_rate;
        self.net_position = self.total_income - self.total_expenses + self.tax_benefit;
    }
}

/// Summaries keyed by fiscal-year label ("FY2024-2025"), chronological
pub type AnnualSummaryMap = BTreeMap<String, AnnualSummaryEntry>;

pub struct AnnualSummarizer {
    fiscal_year_start_month: u32,
    tax_rate: f64,
    property_value: f64,
    annual_growth_percent: f64,
}

impl AnnualSummarizer {
    pub fn new(fiscal_year_start_month: u32, tax_rate: f64) -> Self {
        Self {
            fiscal_year_start_month,
            tax_rate,
            property_value: 0.0,
            annual_growth_percent: 0.0,
        }
    }

    /// Track property value and equity from `value`, compounding `annual_growth_percent`
    pub fn with_property_value(mut self, value: f64, annual_growth_percent: f64) -> Self {
        self.property_value = value;
        self.annual_growth_percent = annual_growth_percent;
        self
    }

    /// Value in the fiscal year `years_held` after the first
    pub fn property_value_after(&self, years_held: u32) -> f64 {
        let growth = 1.0 + self.annual_growth_percent / 100.0;
        self.property_value * growth.powi(years_held as i32)
    }

    pub fn fiscal_year_start_month(&self) -> u32 {
        self.fiscal_year_start_month
    }

    /// Group months into fiscal years, then add loan splits, depreciation and tax
    ///
    /// Interest and principal come from each loan's own schedule for the month rather
    /// than from the cash-flow line items.
    pub fn summarize(
        &self,
        cash_flow: &CashFlowMap,
        loans: &[&LoanResult],
        depreciation_items: &[DepreciationItem],
    ) -> Result<AnnualSummaryMap> {
        if self.fiscal_year_start_month > 11 {
            return Err(CalculatorError::invalid(
                "fiscal_year_start_month",
                format!("{} is not a month index (0-11)", self.fiscal_year_start_month),
            ));
        }

        let mut years: BTreeMap<FiscalYear, AnnualSummaryEntry> = BTreeMap::new();

        for entry in cash_flow.values() {
            let fy = FiscalYear::containing(entry.year, entry.month, self.fiscal_year_start_month);
            let summary = years.entry(fy).or_insert_with(|| AnnualSummaryEntry::new(&fy));

            summary.total_expenses += entry.total_expenses;
            summary.total_income += entry.total_income;

            for loan in loans {
                if let Some(payment) = loan.entry_for_month(entry.year, entry.month) {
                    summary.interest_paid += payment.interest;
                    summary.principal_paid += payment.principal + payment.extra_payment;
                }
            }
        }

        let borrowed: f64 = loans.iter().map(|loan| loan.total_principal).sum();
        let first_year = years.keys().next().map(|fy| fy.start_year);

        let mut summaries = AnnualSummaryMap::new();
        for (fy, mut summary) in years {
            let (fy_start, fy_end) = (fy.start_date()?, fy.end_date()?);
            summary.depreciation = depreciation_items
                .iter()
                .map(|item| item.amount_for_period(fy_start, fy_end))
                .sum();
            summary.finalize(self.tax_rate);

            let years_held = first_year.map_or(0, |first| (fy.start_year - first).max(0) as u32);
            summary.property_value = self.property_value_after(years_held);
            summary.remaining_balance = loans.iter().map(|loan| closing_balance(loan, fy_end)).sum();
            summary.equity = summary.property_value - summary.remaining_balance;
            if borrowed > 0.0 {
                summary.roi_percent = (summary.total_income - summary.total_expenses) / borrowed * 100.0;
            }
            summaries.insert(summary.fiscal_year.clone(), summary);
        }

        Ok(summaries)
    }
}

/// Balance after the last payment dated on or before `date`; zero before the first payment
fn closing_balance(loan: &LoanResult, date: NaiveDate) -> f64 {
    let paid = loan.schedule.partition_point(|e| e.date <= date);
    paid.checked_sub(1).map_or(0.0, |i| loan.schedule[i].ending_balance)
}

impl Default for AnnualSummarizer {
    /// July fiscal year at the default tax rate
    fn default() -> Self {
        Self::new(6, DEFAULT_TAX_RATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cashflow::{CashFlowEntry, CashFlowKey};
    use crate::loan::{LoanParameters, LoanScheduler};
    use approx::assert_abs_diff_eq;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn flat_cash_flow(start: NaiveDate, months: u32, rent: f64, expenses: f64) -> CashFlowMap {
        (0..months)
            .map(|k| {
                let mut entry = CashFlowEntry::new(dates::add_months(start, k).unwrap());
                entry.rental = rent;
                entry.loan_payment = expenses;
                entry.update_totals();
                (entry.key(), entry)
            })
            .collect()
    }

    #[test]
    fn test_fiscal_year_assignment() {
        assert_eq!(FiscalYear::containing(2024, 7, 6).start_year, 2024);
        assert_eq!(FiscalYear::containing(2024, 6, 6).start_year, 2023);
        assert_eq!(FiscalYear::containing(2024, 1, 0).start_year, 2024);
        assert_eq!(FiscalYear::containing(2024, 12, 11).start_year, 2024);
        assert_eq!(FiscalYear::containing(2024, 11, 11).start_year, 2023);

        let fy = FiscalYear::containing(2025, 3, 6);
        assert_eq!(fy.label(), "FY2024-2025");
        assert_eq!(fy.start_date().unwrap(), d(2024, 7, 1));
        assert_eq!(fy.end_date().unwrap(), d(2025, 6, 30));
    }

    #[test]
    fn test_months_grouped_by_fiscal_year() {
        // March 2024 .. February 2026
        let cash_flow = flat_cash_flow(d(2024, 3, 1), 24, 2_000.0, 1_500.0);
        let summaries = AnnualSummarizer::default().summarize(&cash_flow, &[], &[]).unwrap();

        let labels: Vec<_> = summaries.keys().cloned().collect();
        assert_eq!(labels, vec!["FY2023-2024", "FY2024-2025", "FY2025-2026"]);
        assert_eq!(summaries["FY2023-2024"].total_income, 4.0 * 2_000.0);
        assert_eq!(summaries["FY2024-2025"].total_income, 12.0 * 2_000.0);
        assert_eq!(summaries["FY2025-2026"].total_expenses, 8.0 * 1_500.0);
    }

    #[test]
    fn test_income_conserved_across_fiscal_years() {
        let cash_flow = flat_cash_flow(d(2023, 11, 1), 41, 1_733.33, 2_100.0);
        let rent: f64 = cash_flow.values().map(|e| e.rental).sum();

        for start_month in [0, 6, 9] {
            let summaries = AnnualSummarizer::new(start_month, DEFAULT_TAX_RATE)
                .summarize(&cash_flow, &[], &[])
                .unwrap();
            let income: f64 = summaries.values().map(|s| s.total_income).sum();
            assert_abs_diff_eq!(income, rent, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_tax_benefit_and_net_position() {
        let cash_flow = flat_cash_flow(d(2024, 7, 1), 12, 2_000.0, 3_000.0);
        let items = [DepreciationItem::new("Building", 400_000.0, 2.5, d(2024, 7, 1))];
        let summaries = AnnualSummarizer::new(6, 0.3).summarize(&cash_flow, &[], &items).unwrap();
        let fy = &summaries["FY2024-2025"];

        assert_eq!(fy.depreciation, 10_000.0);
        // (36,000 + 10,000 - 24,000) * 0.3
        assert_abs_diff_eq!(fy.tax_benefit, 6_600.0, epsilon = 1e-9);
        assert_abs_diff_eq!(fy.net_position, 24_000.0 - 36_000.0 + 6_600.0, epsilon = 1e-9);
    }

    #[test]
    fn test_profitable_year_has_no_tax_benefit() {
        let cash_flow = flat_cash_flow(d(2024, 7, 1), 12, 3_000.0, 1_000.0);
        let summaries = AnnualSummarizer::default().summarize(&cash_flow, &[], &[]).unwrap();
        let fy = &summaries["FY2024-2025"];
        assert_eq!(fy.tax_benefit, 0.0);
        assert_eq!(fy.net_position, 24_000.0);
    }

    #[test]
    fn test_depreciation_starts_at_purchase() {
        let cash_flow = flat_cash_flow(d(2023, 7, 1), 36, 0.0, 0.0);
        let items = [
            DepreciationItem::new("Building", 400_000.0, 2.5, d(2024, 7, 1)),
            DepreciationItem::new("Dishwasher", 1_200.0, 10.0, d(2025, 4, 15)),
        ];
        let summaries = AnnualSummarizer::default().summarize(&cash_flow, &[], &items).unwrap();

        assert_eq!(summaries["FY2023-2024"].depreciation, 0.0);
        // April to June is 3 months of the dishwasher
        assert_abs_diff_eq!(summaries["FY2024-2025"].depreciation, 10_000.0 + 30.0, epsilon = 1e-9);
        assert_abs_diff_eq!(summaries["FY2025-2026"].depreciation, 10_000.0 + 120.0, epsilon = 1e-9);
    }

    #[test]
    fn test_interest_and_principal_from_schedules() {
        let loan = LoanScheduler::default()
            .schedule(&LoanParameters::new(100_000.0, 6.0, 2, d(2024, 7, 1)))
            .unwrap();
        let cash_flow: CashFlowMap = loan
            .schedule
            .iter()
            .map(|p| {
                let mut entry = CashFlowEntry::new(p.date);
                entry.loan_payment = p.total_payment;
                entry.update_totals();
                (CashFlowKey::from_date(p.date), entry)
            })
            .collect();

        let summaries = AnnualSummarizer::default().summarize(&cash_flow, &[&loan], &[]).unwrap();
        assert_eq!(summaries.len(), 2);

        let interest: f64 = summaries.values().map(|s| s.interest_paid).sum();
        let principal: f64 = summaries.values().map(|s| s.principal_paid).sum();
        assert_abs_diff_eq!(interest, loan.total_interest, epsilon = 1e-6);
        assert_abs_diff_eq!(principal, 100_000.0, epsilon = 1e-6);

        let first = &summaries["FY2024-2025"];
        assert_abs_diff_eq!(first.interest_paid + first.principal_paid, first.total_expenses, epsilon = 1e-6);
    }

    #[test]
    fn test_property_value_compounds_per_fiscal_year() {
        let cash_flow = flat_cash_flow(d(2024, 7, 1), 36, 0.0, 0.0);
        let summaries = AnnualSummarizer::default()
            .with_property_value(600_000.0, 5.0)
            .summarize(&cash_flow, &[], &[])
            .unwrap();

        assert_eq!(summaries["FY2024-2025"].property_value, 600_000.0);
        assert_abs_diff_eq!(summaries["FY2025-2026"].property_value, 630_000.0, epsilon = 1e-6);
        assert_abs_diff_eq!(summaries["FY2026-2027"].property_value, 661_500.0, epsilon = 1e-6);
        // No loans: equity is the whole value and there is no return on borrowing
        assert_eq!(summaries["FY2026-2027"].equity, summaries["FY2026-2027"].property_value);
        assert_eq!(summaries["FY2026-2027"].roi_percent, 0.0);
    }

    #[test]
    fn test_equity_and_roi_from_closing_balances() {
        let primary = LoanScheduler::default()
            .schedule(&LoanParameters::new(400_000.0, 6.0, 30, d(2024, 7, 1)))
            .unwrap();
        // Drawn in the second fiscal year
        let equity_loan = LoanScheduler::default()
            .schedule(&LoanParameters::new(50_000.0, 7.0, 10, d(2025, 9, 1)))
            .unwrap();
        let cash_flow = flat_cash_flow(d(2024, 7, 1), 24, 2_500.0, 3_000.0);

        let summaries = AnnualSummarizer::default()
            .with_property_value(500_000.0, 0.0)
            .summarize(&cash_flow, &[&primary, &equity_loan], &[])
            .unwrap();

        let first = &summaries["FY2024-2025"];
        assert_eq!(first.remaining_balance, primary.schedule[11].ending_balance);
        assert_abs_diff_eq!(first.equity, 500_000.0 - first.remaining_balance, epsilon = 1e-9);

        let second = &summaries["FY2025-2026"];
        let expected = primary.schedule[23].ending_balance + equity_loan.schedule[9].ending_balance;
        assert_abs_diff_eq!(second.remaining_balance, expected, epsilon = 1e-9);
        assert_abs_diff_eq!(second.equity, 500_000.0 - expected, epsilon = 1e-9);

        // (30,000 - 36,000) / 450,000
        assert_abs_diff_eq!(second.roi_percent, -6_000.0 / 450_000.0 * 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_rejects_bad_start_month() {
        let cash_flow = flat_cash_flow(d(2024, 7, 1), 1, 0.0, 0.0);
        let result = AnnualSummarizer::new(12, DEFAULT_TAX_RATE).summarize(&cash_flow, &[], &[]);
        assert!(result.is_err());
    }
}
