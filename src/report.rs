//! CSV export of schedules, monthly cash flow and fiscal-year summaries

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use log::info;
use serde::Serialize;

use crate::calculator::ScenarioResults;
use crate::cashflow::CashFlowMap;
use crate::error::Result;
use crate::loan::{AmortizationEntry, LoanTarget};
use crate::summary::AnnualSummaryMap;

/// Flat cash-flow row: line items collapse into totals
#[derive(Debug, Serialize)]
struct CashFlowRow<'a> {
    month: String,
    date: NaiveDate,
    loan_payment: f64,
    other_expenses: f64,
    total_expenses: f64,
    rental: f64,
    rental_payments: usize,
    total_income: f64,
    net_cash_flow: f64,
    expense_items: &'a str,
}

/// One scenario's fiscal year in a combined batch file
#[derive(Debug, Serialize)]
struct BatchRow<'a> {
    #[serde(rename = "Scenario")]
    scenario: &'a str,
    #[serde(rename = "FiscalYear")]
    fiscal_year: &'a str,
    #[serde(rename = "Income")]
    income: f64,
    #[serde(rename = "Expenses")]
    expenses: f64,
    #[serde(rename = "Interest")]
    interest: f64,
    #[serde(rename = "Principal")]
    principal: f64,
    #[serde(rename = "Depreciation")]
    depreciation: f64,
    #[serde(rename = "TaxBenefit")]
    tax_benefit: f64,
    #[serde(rename = "NetPosition")]
    net_position: f64,
    #[serde(rename = "Equity")]
    equity: f64,
    #[serde(rename = "ROIPercent")]
    roi_percent: f64,
}

/// One row per schedule month
pub fn write_schedule_csv<W: Write>(writer: W, schedule: &[AmortizationEntry]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for entry in schedule {
        csv.serialize(entry)?;
    }
    csv.flush()?;
    Ok(())
}

/// One row per month; expense categories are joined into a single column
pub fn write_cash_flow_csv<W: Write>(writer: W, cash_flow: &CashFlowMap) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for (key, entry) in cash_flow {
        let items = entry
            .expenses
            .iter()
            .map(|e| format!("{} {:.2}", e.category, e.amount))
            .collect::<Vec<_>>()
            .join("; ");

        csv.serialize(CashFlowRow {
            month: key.to_string(),
            date: entry.date,
            loan_payment: entry.loan_payment,
            other_expenses: entry.other_expenses(),
            total_expenses: entry.total_expenses,
            rental: entry.rental,
            rental_payments: entry.rental_payment_count(),
            total_income: entry.total_income,
            net_cash_flow: entry.net_cash_flow,
            expense_items: &items,
        })?;
    }
    csv.flush()?;
    Ok(())
}

pub fn write_annual_summary_csv<W: Write>(writer: W, summary: &AnnualSummaryMap) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for entry in summary.values() {
        csv.serialize(entry)?;
    }
    csv.flush()?;
    Ok(())
}

/// One row per scenario per fiscal year, scenarios in the order given
pub fn write_batch_summary_csv<W: Write>(writer: W, scenarios: &[(&str, &AnnualSummaryMap)]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for (name, summary) in scenarios {
        for entry in summary.values() {
            csv.serialize(BatchRow {
                scenario: *name,
                fiscal_year: &entry.fiscal_year,
                income: entry.total_income,
                expenses: entry.total_expenses,
                interest: entry.interest_paid,
                principal: entry.principal_paid,
                depreciation: entry.depreciation,
                tax_benefit: entry.tax_benefit,
                net_position: entry.net_position,
                equity: entry.equity,
                roi_percent: entry.roi_percent,
            })?;
        }
    }
    csv.flush()?;
    Ok(())
}

/// Write every report for a result set into `dir`, returning the files written
///
/// Loan schedules that are empty (no split or equity loan) are not written.
pub fn write_all_reports(dir: &Path, results: &ScenarioResults) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::new();

    for target in [LoanTarget::Primary, LoanTarget::Split1, LoanTarget::Split2, LoanTarget::Equity] {
        let loan = results.loan(target);
        if loan.is_empty() {
            continue;
        }
        let path = dir.join(format!("schedule_{}.csv", target.as_str()));
        write_schedule_csv(File::create(&path)?, &loan.schedule)?;
        written.push(path);
    }

    let path = dir.join("cash_flow.csv");
    write_cash_flow_csv(File::create(&path)?, &results.cash_flow)?;
    written.push(path);

    let path = dir.join("annual_summary.csv");
    write_annual_summary_csv(File::create(&path)?, &results.annual_summary)?;
    written.push(path);

    info!("Wrote {} reports to {}", written.len(), dir.display());
    Ok(written)
}
