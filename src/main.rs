//! Property Calc CLI
//!
//! Calculates one scenario, prints loan, cash-flow and fiscal-year tables and writes
//! the CSV reports.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use property_calc::loan::LoanTarget;
use property_calc::report::write_all_reports;
use property_calc::scenario::{load_depreciation_items, load_scenario};
use property_calc::{ScenarioRunner, PaymentPolicy};

/// Mortgage, cash-flow and tax summary for an investment property
#[derive(Parser, Debug)]
#[command(name = "property_calc")]
#[command(version, about, long_about = None)]
struct Args {
    /// Scenario JSON file
    #[arg(short, long)]
    scenario: PathBuf,

    /// Depreciation schedule CSV (Description,Cost,Rate,StartDate); adds to any items in the scenario
    #[arg(short, long)]
    depreciation: Option<PathBuf>,

    /// Directory for the CSV reports
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

    /// Recompute the monthly payment whenever the rate changes
    #[arg(long)]
    recalculate_on_rate_change: bool,

    /// Override the scenario's marginal tax rate (0-1)
    #[arg(long)]
    tax_rate: Option<f64>,

    /// Number of cash-flow months to print
    #[arg(long, default_value_t = 24)]
    months: usize,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    println!("Property Calc v{}", env!("CARGO_PKG_VERSION"));
    println!("======================\n");

    let mut scenario = load_scenario(&args.scenario)
        .with_context(|| format!("loading scenario {}", args.scenario.display()))?;

    if let Some(path) = &args.depreciation {
        let items = load_depreciation_items(path, scenario.loan.start_date)
            .with_context(|| format!("loading depreciation schedule {}", path.display()))?;
        println!("Loaded {} depreciation items from {}", items.len(), path.display());
        scenario.depreciation_items.extend(items);
    }
    if args.recalculate_on_rate_change {
        scenario.payment_policy = PaymentPolicy::RecalculateOnRateChange;
    }
    if let Some(rate) = args.tax_rate {
        scenario.tax_rate = rate;
    }

    let mut runner = ScenarioRunner::new();
    let results = runner.recalculate(&scenario).context("calculation failed")?;

    // Loans
    println!("Loans:");
    println!("{:>8} {:>14} {:>12} {:>8} {:>8} {:>14} {:>14}",
        "Loan", "Principal", "Payment", "Months", "Saved", "Interest", "Int. Saved");
    println!("{}", "-".repeat(86));
    for target in [LoanTarget::Primary, LoanTarget::Split1, LoanTarget::Split2, LoanTarget::Equity] {
        let loan = results.loan(target);
        if loan.is_empty() {
            continue;
        }
        let summary = loan.summary();
        println!("{:>8} {:>14.2} {:>12.2} {:>8} {:>8} {:>14.2} {:>14.2}",
            target.as_str(),
            loan.total_principal,
            loan.monthly_payment,
            summary.actual_months,
            summary.months_saved,
            summary.total_interest,
            summary.interest_saved,
        );
    }

    let primary_periods = results.primary_loan.rate_periods();
    if primary_periods.len() > 1 {
        println!("\nRate periods (primary):");
        for period in &primary_periods {
            println!("  Month {:>3} ({}): {:.3}% payment ${:.2}",
                period.month_index, period.date, period.rate_percent, period.scheduled_payment);
        }
    }

    // Monthly cash flow
    println!("\nCash flow ({} months):", results.cash_flow.len());
    println!("{:>8} {:>12} {:>12} {:>12} {:>4} {:>12}",
        "Month", "Loan", "Expenses", "Rent", "Pmts", "Net");
    println!("{}", "-".repeat(66));
    for (key, entry) in results.cash_flow.iter().take(args.months) {
        println!("{:>8} {:>12.2} {:>12.2} {:>12.2} {:>4} {:>12.2}",
            key.to_string(),
            entry.loan_payment,
            entry.other_expenses(),
            entry.rental,
            entry.rental_payment_count(),
            entry.net_cash_flow,
        );
    }
    if results.cash_flow.len() > args.months {
        println!("... ({} more months)", results.cash_flow.len() - args.months);
    }

    // Fiscal years
    println!("\nFiscal years (tax rate {:.0}%):", scenario.tax_rate * 100.0);
    println!("{:>12} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12} {:>8}",
        "Year", "Income", "Expenses", "Interest", "Principal", "Deprec.", "Tax Ben.", "Net", "Equity", "ROI %");
    println!("{}", "-".repeat(126));
    for entry in results.annual_summary.values() {
        println!("{:>12} {:>12.2} {:>12.2} {:>12.2} {:>12.2} {:>12.2} {:>12.2} {:>12.2} {:>12.2} {:>8.2}",
            entry.fiscal_year,
            entry.total_income,
            entry.total_expenses,
            entry.interest_paid,
            entry.principal_paid,
            entry.depreciation,
            entry.tax_benefit,
            entry.net_position,
            entry.equity,
            entry.roi_percent,
        );
    }

    println!("\nTotal net cash flow: ${:.2}", results.total_net_cash_flow());

    let written = write_all_reports(&args.output_dir, results)
        .with_context(|| format!("writing reports to {}", args.output_dir.display()))?;
    println!("\nReports written:");
    for path in written {
        println!("  {}", path.display());
    }

    Ok(())
}
