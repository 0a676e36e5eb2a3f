//! Scenario calculation: loans, then cash flow, then fiscal-year summary
//!
//! Every run builds a fresh `ScenarioResults` from its scenario alone. The runner
//! only holds the latest successful result set and replaces it wholesale.

use log::{info, warn};
use rayon::prelude::*;

use crate::cashflow::{ActiveLoan, CashFlowAggregator, CashFlowMap, ExpenseCategory};
use crate::error::Result;
use crate::loan::{LoanResult, LoanScheduler, LoanTarget};
use crate::scenario::PropertyScenario;
use crate::summary::{AnnualSummarizer, AnnualSummaryMap};

/// Everything one calculation produces
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioResults {
    /// The primary loan, or the merge of both split loans when the scenario splits it
    pub primary_loan: LoanResult,
    pub split_loan_1: LoanResult,
    pub split_loan_2: LoanResult,
    pub equity_loan: LoanResult,
    pub cash_flow: CashFlowMap,
    pub annual_summary: AnnualSummaryMap,
}

impl ScenarioResults {
    pub fn loan(&self, target: LoanTarget) -> &LoanResult {
        match target {
            LoanTarget::Primary => &self.primary_loan,
            LoanTarget::Split1 => &self.split_loan_1,
            LoanTarget::Split2 => &self.split_loan_2,
            LoanTarget::Equity => &self.equity_loan,
        }
    }

    /// Primary and equity loans merged into one schedule
    pub fn combined_loans(&self) -> LoanResult {
        self.primary_loan.combine(&self.equity_loan)
    }

    pub fn total_net_cash_flow(&self) -> f64 {
        self.cash_flow.values().map(|e| e.net_cash_flow).sum()
    }
}

/// Run the full calculation for one scenario
pub fn calculate(scenario: &PropertyScenario) -> Result<ScenarioResults> {
    scenario.validate()?;
    info!(
        "Calculating scenario: loan {:.2} from {}, policy {:?}",
        scenario.loan.amount, scenario.loan.start_date, scenario.payment_policy
    );

    let scheduler = LoanScheduler::new(scenario.payment_policy);

    let (primary_loan, split_loan_1, split_loan_2) = if scenario.has_split_loan() {
        let (payments, rate_changes) = scenario.primary_events_ignored_by_split();
        if payments > 0 {
            warn!("{} extra payment(s) targeting the primary loan are ignored when the loan is split", payments);
        }
        if rate_changes > 0 {
            warn!("{} rate change(s) targeting the primary loan are ignored when the loan is split", rate_changes);
        }
        let split_1 = scheduler.schedule(&scenario.loan_parameters(LoanTarget::Split1)?)?;
        let split_2 = scheduler.schedule(&scenario.loan_parameters(LoanTarget::Split2)?)?;
        (split_1.combine(&split_2), split_1, split_2)
    } else {
        let primary = scheduler.schedule(&scenario.loan_parameters(LoanTarget::Primary)?)?;
        (primary, LoanResult::empty(), LoanResult::empty())
    };

    let equity_loan = if scenario.has_equity_loan() {
        scheduler.schedule(&scenario.loan_parameters(LoanTarget::Equity)?)?
    } else {
        LoanResult::empty()
    };

    let primary_category = ExpenseCategory::PrimaryLoanPayment;
    let equity_category = ExpenseCategory::EquityLoanPayment;
    let active_loans: Vec<ActiveLoan<'_>> = [
        (&primary_category, &primary_loan),
        (&equity_category, &equity_loan),
    ]
    .into_iter()
    .filter(|(_, result)| !result.is_empty())
    .map(|(category, result)| ActiveLoan { category, result })
    .collect();

    let cash_flow = CashFlowAggregator::new(scenario).aggregate(&active_loans)?;

    let annual_summary = AnnualSummarizer::new(scenario.fiscal_year_start_month, scenario.tax_rate)
        .with_property_value(scenario.property_value, scenario.annual_property_value_increase)
        .summarize(&cash_flow, &[&primary_loan, &equity_loan], &scenario.depreciation_items)?;

    info!(
        "Calculated {} schedule months, {} cash-flow months, {} fiscal years",
        primary_loan.schedule.len(),
        cash_flow.len(),
        annual_summary.len()
    );

    Ok(ScenarioResults {
        primary_loan,
        split_loan_1,
        split_loan_2,
        equity_loan,
        cash_flow,
        annual_summary,
    })
}

/// Holder of the latest calculation
///
/// `recalculate` takes `&mut self`, so two recalculations of one runner can never
/// interleave.
#[derive(Debug, Clone, Default)]
pub struct ScenarioRunner {
    latest: Option<ScenarioResults>,
}

impl ScenarioRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard the previous results, then calculate
    ///
    /// On failure the runner is left empty rather than holding stale results.
    pub fn recalculate(&mut self, scenario: &PropertyScenario) -> Result<&ScenarioResults> {
        self.latest = None;
        let results = calculate(scenario)?;
        Ok(self.latest.insert(results))
    }

    pub fn latest(&self) -> Option<&ScenarioResults> {
        self.latest.as_ref()
    }

    pub fn clear(&mut self) {
        self.latest = None;
    }

    /// Calculate independent scenarios in parallel, results in input order
    pub fn run_batch(scenarios: &[PropertyScenario]) -> Vec<Result<ScenarioResults>> {
        scenarios.par_iter().map(calculate).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cashflow::CashFlowKey;
    use crate::loan::{ExtraPayment, PaymentPolicy, RateChange};
    use crate::scenario::{EquityLoanConfig, SplitLoanConfig};
    use crate::summary::DepreciationItem;
    use approx::assert_abs_diff_eq;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn investment_scenario() -> PropertyScenario {
        let mut scenario = PropertyScenario::new(d(2024, 7, 1), 200_000.0);
        scenario.loan.interest_rate = 6.0;
        scenario.rental.weekly_rent = 400.0;
        scenario.settlement_costs.stamp_duty = 5_000.0;
        scenario.settlement_costs.agent_fees_percentage = 7.0;
        scenario.recurring_expenses.council_rates = 1_800.0;
        scenario.recurring_expenses.insurance = 1_500.0;
        scenario.depreciation_items = vec![DepreciationItem::new("Building", 250_000.0, 2.5, d(2024, 7, 1))];
        scenario
    }

    #[test]
    fn test_end_to_end_single_loan() {
        let results = calculate(&investment_scenario()).unwrap();

        assert_abs_diff_eq!(results.primary_loan.monthly_payment, 1_199.10, epsilon = 0.01);
        assert_abs_diff_eq!(results.primary_loan.schedule[0].ending_balance, 199_800.90, epsilon = 0.01);
        assert!(results.split_loan_1.is_empty());
        assert!(results.equity_loan.is_empty());

        assert_eq!(results.cash_flow.len(), 360);
        assert_eq!(results.annual_summary.len(), 30);
        assert!(results.annual_summary.contains_key("FY2024-2025"));
        assert!(results.annual_summary.contains_key("FY2053-2054"));

        let rent: f64 = results.cash_flow.values().map(|e| e.rental).sum();
        let income: f64 = results.annual_summary.values().map(|s| s.total_income).sum();
        assert_abs_diff_eq!(rent, income, epsilon = 1e-6);

        let first = &results.annual_summary["FY2024-2025"];
        assert_eq!(first.depreciation, 6_250.0);
        assert_abs_diff_eq!(
            first.net_position,
            first.total_income - first.total_expenses + first.tax_benefit,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_split_loans_merge_into_primary() {
        let mut scenario = investment_scenario();
        scenario.split_loan = Some(SplitLoanConfig {
            amount_1: 150_000.0,
            amount_2: 50_000.0,
            rate_1: 5.5,
            rate_2: 6.5,
        });
        let results = calculate(&scenario).unwrap();

        assert_eq!(results.split_loan_1.total_principal, 150_000.0);
        assert_eq!(results.split_loan_2.total_principal, 50_000.0);
        assert_abs_diff_eq!(
            results.primary_loan.monthly_payment,
            results.split_loan_1.monthly_payment + results.split_loan_2.monthly_payment,
            epsilon = 1e-9
        );
        assert_abs_diff_eq!(results.primary_loan.schedule[0].rate_percent, 6.0, epsilon = 1e-12);
        assert_eq!(results.loan(LoanTarget::Split2), &results.split_loan_2);
    }

    #[test]
    fn test_equity_loan_extends_cash_flow_and_adds_payments() {
        let mut scenario = investment_scenario();
        scenario.loan.term_years = 10;
        scenario.equity_loan = Some(EquityLoanConfig {
            start_date: Some(d(2025, 1, 1)),
            amount: 50_000.0,
            term_years: 15,
            interest_rate: 7.0,
        });
        let results = calculate(&scenario).unwrap();

        // July 2024 through December 2039
        assert_eq!(results.cash_flow.len(), 186);
        let jan = &results.cash_flow[&CashFlowKey::new(2025, 1)];
        assert_eq!(jan.loan_items.len(), 2);
        assert_abs_diff_eq!(
            jan.loan_payment,
            results.primary_loan.monthly_payment + results.equity_loan.monthly_payment,
            epsilon = 1e-9
        );

        let combined = results.combined_loans();
        assert_eq!(combined.total_principal, 250_000.0);

        let principal: f64 = results.annual_summary.values().map(|s| s.principal_paid).sum();
        assert_abs_diff_eq!(principal, 250_000.0, epsilon = 1e-6);
    }

    #[test]
    fn test_rate_change_and_extra_payment_flow_through() {
        let mut scenario = investment_scenario();
        scenario.rate_changes = vec![RateChange {
            effective_date: d(2026, 1, 1),
            annual_rate_percent: 4.0,
            target: None,
        }];
        scenario.extra_payments = vec![ExtraPayment {
            date: d(2025, 1, 1),
            amount: 20_000.0,
            description: "Bonus".to_string(),
            target: LoanTarget::Primary,
        }];

        let fixed = calculate(&scenario).unwrap();
        scenario.payment_policy = PaymentPolicy::RecalculateOnRateChange;
        let recalculated = calculate(&scenario).unwrap();

        assert!(fixed.primary_loan.schedule.len() < 360);
        assert_eq!(recalculated.primary_loan.schedule.len(), 360);

        let jan = &fixed.cash_flow[&CashFlowKey::new(2025, 1)];
        assert!(jan.loan_items[0].notes.contains("Extra: $20000.00"));
        assert_abs_diff_eq!(jan.loan_payment, fixed.primary_loan.monthly_payment + 20_000.0, epsilon = 1e-6);
    }

    #[test]
    fn test_runner_replaces_and_clears_results() {
        let mut runner = ScenarioRunner::new();
        assert!(runner.latest().is_none());

        let months = runner.recalculate(&investment_scenario()).unwrap().cash_flow.len();
        assert_eq!(months, 360);
        assert!(runner.latest().is_some());

        let mut broken = investment_scenario();
        broken.fiscal_year_start_month = 12;
        assert!(runner.recalculate(&broken).is_err());
        assert!(runner.latest().is_none());

        runner.recalculate(&investment_scenario()).unwrap();
        runner.clear();
        assert!(runner.latest().is_none());
    }

    #[test]
    fn test_run_batch_matches_sequential() {
        let scenarios: Vec<PropertyScenario> = [150_000.0, 300_000.0, 450_000.0]
            .iter()
            .map(|&amount| {
                let mut scenario = investment_scenario();
                scenario.loan.amount = amount;
                scenario
            })
            .collect();

        let batch = ScenarioRunner::run_batch(&scenarios);
        assert_eq!(batch.len(), 3);
        for (scenario, result) in scenarios.iter().zip(batch) {
            assert_eq!(result.unwrap(), calculate(scenario).unwrap());
        }
    }
}
