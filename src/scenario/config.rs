//! Typed property scenario: every input the calculator recognises, with defaults

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{CalculatorError, Result};
use crate::loan::{
    expand_staged_payments, ExtraPayment, LoanParameters, LoanTarget, PaymentPolicy, RateChange,
    StagedExtraPayment, MAX_TERM_YEARS,
};
use crate::summary::{DepreciationItem, DEFAULT_TAX_RATE};

fn default_term_years() -> u32 {
    30
}

fn default_interest_rate() -> f64 {
    4.5
}

fn default_split_rate_2() -> f64 {
    5.0
}

/// July
fn default_fiscal_year_start_month() -> u32 {
    6
}

fn default_tax_rate() -> f64 {
    DEFAULT_TAX_RATE
}

fn default_repair_description() -> String {
    "Repair".to_string()
}

/// Primary loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanConfig {
    /// First payment date; also the first month of the cash-flow range
    pub start_date: NaiveDate,

    #[serde(default)]
    pub amount: f64,

    #[serde(default = "default_term_years")]
    pub term_years: u32,

    /// Annual rate in percent
    #[serde(default = "default_interest_rate")]
    pub interest_rate: f64,
}

/// Primary borrowing divided into two sub-loans sharing the primary term and start date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitLoanConfig {
    #[serde(default)]
    pub amount_1: f64,
    #[serde(default)]
    pub amount_2: f64,
    #[serde(default = "default_interest_rate")]
    pub rate_1: f64,
    #[serde(default = "default_split_rate_2")]
    pub rate_2: f64,
}

/// Secondary loan drawn against property equity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityLoanConfig {
    /// Defaults to the primary loan start date
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub amount: f64,
    #[serde(default = "default_term_years")]
    pub term_years: u32,
    #[serde(default = "default_interest_rate")]
    pub interest_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RentalConfig {
    /// Anchor of the fortnightly rent cycle; defaults to the loan start date
    pub start_date: Option<NaiveDate>,
    pub weekly_rent: f64,
}

/// One-time purchase costs charged in the first cash-flow month
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettlementCosts {
    pub stamp_duty: f64,
    pub transfer_fee: f64,
    pub mortgage_fee: f64,
    pub government_fee: f64,
    pub bank_wealth_package: f64,
    pub solicitor_fees: f64,
    pub conveyancer_fees: f64,
    pub property_inspection: f64,
    pub furnishings: f64,
    pub bank_cheque_fee: f64,
    pub bank_settlement_fee: f64,
    pub land_titles_office_fees: f64,
    pub initial_utilities: f64,
    pub initial_strata_fees: f64,

    /// Property manager fee as a percentage of each month's rent; charged monthly,
    /// not at settlement
    pub agent_fees_percentage: f64,
}

impl SettlementCosts {
    /// Flat settlement costs with their display labels
    pub fn line_items(&self) -> [(&'static str, f64); 14] {
        [
            ("Stamp Duty", self.stamp_duty),
            ("Transfer Fee", self.transfer_fee),
            ("Mortgage Fee", self.mortgage_fee),
            ("Government Fee", self.government_fee),
            ("Bank Wealth Package", self.bank_wealth_package),
            ("Solicitor Fees", self.solicitor_fees),
            ("Conveyancer Fees", self.conveyancer_fees),
            ("Property Inspection", self.property_inspection),
            ("Furnishings", self.furnishings),
            ("Bank Cheque Fee", self.bank_cheque_fee),
            ("Bank Settlement Fee", self.bank_settlement_fee),
            ("Land Titles Office Fees", self.land_titles_office_fees),
            ("Initial Utilities", self.initial_utilities),
            ("Initial Strata Fees", self.initial_strata_fees),
        ]
    }
}

/// Annual totals of recurring holding costs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecurringExpenses {
    pub land_tax: f64,
    pub council_rates: f64,
    pub strata_rates: f64,
    pub water_rates: f64,
    pub insurance: f64,
}

/// One-off repair or maintenance cost
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repair {
    pub date: NaiveDate,
    pub amount: f64,
    #[serde(default = "default_repair_description")]
    pub description: String,
}

/// Complete input for one property calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyScenario {
    pub loan: LoanConfig,

    /// When present, replaces the primary loan amount/rate with two sub-loans
    #[serde(default)]
    pub split_loan: Option<SplitLoanConfig>,

    #[serde(default)]
    pub equity_loan: Option<EquityLoanConfig>,

    #[serde(default)]
    pub rental: RentalConfig,

    #[serde(default)]
    pub settlement_costs: SettlementCosts,

    #[serde(default)]
    pub recurring_expenses: RecurringExpenses,

    #[serde(default)]
    pub rate_changes: Vec<RateChange>,

    #[serde(default)]
    pub repairs: Vec<Repair>,

    #[serde(default)]
    pub extra_payments: Vec<ExtraPayment>,

    #[serde(default)]
    pub staged_payments: Vec<StagedExtraPayment>,

    #[serde(default)]
    pub depreciation_items: Vec<DepreciationItem>,

    /// Market value at purchase; zero leaves equity and value columns at zero
    #[serde(default)]
    pub property_value: f64,

    /// Yearly growth of the property value in percent, compounded per fiscal year
    #[serde(default)]
    pub annual_property_value_increase: f64,

    /// 0 = January .. 11 = December
    #[serde(default = "default_fiscal_year_start_month")]
    pub fiscal_year_start_month: u32,

    /// Marginal rate applied to a negatively geared loss
    #[serde(default = "default_tax_rate")]
    pub tax_rate: f64,

    #[serde(default)]
    pub payment_policy: PaymentPolicy,
}

impl PropertyScenario {
    /// Scenario with a single primary loan and every other input at its default
    pub fn new(loan_start_date: NaiveDate, loan_amount: f64) -> Self {
        Self {
            loan: LoanConfig {
                start_date: loan_start_date,
                amount: loan_amount,
                term_years: default_term_years(),
                interest_rate: default_interest_rate(),
            },
            split_loan: None,
            equity_loan: None,
            rental: RentalConfig::default(),
            settlement_costs: SettlementCosts::default(),
            recurring_expenses: RecurringExpenses::default(),
            rate_changes: Vec::new(),
            repairs: Vec::new(),
            extra_payments: Vec::new(),
            staged_payments: Vec::new(),
            depreciation_items: Vec::new(),
            property_value: 0.0,
            annual_property_value_increase: 0.0,
            fiscal_year_start_month: default_fiscal_year_start_month(),
            tax_rate: default_tax_rate(),
            payment_policy: PaymentPolicy::default(),
        }
    }

    pub fn has_split_loan(&self) -> bool {
        self.split_loan.is_some()
    }

    pub fn has_equity_loan(&self) -> bool {
        self.equity_loan.as_ref().map_or(false, |e| e.amount > 0.0)
    }

    pub fn rental_start_date(&self) -> NaiveDate {
        self.rental.start_date.unwrap_or(self.loan.start_date)
    }

    /// Extra payments (one-off and staged) and rate changes aimed at the primary loan
    /// that a split scenario never schedules
    pub fn primary_events_ignored_by_split(&self) -> (usize, usize) {
        if !self.has_split_loan() {
            return (0, 0);
        }
        let payments = self.extra_payments.iter().filter(|p| p.target == LoanTarget::Primary).count()
            + self.staged_payments.iter().filter(|s| s.target == LoanTarget::Primary).count();
        let rate_changes = self
            .rate_changes
            .iter()
            .filter(|rc| rc.target == Some(LoanTarget::Primary))
            .count();
        (payments, rate_changes)
    }

    /// Scheduler input for one loan, with its rate changes and extra payments selected
    ///
    /// A loan absent from the scenario gets a zero principal, which schedules as empty.
    pub fn loan_parameters(&self, target: LoanTarget) -> Result<LoanParameters> {
        let (principal, rate, term_years, start_date) = match target {
            LoanTarget::Primary => (
                self.loan.amount,
                self.loan.interest_rate,
                self.loan.term_years,
                self.loan.start_date,
            ),
            LoanTarget::Split1 | LoanTarget::Split2 => {
                let (amount, rate) = match (&self.split_loan, target) {
                    (Some(split), LoanTarget::Split1) => (split.amount_1, split.rate_1),
                    (Some(split), _) => (split.amount_2, split.rate_2),
                    (None, _) => (0.0, 0.0),
                };
                (amount, rate, self.loan.term_years, self.loan.start_date)
            }
            LoanTarget::Equity => match &self.equity_loan {
                Some(equity) => (
                    equity.amount,
                    equity.interest_rate,
                    equity.term_years,
                    equity.start_date.unwrap_or(self.loan.start_date),
                ),
                None => (0.0, 0.0, self.loan.term_years, self.loan.start_date),
            },
        };

        let rate_changes = self
            .rate_changes
            .iter()
            .filter(|rc| rc.applies_to(target))
            .cloned()
            .collect();
        let extra: Vec<ExtraPayment> = self
            .extra_payments
            .iter()
            .filter(|p| p.target == target)
            .cloned()
            .collect();
        let staged: Vec<StagedExtraPayment> = self
            .staged_payments
            .iter()
            .filter(|s| s.target == target)
            .cloned()
            .collect();

        Ok(LoanParameters::new(principal, rate, term_years, start_date)
            .with_rate_changes(rate_changes)
            .with_extra_payments(expand_staged_payments(&extra, &staged)?))
    }

    /// Reject inputs the calculation cannot give a meaning to
    pub fn validate(&self) -> Result<()> {
        check_term("loan.term_years", self.loan.term_years)?;
        check_amount("loan.amount", self.loan.amount)?;
        check_amount("loan.interest_rate", self.loan.interest_rate)?;

        if let Some(split) = &self.split_loan {
            check_amount("split_loan.amount_1", split.amount_1)?;
            check_amount("split_loan.amount_2", split.amount_2)?;
            check_amount("split_loan.rate_1", split.rate_1)?;
            check_amount("split_loan.rate_2", split.rate_2)?;
        }

        if let Some(equity) = &self.equity_loan {
            check_term("equity_loan.term_years", equity.term_years)?;
            check_amount("equity_loan.amount", equity.amount)?;
            check_amount("equity_loan.interest_rate", equity.interest_rate)?;
        }

        check_amount("rental.weekly_rent", self.rental.weekly_rent)?;

        for (label, value) in self.settlement_costs.line_items() {
            check_amount(&format!("settlement_costs.{}", label), value)?;
        }
        check_amount("settlement_costs.agent_fees_percentage", self.settlement_costs.agent_fees_percentage)?;

        let recurring = &self.recurring_expenses;
        check_amount("recurring_expenses.land_tax", recurring.land_tax)?;
        check_amount("recurring_expenses.council_rates", recurring.council_rates)?;
        check_amount("recurring_expenses.strata_rates", recurring.strata_rates)?;
        check_amount("recurring_expenses.water_rates", recurring.water_rates)?;
        check_amount("recurring_expenses.insurance", recurring.insurance)?;

        for (i, rc) in self.rate_changes.iter().enumerate() {
            check_amount(&format!("rate_changes[{}].annual_rate_percent", i), rc.annual_rate_percent)?;
        }
        for (i, repair) in self.repairs.iter().enumerate() {
            check_amount(&format!("repairs[{}].amount", i), repair.amount)?;
        }
        for (i, payment) in self.extra_payments.iter().enumerate() {
            check_amount(&format!("extra_payments[{}].amount", i), payment.amount)?;
        }
        for (i, stage) in self.staged_payments.iter().enumerate() {
            check_amount(&format!("staged_payments[{}].amount", i), stage.amount)?;
            if stage.end_date < stage.start_date {
                return Err(CalculatorError::invalid(
                    format!("staged_payments[{}].end_date", i),
                    "precedes start_date",
                ));
            }
        }
        for (i, item) in self.depreciation_items.iter().enumerate() {
            check_amount(&format!("depreciation_items[{}].cost_basis", i), item.cost_basis)?;
            check_amount(&format!("depreciation_items[{}].annual_rate_percent", i), item.annual_rate_percent)?;
        }

        check_amount("property_value", self.property_value)?;
        let growth = self.annual_property_value_increase;
        if !growth.is_finite() || growth <= -100.0 {
            return Err(CalculatorError::invalid(
                "annual_property_value_increase",
                format!("{} is not a growth percentage above -100", growth),
            ));
        }

        if self.fiscal_year_start_month > 11 {
            return Err(CalculatorError::invalid(
                "fiscal_year_start_month",
                format!("{} is not a month index (0-11)", self.fiscal_year_start_month),
            ));
        }
        if !(0.0..=1.0).contains(&self.tax_rate) {
            return Err(CalculatorError::invalid(
                "tax_rate",
                format!("{} is outside [0, 1]", self.tax_rate),
            ));
        }

        Ok(())
    }
}

fn check_term(field: &str, years: u32) -> Result<()> {
    if years == 0 {
        return Err(CalculatorError::invalid(field, "must be greater than zero"));
    }
    if years > MAX_TERM_YEARS {
        return Err(CalculatorError::invalid(
            field,
            format!("{} exceeds the {}-year maximum", years, MAX_TERM_YEARS),
        ));
    }
    Ok(())
}

fn check_amount(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(CalculatorError::invalid(field, "must be a finite number"));
    }
    if value < 0.0 {
        return Err(CalculatorError::invalid(field, format!("{} is negative", value)));
    }
    Ok(())
}
