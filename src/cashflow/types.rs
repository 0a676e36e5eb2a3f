//! Monthly cash-flow output structures

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Calendar month key (`month` is 1-12), ordered chronologically
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CashFlowKey {
    pub year: i32,
    pub month: u32,
}

impl CashFlowKey {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for CashFlowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

/// What an expense line item pays for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseCategory {
    PrimaryLoanPayment,
    EquityLoanPayment,
    LandTax,
    CouncilRates,
    StrataRates,
    WaterRates,
    Insurance,
    AgentFees,
    MiscellaneousRepair,
    /// Flat settlement cost, labelled by its kind
    Settlement(String),
}

impl ExpenseCategory {
    pub fn label(&self) -> &str {
        match self {
            ExpenseCategory::PrimaryLoanPayment => "Primary Loan Payment",
            ExpenseCategory::EquityLoanPayment => "Equity Loan Payment",
            ExpenseCategory::LandTax => "Land Tax (Quarterly)",
            ExpenseCategory::CouncilRates => "Council Rates (Quarterly)",
            ExpenseCategory::StrataRates => "Strata Rates (Quarterly)",
            ExpenseCategory::WaterRates => "Water Rates (Quarterly)",
            ExpenseCategory::Insurance => "Home & Contents Insurance",
            ExpenseCategory::AgentFees => "Agent Fees",
            ExpenseCategory::MiscellaneousRepair => "Miscellaneous Repair",
            ExpenseCategory::Settlement(label) => label.as_str(),
        }
    }
}

impl fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single expense in a month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseItem {
    pub category: ExpenseCategory,
    pub amount: f64,
    pub notes: String,
}

impl ExpenseItem {
    pub fn new(category: ExpenseCategory, amount: f64, notes: impl Into<String>) -> Self {
        Self {
            category,
            amount,
            notes: notes.into(),
        }
    }
}

/// Aggregated cash flow for one calendar month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowEntry {
    pub date: NaiveDate,
    pub year: i32,
    pub month: u32,

    /// Sum of this month's payments across active loans, extra payments included
    pub loan_payment: f64,
    /// One line per loan with its interest/principal split
    pub loan_items: Vec<ExpenseItem>,
    /// Every non-loan expense
    pub expenses: Vec<ExpenseItem>,

    pub rental: f64,
    pub rental_payment_dates: Vec<NaiveDate>,

    pub total_expenses: f64,
    pub total_income: f64,
    pub net_cash_flow: f64,
}

impl CashFlowEntry {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            year: date.year(),
            month: date.month(),
            loan_payment: 0.0,
            loan_items: Vec::new(),
            expenses: Vec::new(),
            rental: 0.0,
            rental_payment_dates: Vec::new(),
            total_expenses: 0.0,
            total_income: 0.0,
            net_cash_flow: 0.0,
        }
    }

    pub fn key(&self) -> CashFlowKey {
        CashFlowKey::new(self.year, self.month)
    }

    pub fn rental_payment_count(&self) -> usize {
        self.rental_payment_dates.len()
    }

    /// Sum of the non-loan expense line items
    pub fn other_expenses(&self) -> f64 {
        self.expenses.iter().map(|e| e.amount).sum()
    }

    pub fn add_expense(&mut self, item: ExpenseItem) {
        self.expenses.push(item);
    }

    /// Recompute totals from the loan payment, line items and rent
    pub fn update_totals(&mut self) {
        self.total_expenses = self.loan_payment + self.other_expenses();
        self.total_income = self.rental;
        self.net_cash_flow = self.total_income - self.total_expenses;
    }
}

/// Cash flow for every month in the range, in chronological order
pub type CashFlowMap = BTreeMap<CashFlowKey, CashFlowEntry>;
