//! Property Calc - mortgage amortization and investment property cash-flow engine
//!
//! This library provides:
//! - Loan schedules with mid-term rate changes, one-off and staged extra payments
//! - Merging of split, primary and equity loan schedules
//! - Monthly cash flow: loan payments, holding costs, fortnightly rent, repairs, settlement
//! - Fiscal-year summaries with straight-line depreciation and negative-gearing tax benefit
//! - JSON scenario loading, CSV depreciation import and CSV reports

pub mod calculator;
pub mod cashflow;
pub mod dates;
pub mod error;
pub mod loan;
pub mod report;
pub mod scenario;
pub mod summary;

// Re-export commonly used types
pub use calculator::{calculate, ScenarioResults, ScenarioRunner};
pub use cashflow::{CashFlowAggregator, CashFlowEntry, CashFlowMap};
pub use error::{CalculatorError, Result};
pub use loan::{AmortizationEntry, LoanParameters, LoanResult, LoanScheduler, PaymentPolicy};
pub use scenario::PropertyScenario;
pub use summary::{AnnualSummarizer, AnnualSummaryEntry, DepreciationItem};
