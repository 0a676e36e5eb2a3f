//! Monthly cash flow: loan payments, holding costs, rent and one-off expenses

pub mod aggregator;
pub mod rental;
pub mod types;

pub use aggregator::{ActiveLoan, CashFlowAggregator};
pub use rental::{fortnightly_payments_in_month, rent_for_payments, RENT_CYCLE_DAYS};
pub use types::{CashFlowEntry, CashFlowKey, CashFlowMap, ExpenseCategory, ExpenseItem};
