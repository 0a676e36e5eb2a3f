//! Property scenario inputs and their loaders

pub mod config;
pub mod loader;

pub use config::{
    EquityLoanConfig, LoanConfig, PropertyScenario, RecurringExpenses, RentalConfig, Repair,
    SettlementCosts, SplitLoanConfig,
};
pub use loader::{
    load_depreciation_items, load_depreciation_items_from_reader, load_scenario,
    load_scenario_from_reader, DEFAULT_DEPRECIATION_RATE,
};
