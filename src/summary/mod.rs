//! Fiscal-year summaries: income, expenses, loan splits, depreciation and tax benefit

pub mod annual;
pub mod depreciation;

pub use annual::{AnnualSummarizer, AnnualSummaryEntry, AnnualSummaryMap, FiscalYear, DEFAULT_TAX_RATE};
pub use depreciation::DepreciationItem;
