//! Loan amortization: scheduling, schedule merging and extra-payment handling

mod types;
mod scheduler;
mod merge;
mod staged;

pub use types::{
    AmortizationEntry, ExtraPayment, LoanParameters, LoanResult, LoanSummary, LoanTarget,
    RateChange, RatePeriod, StagedExtraPayment, MAX_TERM_YEARS,
};
pub use scheduler::{amortizing_payment, monthly_rate, LoanScheduler, PaymentPolicy, PAYOFF_TOLERANCE};
pub use merge::{merge_all, merge_schedules};
pub use staged::expand_staged_payments;
