//! Monthly cash-flow aggregation for a property scenario
//!
//! Walks calendar months from the loan start to the month of the last scheduled
//! loan payment and records, per month: loan payments, recurring holding costs,
//! fortnightly rent with agent fees, one-off repairs and (first month only)
//! settlement costs.

use chrono::{Datelike, NaiveDate};

use super::rental::{fortnightly_payments_in_month, rent_for_payments};
use super::types::{CashFlowEntry, CashFlowKey, CashFlowMap, ExpenseCategory, ExpenseItem};
use crate::dates;
use crate::error::Result;
use crate::loan::{AmortizationEntry, LoanResult};
use crate::scenario::PropertyScenario;

/// A loan whose payments are charged to the cash flow
#[derive(Debug, Clone, Copy)]
pub struct ActiveLoan<'a> {
    pub category: &'a ExpenseCategory,
    pub result: &'a LoanResult,
}

/// Builds the month-by-month cash flow of one scenario
pub struct CashFlowAggregator<'a> {
    scenario: &'a PropertyScenario,
}

impl<'a> CashFlowAggregator<'a> {
    pub fn new(scenario: &'a PropertyScenario) -> Self {
        Self { scenario }
    }

    /// One entry per calendar month from the loan start through the latest loan end month
    pub fn aggregate(&self, loans: &[ActiveLoan<'_>]) -> Result<CashFlowMap> {
        let start = self.scenario.loan.start_date;
        let end = loans
            .iter()
            .filter_map(|loan| loan.result.end_date())
            .fold(start, NaiveDate::max);
        let months = dates::months_between(start, end).max(0) as u32;

        let mut cash_flow = CashFlowMap::new();
        for offset in 0..=months {
            let date = dates::add_months(start, offset)?;
            let entry = self.calculate_month(date, offset == 0, loans)?;
            cash_flow.insert(CashFlowKey::from_date(date), entry);
        }

        Ok(cash_flow)
    }

    fn calculate_month(
        &self,
        date: NaiveDate,
        first_month: bool,
        loans: &[ActiveLoan<'_>],
    ) -> Result<CashFlowEntry> {
        let mut entry = CashFlowEntry::new(date);

        for loan in loans {
            if let Some(payment) = loan.result.entry_for_month(date.year(), date.month()) {
                entry.loan_payment += payment.total_payment;
                entry.loan_items.push(ExpenseItem::new(
                    loan.category.clone(),
                    payment.total_payment,
                    payment_notes(payment),
                ));
            }
        }

        self.add_recurring_expenses(&mut entry);
        self.add_rental_income(&mut entry)?;
        self.add_repairs(&mut entry);
        if first_month {
            self.add_settlement_costs(&mut entry);
        }

        entry.update_totals();
        Ok(entry)
    }

    /// Rates and taxes in January, April, July and October at a quarter of the
    /// annual amount; insurance every month at a twelfth
    fn add_recurring_expenses(&self, entry: &mut CashFlowEntry) {
        let recurring = &self.scenario.recurring_expenses;

        if entry.date.month0() % 3 == 0 {
            let quarterly = [
                (ExpenseCategory::LandTax, recurring.land_tax),
                (ExpenseCategory::CouncilRates, recurring.council_rates),
                (ExpenseCategory::StrataRates, recurring.strata_rates),
                (ExpenseCategory::WaterRates, recurring.water_rates),
            ];
            for (category, annual) in quarterly {
                let amount = annual / 4.0;
                if amount > 0.0 {
                    let notes = format!("Quarterly payment ({:.2} × 4 = {:.2} yearly)", amount, annual);
                    entry.add_expense(ExpenseItem::new(category, amount, notes));
                }
            }
        }

        let monthly_insurance = recurring.insurance / 12.0;
        if monthly_insurance > 0.0 {
            let notes = format!(
                "Monthly payment ({:.2} × 12 = {:.2} yearly)",
                monthly_insurance, recurring.insurance
            );
            entry.add_expense(ExpenseItem::new(ExpenseCategory::Insurance, monthly_insurance, notes));
        }
    }

    fn add_rental_income(&self, entry: &mut CashFlowEntry) -> Result<()> {
        let weekly_rent = self.scenario.rental.weekly_rent;
        let rental_start = self.scenario.rental_start_date();
        if !(weekly_rent > 0.0) || entry.date < rental_start {
            return Ok(());
        }

        let month_start = dates::month_start(entry.date);
        let month_end = dates::month_end(entry.date)?;
        let payments = fortnightly_payments_in_month(rental_start, month_start, month_end);
        let rent = rent_for_payments(weekly_rent, payments.len());

        entry.rental = rent;
        entry.rental_payment_dates = payments;

        let agent_pct = self.scenario.settlement_costs.agent_fees_percentage;
        if agent_pct > 0.0 && rent > 0.0 {
            let notes = format!("{}% of rental income (${:.2})", agent_pct, rent);
            entry.add_expense(ExpenseItem::new(ExpenseCategory::AgentFees, rent * agent_pct / 100.0, notes));
        }

        Ok(())
    }

    fn add_repairs(&self, entry: &mut CashFlowEntry) {
        for repair in &self.scenario.repairs {
            if dates::same_month(repair.date, entry.date) {
                entry.add_expense(ExpenseItem::new(
                    ExpenseCategory::MiscellaneousRepair,
                    repair.amount,
                    repair.description.clone(),
                ));
            }
        }
    }

    fn add_settlement_costs(&self, entry: &mut CashFlowEntry) {
        for (label, amount) in self.scenario.settlement_costs.line_items() {
            if amount > 0.0 {
                entry.add_expense(ExpenseItem::new(
                    ExpenseCategory::Settlement(label.to_string()),
                    amount,
                    "One-time settlement cost",
                ));
            }
        }
    }
}

fn payment_notes(payment: &AmortizationEntry) -> String {
    let mut notes = format!(
        "Interest: ${:.2}, Principal: ${:.2}",
        payment.interest, payment.principal
    );
    if payment.extra_payment > 0.0 {
        notes.push_str(&format!(", Extra: ${:.2}", payment.extra_payment));
    }
    notes
}
