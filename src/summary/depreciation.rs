//! Straight-line depreciation with first-year proration

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dates;

/// A depreciable asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepreciationItem {
    pub description: String,
    #[serde(alias = "cost")]
    pub cost_basis: f64,
    /// Percent of cost written off per year
    #[serde(alias = "rate")]
    pub annual_rate_percent: f64,
    /// Purchase date; nothing is claimed before it
    pub start_date: NaiveDate,
}

impl DepreciationItem {
    pub fn new(
        description: impl Into<String>,
        cost_basis: f64,
        annual_rate_percent: f64,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            description: description.into(),
            cost_basis,
            annual_rate_percent,
            start_date,
        }
    }

    pub fn annual_amount(&self) -> f64 {
        self.cost_basis * self.annual_rate_percent / 100.0
    }

    /// Depreciation claimable in the fiscal year [fy_start, fy_end]
    ///
    /// Zero if bought after the year ends. When bought inside the year, the annual
    /// amount is scaled by the months from the purchase month to the year's last
    /// month, both inclusive, over 12.
    pub fn amount_for_period(&self, fy_start: NaiveDate, fy_end: NaiveDate) -> f64 {
        if self.start_date > fy_end {
            return 0.0;
        }
        if self.start_date >= fy_start {
            let months = dates::months_between(self.start_date, fy_end) + 1;
            return self.annual_amount() * months as f64 / 12.0;
        }
        self.annual_amount()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_annual_amount() {
        let item = DepreciationItem::new("Building", 400_000.0, 2.5, d(2024, 7, 1));
        assert_eq!(item.annual_amount(), 10_000.0);
    }

    #[test]
    fn test_purchase_on_boundary_claims_full_year() {
        let item = DepreciationItem::new("Building", 400_000.0, 2.5, d(2024, 7, 1));

        assert_eq!(item.amount_for_period(d(2024, 7, 1), d(2025, 6, 30)), 10_000.0);
        assert_eq!(item.amount_for_period(d(2023, 7, 1), d(2024, 6, 30)), 0.0);
        assert_eq!(item.amount_for_period(d(2025, 7, 1), d(2026, 6, 30)), 10_000.0);
    }

    #[test]
    fn test_mid_year_purchase_is_prorated() {
        // October to June inclusive is 9 months
        let item = DepreciationItem::new("Carpet", 6_000.0, 10.0, d(2024, 10, 20));
        assert_abs_diff_eq!(
            item.amount_for_period(d(2024, 7, 1), d(2025, 6, 30)),
            600.0 * 9.0 / 12.0,
            epsilon = 1e-9
        );

        // Bought in the last month of the year
        let item = DepreciationItem::new("Blinds", 1_200.0, 20.0, d(2025, 6, 30));
        assert_abs_diff_eq!(item.amount_for_period(d(2024, 7, 1), d(2025, 6, 30)), 20.0, epsilon = 1e-9);
    }

    #[test]
    fn test_json_accepts_short_field_names() {
        let json = r#"{ "description": "Oven", "cost": 2000, "rate": 12.5, "start_date": "2024-09-01" }"#;
        let item: DepreciationItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.cost_basis, 2_000.0);
        assert_eq!(item.annual_rate_percent, 12.5);
    }
}
