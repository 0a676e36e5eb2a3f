//! Load scenarios from JSON and depreciation schedules from CSV

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use log::{debug, warn};

use super::config::PropertyScenario;
use crate::error::{CalculatorError, Result};
use crate::summary::DepreciationItem;

/// Rate applied to imported rows that leave it blank (capital works on a building)
pub const DEFAULT_DEPRECIATION_RATE: f64 = 2.5;

/// Load and validate a scenario JSON file
pub fn load_scenario(path: &Path) -> Result<PropertyScenario> {
    let file = File::open(path)?;
    load_scenario_from_reader(file)
}

pub fn load_scenario_from_reader<R: Read>(reader: R) -> Result<PropertyScenario> {
    let scenario: PropertyScenario = serde_json::from_reader(reader)?;
    scenario.validate()?;
    Ok(scenario)
}

/// Raw CSV row of a depreciation schedule export
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    #[serde(rename = "Description", default)]
    description: Option<String>,
    #[serde(rename = "Cost", default)]
    cost: Option<f64>,
    #[serde(rename = "Rate", default)]
    rate: Option<f64>,
    #[serde(rename = "StartDate", default)]
    start_date: Option<String>,
}

impl CsvRow {
    /// None when the row lacks a description or cost
    fn to_item(self, default_start: NaiveDate) -> Result<Option<DepreciationItem>> {
        let description = match self.description.filter(|d| !d.trim().is_empty()) {
            Some(d) => d.trim().to_string(),
            None => return Ok(None),
        };
        let cost = match self.cost {
            Some(c) => c,
            None => return Ok(None),
        };

        let start_date = match self.start_date.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| {
                CalculatorError::invalid(
                    format!("depreciation '{}' StartDate", description),
                    format!("{}: {}", s, e),
                )
            })?,
            _ => default_start,
        };

        Ok(Some(DepreciationItem::new(
            description,
            cost,
            self.rate.unwrap_or(DEFAULT_DEPRECIATION_RATE),
            start_date,
        )))
    }
}

/// Load depreciation items from a CSV file with `Description,Cost,Rate,StartDate` headers
///
/// Rows without a start date take `default_start`, normally the loan start.
pub fn load_depreciation_items(path: &Path, default_start: NaiveDate) -> Result<Vec<DepreciationItem>> {
    let file = File::open(path)?;
    load_depreciation_items_from_reader(file, default_start)
}

pub fn load_depreciation_items_from_reader<R: Read>(
    reader: R,
    default_start: NaiveDate,
) -> Result<Vec<DepreciationItem>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut items = Vec::new();
    let mut skipped = 0;
    for result in reader.deserialize() {
        let row: CsvRow = result?;
        match row.to_item(default_start)? {
            Some(item) => items.push(item),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!("Skipped {} depreciation rows without a description or cost", skipped);
    }
    debug!("Loaded {} depreciation items", items.len());
    Ok(items)
}
