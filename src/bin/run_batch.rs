//! Run many property scenarios in parallel
//!
//! Outputs one row per scenario per fiscal year for side-by-side comparison

use std::fs::File;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use rayon::prelude::*;

use property_calc::report::write_batch_summary_csv;
use property_calc::scenario::load_scenario;
use property_calc::{PropertyScenario, ScenarioRunner};

/// Compare fiscal-year outcomes across scenario files
#[derive(Parser, Debug)]
#[command(name = "run_batch")]
#[command(version, about, long_about = None)]
struct Args {
    /// Scenario JSON files
    #[arg(required = true)]
    scenarios: Vec<PathBuf>,

    /// Combined output CSV
    #[arg(short, long, default_value = "batch_summary.csv")]
    output: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let start = Instant::now();
    println!("Loading {} scenarios...", args.scenarios.len());

    let scenarios: Vec<PropertyScenario> = args
        .scenarios
        .par_iter()
        .map(|path| load_scenario(path).with_context(|| format!("loading scenario {}", path.display())))
        .collect::<Result<_>>()?;

    println!("Running calculations...");
    let calc_start = Instant::now();
    let results = ScenarioRunner::run_batch(&scenarios);
    println!("Calculations complete in {:?}", calc_start.elapsed());

    let mut completed = Vec::new();
    let mut failed = 0;
    println!("\n{:<32} {:>10} {:>14} {:>14} {:>14}", "Scenario", "Months", "Interest", "Tax Benefit", "Net");
    println!("{}", "-".repeat(88));

    for (path, result) in args.scenarios.iter().zip(results) {
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let results = match result {
            Ok(results) => results,
            Err(err) => {
                eprintln!("{}: calculation failed: {}", name, err);
                failed += 1;
                continue;
            }
        };

        let interest: f64 = results.annual_summary.values().map(|e| e.interest_paid).sum();
        let tax_benefit: f64 = results.annual_summary.values().map(|e| e.tax_benefit).sum();
        let net: f64 = results.annual_summary.values().map(|e| e.net_position).sum();
        println!("{:<32} {:>10} {:>14.2} {:>14.2} {:>14.2}",
            name, results.cash_flow.len(), interest, tax_benefit, net);
        completed.push((name, results));
    }

    let rows: Vec<_> = completed
        .iter()
        .map(|(name, results)| (name.as_str(), &results.annual_summary))
        .collect();
    let file = File::create(&args.output).with_context(|| format!("creating {}", args.output.display()))?;
    write_batch_summary_csv(file, &rows)?;
    println!("\nOutput written to {}", args.output.display());
    if failed > 0 {
        println!("{} scenario(s) failed", failed);
    }
    println!("Total time: {:?}", start.elapsed());

    Ok(())
}
