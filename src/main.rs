use std::time::Instant;

use anyhow::Context;
use arrow::datatypes::FieldRef;
use chrono::{Duration, NaiveDate};
use epi_insight::{AnalysisConfig, CaseDataset, InsightAssembler};
use log::{info, warn};
use rand::prelude::*;
use rand::rngs::StdRng;
use serde::Serialize;
use serde_arrow::schema::{SchemaLike, TracingOptions};

const DISTRICTS: [&str; 5] = ["Delhi", "Mumbai", "Bangalore", "Chennai", "Kolkata"];
const DIAGNOSES: [&str; 4] = ["Dengue", "Malaria", "Typhoid", "Cholera"];
const OUTCOMES: [&str; 3] = ["Recovered", "Hospitalised", "Deceased"];
const LAB_RESULTS: [&str; 3] = ["Positive", "Negative", "Pending"];
const GENDERS: [&str; 2] = ["F", "M"];

/// One synthetic case record
#[derive(Debug, Serialize)]
struct CaseRecord {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Age")]
    age: Option<f64>,
    #[serde(rename = "Gender")]
    gender: String,
    #[serde(rename = "District")]
    district: String,
    #[serde(rename = "Diagnosis")]
    diagnosis: String,
    #[serde(rename = "Outcome")]
    outcome: String,
    #[serde(rename = "Lab_Result")]
    lab_result: String,
    #[serde(rename = "Days_Hospitalised")]
    days_hospitalised: f64,
}

fn pick<'a>(rng: &mut StdRng, values: &[&'a str]) -> &'a str {
    values[rng.random_range(0..values.len())]
}

/// A reproducible outbreak-shaped sample of case records
fn synthetic_cases(n: usize, seed: u64) -> anyhow::Result<CaseDataset> {
    let mut rng = StdRng::seed_from_u64(seed);
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).context("invalid start date")?;

    let records: Vec<CaseRecord> = (0..n)
        .map(|_| {
            // Cases concentrate in the middle of the quarter
            let offset = rng.random_range(0..45) + rng.random_range(0..45);
            let district = if rng.random_bool(0.4) {
                DISTRICTS[0]
            } else {
                pick(&mut rng, &DISTRICTS)
            };
            let outcome = pick(&mut rng, &OUTCOMES);
            let days_hospitalised = if outcome == "Recovered" {
                rng.random_range(0.0..3.0)
            } else {
                rng.random_range(2.0..21.0)
            };
            CaseRecord {
                date: (start + Duration::days(offset)).format("%Y-%m-%d").to_string(),
                age: (!rng.random_bool(0.03)).then(|| f64::from(rng.random_range(0..90_u8))),
                gender: pick(&mut rng, &GENDERS).to_string(),
                district: district.to_string(),
                diagnosis: pick(&mut rng, &DIAGNOSES).to_string(),
                outcome: outcome.to_string(),
                lab_result: pick(&mut rng, &LAB_RESULTS).to_string(),
                days_hospitalised,
            }
        })
        .collect();

    let fields = Vec::<FieldRef>::from_samples(
        &records,
        TracingOptions::default().allow_null_fields(true),
    )
    .map_err(|e| anyhow::anyhow!("Schema generation error: {e}"))?;
    let batch = serde_arrow::to_record_batch(&fields, &records)
        .map_err(|e| anyhow::anyhow!("Serialization error: {e}"))?;
    Ok(CaseDataset::new(batch))
}

fn load_config() -> anyhow::Result<AnalysisConfig> {
    match std::env::args().nth(1) {
        Some(path) => {
            info!("Loading analysis configuration from {path}");
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("reading configuration file {path}"))?;
            AnalysisConfig::from_json_str(&json)
                .with_context(|| format!("parsing configuration file {path}"))
        }
        None => Ok(AnalysisConfig::default()),
    }
}

fn main() -> anyhow::Result<()> {
    // Setup logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = load_config()?;
    info!("{config}");

    let start = Instant::now();
    let dataset = synthetic_cases(500, config.random_seed)?;
    info!(
        "Generated {} synthetic case records in {:?}",
        dataset.num_rows(),
        start.elapsed()
    );

    let assembler = InsightAssembler::new(config)?;
    let report = assembler.assemble(&dataset)?;
    for failure in &report.failures {
        warn!("Section {} was not computed: {}", failure.section, failure.message);
    }

    println!("{}", report.to_json_string_pretty()?);
    Ok(())
}
