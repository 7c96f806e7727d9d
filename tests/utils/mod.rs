use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, FieldRef, Schema};
use arrow::record_batch::RecordBatch;
use epi_insight::CaseDataset;
use rand::prelude::*;
use rand::rngs::StdRng;
use serde::Serialize;
use serde_arrow::schema::{SchemaLike, TracingOptions};

/// A case record for building test datasets with `serde_arrow`
#[derive(Debug, Clone, Default, Serialize)]
pub struct CaseRow {
    #[serde(rename = "Date")]
    pub date: Option<String>,
    #[serde(rename = "Age")]
    pub age: Option<f64>,
    #[serde(rename = "Gender")]
    pub gender: Option<String>,
    #[serde(rename = "District")]
    pub district: Option<String>,
    #[serde(rename = "Diagnosis")]
    pub diagnosis: Option<String>,
    #[serde(rename = "Outcome")]
    pub outcome: Option<String>,
    #[serde(rename = "Lab_Result")]
    pub lab_result: Option<String>,
}

/// Convert case rows into a dataset
#[must_use]
pub fn dataset_from_rows(rows: &[CaseRow]) -> CaseDataset {
    let fields =
        Vec::<FieldRef>::from_samples(rows, TracingOptions::default().allow_null_fields(true))
            .expect("Failed to create schema from samples");
    let batch = serde_arrow::to_record_batch(&fields, &rows).expect("Failed to build batch");
    CaseDataset::new(batch)
}

/// Build a dataset from named columns
#[must_use]
pub fn dataset_from_columns(columns: Vec<(&str, ArrayRef)>) -> CaseDataset {
    let fields: Vec<Field> = columns
        .iter()
        .map(|(name, array)| Field::new(*name, array.data_type().clone(), true))
        .collect();
    let arrays = columns.into_iter().map(|(_, array)| array).collect();
    let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)
        .expect("Failed to build batch");
    CaseDataset::new(batch)
}

#[must_use]
pub fn strings(values: &[&str]) -> ArrayRef {
    Arc::new(StringArray::from(values.to_vec()))
}

/// The ten-row surveillance scenario
///
/// Delhi and Mumbai have three cases each, Bangalore and Chennai two. Three
/// patients are aged five or under.
#[must_use]
pub fn scenario_dataset() -> CaseDataset {
    dataset_from_columns(vec![
        (
            "Date",
            strings(&[
                "2024-01-01",
                "2024-01-02",
                "2024-01-03",
                "2024-01-08",
                "2024-01-09",
                "2024-01-10",
                "2024-01-15",
                "2024-01-16",
                "2024-02-01",
                "2024-02-02",
            ]),
        ),
        (
            "District",
            strings(&[
                "Delhi",
                "Delhi",
                "Delhi",
                "Mumbai",
                "Mumbai",
                "Mumbai",
                "Bangalore",
                "Bangalore",
                "Chennai",
                "Chennai",
            ]),
        ),
        (
            "Age",
            Arc::new(Int64Array::from(vec![3, 4, 5, 6, 7, 6, 7, 6, 7, 7])) as ArrayRef,
        ),
        (
            "Gender",
            strings(&["F", "M", "F", "M", "F", "M", "F", "M", "F", "F"]),
        ),
        (
            "Outcome",
            strings(&[
                "Recovered",
                "Recovered",
                "Hospitalised",
                "Recovered",
                "Recovered",
                "Deceased",
                "Recovered",
                "Hospitalised",
                "Recovered",
                "Recovered",
            ]),
        ),
    ])
}

/// `n` rows with two numeric features
///
/// Rows `n - 5..n` are placed far from the others in different directions.
#[must_use]
pub fn numeric_dataset(n: usize, seed: u64) -> CaseDataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut x = Vec::with_capacity(n);
    let mut y = Vec::with_capacity(n);
    for _ in 0..n - 5 {
        x.push(rng.random_range(30.0..40.0));
        y.push(rng.random_range(1.0..3.0));
    }
    for (dx, dy) in [(60.0, 9.0), (-40.0, 12.0), (80.0, -6.0), (-55.0, -8.0), (5.0, 20.0)] {
        x.push(35.0 + dx);
        y.push(2.0 + dy);
    }
    let districts: Vec<&str> = (0..n)
        .map(|i| ["Delhi", "Mumbai", "Pune"][i % 3])
        .collect();

    dataset_from_columns(vec![
        ("Age", Arc::new(Float64Array::from(x)) as ArrayRef),
        ("Days_Hospitalised", Arc::new(Float64Array::from(y)) as ArrayRef),
        ("District", strings(&districts)),
    ])
}

/// A dataset with only text columns
#[must_use]
pub fn categorical_dataset() -> CaseDataset {
    dataset_from_columns(vec![
        ("District", strings(&["Delhi", "Mumbai", "Delhi", "Pune"])),
        ("Diagnosis", strings(&["Dengue", "Malaria", "Dengue", "Dengue"])),
    ])
}

/// Numeric type assertion helper for fixtures
#[must_use]
pub fn column_type(dataset: &CaseDataset, name: &str) -> DataType {
    dataset.data_type(name).expect("column present")
}
