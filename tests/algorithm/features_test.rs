//! Tests for feature preparation over whole datasets

use std::sync::Arc;

use arrow::array::{ArrayRef, BooleanArray, Float64Array};
use arrow::datatypes::DataType;
use epi_insight::features::{FeaturePreparation, classify_columns, encode_categorical};
use epi_insight::{AnalysisConfig, DateFormatConfig, generate_insights};

use crate::utils::{column_type, dataset_from_columns, numeric_dataset, scenario_dataset, strings};

#[test]
fn test_standardized_columns_have_zero_mean_unit_variance() {
    let dataset = numeric_dataset(100, 9);
    let prepared = FeaturePreparation::prepare(&dataset, &AnalysisConfig::default()).unwrap();
    assert_eq!(prepared.standardized.n_cols(), 2);

    for col in 0..prepared.standardized.n_cols() {
        let values = prepared.standardized.column(col);
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        assert!(mean.abs() < 1e-9, "column {col} mean {mean}");
        assert!((variance - 1.0).abs() < 1e-9, "column {col} variance {variance}");
    }
}

#[test]
fn test_constant_column_standardizes_to_zero() {
    let dataset = dataset_from_columns(vec![
        ("Age", Arc::new(Float64Array::from(vec![4.0, 8.0, 15.0])) as ArrayRef),
        ("Ward", Arc::new(Float64Array::from(vec![2.0, 2.0, 2.0])) as ArrayRef),
    ]);
    let prepared = FeaturePreparation::prepare(&dataset, &AnalysisConfig::default()).unwrap();
    assert_eq!(prepared.standardized.column(1), vec![0.0; 3]);
    assert!(prepared.scaling[1].std_dev.abs() < f64::EPSILON);
}

#[test]
fn test_numeric_text_columns_are_features() {
    let dataset = dataset_from_columns(vec![
        ("Age", strings(&["12", " 40 ", "", "7.5"])),
        ("District", strings(&["Delhi", "Pune", "Delhi", "Goa"])),
    ]);
    assert_eq!(column_type(&dataset, "Age"), DataType::Utf8);

    let classification = classify_columns(&dataset, &[], &DateFormatConfig::default()).unwrap();
    assert_eq!(classification.numeric, vec!["Age"]);
    assert_eq!(classification.categorical, vec!["District"]);

    let prepared = FeaturePreparation::prepare(&dataset, &AnalysisConfig::default()).unwrap();
    assert_eq!(prepared.missing, vec![1]);
    // Imputed with the mean of 12, 40 and 7.5
    assert!((prepared.numeric.get(2, 0) - 59.5 / 3.0).abs() < 1e-12);
}

#[test]
fn test_scenario_classification() {
    let classification =
        classify_columns(&scenario_dataset(), &[], &DateFormatConfig::default()).unwrap();
    assert_eq!(classification.numeric, vec!["Age"]);
    assert_eq!(classification.categorical, vec!["District", "Gender", "Outcome"]);
    assert_eq!(classification.temporal, vec!["Date"]);
}

#[test]
fn test_text_dates_are_temporal() {
    for dates in [
        ["2024-01-15", "2024-01-16", "2024-03-01"],
        ["20240115", "20240116", "20240301"],
    ] {
        let dataset = dataset_from_columns(vec![
            ("Date", strings(&dates)),
            ("Age", Arc::new(Float64Array::from(vec![4.0, 30.0, 71.0])) as ArrayRef),
        ]);
        let classification =
            classify_columns(&dataset, &[], &DateFormatConfig::default()).unwrap();
        assert_eq!(classification.temporal, vec!["Date"], "{dates:?}");
        assert_eq!(classification.numeric, vec!["Age"], "{dates:?}");
        assert!(classification.categorical.is_empty(), "{dates:?}");

        let report = generate_insights(&dataset, &AnalysisConfig::default()).unwrap();
        assert_eq!(report.summary.temporal_columns, vec!["Date"]);
        assert!(!report.summary.categorical_columns.contains_key("Date"));
        assert_eq!(report.statistics.keys().collect::<Vec<_>>(), vec!["Age"]);
        assert_eq!(report.temporal.daily_cases.len(), 3);
    }
}

#[test]
fn test_unparseable_date_column_is_classified_by_type() {
    let dataset = dataset_from_columns(vec![
        ("Date", strings(&["next week", "unknown"])),
        (
            "Flag",
            Arc::new(BooleanArray::from(vec![true, false])) as ArrayRef,
        ),
    ]);
    let classification = classify_columns(&dataset, &[], &DateFormatConfig::default()).unwrap();
    assert!(classification.temporal.is_empty());
    assert_eq!(classification.categorical, vec!["Date", "Flag"]);
}

#[test]
fn test_label_encoding_of_a_column() {
    let districts = scenario_dataset().string_values("District").unwrap();
    let encoding = encode_categorical(&districts);
    assert_eq!(encoding.classes, vec!["Bangalore", "Chennai", "Delhi", "Mumbai"]);
    assert_eq!(encoding.codes[0], Some(2));
    assert_eq!(encoding.class(3), Some("Mumbai"));

    let prepared =
        FeaturePreparation::prepare(&scenario_dataset(), &AnalysisConfig::default()).unwrap();
    assert_eq!(prepared.encodings["District"], encoding);
    assert_eq!(
        prepared.encodings.keys().collect::<Vec<_>>(),
        vec!["District", "Gender", "Outcome"]
    );
}
