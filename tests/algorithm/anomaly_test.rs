//! Tests for isolation forest anomaly detection on datasets

use arrow::array::{BooleanArray, Float64Array};
use arrow::record_batch::RecordBatch;
use epi_insight::algorithm::anomaly::{IsolationForestParams, detect_anomalies};
use epi_insight::features::FeaturePreparation;
use epi_insight::{AnalysisConfig, CaseDataset};

use crate::utils::{categorical_dataset, numeric_dataset};

fn detect(dataset: &CaseDataset, params: &IsolationForestParams) -> RecordBatch {
    let features = FeaturePreparation::prepare(dataset, &AnalysisConfig::default()).unwrap();
    detect_anomalies(dataset, &features.standardized, params).unwrap()
}

#[test]
fn test_contamination_bounds_flagged_rows() {
    let dataset = numeric_dataset(100, 1);
    let outliers = detect(&dataset, &IsolationForestParams::default());
    assert!(
        (8..=12).contains(&outliers.num_rows()),
        "flagged {} rows",
        outliers.num_rows()
    );

    // Original columns first, then the flag and score
    let names: Vec<String> = outliers
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    assert_eq!(names, vec!["Age", "Days_Hospitalised", "District", "Anomaly", "Anomaly_Score"]);

    let flags = outliers
        .column_by_name("Anomaly")
        .unwrap()
        .as_any()
        .downcast_ref::<BooleanArray>()
        .unwrap();
    assert_eq!(flags.true_count(), outliers.num_rows());
    let scores = outliers
        .column_by_name("Anomaly_Score")
        .unwrap()
        .as_any()
        .downcast_ref::<Float64Array>()
        .unwrap();
    assert!(scores.values().iter().all(|s| *s > 0.0 && *s <= 1.0));
}

#[test]
fn test_planted_rows_are_flagged_in_order() {
    let dataset = numeric_dataset(100, 1);
    let outliers = detect(&dataset, &IsolationForestParams::default());
    let ages = outliers
        .column_by_name("Age")
        .unwrap()
        .as_any()
        .downcast_ref::<Float64Array>()
        .unwrap();
    let positions: Vec<usize> = [95.0, -5.0, 115.0, -20.0]
        .iter()
        .map(|planted| {
            ages.values()
                .iter()
                .position(|age| age == planted)
                .unwrap_or_else(|| panic!("planted age {planted} not flagged"))
        })
        .collect();
    // Outliers keep their original row order
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_no_numeric_columns_gives_empty_result() {
    let outliers = detect(&categorical_dataset(), &IsolationForestParams::default());
    assert_eq!(outliers.num_rows(), 0);
}

#[test]
fn test_detection_is_deterministic() {
    let dataset = numeric_dataset(100, 2);
    let params = IsolationForestParams::default();
    assert_eq!(detect(&dataset, &params), detect(&dataset, &params));
}

#[test]
fn test_excluded_features_are_not_scored() {
    let dataset = numeric_dataset(50, 3);
    let config = AnalysisConfig::builder()
        .exclude_feature("Age")
        .exclude_feature("Days_Hospitalised")
        .build()
        .unwrap();
    let features = FeaturePreparation::prepare(&dataset, &config).unwrap();
    assert!(features.standardized.is_empty());
    let outliers =
        detect_anomalies(&dataset, &features.standardized, &config.isolation_params()).unwrap();
    assert_eq!(outliers.num_rows(), 0);
}
