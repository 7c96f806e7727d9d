//! End-to-end tests of report assembly

use std::sync::Arc;

use arrow::array::{ArrayRef, BooleanArray, DictionaryArray};
use arrow::datatypes::Int32Type;
use epi_insight::insight::SECTION_KEYS;
use epi_insight::{AnalysisConfig, CaseDataset, InsightAssembler, generate_insights};

use crate::utils::{
    CaseRow, categorical_dataset, dataset_from_columns, dataset_from_rows, numeric_dataset,
    scenario_dataset, strings,
};

fn sorted_keys(value: &serde_json::Value) -> Vec<String> {
    let mut keys: Vec<String> = value.as_object().expect("object").keys().cloned().collect();
    keys.sort();
    keys
}

#[test]
fn test_report_has_fixed_keys_for_any_columns() {
    let mut expected: Vec<String> = SECTION_KEYS.iter().map(ToString::to_string).collect();
    expected.sort();

    let only_dates = dataset_from_rows(&[CaseRow {
        date: Some("2024-03-01".to_string()),
        ..CaseRow::default()
    }]);
    let datasets = [
        scenario_dataset(),
        categorical_dataset(),
        numeric_dataset(40, 1),
        only_dates,
        CaseDataset::empty(),
    ];
    for dataset in &datasets {
        let report = generate_insights(dataset, &AnalysisConfig::default()).unwrap();
        assert_eq!(sorted_keys(&report.to_json().unwrap()), expected);
    }
}

#[test]
fn test_report_keys_serialize_in_order() {
    let report = generate_insights(&scenario_dataset(), &AnalysisConfig::default()).unwrap();
    let text = report.to_json_string_pretty().unwrap();
    let positions: Vec<usize> = SECTION_KEYS
        .iter()
        .map(|key| text.find(&format!("\n  \"{key}\":")).expect("top-level key"))
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_end_to_end_scenario() {
    let report = generate_insights(&scenario_dataset(), &AnalysisConfig::default()).unwrap();
    assert!(report.failures.is_empty(), "{:?}", report.failures);

    let districts = &report.geographic.district_cases;
    assert_eq!(districts["Delhi"], 3);
    assert_eq!(districts["Mumbai"], 3);
    assert_eq!(districts["Bangalore"], 2);
    assert_eq!(districts["Chennai"], 2);

    let geographic = report.risk.geographic.as_ref().unwrap();
    assert!((geographic.mean - 2.5).abs() < f64::EPSILON);
    assert!(geographic.high_incidence.contains_key("Delhi"));
    assert!(geographic.high_incidence.contains_key("Mumbai"));
    assert!(geographic.normal_incidence.contains_key("Bangalore"));
    assert!(geographic.normal_incidence.contains_key("Chennai"));

    let under_five = report
        .demographic
        .age_brackets
        .iter()
        .find(|(bracket, _)| bracket.label == "0-5")
        .map(|(_, count)| *count);
    assert_eq!(under_five, Some(3));

    assert_eq!(report.summary.total_rows, 10);
    assert_eq!(report.statistics["Age"].count, 10);
    assert_eq!(report.risk.age.unwrap().total(), 10);
    assert_eq!(report.temporal.daily_cases.len(), 10);
    assert_eq!(report.clusters.num_rows(), 10);
    assert!(report.clusters.batch().column_by_name("Cluster").is_some());
    assert!(report.anomalies.num_rows() <= 10);
}

#[test]
fn test_wrong_typed_date_only_empties_temporal_sections() {
    let dataset = dataset_from_columns(vec![
        (
            "Date",
            Arc::new(BooleanArray::from(vec![true, false, true, true])) as ArrayRef,
        ),
        ("District", strings(&["Delhi", "Delhi", "Pune", "Goa"])),
    ]);
    let report = generate_insights(&dataset, &AnalysisConfig::default()).unwrap();

    let failed: Vec<&str> = report.failures.iter().map(|f| f.section.as_str()).collect();
    assert_eq!(failed, vec!["temporal", "risk.temporal"]);
    assert!(report.temporal.is_empty());
    assert!(report.risk.temporal.is_none());
    assert_eq!(report.geographic.district_cases["Delhi"], 2);
    assert!(report.risk.geographic.is_some());
}

#[test]
fn test_missing_columns_leave_sections_empty() {
    let dataset = categorical_dataset();
    let report = generate_insights(&dataset, &AnalysisConfig::default()).unwrap();
    assert!(report.failures.is_empty());
    assert!(report.temporal.is_empty());
    assert!(report.demographic.age_brackets.is_empty());
    assert!(report.risk.age.is_none());
    assert!(report.statistics.is_empty());
    assert!(report.anomalies.is_empty());
    assert_eq!(report.clusters.batch(), dataset.batch());
    assert_eq!(report.clinical.diagnosis["Dengue"], 3);
}

#[test]
fn test_assembly_is_deterministic() {
    let dataset = numeric_dataset(100, 6);
    let assembler = InsightAssembler::new(AnalysisConfig::default()).unwrap();
    let first = assembler.assemble(&dataset).unwrap();
    let second = assembler.assemble(&dataset).unwrap();
    assert_eq!(first, second);
    assert!((8..=12).contains(&first.anomalies.num_rows()));
}

#[test]
fn test_config_file_drives_assembly() {
    let config =
        AnalysisConfig::from_json_str(r#"{"n_clusters": 2, "contamination": 0.05}"#).unwrap();
    let report = generate_insights(&numeric_dataset(100, 7), &config).unwrap();
    let rows = report.clusters.to_json_rows().unwrap();
    assert_eq!(rows.len(), 100);
    assert!(
        rows.iter()
            .all(|row| matches!(row["Cluster"].as_i64(), Some(0 | 1)))
    );
    assert!(report.anomalies.num_rows() <= 7);
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = AnalysisConfig {
        contamination: 0.9,
        ..AnalysisConfig::default()
    };
    assert!(generate_insights(&scenario_dataset(), &config).is_err());
}

#[test]
fn test_dictionary_encoded_age_is_analysed() {
    let ages: DictionaryArray<Int32Type> = ["3", "40", "3", "70"].into_iter().collect();
    let dataset = dataset_from_columns(vec![
        ("Age", Arc::new(ages) as ArrayRef),
        ("District", strings(&["Delhi", "Pune", "Delhi", "Goa"])),
    ]);
    let report = generate_insights(&dataset, &AnalysisConfig::default()).unwrap();
    assert!(report.failures.is_empty(), "{:?}", report.failures);
    let brackets = &report.demographic.age_brackets;
    assert_eq!(brackets.values().sum::<usize>(), 4);
    assert_eq!(report.statistics["Age"].count, 4);
}
