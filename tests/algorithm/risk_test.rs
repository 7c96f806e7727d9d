//! Tests for age and incidence risk tiers

use epi_insight::AgeRiskThresholds;
use epi_insight::algorithm::aggregation::Counts;
use epi_insight::algorithm::risk::{age_risk, geographic_risk, temporal_risk, tier_by_mean};
use epi_insight::DateFormatConfig;

use crate::utils::{CaseRow, dataset_from_rows, scenario_dataset};

fn keys(counts: &Counts<String>) -> Vec<&str> {
    counts.keys().map(String::as_str).collect()
}

#[test]
fn test_mean_relative_tiers() {
    let counts: Counts<String> = [("a", 5), ("b", 5), ("c", 5), ("d", 15)]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    let tiers = tier_by_mean(&counts);
    assert!((tiers.mean - 7.5).abs() < f64::EPSILON);
    assert_eq!(keys(&tiers.high_incidence), vec!["d"]);
    assert_eq!(keys(&tiers.normal_incidence), vec!["a", "b", "c"]);
}

#[test]
fn test_scenario_geographic_risk() {
    let tiers = geographic_risk(&scenario_dataset()).unwrap();
    assert!((tiers.mean - 2.5).abs() < f64::EPSILON);
    assert_eq!(keys(&tiers.high_incidence), vec!["Delhi", "Mumbai"]);
    assert_eq!(keys(&tiers.normal_incidence), vec!["Bangalore", "Chennai"]);
}

#[test]
fn test_age_tiers_partition_rows_with_age() {
    let ages = [Some(-1.0), Some(0.0), Some(4.9), Some(5.0), Some(17.0), Some(18.0), None, Some(70.0)];
    let rows: Vec<CaseRow> = ages
        .iter()
        .map(|age| CaseRow {
            age: *age,
            ..CaseRow::default()
        })
        .collect();
    let risk = age_risk(&dataset_from_rows(&rows), &AgeRiskThresholds::default()).unwrap();
    assert_eq!(risk.high_risk, 3);
    assert_eq!(risk.moderate_risk, 2);
    assert_eq!(risk.low_risk, 2);
    assert_eq!(risk.total(), 7);
}

#[test]
fn test_age_thresholds_are_overridable() {
    let thresholds = AgeRiskThresholds {
        high_risk_below: 6.0,
        moderate_risk_below: 7.0,
    };
    let risk = age_risk(&scenario_dataset(), &thresholds).unwrap();
    assert_eq!(risk.high_risk, 3);
    assert_eq!(risk.moderate_risk, 3);
    assert_eq!(risk.low_risk, 4);
}

#[test]
fn test_scenario_temporal_risk() {
    let tiers = temporal_risk(&scenario_dataset(), &DateFormatConfig::default()).unwrap();
    // Weeks 1, 2 and 3 of 2024 and week 5
    let total: usize = tiers
        .high_incidence
        .values()
        .chain(tiers.normal_incidence.values())
        .sum();
    assert_eq!(total, 10);
    assert!((tiers.mean - 2.5).abs() < f64::EPSILON);
    let high: Vec<String> = tiers.high_incidence.keys().map(ToString::to_string).collect();
    assert_eq!(high, vec!["2024-W01", "2024-W02"]);
}
