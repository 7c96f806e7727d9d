//! District-level case distribution

use serde::Serialize;

use super::{Counts, CrossTab, cross_tabulate, value_counts};
use crate::dataset::CaseDataset;
use crate::dataset::columns::DISTRICT;
use crate::error::Result;

/// Geographic section of the insight report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GeographicSection {
    #[serde(skip_serializing_if = "Counts::is_empty")]
    pub district_cases: Counts<String>,
    /// District to outcome to count
    #[serde(skip_serializing_if = "CrossTab::is_empty")]
    pub district_outcomes: CrossTab,
    /// District to lab result to count
    #[serde(skip_serializing_if = "CrossTab::is_empty")]
    pub district_lab_results: CrossTab,
}

/// Cases per district
pub fn district_counts(dataset: &CaseDataset) -> Result<Counts<String>> {
    value_counts(dataset, DISTRICT)
}

/// Cases per district broken down by another categorical column
pub fn district_breakdown(dataset: &CaseDataset, column: &str) -> Result<CrossTab> {
    cross_tabulate(dataset, DISTRICT, column)
}
