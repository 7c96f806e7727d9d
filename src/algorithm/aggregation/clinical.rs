//! Diagnosis, outcome and lab result distributions

use serde::Serialize;

use super::{Counts, value_counts};
use crate::dataset::CaseDataset;
use crate::dataset::columns::{DIAGNOSIS, LAB_RESULT, OUTCOME};
use crate::error::Result;

/// Clinical section of the insight report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClinicalSection {
    #[serde(skip_serializing_if = "Counts::is_empty")]
    pub diagnosis: Counts<String>,
    #[serde(skip_serializing_if = "Counts::is_empty")]
    pub outcome: Counts<String>,
    #[serde(skip_serializing_if = "Counts::is_empty")]
    pub lab_result: Counts<String>,
}

/// The clinical distributions of whichever clinical columns are present
pub fn aggregate_clinical(dataset: &CaseDataset) -> Result<ClinicalSection> {
    let counts_if_present = |column: &str| -> Result<Counts<String>> {
        if dataset.has_column(column) {
            value_counts(dataset, column)
        } else {
            Ok(Counts::new())
        }
    };

    Ok(ClinicalSection {
        diagnosis: counts_if_present(DIAGNOSIS)?,
        outcome: counts_if_present(OUTCOME)?,
        lab_result: counts_if_present(LAB_RESULT)?,
    })
}
