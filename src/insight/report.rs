//! The insight report returned by the assembler

use std::collections::BTreeMap;
use std::sync::Arc;

use arrow::datatypes::Schema;
use arrow::json::ArrayWriter;
use arrow::record_batch::RecordBatch;
use log::debug;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::algorithm::aggregation::{
    ClinicalSection, DemographicSection, GeographicSection, TemporalSection, count_values, ranked,
};
use crate::algorithm::descriptive::NumericSummary;
use crate::algorithm::risk::RiskSection;
use crate::dataset::CaseDataset;
use crate::error::{InsightError, Result};
use crate::features::ColumnClassification;

/// Top-level keys of a serialized report, in order
pub const SECTION_KEYS: [&str; 9] = [
    "summary",
    "statistics",
    "temporal",
    "geographic",
    "demographic",
    "clinical",
    "risk",
    "anomalies",
    "clusters",
];

/// A subset of dataset rows, serialized as an array of row objects
#[derive(Debug, Clone, PartialEq)]
pub struct RowSet(RecordBatch);

impl RowSet {
    #[must_use]
    pub const fn new(batch: RecordBatch) -> Self {
        Self(batch)
    }

    #[must_use]
    pub const fn batch(&self) -> &RecordBatch {
        &self.0
    }

    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.0.num_rows()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.num_rows() == 0
    }

    /// Rows as JSON objects; null values are omitted
    pub fn to_json_rows(&self) -> Result<Vec<Map<String, Value>>> {
        if self.is_empty() {
            return Ok(Vec::new());
        }
        let mut writer = ArrayWriter::new(Vec::new());
        writer.write(&self.0)?;
        writer.finish()?;
        Ok(serde_json::from_slice(&writer.into_inner())?)
    }
}

impl Default for RowSet {
    fn default() -> Self {
        Self(RecordBatch::new_empty(Arc::new(Schema::empty())))
    }
}

impl From<RecordBatch> for RowSet {
    fn from(batch: RecordBatch) -> Self {
        Self(batch)
    }
}

impl Serialize for RowSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json_rows()
            .map_err(serde::ser::Error::custom)?
            .serialize(serializer)
    }
}

/// Profile of one categorical column
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoricalSummary {
    pub non_missing: usize,
    pub unique: usize,
    /// Most frequent value; ties go to the smallest value
    pub top: Option<String>,
    pub top_count: usize,
}

/// Shape and column kinds of the analysed dataset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DatasetSummary {
    pub total_rows: usize,
    pub total_columns: usize,
    pub numeric_columns: Vec<String>,
    pub categorical_columns: BTreeMap<String, CategoricalSummary>,
    pub temporal_columns: Vec<String>,
}

impl DatasetSummary {
    /// Summarise a dataset given its column classification
    ///
    /// Categorical columns whose values cannot be read as text (lists,
    /// structs) are left out of the per-column profiles.
    pub fn from_dataset(
        dataset: &CaseDataset,
        classification: &ColumnClassification,
    ) -> Result<Self> {
        let mut categorical_columns = BTreeMap::new();
        for name in &classification.categorical {
            let values = match dataset.string_values(name) {
                Ok(values) => values,
                Err(InsightError::ColumnType { data_type, .. }) => {
                    debug!("Not profiling column '{name}' of type {data_type}");
                    continue;
                }
                Err(error) => return Err(error),
            };
            let counts = count_values(values);
            let (top, top_count) = ranked(&counts)
                .first()
                .map_or((None, 0), |(value, count)| (Some((*value).clone()), *count));
            categorical_columns.insert(
                name.clone(),
                CategoricalSummary {
                    non_missing: counts.values().sum(),
                    unique: counts.len(),
                    top,
                    top_count,
                },
            );
        }

        Ok(Self {
            total_rows: dataset.num_rows(),
            total_columns: dataset.num_columns(),
            numeric_columns: classification.numeric.clone(),
            categorical_columns,
            temporal_columns: classification.temporal.clone(),
        })
    }
}

/// A section that could not be computed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionFailure {
    /// Analyzer name
    pub section: String,
    pub message: String,
}

/// The complete result of one analysis call
///
/// Every top-level key is always present; a section that had no input
/// columns, or whose analyzer failed, is empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InsightReport {
    pub summary: DatasetSummary,
    /// Numeric column to descriptive statistics
    pub statistics: BTreeMap<String, NumericSummary>,
    pub temporal: TemporalSection,
    pub geographic: GeographicSection,
    pub demographic: DemographicSection,
    pub clinical: ClinicalSection,
    pub risk: RiskSection,
    /// Outlier rows with their anomaly scores
    pub anomalies: RowSet,
    /// Every row with its cluster label
    pub clusters: RowSet,
    #[serde(skip)]
    pub failures: Vec<SectionFailure>,
}

impl InsightReport {
    /// Serialize to a JSON value
    pub fn to_json(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Serialize to a pretty-printed JSON string
    pub fn to_json_string_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Whether any section failed
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}
