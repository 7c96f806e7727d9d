//! Feature preparation: column classification, numeric views, scaling and
//! categorical encoding.
//!
//! Everything here is derived from the dataset of the current call. Nothing
//! is cached between calls because the scaling parameters depend on the
//! input.

use std::collections::BTreeMap;

use arrow::datatypes::DataType;
use log::debug;
use rustc_hash::FxHashMap;

use crate::algorithm::descriptive::{mean, population_std_dev};
use crate::config::AnalysisConfig;
use crate::dataset::date_utils::DateFormatConfig;
use crate::dataset::{CaseDataset, columns};
use crate::error::{InsightError, Result};

/// How a column is treated by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Every non-missing value is a number
    Numeric,
    /// Dates and timestamps
    Temporal,
    /// Everything else
    Categorical,
}

/// Columns of a dataset grouped by kind, each in dataset order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnClassification {
    pub numeric: Vec<String>,
    pub categorical: Vec<String>,
    pub temporal: Vec<String>,
}

/// Classify every column of the dataset
///
/// Columns listed in `excluded`, and the engine's derived columns, are never
/// classified as numeric features; they are reported as categorical. A text
/// `Date` column holding at least one parseable date is temporal, whatever
/// the shape of its values.
pub fn classify_columns(
    dataset: &CaseDataset,
    excluded: &[String],
    formats: &DateFormatConfig,
) -> Result<ColumnClassification> {
    let mut classification = ColumnClassification::default();

    for name in dataset.column_names() {
        let kind = if name == columns::DATE && holds_dates(dataset, formats) {
            ColumnKind::Temporal
        } else {
            column_kind(dataset, &name)?
        };
        let is_feature = !excluded.contains(&name) && !columns::DERIVED.contains(&name.as_str());
        match kind {
            ColumnKind::Numeric if is_feature => classification.numeric.push(name),
            ColumnKind::Temporal => classification.temporal.push(name),
            _ => classification.categorical.push(name),
        }
    }

    debug!(
        "Classified columns: {} numeric, {} categorical, {} temporal",
        classification.numeric.len(),
        classification.categorical.len(),
        classification.temporal.len()
    );
    Ok(classification)
}

// A wrong-typed Date column falls back to classification by type
fn holds_dates(dataset: &CaseDataset, formats: &DateFormatConfig) -> bool {
    dataset
        .date_values(columns::DATE, formats)
        .is_ok_and(|dates| dates.iter().any(Option::is_some))
}

/// Determine the kind of a single column by its type and values
pub fn column_kind(dataset: &CaseDataset, name: &str) -> Result<ColumnKind> {
    let kind = match dataset.data_type(name)? {
        data_type if data_type.is_numeric() => ColumnKind::Numeric,
        DataType::Date32 | DataType::Date64 | DataType::Timestamp(_, _) => ColumnKind::Temporal,
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View | DataType::Dictionary(_, _) => {
            let raw = dataset.string_values(name)?;
            let mut present = raw.iter().flatten().peekable();
            if present.peek().is_some() && present.all(|v| v.parse::<f64>().is_ok()) {
                ColumnKind::Numeric
            } else {
                ColumnKind::Categorical
            }
        }
        _ => ColumnKind::Categorical,
    };
    Ok(kind)
}

/// Row-major matrix of numeric features, row-aligned with the dataset
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureMatrix {
    columns: Vec<String>,
    n_rows: usize,
    data: Vec<f64>,
}

impl FeatureMatrix {
    /// Build from row-major data; `data.len()` must equal rows x columns
    #[must_use]
    pub fn from_row_major(columns: Vec<String>, n_rows: usize, data: Vec<f64>) -> Self {
        debug_assert_eq!(data.len(), n_rows * columns.len());
        Self {
            columns,
            n_rows,
            data,
        }
    }

    /// A matrix with the given number of rows and no columns
    #[must_use]
    pub const fn empty(n_rows: usize) -> Self {
        Self {
            columns: Vec::new(),
            n_rows,
            data: Vec::new(),
        }
    }

    #[must_use]
    pub const fn n_rows(&self) -> usize {
        self.n_rows
    }

    #[must_use]
    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// Feature column names
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// No rows or no columns
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.n_rows == 0 || self.columns.is_empty()
    }

    /// One row of features
    #[must_use]
    pub fn row(&self, index: usize) -> &[f64] {
        let width = self.n_cols();
        &self.data[index * width..(index + 1) * width]
    }

    /// Iterate over rows
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        // chunks_exact panics on zero width
        let width = self.n_cols().max(1);
        self.data.chunks_exact(width)
    }

    /// Copy out one column
    #[must_use]
    pub fn column(&self, index: usize) -> Vec<f64> {
        self.rows().map(|row| row[index]).collect()
    }

    /// Single value
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.n_cols() + col]
    }
}

/// Per-column scaling parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnScaling {
    pub mean: f64,
    /// Population standard deviation
    pub std_dev: f64,
}

/// Numeric view of the dataset with missing values imputed by column mean
///
/// Returns the matrix and the number of imputed values per column.
pub fn numeric_view(
    dataset: &CaseDataset,
    classification: &ColumnClassification,
) -> Result<(FeatureMatrix, Vec<usize>)> {
    let n_rows = dataset.num_rows();
    let mut column_values = Vec::with_capacity(classification.numeric.len());
    let mut missing = Vec::with_capacity(classification.numeric.len());

    for name in &classification.numeric {
        let raw = dataset.numeric_values(name)?;
        let present: Vec<f64> = raw.iter().flatten().copied().collect();
        let fill = mean(&present).unwrap_or(0.0);
        missing.push(n_rows - present.len());
        column_values.push(raw.into_iter().map(|v| v.unwrap_or(fill)).collect::<Vec<_>>());
    }

    let n_cols = column_values.len();
    let mut data = Vec::with_capacity(n_rows * n_cols);
    for row in 0..n_rows {
        data.extend(column_values.iter().map(|col| col[row]));
    }

    Ok((
        FeatureMatrix::from_row_major(classification.numeric.clone(), n_rows, data),
        missing,
    ))
}

/// Rescale each column to zero mean and unit population variance
///
/// A zero-variance column becomes all zeros.
#[must_use]
pub fn standardize(matrix: &FeatureMatrix) -> (FeatureMatrix, Vec<ColumnScaling>) {
    let scaling: Vec<ColumnScaling> = (0..matrix.n_cols())
        .map(|col| {
            let values = matrix.column(col);
            ColumnScaling {
                mean: mean(&values).unwrap_or(0.0),
                std_dev: population_std_dev(&values).unwrap_or(0.0),
            }
        })
        .collect();

    let params = &scaling;
    let data = matrix
        .rows()
        .flat_map(move |row| {
            row.iter().zip(params).map(|(x, s)| {
                if s.std_dev > f64::EPSILON * s.mean.abs().max(1.0) {
                    (x - s.mean) / s.std_dev
                } else {
                    0.0
                }
            })
        })
        .collect();

    (
        FeatureMatrix::from_row_major(matrix.columns().to_vec(), matrix.n_rows(), data),
        scaling,
    )
}

/// Label encoding of a categorical column
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoricalEncoding {
    /// Distinct values, sorted
    pub classes: Vec<String>,
    /// Index into `classes` for each row
    pub codes: Vec<Option<usize>>,
}

impl CategoricalEncoding {
    /// Decode a class index
    #[must_use]
    pub fn class(&self, code: usize) -> Option<&str> {
        self.classes.get(code).map(String::as_str)
    }
}

/// Encode values as indices into their sorted distinct classes
#[must_use]
pub fn encode_categorical(values: &[Option<String>]) -> CategoricalEncoding {
    let mut classes: Vec<String> = values.iter().flatten().cloned().collect();
    classes.sort_unstable();
    classes.dedup();

    let index: FxHashMap<&str, usize> = classes
        .iter()
        .enumerate()
        .map(|(i, class)| (class.as_str(), i))
        .collect();
    let codes = values
        .iter()
        .map(|v| v.as_deref().and_then(|v| index.get(v).copied()))
        .collect();

    CategoricalEncoding { classes, codes }
}

/// Encode every categorical column, skipping those that are not text-like
pub fn categorical_encodings(
    dataset: &CaseDataset,
    classification: &ColumnClassification,
) -> Result<BTreeMap<String, CategoricalEncoding>> {
    let mut encodings = BTreeMap::new();
    for name in &classification.categorical {
        match dataset.string_values(name) {
            Ok(values) => {
                encodings.insert(name.clone(), encode_categorical(&values));
            }
            Err(InsightError::ColumnType { data_type, .. }) => {
                debug!("Not encoding column '{name}' of type {data_type}");
            }
            Err(error) => return Err(error),
        }
    }
    Ok(encodings)
}

/// Feature views derived from one dataset
#[derive(Debug, Clone, Default)]
pub struct PreparedFeatures {
    pub classification: ColumnClassification,
    /// Numeric view, mean-imputed
    pub numeric: FeatureMatrix,
    /// Standardized numeric view
    pub standardized: FeatureMatrix,
    pub scaling: Vec<ColumnScaling>,
    /// Imputed values per numeric column
    pub missing: Vec<usize>,
    /// Label encoding of each categorical column that reads as text
    pub encodings: BTreeMap<String, CategoricalEncoding>,
}

impl PreparedFeatures {
    /// Views with no feature columns for a dataset of `n_rows`
    #[must_use]
    pub fn empty(n_rows: usize) -> Self {
        Self {
            numeric: FeatureMatrix::empty(n_rows),
            standardized: FeatureMatrix::empty(n_rows),
            ..Self::default()
        }
    }
}

/// Derives the feature views for an analysis call
pub struct FeaturePreparation;

impl FeaturePreparation {
    /// Classify, extract and standardize the dataset's numeric features
    pub fn prepare(dataset: &CaseDataset, config: &AnalysisConfig) -> Result<PreparedFeatures> {
        let classification =
            classify_columns(dataset, &config.excluded_features, &config.date_formats)?;
        let (numeric, missing) = numeric_view(dataset, &classification)?;
        let (standardized, scaling) = standardize(&numeric);
        let encodings = categorical_encodings(dataset, &classification)?;
        debug!(
            "Prepared {} x {} feature matrix and {} categorical encodings",
            numeric.n_rows(),
            numeric.n_cols(),
            encodings.len()
        );
        Ok(PreparedFeatures {
            classification,
            numeric,
            standardized,
            scaling,
            missing,
            encodings,
        })
    }
}
