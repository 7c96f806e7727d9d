//! The tabular case dataset the engine operates on.
//!
//! Records are stored column-wise in an Arrow [`RecordBatch`]. Accessors
//! convert a column into plain Rust values with a uniform missing-value
//! policy: nulls, NaN, empty and whitespace-only strings, and values that do
//! not parse as the requested type all become `None`.

pub mod date_utils;

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Date32Array, Float64Array, StringArray};
use arrow::compute::{cast, concat_batches};
use arrow::datatypes::{DataType, Field, FieldRef, Schema};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;

use crate::error::{InsightError, Result};
use date_utils::{DateFormatConfig, parse_date_string};

/// Well-known column names
pub mod columns {
    /// Case report date
    pub const DATE: &str = "Date";
    /// Patient age in years
    pub const AGE: &str = "Age";
    /// Patient gender
    pub const GENDER: &str = "Gender";
    /// Reporting district
    pub const DISTRICT: &str = "District";
    /// Clinical diagnosis
    pub const DIAGNOSIS: &str = "Diagnosis";
    /// Case outcome
    pub const OUTCOME: &str = "Outcome";
    /// Laboratory result
    pub const LAB_RESULT: &str = "Lab_Result";

    /// Anomaly flag appended to outlier rows
    pub const ANOMALY: &str = "Anomaly";
    /// Anomaly score appended to outlier rows
    pub const ANOMALY_SCORE: &str = "Anomaly_Score";
    /// Cluster label appended to clustered rows
    pub const CLUSTER: &str = "Cluster";

    /// Columns the engine itself adds to row subsets
    pub const DERIVED: [&str; 3] = [ANOMALY, ANOMALY_SCORE, CLUSTER];
}

/// An in-memory set of case records
#[derive(Debug, Clone)]
pub struct CaseDataset {
    batch: RecordBatch,
}

impl CaseDataset {
    /// Wrap a record batch
    #[must_use]
    pub const fn new(batch: RecordBatch) -> Self {
        Self { batch }
    }

    /// A dataset with no columns and no rows
    #[must_use]
    pub fn empty() -> Self {
        Self::new(RecordBatch::new_empty(Arc::new(Schema::empty())))
    }

    /// Concatenate batches that share a schema into one dataset
    pub fn try_from_batches(batches: &[RecordBatch]) -> Result<Self> {
        match batches.first() {
            None => Ok(Self::empty()),
            Some(first) => {
                let batch = concat_batches(&first.schema(), batches)?;
                Ok(Self::new(batch))
            }
        }
    }

    /// The underlying record batch
    #[must_use]
    pub const fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    /// Consume the dataset, returning the record batch
    #[must_use]
    pub fn into_batch(self) -> RecordBatch {
        self.batch
    }

    /// Number of records
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    /// Number of columns
    #[must_use]
    pub fn num_columns(&self) -> usize {
        self.batch.num_columns()
    }

    /// Column names in dataset order
    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|field| field.name().clone())
            .collect()
    }

    /// Whether a column is present
    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.batch.schema().column_with_name(name).is_some()
    }

    /// Whether every listed column is present
    #[must_use]
    pub fn has_columns(&self, names: &[&str]) -> bool {
        names.iter().all(|name| self.has_column(name))
    }

    /// Raw column by name
    pub fn column(&self, name: &str) -> Result<&ArrayRef> {
        self.batch
            .column_by_name(name)
            .ok_or_else(|| InsightError::MissingColumn(name.to_string()))
    }

    /// Arrow type of a column
    pub fn data_type(&self, name: &str) -> Result<DataType> {
        Ok(self.column(name)?.data_type().clone())
    }

    /// Column values as trimmed text
    pub fn string_values(&self, name: &str) -> Result<Vec<Option<String>>> {
        let strings = self.text_array(name)?;
        Ok((0..strings.len())
            .map(|i| {
                if strings.is_null(i) {
                    return None;
                }
                let value = strings.value(i).trim();
                (!value.is_empty()).then(|| value.to_string())
            })
            .collect())
    }

    /// Column values as `f64`
    ///
    /// Numeric columns are cast; text and dictionary-encoded columns are
    /// parsed value by value.
    pub fn numeric_values(&self, name: &str) -> Result<Vec<Option<f64>>> {
        let array = self.column(name)?;
        match array.data_type() {
            DataType::Utf8
            | DataType::LargeUtf8
            | DataType::Utf8View
            | DataType::Dictionary(_, _) => Ok(self
                .string_values(name)?
                .into_iter()
                .map(|value| value.and_then(|v| v.parse::<f64>().ok()))
                .map(|value| value.filter(|v| v.is_finite()))
                .collect()),
            data_type if data_type.is_numeric() => {
                let floats = cast(array, &DataType::Float64)?;
                let floats = floats
                    .as_any()
                    .downcast_ref::<Float64Array>()
                    .ok_or_else(|| {
                        InsightError::column_type(name, data_type, "a numeric column")
                    })?;
                Ok((0..floats.len())
                    .map(|i| {
                        if floats.is_null(i) {
                            None
                        } else {
                            Some(floats.value(i)).filter(|v| v.is_finite())
                        }
                    })
                    .collect())
            }
            data_type => Err(InsightError::column_type(
                name,
                data_type,
                "a numeric or numeric-text column",
            )),
        }
    }

    /// Column values as calendar dates
    ///
    /// Temporal columns are cast to `Date32`; text and dictionary-encoded
    /// columns are parsed with the given formats.
    pub fn date_values(
        &self,
        name: &str,
        formats: &DateFormatConfig,
    ) -> Result<Vec<Option<NaiveDate>>> {
        let array = self.column(name)?;
        match array.data_type() {
            DataType::Utf8
            | DataType::LargeUtf8
            | DataType::Utf8View
            | DataType::Dictionary(_, _) => Ok(self
                .string_values(name)?
                .into_iter()
                .map(|value| value.and_then(|v| parse_date_string(&v, formats)))
                .collect()),
            DataType::Date32 | DataType::Date64 | DataType::Timestamp(_, _) => {
                let days = cast(array, &DataType::Date32)?;
                let days = days
                    .as_any()
                    .downcast_ref::<Date32Array>()
                    .ok_or_else(|| {
                        InsightError::column_type(name, array.data_type(), "a date column")
                    })?;
                Ok((0..days.len())
                    .map(|i| {
                        if days.is_null(i) {
                            None
                        } else {
                            days.value_as_date(i)
                        }
                    })
                    .collect())
            }
            data_type => Err(InsightError::column_type(
                name,
                data_type,
                "a date, timestamp or date-text column",
            )),
        }
    }

    fn text_array(&self, name: &str) -> Result<StringArray> {
        let array = self.column(name)?;
        match array.data_type() {
            DataType::Utf8
            | DataType::LargeUtf8
            | DataType::Utf8View
            | DataType::Dictionary(_, _)
            | DataType::Boolean => {}
            data_type if data_type.is_numeric() => {}
            data_type => {
                return Err(InsightError::column_type(
                    name,
                    data_type,
                    "a text, categorical or numeric column",
                ));
            }
        }
        let text = cast(array, &DataType::Utf8)?;
        text.as_any()
            .downcast_ref::<StringArray>()
            .cloned()
            .ok_or_else(|| InsightError::column_type(name, array.data_type(), "a text column"))
    }
}

/// Append a column to a batch, replacing any existing column of the same name
pub fn with_column(batch: &RecordBatch, field: Field, array: ArrayRef) -> Result<RecordBatch> {
    let schema = batch.schema();
    let mut fields: Vec<FieldRef> = Vec::with_capacity(batch.num_columns() + 1);
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(batch.num_columns() + 1);
    for (existing, column) in schema.fields().iter().zip(batch.columns()) {
        if existing.name() != field.name() {
            fields.push(Arc::clone(existing));
            arrays.push(Arc::clone(column));
        }
    }
    fields.push(Arc::new(field));
    arrays.push(array);

    let schema = Schema::new_with_metadata(fields, schema.metadata().clone());
    Ok(RecordBatch::try_new(Arc::new(schema), arrays)?)
}

impl From<RecordBatch> for CaseDataset {
    fn from(batch: RecordBatch) -> Self {
        Self::new(batch)
    }
}
