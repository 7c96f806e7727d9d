//! Error handling for the insight engine.

use arrow::datatypes::DataType;
use arrow::error::ArrowError;

/// Errors that can occur while analysing a case dataset
#[derive(Debug, thiserror::Error)]
pub enum InsightError {
    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    /// JSON serialization or configuration parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A column required by an accessor is not present
    #[error("Column '{0}' not found in dataset")]
    MissingColumn(String),

    /// A column is present but has a type the operation cannot use
    #[error("Column '{column}' has type {data_type}, expected {expected}")]
    ColumnType {
        /// Name of the offending column
        column: String,
        /// Arrow type found in the dataset
        data_type: DataType,
        /// Description of the accepted types
        expected: &'static str,
    },

    /// Configuration parameter out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Input too small or too uniform for the requested operation
    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    /// Every section analyzer that ran failed
    #[error("No insight section could be computed: {0}")]
    NoSectionComputed(String),
}

impl InsightError {
    /// Build a column type error
    pub fn column_type(column: &str, data_type: &DataType, expected: &'static str) -> Self {
        Self::ColumnType {
            column: column.to_string(),
            data_type: data_type.clone(),
            expected,
        }
    }
}

/// Result type for insight engine operations
pub type Result<T> = std::result::Result<T, InsightError>;
