//! A Rust library for disease-surveillance analytics over case records held
//! in Arrow record batches: temporal, geographic, demographic and clinical
//! aggregation, risk tiering, isolation forest anomaly detection and
//! PCA + k-means clustering, assembled into one serializable insight report.

pub mod algorithm;
pub mod config;
pub mod dataset;
pub mod error;
pub mod features;
pub mod insight;

// Re-export the most common types for easier use
// Core types
pub use config::{AgeRiskThresholds, AnalysisConfig, AnalysisConfigBuilder};
pub use dataset::CaseDataset;
pub use dataset::date_utils::DateFormatConfig;
pub use error::{InsightError, Result};

// Report assembly
pub use insight::{
    InsightAssembler, InsightReport, RowSet, SectionAnalyzer, SectionFailure, generate_insights,
};

// Algorithm parameters
pub use algorithm::anomaly::IsolationForestParams;
pub use algorithm::clustering::KMeansParams;

// Arrow types
pub use arrow::datatypes::Schema as ArrowSchema;
pub use arrow::record_batch::RecordBatch;
