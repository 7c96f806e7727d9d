//! Insight report assembly
//!
//! The assembler runs a registry of section analyzers over one dataset and
//! collects their results into an [`InsightReport`].

pub mod analyzers;
pub mod assembler;
pub mod report;

pub use analyzers::{AnalysisContext, FnAnalyzer, SectionAnalyzer, default_analyzers};
pub use assembler::{InsightAssembler, generate_insights};
pub use report::{
    CategoricalSummary, DatasetSummary, InsightReport, RowSet, SECTION_KEYS, SectionFailure,
};
