//! Orchestration of the section analyzers into one report

use std::time::Instant;

use itertools::Itertools;
use log::{debug, info, warn};

use crate::algorithm::aggregation::AgeBrackets;
use crate::config::AnalysisConfig;
use crate::dataset::CaseDataset;
use crate::error::{InsightError, Result};
use crate::features::{FeaturePreparation, PreparedFeatures};
use crate::insight::analyzers::{AnalysisContext, SectionAnalyzer, default_analyzers};
use crate::insight::report::{InsightReport, SectionFailure};

/// Runs every applicable analyzer over a dataset
pub struct InsightAssembler {
    config: AnalysisConfig,
    age_brackets: AgeBrackets,
    analyzers: Vec<Box<dyn SectionAnalyzer>>,
}

impl InsightAssembler {
    /// Create an assembler with the default analyzers
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        Self::with_analyzers(config, default_analyzers())
    }

    /// Create an assembler running exactly the given analyzers
    pub fn with_analyzers(
        config: AnalysisConfig,
        analyzers: Vec<Box<dyn SectionAnalyzer>>,
    ) -> Result<Self> {
        config.validate()?;
        let age_brackets = AgeBrackets::from_edges(&config.age_bracket_edges)?;
        debug!("Creating insight assembler with {config}");
        Ok(Self {
            config,
            age_brackets,
            analyzers,
        })
    }

    /// Register an additional analyzer, run after the existing ones
    #[must_use]
    pub fn with_analyzer(mut self, analyzer: impl SectionAnalyzer + 'static) -> Self {
        self.analyzers.push(Box::new(analyzer));
        self
    }

    #[must_use]
    pub const fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Names of the registered analyzers, in run order
    #[must_use]
    pub fn analyzer_names(&self) -> Vec<&'static str> {
        self.analyzers.iter().map(|a| a.name()).collect()
    }

    /// Build the insight report for a dataset
    ///
    /// A failing analyzer leaves its section empty and is recorded in
    /// [`InsightReport::failures`]. Only when every analyzer that ran
    /// failed is an error returned.
    pub fn assemble(&self, dataset: &CaseDataset) -> Result<InsightReport> {
        let start = Instant::now();
        info!(
            "Assembling insights for {} rows x {} columns",
            dataset.num_rows(),
            dataset.num_columns()
        );

        let mut report = InsightReport::default();
        let features = match FeaturePreparation::prepare(dataset, &self.config) {
            Ok(features) => features,
            Err(error) => {
                warn!("Feature preparation failed, continuing without features: {error}");
                report.failures.push(SectionFailure {
                    section: "features".to_string(),
                    message: error.to_string(),
                });
                PreparedFeatures::empty(dataset.num_rows())
            }
        };

        let context = AnalysisContext {
            dataset,
            config: &self.config,
            features: &features,
            age_brackets: &self.age_brackets,
        };

        let mut ran = 0;
        let mut failed = Vec::new();
        for analyzer in &self.analyzers {
            let required = analyzer.required_columns();
            if !dataset.has_columns(required) {
                let missing = required
                    .iter()
                    .filter(|column| !dataset.has_column(column))
                    .join(", ");
                info!("Skipping {}: missing column(s) {missing}", analyzer.name());
                continue;
            }

            ran += 1;
            match analyzer.contribute(&context, &mut report) {
                Ok(()) => debug!("Computed {}", analyzer.name()),
                Err(error) => {
                    warn!("Section {} failed: {error}", analyzer.name());
                    failed.push(analyzer.name());
                    report.failures.push(SectionFailure {
                        section: analyzer.name().to_string(),
                        message: error.to_string(),
                    });
                }
            }
        }

        if ran > 0 && failed.len() == ran {
            return Err(InsightError::NoSectionComputed(format!(
                "all {ran} analyzers failed: {}",
                failed.join(", ")
            )));
        }

        info!(
            "Assembled insight report: {} of {} analyzers ran, {} failed, in {:?}",
            ran,
            self.analyzers.len(),
            failed.len(),
            start.elapsed()
        );
        Ok(report)
    }
}

impl std::fmt::Debug for InsightAssembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InsightAssembler")
            .field("config", &self.config)
            .field("analyzers", &self.analyzer_names())
            .finish_non_exhaustive()
    }
}

/// Validate `config` and assemble the report for `dataset` in one call
pub fn generate_insights(dataset: &CaseDataset, config: &AnalysisConfig) -> Result<InsightReport> {
    InsightAssembler::new(config.clone())?.assemble(dataset)
}
