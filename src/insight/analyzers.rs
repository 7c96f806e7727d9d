//! Section analyzers
//!
//! Each analyzer fills one part of the report and declares the columns it
//! needs. The assembler only runs an analyzer whose columns are all present.
//! An analyzer computes its whole contribution before touching the report, so
//! an error leaves its part exactly as it was.

use log::debug;

use crate::algorithm::aggregation::demographic::age_bracket_counts;
use crate::algorithm::aggregation::geographic::{district_breakdown, district_counts};
use crate::algorithm::aggregation::temporal::aggregate_temporal;
use crate::algorithm::aggregation::{AgeBrackets, value_counts};
use crate::algorithm::anomaly::detect_anomalies;
use crate::algorithm::clustering::cluster_dataset;
use crate::algorithm::descriptive::NumericSummary;
use crate::algorithm::risk::{age_risk, geographic_risk, temporal_risk};
use crate::config::AnalysisConfig;
use crate::dataset::CaseDataset;
use crate::dataset::columns::{AGE, DATE, DIAGNOSIS, DISTRICT, GENDER, LAB_RESULT, OUTCOME};
use crate::error::Result;
use crate::features::PreparedFeatures;
use crate::insight::report::{DatasetSummary, InsightReport, RowSet};

/// Inputs shared by every analyzer of one call
#[derive(Debug, Clone, Copy)]
pub struct AnalysisContext<'a> {
    pub dataset: &'a CaseDataset,
    pub config: &'a AnalysisConfig,
    pub features: &'a PreparedFeatures,
    pub age_brackets: &'a AgeBrackets,
}

/// One independently computed part of the insight report
pub trait SectionAnalyzer: Send + Sync {
    /// Name used in logs and failure records
    fn name(&self) -> &'static str;

    /// Columns that must be present for this analyzer to run
    fn required_columns(&self) -> &[&'static str];

    /// Compute this analyzer's contribution and write it into the report
    fn contribute(&self, context: &AnalysisContext<'_>, report: &mut InsightReport)
    -> Result<()>;
}

type ContributeFn = fn(&AnalysisContext<'_>, &mut InsightReport) -> Result<()>;

/// An analyzer backed by a plain function
#[derive(Clone, Copy)]
pub struct FnAnalyzer {
    name: &'static str,
    required: &'static [&'static str],
    run: ContributeFn,
}

impl FnAnalyzer {
    #[must_use]
    pub const fn new(
        name: &'static str,
        required: &'static [&'static str],
        run: ContributeFn,
    ) -> Self {
        Self {
            name,
            required,
            run,
        }
    }
}

impl std::fmt::Debug for FnAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnAnalyzer")
            .field("name", &self.name)
            .field("required", &self.required)
            .finish_non_exhaustive()
    }
}

impl SectionAnalyzer for FnAnalyzer {
    fn name(&self) -> &'static str {
        self.name
    }

    fn required_columns(&self) -> &[&'static str] {
        self.required
    }

    fn contribute(
        &self,
        context: &AnalysisContext<'_>,
        report: &mut InsightReport,
    ) -> Result<()> {
        (self.run)(context, report)
    }
}

fn summary(ctx: &AnalysisContext<'_>, report: &mut InsightReport) -> Result<()> {
    report.summary = DatasetSummary::from_dataset(ctx.dataset, &ctx.features.classification)?;
    Ok(())
}

fn statistics(ctx: &AnalysisContext<'_>, report: &mut InsightReport) -> Result<()> {
    let mut statistics = std::collections::BTreeMap::new();
    for name in &ctx.features.classification.numeric {
        match NumericSummary::from_values(&ctx.dataset.numeric_values(name)?) {
            Some(column_summary) => {
                statistics.insert(name.clone(), column_summary);
            }
            None => debug!("Column '{name}' has no numeric values, omitted from statistics"),
        }
    }
    report.statistics = statistics;
    Ok(())
}

fn temporal(ctx: &AnalysisContext<'_>, report: &mut InsightReport) -> Result<()> {
    report.temporal = aggregate_temporal(ctx.dataset, &ctx.config.date_formats)?;
    Ok(())
}

fn district_cases(ctx: &AnalysisContext<'_>, report: &mut InsightReport) -> Result<()> {
    report.geographic.district_cases = district_counts(ctx.dataset)?;
    Ok(())
}

fn district_outcomes(ctx: &AnalysisContext<'_>, report: &mut InsightReport) -> Result<()> {
    report.geographic.district_outcomes = district_breakdown(ctx.dataset, OUTCOME)?;
    Ok(())
}

fn district_lab_results(ctx: &AnalysisContext<'_>, report: &mut InsightReport) -> Result<()> {
    report.geographic.district_lab_results = district_breakdown(ctx.dataset, LAB_RESULT)?;
    Ok(())
}

fn age_brackets(ctx: &AnalysisContext<'_>, report: &mut InsightReport) -> Result<()> {
    report.demographic.age_brackets = age_bracket_counts(ctx.dataset, ctx.age_brackets)?;
    Ok(())
}

fn gender(ctx: &AnalysisContext<'_>, report: &mut InsightReport) -> Result<()> {
    report.demographic.gender = value_counts(ctx.dataset, GENDER)?;
    Ok(())
}

fn diagnosis(ctx: &AnalysisContext<'_>, report: &mut InsightReport) -> Result<()> {
    report.clinical.diagnosis = value_counts(ctx.dataset, DIAGNOSIS)?;
    Ok(())
}

fn outcome(ctx: &AnalysisContext<'_>, report: &mut InsightReport) -> Result<()> {
    report.clinical.outcome = value_counts(ctx.dataset, OUTCOME)?;
    Ok(())
}

fn lab_result(ctx: &AnalysisContext<'_>, report: &mut InsightReport) -> Result<()> {
    report.clinical.lab_result = value_counts(ctx.dataset, LAB_RESULT)?;
    Ok(())
}

fn age_risk_tiers(ctx: &AnalysisContext<'_>, report: &mut InsightReport) -> Result<()> {
    report.risk.age = Some(age_risk(ctx.dataset, &ctx.config.age_risk)?);
    Ok(())
}

fn geographic_risk_tiers(ctx: &AnalysisContext<'_>, report: &mut InsightReport) -> Result<()> {
    report.risk.geographic = Some(geographic_risk(ctx.dataset)?);
    Ok(())
}

fn temporal_risk_tiers(ctx: &AnalysisContext<'_>, report: &mut InsightReport) -> Result<()> {
    report.risk.temporal = Some(temporal_risk(ctx.dataset, &ctx.config.date_formats)?);
    Ok(())
}

fn anomalies(ctx: &AnalysisContext<'_>, report: &mut InsightReport) -> Result<()> {
    let outliers = detect_anomalies(
        ctx.dataset,
        &ctx.features.standardized,
        &ctx.config.isolation_params(),
    )?;
    report.anomalies = RowSet::new(outliers);
    Ok(())
}

fn clusters(ctx: &AnalysisContext<'_>, report: &mut InsightReport) -> Result<()> {
    let clustered = cluster_dataset(
        ctx.dataset,
        &ctx.features.standardized,
        &ctx.config.kmeans_params(),
        ctx.config.pca_components,
    )?;
    report.clusters = RowSet::new(clustered);
    Ok(())
}

/// The built-in analyzers, in report order
#[must_use]
pub fn default_analyzers() -> Vec<Box<dyn SectionAnalyzer>> {
    const ANALYZERS: [FnAnalyzer; 16] = [
        FnAnalyzer::new("summary", &[], summary),
        FnAnalyzer::new("statistics", &[], statistics),
        FnAnalyzer::new("temporal", &[DATE], temporal),
        FnAnalyzer::new("geographic.district_cases", &[DISTRICT], district_cases),
        FnAnalyzer::new(
            "geographic.district_outcomes",
            &[DISTRICT, OUTCOME],
            district_outcomes,
        ),
        FnAnalyzer::new(
            "geographic.district_lab_results",
            &[DISTRICT, LAB_RESULT],
            district_lab_results,
        ),
        FnAnalyzer::new("demographic.age_brackets", &[AGE], age_brackets),
        FnAnalyzer::new("demographic.gender", &[GENDER], gender),
        FnAnalyzer::new("clinical.diagnosis", &[DIAGNOSIS], diagnosis),
        FnAnalyzer::new("clinical.outcome", &[OUTCOME], outcome),
        FnAnalyzer::new("clinical.lab_result", &[LAB_RESULT], lab_result),
        FnAnalyzer::new("risk.age", &[AGE], age_risk_tiers),
        FnAnalyzer::new("risk.geographic", &[DISTRICT], geographic_risk_tiers),
        FnAnalyzer::new("risk.temporal", &[DATE], temporal_risk_tiers),
        FnAnalyzer::new("anomalies", &[], anomalies),
        FnAnalyzer::new("clusters", &[], clusters),
    ];

    ANALYZERS
        .into_iter()
        .map(|analyzer| Box::new(analyzer) as Box<dyn SectionAnalyzer>)
        .collect()
}
