//! Risk tier classification
//!
//! Two policies are used. Age tiers compare each age against fixed
//! thresholds. District and week tiers compare each key's case count against
//! the mean count of its own distribution, so the threshold moves with the
//! input and is recomputed on every call.

use std::fmt;

use log::debug;
use serde::Serialize;

use crate::algorithm::aggregation::geographic::district_counts;
use crate::algorithm::aggregation::temporal::weekly_counts;
use crate::algorithm::aggregation::{Counts, WeekKey, total};
use crate::config::AgeRiskThresholds;
use crate::dataset::CaseDataset;
use crate::dataset::columns::AGE;
use crate::dataset::date_utils::DateFormatConfig;
use crate::error::Result;

/// Fixed-threshold age tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RiskTier {
    High,
    Moderate,
    Low,
}

impl RiskTier {
    /// Tier of a single age
    #[must_use]
    pub fn for_age(age: f64, thresholds: &AgeRiskThresholds) -> Self {
        if age < thresholds.high_risk_below {
            Self::High
        } else if age < thresholds.moderate_risk_below {
            Self::Moderate
        } else {
            Self::Low
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::High => "high risk",
            Self::Moderate => "moderate risk",
            Self::Low => "low risk",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Case counts per age tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AgeRisk {
    pub high_risk: usize,
    pub moderate_risk: usize,
    pub low_risk: usize,
}

impl AgeRisk {
    #[must_use]
    pub const fn total(&self) -> usize {
        self.high_risk + self.moderate_risk + self.low_risk
    }
}

/// Keys split around the mean of their count distribution
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncidenceTiers<K: Ord> {
    /// Mean count across all present keys
    pub mean: f64,
    /// Keys whose count is strictly above the mean
    pub high_incidence: Counts<K>,
    /// All other present keys
    pub normal_incidence: Counts<K>,
}

impl<K: Ord> Default for IncidenceTiers<K> {
    fn default() -> Self {
        Self {
            mean: 0.0,
            high_incidence: Counts::new(),
            normal_incidence: Counts::new(),
        }
    }
}

/// Risk section of the insight report
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RiskSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<AgeRisk>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geographic: Option<IncidenceTiers<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temporal: Option<IncidenceTiers<WeekKey>>,
}

/// Count rows per age tier; rows without a usable age are not counted
pub fn age_risk(dataset: &CaseDataset, thresholds: &AgeRiskThresholds) -> Result<AgeRisk> {
    let mut risk = AgeRisk::default();
    for age in dataset.numeric_values(AGE)?.into_iter().flatten() {
        match RiskTier::for_age(age, thresholds) {
            RiskTier::High => risk.high_risk += 1,
            RiskTier::Moderate => risk.moderate_risk += 1,
            RiskTier::Low => risk.low_risk += 1,
        }
    }
    Ok(risk)
}

/// Split keys into high and normal incidence around the mean count
#[must_use]
pub fn tier_by_mean<K: Ord + Clone>(counts: &Counts<K>) -> IncidenceTiers<K> {
    if counts.is_empty() {
        return IncidenceTiers::default();
    }

    let mean = total(counts) as f64 / counts.len() as f64;
    let (high_incidence, normal_incidence) = counts
        .iter()
        .map(|(key, count)| (key.clone(), *count))
        .partition(|(_, count)| *count as f64 > mean);

    IncidenceTiers {
        mean,
        high_incidence,
        normal_incidence,
    }
}

/// Mean-relative tiers of district case counts
pub fn geographic_risk(dataset: &CaseDataset) -> Result<IncidenceTiers<String>> {
    let tiers = tier_by_mean(&district_counts(dataset)?);
    debug!(
        "{} high-incidence districts (mean {:.2})",
        tiers.high_incidence.len(),
        tiers.mean
    );
    Ok(tiers)
}

/// Mean-relative tiers of ISO-week case counts
pub fn temporal_risk(
    dataset: &CaseDataset,
    formats: &DateFormatConfig,
) -> Result<IncidenceTiers<WeekKey>> {
    let tiers = tier_by_mean(&weekly_counts(dataset, formats)?);
    debug!(
        "{} high-incidence weeks (mean {:.2})",
        tiers.high_incidence.len(),
        tiers.mean
    );
    Ok(tiers)
}
