//! Configuration for the insight engine.

use std::fmt;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::algorithm::anomaly::IsolationForestParams;
use crate::algorithm::clustering::KMeansParams;
use crate::dataset::date_utils::DateFormatConfig;
use crate::error::{InsightError, Result};

/// Age cut-offs for the fixed-threshold risk tiers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgeRiskThresholds {
    /// Ages strictly below this value are high risk
    pub high_risk_below: f64,
    /// Ages from `high_risk_below` up to (excluding) this value are moderate risk
    pub moderate_risk_below: f64,
}

impl Default for AgeRiskThresholds {
    fn default() -> Self {
        Self {
            high_risk_below: 5.0,
            moderate_risk_below: 18.0,
        }
    }
}

/// Configuration for a single analysis call
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Number of k-means clusters
    pub n_clusters: usize,
    /// Expected proportion of outlier rows
    pub contamination: f64,
    /// Seed for every randomized step (isolation forest and k-means)
    pub random_seed: u64,
    /// Age bracket edges; the last bracket is open-ended
    pub age_bracket_edges: Vec<f64>,
    /// Thresholds for the age risk tiers
    pub age_risk: AgeRiskThresholds,
    /// Number of isolation trees
    pub isolation_trees: usize,
    /// Rows sampled per isolation tree
    pub isolation_sample_size: usize,
    /// Maximum Lloyd iterations per k-means run
    pub kmeans_max_iterations: usize,
    /// Number of seeded k-means restarts
    pub kmeans_restarts: usize,
    /// Centroid shift below which k-means has converged
    pub kmeans_tolerance: f64,
    /// Principal components kept before clustering
    pub pca_components: usize,
    /// Numeric columns that should not be used as model features
    pub excluded_features: Vec<String>,
    /// Formats tried when `Date` is stored as text
    pub date_formats: DateFormatConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            n_clusters: 3,
            contamination: 0.1,
            random_seed: 42,
            age_bracket_edges: vec![0.0, 5.0, 12.0, 18.0, 60.0, 100.0],
            age_risk: AgeRiskThresholds::default(),
            isolation_trees: 100,
            isolation_sample_size: 256,
            kmeans_max_iterations: 300,
            kmeans_restarts: 10,
            kmeans_tolerance: 1e-4,
            pca_components: 2,
            excluded_features: Vec::new(),
            date_formats: DateFormatConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new builder for constructing an analysis configuration
    #[must_use]
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder::new()
    }

    /// Parse a configuration from JSON; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every parameter is within its accepted range
    pub fn validate(&self) -> Result<()> {
        if self.n_clusters == 0 {
            return Err(InsightError::InvalidConfig(
                "n_clusters must be at least 1".to_string(),
            ));
        }
        if !(self.contamination > 0.0 && self.contamination <= 0.5) {
            return Err(InsightError::InvalidConfig(format!(
                "contamination must be in (0, 0.5], got {}",
                self.contamination
            )));
        }
        if self.age_bracket_edges.len() < 2 {
            return Err(InsightError::InvalidConfig(
                "age_bracket_edges needs at least two edges".to_string(),
            ));
        }
        if !self
            .age_bracket_edges
            .iter()
            .tuple_windows()
            .all(|(a, b)| a < b)
        {
            return Err(InsightError::InvalidConfig(format!(
                "age_bracket_edges must be strictly increasing, got {:?}",
                self.age_bracket_edges
            )));
        }
        if self.age_risk.high_risk_below > self.age_risk.moderate_risk_below {
            return Err(InsightError::InvalidConfig(format!(
                "age risk thresholds out of order: {} > {}",
                self.age_risk.high_risk_below, self.age_risk.moderate_risk_below
            )));
        }
        if self.isolation_trees == 0 || self.isolation_sample_size == 0 {
            return Err(InsightError::InvalidConfig(
                "isolation_trees and isolation_sample_size must be positive".to_string(),
            ));
        }
        if self.kmeans_max_iterations == 0 || self.kmeans_restarts == 0 {
            return Err(InsightError::InvalidConfig(
                "kmeans_max_iterations and kmeans_restarts must be positive".to_string(),
            ));
        }
        if !(self.kmeans_tolerance >= 0.0) {
            return Err(InsightError::InvalidConfig(format!(
                "kmeans_tolerance must be non-negative, got {}",
                self.kmeans_tolerance
            )));
        }
        if self.pca_components == 0 {
            return Err(InsightError::InvalidConfig(
                "pca_components must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Isolation forest parameters derived from this configuration
    #[must_use]
    pub const fn isolation_params(&self) -> IsolationForestParams {
        IsolationForestParams {
            n_trees: self.isolation_trees,
            sample_size: self.isolation_sample_size,
            contamination: self.contamination,
            seed: self.random_seed,
        }
    }

    /// K-means parameters derived from this configuration
    #[must_use]
    pub const fn kmeans_params(&self) -> KMeansParams {
        KMeansParams {
            k: self.n_clusters,
            max_iterations: self.kmeans_max_iterations,
            restarts: self.kmeans_restarts,
            tolerance: self.kmeans_tolerance,
            seed: self.random_seed,
        }
    }
}

impl fmt::Display for AnalysisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Analysis Configuration:")?;
        writeln!(f, "  Clusters: {}", self.n_clusters)?;
        writeln!(f, "  Contamination: {}", self.contamination)?;
        writeln!(f, "  Random Seed: {}", self.random_seed)?;
        writeln!(
            f,
            "  Age Bracket Edges: {}",
            self.age_bracket_edges.iter().join(", ")
        )?;
        writeln!(
            f,
            "  Age Risk Thresholds: <{} high, <{} moderate",
            self.age_risk.high_risk_below, self.age_risk.moderate_risk_below
        )?;
        writeln!(
            f,
            "  Isolation Forest: {} trees x {} samples",
            self.isolation_trees, self.isolation_sample_size
        )?;
        writeln!(
            f,
            "  K-means: {} restarts, {} iterations, tolerance {}",
            self.kmeans_restarts, self.kmeans_max_iterations, self.kmeans_tolerance
        )?;
        writeln!(f, "  PCA Components: {}", self.pca_components)?;
        if !self.excluded_features.is_empty() {
            writeln!(
                f,
                "  Excluded Features: {}",
                self.excluded_features.iter().join(", ")
            )?;
        }
        Ok(())
    }
}

/// Builder for constructing an analysis configuration
#[derive(Debug, Clone)]
pub struct AnalysisConfigBuilder {
    config: AnalysisConfig,
}

impl Default for AnalysisConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisConfigBuilder {
    /// Create a new builder with default configuration
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: AnalysisConfig::default(),
        }
    }

    /// Set the number of clusters
    #[must_use]
    pub const fn n_clusters(mut self, n_clusters: usize) -> Self {
        self.config.n_clusters = n_clusters;
        self
    }

    /// Set the contamination fraction
    #[must_use]
    pub const fn contamination(mut self, contamination: f64) -> Self {
        self.config.contamination = contamination;
        self
    }

    /// Set the random seed
    #[must_use]
    pub const fn random_seed(mut self, seed: u64) -> Self {
        self.config.random_seed = seed;
        self
    }

    /// Set the age bracket edges
    #[must_use]
    pub fn age_bracket_edges(mut self, edges: Vec<f64>) -> Self {
        self.config.age_bracket_edges = edges;
        self
    }

    /// Set the age risk thresholds
    #[must_use]
    pub const fn age_risk(mut self, thresholds: AgeRiskThresholds) -> Self {
        self.config.age_risk = thresholds;
        self
    }

    /// Set the number of isolation trees
    #[must_use]
    pub const fn isolation_trees(mut self, trees: usize) -> Self {
        self.config.isolation_trees = trees;
        self
    }

    /// Set the isolation tree subsample size
    #[must_use]
    pub const fn isolation_sample_size(mut self, size: usize) -> Self {
        self.config.isolation_sample_size = size;
        self
    }

    /// Set the number of k-means restarts
    #[must_use]
    pub const fn kmeans_restarts(mut self, restarts: usize) -> Self {
        self.config.kmeans_restarts = restarts;
        self
    }

    /// Set the iteration cap of a single k-means run
    #[must_use]
    pub const fn kmeans_max_iterations(mut self, iterations: usize) -> Self {
        self.config.kmeans_max_iterations = iterations;
        self
    }

    /// Set the k-means convergence tolerance
    #[must_use]
    pub const fn kmeans_tolerance(mut self, tolerance: f64) -> Self {
        self.config.kmeans_tolerance = tolerance;
        self
    }

    /// Set the number of principal components
    #[must_use]
    pub const fn pca_components(mut self, components: usize) -> Self {
        self.config.pca_components = components;
        self
    }

    /// Exclude a numeric column from the model features
    #[must_use]
    pub fn exclude_feature(mut self, column: impl Into<String>) -> Self {
        self.config.excluded_features.push(column.into());
        self
    }

    /// Set the date format configuration
    #[must_use]
    pub fn date_formats(mut self, formats: DateFormatConfig) -> Self {
        self.config.date_formats = formats;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<AnalysisConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
