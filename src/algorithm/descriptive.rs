//! Descriptive statistics over numeric columns.

use itertools::Itertools;
use serde::Serialize;

/// Arithmetic mean, `None` for an empty slice
#[must_use]
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Population standard deviation (divides by n)
#[must_use]
pub fn population_std_dev(values: &[f64]) -> Option<f64> {
    let mu = mean(values)?;
    let variance = values.iter().map(|v| (v - mu).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

/// Sample standard deviation (divides by n - 1), `None` below two values
#[must_use]
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mu = mean(values)?;
    let variance =
        values.iter().map(|v| (v - mu).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

/// Percentile with linear interpolation between closest ranks
///
/// `sorted` must be ascending; `q` is in [0, 100].
#[must_use]
pub fn percentile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let q = q.clamp(0.0, 100.0);
    let position = q / 100.0 * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Summary of one numeric column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericSummary {
    /// Non-missing values
    pub count: usize,
    /// Missing or unparseable values
    pub missing: usize,
    pub mean: f64,
    /// Sample standard deviation; 0 for a single value
    pub std: f64,
    pub min: f64,
    pub p25: f64,
    pub median: f64,
    pub p75: f64,
    pub max: f64,
}

impl NumericSummary {
    /// Summarise a column, `None` when it has no values
    #[must_use]
    pub fn from_values(values: &[Option<f64>]) -> Option<Self> {
        let present: Vec<f64> = values
            .iter()
            .flatten()
            .copied()
            .sorted_by(f64::total_cmp)
            .collect();
        let count = present.len();
        let first = *present.first()?;
        let last = *present.last()?;
        Some(Self {
            count,
            missing: values.len() - count,
            mean: mean(&present)?,
            std: sample_std_dev(&present).unwrap_or(0.0),
            min: first,
            p25: percentile(&present, 25.0)?,
            median: percentile(&present, 50.0)?,
            p75: percentile(&present, 75.0)?,
            max: last,
        })
    }
}
