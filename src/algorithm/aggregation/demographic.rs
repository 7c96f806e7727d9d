//! Age brackets and demographic distributions
//!
//! Brackets are built from a list of edges `e0 < e1 < ... < en`. The first
//! bracket is `[e0, e1]`, each following bracket `(e(i), e(i+1)]`, and the
//! last bracket `(e(n-1), ∞)` is open-ended so that any age at or above `e0`
//! falls in exactly one bracket. The final edge only closes the scale. With
//! the default edges `0, 5, 12, 18, 60, 100` this gives `0-5`, `6-12`,
//! `13-18`, `19-60` and `60+`.

use std::fmt;

use serde::{Serialize, Serializer};

use super::{Counts, count_values};
use crate::dataset::CaseDataset;
use crate::dataset::columns::AGE;
use crate::error::{InsightError, Result};

/// One age bracket; orders by position, not by label
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AgeBracket {
    pub index: usize,
    pub label: String,
}

impl fmt::Display for AgeBracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

impl Serialize for AgeBracket {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.label)
    }
}

/// An ordered partition of ages
#[derive(Debug, Clone, PartialEq)]
pub struct AgeBrackets {
    edges: Vec<f64>,
    brackets: Vec<AgeBracket>,
}

impl AgeBrackets {
    /// Build brackets from strictly increasing edges (at least two)
    pub fn from_edges(edges: &[f64]) -> Result<Self> {
        if edges.len() < 2 || edges.windows(2).any(|w| w[0] >= w[1]) {
            return Err(InsightError::InvalidConfig(format!(
                "age bracket edges must be at least two strictly increasing values, got {edges:?}"
            )));
        }

        let n = edges.len() - 1;
        let brackets = (0..n)
            .map(|index| {
                let label = if index + 1 == n {
                    format!("{}+", format_edge(edges[index]))
                } else if index == 0 {
                    format!("{}-{}", format_edge(edges[0]), format_edge(edges[1]))
                } else {
                    format!("{}-{}", lower_label(edges[index]), format_edge(edges[index + 1]))
                };
                AgeBracket { index, label }
            })
            .collect();

        Ok(Self {
            edges: edges.to_vec(),
            brackets,
        })
    }

    /// All brackets in order
    #[must_use]
    pub fn brackets(&self) -> &[AgeBracket] {
        &self.brackets
    }

    /// The bracket containing `age`, `None` below the first edge
    #[must_use]
    pub fn bracket_for(&self, age: f64) -> Option<&AgeBracket> {
        if !age.is_finite() || age < self.edges[0] {
            return None;
        }
        let last = self.brackets.len() - 1;
        let index = (0..last)
            .find(|&i| age <= self.edges[i + 1])
            .unwrap_or(last);
        self.brackets.get(index)
    }
}

impl Default for AgeBrackets {
    fn default() -> Self {
        Self::from_edges(&[0.0, 5.0, 12.0, 18.0, 60.0, 100.0])
            .expect("default edges are strictly increasing")
    }
}

fn format_edge(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}

fn lower_label(edge: f64) -> String {
    // Integral edges name the first whole year inside the half-open bracket
    if edge.fract() == 0.0 {
        format!("{:.0}", edge + 1.0)
    } else {
        format!("{edge}")
    }
}

/// Demographic section of the insight report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DemographicSection {
    #[serde(skip_serializing_if = "Counts::is_empty")]
    pub age_brackets: Counts<AgeBracket>,
    #[serde(skip_serializing_if = "Counts::is_empty")]
    pub gender: Counts<String>,
}

/// Cases per age bracket; missing, unparseable and negative ages are skipped
pub fn age_bracket_counts(
    dataset: &CaseDataset,
    brackets: &AgeBrackets,
) -> Result<Counts<AgeBracket>> {
    Ok(count_values(
        dataset
            .numeric_values(AGE)?
            .into_iter()
            .map(|age| age.and_then(|a| brackets.bracket_for(a).cloned())),
    ))
}
