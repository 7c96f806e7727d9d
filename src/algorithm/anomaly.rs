//! Isolation forest outlier detection
//!
//! The forest is grown from scratch on every call from the standardized
//! features of that call, with an explicit seed. Rows that isolate in few
//! random splits get a score close to 1, ordinary rows a score near or below
//! 0.5. The contamination fraction sets the cut-off: rows scoring above the
//! `(1 - contamination)` percentile of all scores are flagged.

use std::sync::Arc;

use arrow::array::{ArrayRef, BooleanArray, Float64Array};
use arrow::compute::filter_record_batch;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use itertools::Itertools;
use log::{debug, info};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand::seq::index;

use crate::algorithm::descriptive::percentile;
use crate::dataset::columns::{ANOMALY, ANOMALY_SCORE};
use crate::dataset::{CaseDataset, with_column};
use crate::error::Result;
use crate::features::FeatureMatrix;

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Parameters of one isolation forest fit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IsolationForestParams {
    pub n_trees: usize,
    /// Rows sampled without replacement per tree, capped at the row count
    pub sample_size: usize,
    /// Expected proportion of outliers
    pub contamination: f64,
    pub seed: u64,
}

impl Default for IsolationForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            sample_size: 256,
            contamination: 0.1,
            seed: 42,
        }
    }
}

#[derive(Debug)]
enum Node {
    Leaf {
        size: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn path_length(&self, row: &[f64], depth: usize) -> f64 {
        match self {
            Self::Leaf { size } => depth as f64 + average_path_length(*size),
            Self::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if row[*feature] <= *threshold {
                    left.path_length(row, depth + 1)
                } else {
                    right.path_length(row, depth + 1)
                }
            }
        }
    }
}

/// Average path length of an unsuccessful binary search tree lookup among `n` points
fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        n => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

fn grow_tree(
    matrix: &FeatureMatrix,
    rows: Vec<usize>,
    depth: usize,
    max_depth: usize,
    rng: &mut StdRng,
) -> Node {
    if depth >= max_depth || rows.len() <= 1 {
        return Node::Leaf { size: rows.len() };
    }

    // Only features that still vary within this node can split it
    let candidates: Vec<(usize, f64, f64)> = (0..matrix.n_cols())
        .filter_map(|feature| {
            let (min, max) = rows
                .iter()
                .map(|&row| matrix.get(row, feature))
                .minmax()
                .into_option()?;
            (max > min).then_some((feature, min, max))
        })
        .collect();

    if candidates.is_empty() {
        return Node::Leaf { size: rows.len() };
    }

    let (feature, min, max) = candidates[rng.random_range(0..candidates.len())];
    let threshold = rng.random_range(min..max);
    let (left, right): (Vec<usize>, Vec<usize>) = rows
        .into_iter()
        .partition(|&row| matrix.get(row, feature) <= threshold);

    Node::Split {
        feature,
        threshold,
        left: Box::new(grow_tree(matrix, left, depth + 1, max_depth, rng)),
        right: Box::new(grow_tree(matrix, right, depth + 1, max_depth, rng)),
    }
}

/// Anomaly score in (0, 1] for every row of the matrix
///
/// Returns an empty vector for a matrix with no columns or fewer than two rows.
#[must_use]
pub fn anomaly_scores(matrix: &FeatureMatrix, params: &IsolationForestParams) -> Vec<f64> {
    let n_rows = matrix.n_rows();
    if matrix.is_empty() || n_rows < 2 || params.n_trees == 0 {
        return Vec::new();
    }

    let sample_size = params.sample_size.clamp(2, n_rows);
    let max_depth = (sample_size as f64).log2().ceil() as usize;
    let mut rng = StdRng::seed_from_u64(params.seed);

    let forest: Vec<Node> = (0..params.n_trees)
        .map(|_| {
            let sample = index::sample(&mut rng, n_rows, sample_size).into_vec();
            grow_tree(matrix, sample, 0, max_depth, &mut rng)
        })
        .collect();

    let normaliser = average_path_length(sample_size);
    matrix
        .rows()
        .map(|row| {
            let mean_path = forest.iter().map(|tree| tree.path_length(row, 0)).sum::<f64>()
                / forest.len() as f64;
            2f64.powf(-mean_path / normaliser)
        })
        .collect()
}

/// Score above which a row is an outlier
#[must_use]
pub fn outlier_threshold(scores: &[f64], contamination: f64) -> Option<f64> {
    let sorted: Vec<f64> = scores.iter().copied().sorted_by(f64::total_cmp).collect();
    percentile(&sorted, 100.0 * (1.0 - contamination))
}

/// Outlier flag per score
#[must_use]
pub fn flag_outliers(scores: &[f64], contamination: f64) -> Vec<bool> {
    match outlier_threshold(scores, contamination) {
        Some(threshold) => scores.iter().map(|&score| score > threshold).collect(),
        None => Vec::new(),
    }
}

/// Rows classified as outliers, annotated with `Anomaly` and `Anomaly_Score`
///
/// `standardized` must be row-aligned with `dataset`. With no feature
/// columns, or fewer than two rows, the result is an empty batch.
pub fn detect_anomalies(
    dataset: &CaseDataset,
    standardized: &FeatureMatrix,
    params: &IsolationForestParams,
) -> Result<RecordBatch> {
    let scores = anomaly_scores(standardized, params);
    if scores.is_empty() || scores.len() != dataset.num_rows() {
        debug!("No numeric features to score, skipping anomaly detection");
        return Ok(RecordBatch::new_empty(Arc::new(Schema::empty())));
    }

    let flags = flag_outliers(&scores, params.contamination);
    let mask = BooleanArray::from(flags);
    let outliers = filter_record_batch(dataset.batch(), &mask)?;
    let outlier_scores: Vec<f64> = scores
        .iter()
        .zip(mask.values().iter())
        .filter_map(|(score, flagged)| flagged.then_some(*score))
        .collect();

    info!(
        "Flagged {} of {} rows as anomalies",
        outliers.num_rows(),
        dataset.num_rows()
    );

    let n = outliers.num_rows();
    let flagged = with_column(
        &outliers,
        Field::new(ANOMALY, DataType::Boolean, false),
        Arc::new(BooleanArray::from(vec![true; n])) as ArrayRef,
    )?;
    with_column(
        &flagged,
        Field::new(ANOMALY_SCORE, DataType::Float64, false),
        Arc::new(Float64Array::from(outlier_scores)) as ArrayRef,
    )
}
