//! Principal component projection
//!
//! The covariance matrix of the features is diagonalised with cyclic Jacobi
//! rotations. Feature counts in case data are small, so the O(p³) sweeps are
//! negligible next to the O(n·p²) covariance pass.

use log::debug;

use crate::features::FeatureMatrix;

const MAX_SWEEPS: usize = 100;
const OFF_DIAGONAL_TOLERANCE: f64 = 1e-22;

/// A fitted linear projection onto the leading principal components
#[derive(Debug, Clone, PartialEq)]
pub struct PrincipalComponents {
    /// Per-feature mean removed before projecting
    pub mean: Vec<f64>,
    /// One unit-length loading vector per component, by descending variance
    pub components: Vec<Vec<f64>>,
    /// Variance captured by each component
    pub explained_variance: Vec<f64>,
}

impl PrincipalComponents {
    /// Fit up to `n_components` components (capped at features and rows)
    #[must_use]
    pub fn fit(matrix: &FeatureMatrix, n_components: usize) -> Self {
        let n_rows = matrix.n_rows();
        let p = matrix.n_cols();
        if matrix.is_empty() {
            return Self {
                mean: vec![0.0; p],
                components: Vec::new(),
                explained_variance: Vec::new(),
            };
        }

        let mean: Vec<f64> = (0..p)
            .map(|col| matrix.column(col).iter().sum::<f64>() / n_rows as f64)
            .collect();

        let mut covariance = vec![vec![0.0; p]; p];
        for row in matrix.rows() {
            for i in 0..p {
                let di = row[i] - mean[i];
                for j in i..p {
                    covariance[i][j] += di * (row[j] - mean[j]);
                }
            }
        }
        let denominator = n_rows.saturating_sub(1).max(1) as f64;
        for i in 0..p {
            for j in i..p {
                covariance[i][j] /= denominator;
                covariance[j][i] = covariance[i][j];
            }
        }

        let (eigenvalues, eigenvectors) = jacobi_eigen(covariance);
        let mut order: Vec<usize> = (0..p).collect();
        order.sort_by(|&a, &b| eigenvalues[b].total_cmp(&eigenvalues[a]).then(a.cmp(&b)));

        let keep = n_components.min(p).min(n_rows);
        let components: Vec<Vec<f64>> = order
            .iter()
            .take(keep)
            .map(|&c| {
                let mut loading: Vec<f64> = (0..p).map(|f| eigenvectors[f][c]).collect();
                // Fix the sign so the largest-magnitude loading is positive
                let pivot = loading
                    .iter()
                    .copied()
                    .fold(0.0_f64, |acc, v| if v.abs() > acc.abs() { v } else { acc });
                if pivot < 0.0 {
                    loading.iter_mut().for_each(|v| *v = -*v);
                }
                loading
            })
            .collect();
        let explained_variance = order
            .iter()
            .take(keep)
            .map(|&c| eigenvalues[c].max(0.0))
            .collect();

        debug!("Fitted {keep} principal components over {p} features");
        Self {
            mean,
            components,
            explained_variance,
        }
    }

    /// Project rows onto the fitted components
    #[must_use]
    pub fn transform(&self, matrix: &FeatureMatrix) -> FeatureMatrix {
        let names: Vec<String> = (1..=self.components.len())
            .map(|i| format!("PC{i}"))
            .collect();
        let data = matrix
            .rows()
            .flat_map(|row| {
                self.components.iter().map(move |loading| {
                    row.iter()
                        .zip(&self.mean)
                        .zip(loading)
                        .map(|((x, mu), w)| (x - mu) * w)
                        .sum::<f64>()
                })
            })
            .collect();
        FeatureMatrix::from_row_major(names, matrix.n_rows(), data)
    }
}

/// Fit and project in one step
#[must_use]
pub fn project(matrix: &FeatureMatrix, n_components: usize) -> FeatureMatrix {
    if matrix.is_empty() {
        return FeatureMatrix::empty(matrix.n_rows());
    }
    PrincipalComponents::fit(matrix, n_components).transform(matrix)
}

/// Eigen-decomposition of a symmetric matrix
///
/// Returns the eigenvalues and a matrix whose columns are the eigenvectors.
fn jacobi_eigen(mut a: Vec<Vec<f64>>) -> (Vec<f64>, Vec<Vec<f64>>) {
    let p = a.len();
    let mut v: Vec<Vec<f64>> = (0..p)
        .map(|i| (0..p).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
        .collect();

    for _ in 0..MAX_SWEEPS {
        let off: f64 = (0..p)
            .flat_map(|i| ((i + 1)..p).map(move |j| (i, j)))
            .map(|(i, j)| a[i][j] * a[i][j])
            .sum();
        if off < OFF_DIAGONAL_TOLERANCE {
            break;
        }

        for i in 0..p {
            for j in (i + 1)..p {
                if a[i][j] == 0.0 {
                    continue;
                }
                let theta = (a[j][j] - a[i][i]) / (2.0 * a[i][j]);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for k in 0..p {
                    let (aki, akj) = (a[k][i], a[k][j]);
                    a[k][i] = c * aki - s * akj;
                    a[k][j] = s * aki + c * akj;
                }
                for k in 0..p {
                    let (aik, ajk) = (a[i][k], a[j][k]);
                    a[i][k] = c * aik - s * ajk;
                    a[j][k] = s * aik + c * ajk;
                }
                for row in &mut v {
                    let (vki, vkj) = (row[i], row[j]);
                    row[i] = c * vki - s * vkj;
                    row[j] = s * vki + c * vkj;
                }
            }
        }
    }

    let eigenvalues = (0..p).map(|i| a[i][i]).collect();
    (eigenvalues, v)
}
