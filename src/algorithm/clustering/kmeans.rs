//! Seeded k-means with k-means++ initialisation

use rand::prelude::*;
use rand::rngs::StdRng;

use crate::features::FeatureMatrix;

/// Parameters of one k-means fit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KMeansParams {
    pub k: usize,
    pub max_iterations: usize,
    /// Independent seeded initialisations; the lowest inertia wins
    pub restarts: usize,
    /// Total squared centroid movement at which iteration stops
    pub tolerance: f64,
    pub seed: u64,
}

impl Default for KMeansParams {
    fn default() -> Self {
        Self {
            k: 3,
            max_iterations: 300,
            restarts: 10,
            tolerance: 1e-4,
            seed: 42,
        }
    }
}

/// Result of a k-means fit
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansFit {
    /// Cluster label per row, in [0, k)
    pub labels: Vec<usize>,
    pub centroids: Vec<Vec<f64>>,
    /// Sum of squared distances to the assigned centroid
    pub inertia: f64,
    /// Lloyd iterations of the winning run
    pub iterations: usize,
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Index and squared distance of the nearest centroid; ties go to the lower index
fn nearest(row: &[f64], centroids: &[Vec<f64>]) -> (usize, f64) {
    centroids
        .iter()
        .enumerate()
        .map(|(i, c)| (i, squared_distance(row, c)))
        .fold((0, f64::INFINITY), |best, candidate| {
            if candidate.1 < best.1 { candidate } else { best }
        })
}

fn kmeans_plus_plus(matrix: &FeatureMatrix, k: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
    let n = matrix.n_rows();
    let mut centroids = vec![matrix.row(rng.random_range(0..n)).to_vec()];
    let mut distances: Vec<f64> = matrix
        .rows()
        .map(|row| squared_distance(row, &centroids[0]))
        .collect();

    while centroids.len() < k {
        let total: f64 = distances.iter().sum();
        let chosen = if total > 0.0 {
            let target = rng.random::<f64>() * total;
            let mut cumulative = 0.0;
            distances
                .iter()
                .position(|d| {
                    cumulative += d;
                    cumulative > target
                })
                .unwrap_or(n - 1)
        } else {
            // Every row coincides with a centroid
            rng.random_range(0..n)
        };

        let centroid = matrix.row(chosen).to_vec();
        for (distance, row) in distances.iter_mut().zip(matrix.rows()) {
            *distance = distance.min(squared_distance(row, &centroid));
        }
        centroids.push(centroid);
    }
    centroids
}

fn lloyd(
    matrix: &FeatureMatrix,
    mut centroids: Vec<Vec<f64>>,
    params: &KMeansParams,
) -> KMeansFit {
    let width = matrix.n_cols();
    let mut labels = vec![0; matrix.n_rows()];
    let mut iterations = 0;

    while iterations < params.max_iterations {
        iterations += 1;
        for (label, row) in labels.iter_mut().zip(matrix.rows()) {
            *label = nearest(row, &centroids).0;
        }

        let mut sums = vec![vec![0.0; width]; centroids.len()];
        let mut sizes = vec![0usize; centroids.len()];
        for (&label, row) in labels.iter().zip(matrix.rows()) {
            sizes[label] += 1;
            for (sum, x) in sums[label].iter_mut().zip(row) {
                *sum += x;
            }
        }

        let mut shift = 0.0;
        for ((centroid, sum), size) in centroids.iter_mut().zip(sums).zip(sizes) {
            // An empty cluster keeps its previous centroid
            if size == 0 {
                continue;
            }
            let updated: Vec<f64> = sum.into_iter().map(|s| s / size as f64).collect();
            shift += squared_distance(centroid, &updated);
            *centroid = updated;
        }

        if shift <= params.tolerance {
            break;
        }
    }

    let mut inertia = 0.0;
    for (label, row) in labels.iter_mut().zip(matrix.rows()) {
        let (nearest_label, distance) = nearest(row, &centroids);
        *label = nearest_label;
        inertia += distance;
    }

    KMeansFit {
        labels,
        centroids,
        inertia,
        iterations,
    }
}

/// Renumber labels in order of first appearance so row 0 is always cluster 0
fn canonicalise(fit: &mut KMeansFit) {
    let k = fit.centroids.len();
    let mut mapping = vec![usize::MAX; k];
    let mut next = 0;
    for &label in &fit.labels {
        if mapping[label] == usize::MAX {
            mapping[label] = next;
            next += 1;
        }
    }
    for slot in mapping.iter_mut().filter(|m| **m == usize::MAX) {
        *slot = next;
        next += 1;
    }

    let mut centroids = vec![Vec::new(); k];
    for (old, centroid) in fit.centroids.drain(..).enumerate() {
        centroids[mapping[old]] = centroid;
    }
    fit.centroids = centroids;
    fit.labels.iter_mut().for_each(|label| *label = mapping[*label]);
}

/// Partition the rows of `matrix` into at most `k` clusters
///
/// With no more rows than `k`, each row is its own cluster.
#[must_use]
pub fn fit(matrix: &FeatureMatrix, params: &KMeansParams) -> KMeansFit {
    let n = matrix.n_rows();
    if n == 0 || params.k == 0 {
        return KMeansFit {
            labels: Vec::new(),
            centroids: Vec::new(),
            inertia: 0.0,
            iterations: 0,
        };
    }
    if n <= params.k {
        return KMeansFit {
            labels: (0..n).collect(),
            centroids: matrix.rows().map(<[f64]>::to_vec).collect(),
            inertia: 0.0,
            iterations: 0,
        };
    }

    let mut rng = StdRng::seed_from_u64(params.seed);
    let mut best: Option<KMeansFit> = None;
    for _ in 0..params.restarts.max(1) {
        let initial = kmeans_plus_plus(matrix, params.k, &mut rng);
        let candidate = lloyd(matrix, initial, params);
        if best.as_ref().is_none_or(|b| candidate.inertia < b.inertia) {
            best = Some(candidate);
        }
    }

    let mut best = best.unwrap_or_else(|| unreachable!("at least one restart runs"));
    canonicalise(&mut best);
    best
}

/// Cluster label per row
#[must_use]
pub fn fit_predict(matrix: &FeatureMatrix, params: &KMeansParams) -> Vec<usize> {
    fit(matrix, params).labels
}
