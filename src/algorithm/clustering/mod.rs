//! Case clustering
//!
//! Standardized features are projected onto their leading principal
//! components and partitioned with seeded k-means. The labels are written
//! back onto a copy of the dataset as an `Int32` `Cluster` column.

pub mod kmeans;
pub mod pca;

use std::sync::Arc;

use arrow::array::{ArrayRef, Int32Array};
use arrow::datatypes::{DataType, Field};
use arrow::record_batch::RecordBatch;
use log::{debug, info};

use crate::dataset::columns::CLUSTER;
use crate::dataset::{CaseDataset, with_column};
use crate::error::{InsightError, Result};
use crate::features::FeatureMatrix;

pub use kmeans::{KMeansFit, KMeansParams};
pub use pca::PrincipalComponents;

/// Every row of the dataset with a `Cluster` label appended
///
/// `standardized` must be row-aligned with `dataset`. With no feature
/// columns, or no rows, the dataset is returned unchanged.
pub fn cluster_dataset(
    dataset: &CaseDataset,
    standardized: &FeatureMatrix,
    params: &KMeansParams,
    pca_components: usize,
) -> Result<RecordBatch> {
    if standardized.is_empty() {
        debug!("No numeric features to cluster, returning rows unchanged");
        return Ok(dataset.batch().clone());
    }
    if standardized.n_rows() != dataset.num_rows() {
        return Err(InsightError::DegenerateInput(format!(
            "feature matrix has {} rows but dataset has {}",
            standardized.n_rows(),
            dataset.num_rows()
        )));
    }

    let projected = pca::project(standardized, pca_components);
    let fit = kmeans::fit(&projected, params);
    info!(
        "Clustered {} rows into {} clusters over {} components (inertia {:.3})",
        dataset.num_rows(),
        fit.centroids.len(),
        projected.n_cols(),
        fit.inertia
    );

    let labels = fit
        .labels
        .iter()
        .map(|&label| {
            i32::try_from(label).map_err(|_| {
                InsightError::DegenerateInput(format!("cluster label {label} out of range"))
            })
        })
        .collect::<Result<Vec<i32>>>()?;

    with_column(
        dataset.batch(),
        Field::new(CLUSTER, DataType::Int32, false),
        Arc::new(Int32Array::from(labels)) as ArrayRef,
    )
}
