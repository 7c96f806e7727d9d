//! Tests for PCA + k-means clustering of datasets

use std::sync::Arc;

use arrow::array::{ArrayRef, Int32Array};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use epi_insight::algorithm::clustering::{KMeansParams, cluster_dataset};
use epi_insight::features::FeaturePreparation;
use epi_insight::{AnalysisConfig, CaseDataset};

use crate::utils::{categorical_dataset, dataset_from_columns, numeric_dataset, strings};

fn cluster(dataset: &CaseDataset, params: &KMeansParams) -> RecordBatch {
    let features = FeaturePreparation::prepare(dataset, &AnalysisConfig::default()).unwrap();
    cluster_dataset(dataset, &features.standardized, params, 2).unwrap()
}

fn labels(batch: &RecordBatch) -> Vec<i32> {
    batch
        .column_by_name("Cluster")
        .expect("cluster column")
        .as_any()
        .downcast_ref::<Int32Array>()
        .expect("Int32 labels")
        .values()
        .to_vec()
}

#[test]
fn test_every_row_gets_a_label() {
    let dataset = numeric_dataset(60, 4);
    let clustered = cluster(&dataset, &KMeansParams::default());
    assert_eq!(clustered.num_rows(), 60);
    assert_eq!(clustered.num_columns(), dataset.num_columns() + 1);
    assert_eq!(
        clustered.schema().field_with_name("Cluster").unwrap().data_type(),
        &DataType::Int32
    );
    assert!(labels(&clustered).iter().all(|label| (0..3).contains(label)));
}

#[test]
fn test_no_numeric_columns_leaves_dataset_unchanged() {
    let dataset = categorical_dataset();
    let clustered = cluster(&dataset, &KMeansParams::default());
    assert_eq!(&clustered, dataset.batch());
    assert!(clustered.column_by_name("Cluster").is_none());
}

#[test]
fn test_clustering_is_deterministic() {
    let dataset = numeric_dataset(80, 5);
    let params = KMeansParams::default();
    assert_eq!(labels(&cluster(&dataset, &params)), labels(&cluster(&dataset, &params)));
}

#[test]
fn test_fewer_rows_than_clusters() {
    let dataset = dataset_from_columns(vec![
        ("Age", Arc::new(arrow::array::Float64Array::from(vec![10.0, 50.0])) as ArrayRef),
        ("District", strings(&["Delhi", "Pune"])),
    ]);
    assert_eq!(labels(&cluster(&dataset, &KMeansParams::default())), vec![0, 1]);
}

#[test]
fn test_existing_cluster_column_is_replaced() {
    let dataset = dataset_from_columns(vec![
        (
            "Age",
            Arc::new(arrow::array::Float64Array::from(vec![1.0, 2.0, 30.0, 31.0, 70.0, 71.0]))
                as ArrayRef,
        ),
        ("Cluster", strings(&["x", "x", "x", "x", "x", "x"])),
    ]);
    let clustered = cluster(&dataset, &KMeansParams::default());
    assert_eq!(clustered.num_columns(), 2);
    assert_eq!(labels(&clustered), vec![0, 0, 1, 1, 2, 2]);
}
