//! Counting and grouping of case records
//!
//! Every mapping is sparse (a category with zero occurrences is absent) and
//! ordered by ascending key. Use [`ranked`] for the count-descending view.

pub mod clinical;
pub mod demographic;
pub mod geographic;
pub mod temporal;

use std::collections::BTreeMap;

use itertools::Itertools;

use crate::dataset::CaseDataset;
use crate::error::Result;

pub use clinical::ClinicalSection;
pub use demographic::{AgeBracket, AgeBrackets, DemographicSection};
pub use geographic::GeographicSection;
pub use temporal::{DateRange, MonthKey, TemporalSection, WeekKey};

/// Category to count
pub type Counts<K> = BTreeMap<K, usize>;

/// Category to category to count
pub type CrossTab = BTreeMap<String, BTreeMap<String, usize>>;

/// Count the present values of an iterator
pub fn count_values<K, I>(values: I) -> Counts<K>
where
    K: Ord,
    I: IntoIterator<Item = Option<K>>,
{
    let mut counts = Counts::new();
    for value in values.into_iter().flatten() {
        *counts.entry(value).or_insert(0) += 1;
    }
    counts
}

/// Count the distinct non-missing values of a column
pub fn value_counts(dataset: &CaseDataset, column: &str) -> Result<Counts<String>> {
    Ok(count_values(dataset.string_values(column)?))
}

/// Two-key grouping: rows missing either key are skipped
pub fn cross_tabulate(
    dataset: &CaseDataset,
    row_column: &str,
    col_column: &str,
) -> Result<CrossTab> {
    let rows = dataset.string_values(row_column)?;
    let cols = dataset.string_values(col_column)?;

    let mut table = CrossTab::new();
    for (row, col) in rows.into_iter().zip(cols) {
        if let (Some(row), Some(col)) = (row, col) {
            *table.entry(row).or_default().entry(col).or_insert(0) += 1;
        }
    }
    Ok(table)
}

/// Entries ordered by count descending, ties by ascending key
#[must_use]
pub fn ranked<K: Ord>(counts: &Counts<K>) -> Vec<(&K, usize)> {
    counts
        .iter()
        .map(|(key, count)| (key, *count))
        .sorted_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)))
        .collect()
}

/// Sum of all counts
#[must_use]
pub fn total<K>(counts: &Counts<K>) -> usize {
    counts.values().sum()
}
