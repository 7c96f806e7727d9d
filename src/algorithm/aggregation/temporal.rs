//! Case counts over calendar time

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Serialize, Serializer};

use super::{Counts, count_values};
use crate::dataset::CaseDataset;
use crate::dataset::columns::DATE;
use crate::dataset::date_utils::DateFormatConfig;
use crate::error::Result;

/// ISO 8601 week, ordered chronologically
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WeekKey {
    /// ISO week-numbering year (may differ from the calendar year)
    pub year: i32,
    pub week: u32,
}

impl WeekKey {
    #[must_use]
    pub fn of(date: NaiveDate) -> Self {
        let iso = date.iso_week();
        Self {
            year: iso.year(),
            week: iso.week(),
        }
    }
}

impl fmt::Display for WeekKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-W{:02}", self.year, self.week)
    }
}

impl Serialize for WeekKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Calendar month, ordered chronologically
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    #[must_use]
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

impl Serialize for MonthKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// First and last observed dates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub first: NaiveDate,
    pub last: NaiveDate,
}

/// Temporal section of the insight report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TemporalSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
    #[serde(skip_serializing_if = "Counts::is_empty")]
    pub daily_cases: Counts<NaiveDate>,
    #[serde(skip_serializing_if = "Counts::is_empty")]
    pub weekly_cases: Counts<WeekKey>,
    #[serde(skip_serializing_if = "Counts::is_empty")]
    pub monthly_cases: Counts<MonthKey>,
    #[serde(skip_serializing_if = "Counts::is_empty")]
    pub yearly_cases: Counts<i32>,
}

impl TemporalSection {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.daily_cases.is_empty()
    }
}

/// Day, ISO-week, month and year counts of the `Date` column
///
/// Rows whose date is missing or does not parse are not counted.
pub fn aggregate_temporal(
    dataset: &CaseDataset,
    formats: &DateFormatConfig,
) -> Result<TemporalSection> {
    let dates: Vec<NaiveDate> = dataset
        .date_values(DATE, formats)?
        .into_iter()
        .flatten()
        .collect();

    let date_range = match (dates.iter().min(), dates.iter().max()) {
        (Some(&first), Some(&last)) => Some(DateRange { first, last }),
        _ => None,
    };

    Ok(TemporalSection {
        date_range,
        daily_cases: count_values(dates.iter().copied().map(Some)),
        weekly_cases: count_values(dates.iter().map(|d| Some(WeekKey::of(*d)))),
        monthly_cases: count_values(dates.iter().map(|d| Some(MonthKey::of(*d)))),
        yearly_cases: count_values(dates.iter().map(|d| Some(d.year()))),
    })
}

/// ISO-week counts of the `Date` column
pub fn weekly_counts(
    dataset: &CaseDataset,
    formats: &DateFormatConfig,
) -> Result<Counts<WeekKey>> {
    Ok(count_values(
        dataset
            .date_values(DATE, formats)?
            .into_iter()
            .map(|date| date.map(WeekKey::of)),
    ))
}
