//! Analysis algorithms for case surveillance data
//!
//! This module contains the counting, risk tiering, outlier detection and
//! clustering steps the insight assembler composes into a report.

pub mod aggregation;
pub mod anomaly;
pub mod clustering;
pub mod descriptive;
pub mod risk;
