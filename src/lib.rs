//! Synthetic volunteer datasets and percentile-based promotion thresholds.
//!
//! [`generator::DatasetGenerator`] produces seeded, reproducible populations;
//! [`analyzer::ThresholdAnalyzer`] derives statistics and promotion cutoffs
//! from any population in the flat row schema.

pub mod analyzer;
pub mod config;
pub mod dataset;
pub mod error;
pub mod generator;
pub mod models;
pub mod report;
pub mod stats;

pub use analyzer::ThresholdAnalyzer;
pub use error::{Error, Result};
pub use generator::{DatasetGenerator, TaskSampler};
