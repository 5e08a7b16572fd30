//! Analysis engine for Tally datasets.
//!
//! Every routine takes a [`Table`](tally_types::Table) and returns a
//! serializable report, ready to be cached as an analysis artifact:
//!
//! - [`basic_statistics`]: per-column descriptive statistics
//! - [`skewness_kurtosis`]: distribution shape of numeric columns
//! - [`correlation`]: Pearson, Spearman and Cramér's V
//! - [`overview`]: column profile with rule-based highlights
//!
//! Statistics that are undefined for a column (a single row, zero variance,
//! all nulls) are reported as `None` rather than failing the whole report.

mod basic;
mod config;
mod correlation;
mod counts;
mod error;
mod overview;
mod shape;
pub mod stats;

pub use basic::{
    BasicStatistics, ColumnStatistics, DatetimeStatistics, Missing, NumericStatistics,
    TextStatistics, basic_statistics,
};
pub use config::AnalysisConfig;
pub use correlation::{Association, CorrelationPair, CorrelationReport, Matrix, correlation};
pub use counts::ValueCount;
pub use error::{AnalysisError, Result};
pub use overview::{
    CategoricalSummary, ColumnInfo, CorrelationSummary, MissingData, NumericSummary, Overview,
    overview,
};
pub use shape::{ColumnShape, ShapeStatistics, column_shape, skewness_kurtosis};
