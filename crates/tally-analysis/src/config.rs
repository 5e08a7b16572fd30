//! Thresholds used by the analysis routines.

use serde::{Deserialize, Serialize};

/// Thresholds used by the analysis routines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Minimum |r| for a pair to count as highly correlated.
    pub correlation_threshold: f64,

    /// Distinct-value count above which a categorical column is flagged.
    pub high_cardinality_threshold: usize,

    /// Largest number of categories tested for uniformity.
    pub max_categories_for_chi2: usize,

    /// Fewest non-null values for the normality test.
    pub normality_min_samples: usize,

    /// Significance level for the normality and uniformity tests.
    pub significance: f64,

    /// Number of most frequent values listed per categorical column.
    pub overview_top_values: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            correlation_threshold: 0.7,
            high_cardinality_threshold: 50,
            max_categories_for_chi2: 20,
            normality_min_samples: 8,
            significance: 0.05,
            overview_top_values: 10,
        }
    }
}
