//! Dataset profile with rule-based highlights.

use serde::{Deserialize, Serialize};
use tally_types::{Column, ColumnKind, Table};

use crate::basic::{NumericStatistics, percent};
use crate::config::AnalysisConfig;
use crate::correlation::{self, CorrelationPair, Matrix};
use crate::counts::{self, ValueCount};
use crate::error::{AnalysisError, Result};
use crate::stats::{self, Moments};

const SAMPLE_VALUES: usize = 5;
const HIGH_MISSING_PERCENT: f64 = 20.0;
const HIGH_SKEW: f64 = 1.0;
const HIGH_OUTLIER_PERCENT: f64 = 1.0;

/// Profile of a whole dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overview {
    pub row_count: usize,
    pub column_count: usize,
    pub column_info: Vec<ColumnInfo>,
    pub numeric_summary: Vec<NumericSummary>,
    pub categorical_summary: Vec<CategoricalSummary>,
    /// Columns with at least one null.
    pub missing_data: Vec<MissingData>,
    pub correlation_matrix: CorrelationSummary,
    pub highlights: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub dtype: String,
    /// First non-null values as display strings.
    pub sample_values: Vec<String>,
    pub unique_count: usize,
    pub is_numeric: bool,
    /// Text with fewer distinct values than half the rows.
    pub is_categorical: bool,
    pub is_datetime: bool,
    pub is_constant: bool,
    pub has_nulls: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericSummary {
    pub name: String,
    #[serde(flatten)]
    pub stats: NumericStatistics,
    pub skewness: Option<f64>,
    pub kurtosis: Option<f64>,
    pub outlier_percent: Option<f64>,
    /// `None` when the column is too small or too flat to test.
    pub is_normal: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalSummary {
    pub name: String,
    pub unique_count: usize,
    pub top_values: Vec<ValueCount>,
    pub high_cardinality: bool,
    pub entropy: Option<f64>,
    /// `None` when there are too many categories to test.
    pub is_uniform: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingData {
    pub column: String,
    pub count: usize,
    pub percent: f64,
}

/// Pearson matrix with the pairs at or above the correlation threshold.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrelationSummary {
    pub columns: Vec<String>,
    pub values: Matrix,
    pub high_correlation_pairs: Vec<CorrelationPair>,
}

/// Profile every column and derive highlights.
pub fn overview(table: &Table, config: &AnalysisConfig) -> Result<Overview> {
    if table.is_empty() {
        return Err(AnalysisError::EmptyTable {
            computation: "overview",
        });
    }
    let rows = table.row_count();

    let column_info: Vec<ColumnInfo> = table.columns().iter().map(column_info).collect();
    let numeric_summary = table
        .columns_of(ColumnKind::Numeric)
        .filter(|c| c.null_count() < rows)
        .map(|c| numeric_summary(c, config))
        .collect();
    let categorical_summary = table
        .columns()
        .iter()
        .zip(&column_info)
        .filter(|(c, info)| info.is_categorical && c.null_count() < rows)
        .map(|(c, _)| categorical_summary(c, config))
        .collect();
    let missing_data = table
        .columns()
        .iter()
        .filter(|c| c.null_count() > 0)
        .map(|c| MissingData {
            column: c.name().to_string(),
            count: c.null_count(),
            percent: percent(c.null_count(), rows).unwrap_or(0.0),
        })
        .collect();

    let mut overview = Overview {
        row_count: rows,
        column_count: table.column_count(),
        column_info,
        numeric_summary,
        categorical_summary,
        missing_data,
        correlation_matrix: correlation_summary(table, config),
        highlights: Vec::new(),
    };
    overview.highlights = highlights(&overview);
    tracing::debug!(
        rows,
        columns = overview.column_count,
        highlights = overview.highlights.len(),
        "Built dataset overview"
    );
    Ok(overview)
}

fn column_info(column: &Column) -> ColumnInfo {
    let rows = column.len();
    let unique_count = column.distinct_count();
    let kind = column.kind();
    ColumnInfo {
        name: column.name().to_string(),
        dtype: column.dtype().to_string(),
        sample_values: column
            .non_null()
            .take(SAMPLE_VALUES)
            .map(|c| c.to_string())
            .collect(),
        unique_count,
        is_numeric: kind == ColumnKind::Numeric,
        is_categorical: kind == ColumnKind::Text && (unique_count as f64) < rows as f64 * 0.5,
        is_datetime: kind == ColumnKind::Datetime,
        is_constant: unique_count == 1,
        has_nulls: column.null_count() > 0,
    }
}

fn numeric_summary(column: &Column, config: &AnalysisConfig) -> NumericSummary {
    let values = column.numbers();
    let moments = Moments::of(&values);
    let basic = NumericStatistics::compute(column);
    let is_normal = if values.len() >= config.normality_min_samples {
        stats::normal_test(&values).map(|p| p > config.significance)
    } else {
        None
    };
    NumericSummary {
        name: column.name().to_string(),
        outlier_percent: percent(basic.outlier_count, column.len()),
        stats: basic,
        skewness: moments.and_then(|m| m.skewness()),
        kurtosis: moments.and_then(|m| m.excess_kurtosis()),
        is_normal,
    }
}

fn categorical_summary(column: &Column, config: &AnalysisConfig) -> CategoricalSummary {
    let cells = column.cells();
    let freq: Vec<usize> = counts::frequencies(cells)
        .into_iter()
        .map(|(_, n)| n)
        .collect();
    let unique_count = freq.len();
    let is_uniform = if unique_count <= config.max_categories_for_chi2 {
        stats::chisquare_uniform(&freq).map(|p| p > config.significance)
    } else {
        None
    };
    CategoricalSummary {
        name: column.name().to_string(),
        unique_count,
        top_values: counts::top_values(cells, config.overview_top_values),
        high_cardinality: unique_count > config.high_cardinality_threshold,
        entropy: stats::entropy(&freq),
        is_uniform,
    }
}

fn correlation_summary(table: &Table, config: &AnalysisConfig) -> CorrelationSummary {
    let numeric: Vec<&Column> = table.columns_of(ColumnKind::Numeric).collect();
    if numeric.len() < 2 {
        return CorrelationSummary::default();
    }
    let columns: Vec<String> = numeric.iter().map(|c| c.name().to_string()).collect();
    let values = correlation::correlation_matrix(&numeric, stats::pearson);
    let high_correlation_pairs = correlation::ranked_pairs(&columns, &values)
        .into_iter()
        .filter(|p| p.correlation.abs() >= config.correlation_threshold)
        .collect();
    CorrelationSummary {
        columns,
        values,
        high_correlation_pairs,
    }
}

fn highlights(overview: &Overview) -> Vec<String> {
    let mut out = vec![format!(
        "Dataset contains {} columns and {} rows",
        overview.column_count, overview.row_count
    )];

    if overview.missing_data.is_empty() {
        out.push("No missing data in any columns".to_string());
    } else {
        let high = overview
            .missing_data
            .iter()
            .filter(|m| m.percent > HIGH_MISSING_PERCENT)
            .count();
        if high > 0 {
            out.push(format!("{high} columns have >20% missing values"));
        }
    }

    for col in &overview.numeric_summary {
        if let Some(skew) = col.skewness.filter(|s| s.abs() > HIGH_SKEW) {
            let direction = if skew > 0.0 { "right" } else { "left" };
            out.push(format!("{} is {direction}-skewed", col.name));
        }
        if let Some(pct) = col.outlier_percent.filter(|p| *p > HIGH_OUTLIER_PERCENT) {
            out.push(format!("{} has {pct:.1}% outliers", col.name));
        }
        if col.is_normal == Some(true) {
            out.push(format!("{} appears normally distributed", col.name));
        }
    }

    if let Some(top) = overview.correlation_matrix.high_correlation_pairs.first() {
        out.push(format!(
            "Strongest correlation: {} and {} ({:.2})",
            top.col1, top.col2, top.correlation
        ));
    }

    let high_cardinality = overview
        .categorical_summary
        .iter()
        .filter(|c| c.high_cardinality)
        .count();
    if high_cardinality > 0 {
        out.push(format!("{high_cardinality} columns have high cardinality"));
    }

    let uniform = overview
        .categorical_summary
        .iter()
        .filter(|c| c.is_uniform == Some(true))
        .count();
    if uniform > 0 {
        out.push(format!(
            "{uniform} categorical columns have uniform distribution"
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        let ids: Vec<f64> = (1..=10).map(f64::from).collect();
        Table::new(vec![
            Column::from_numbers("id", ids.clone()),
            Column::from_numbers("double", ids.iter().map(|v| v * 2.0)),
            Column::from_strings("group", ["a", "b"].repeat(5)),
            Column::new(
                "note",
                ["x", "y", "z", "w", "v", "u", "t"]
                    .into_iter()
                    .map(Into::into)
                    .chain(std::iter::repeat_n(tally_types::Cell::Null, 3))
                    .collect(),
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_column_info_flags() {
        let ov = overview(&sample(), &AnalysisConfig::default()).unwrap();

        let group = &ov.column_info[2];
        assert!(group.is_categorical);
        assert!(!group.is_numeric);
        assert_eq!(group.sample_values, vec!["a", "b", "a", "b", "a"]);

        let note = &ov.column_info[3];
        assert!(!note.is_categorical);
        assert!(note.has_nulls);
        assert_eq!(note.unique_count, 7);

        assert!(ov.column_info[0].is_numeric);
        assert!(!ov.column_info[0].is_constant);
    }

    #[test]
    fn test_summaries() {
        let ov = overview(&sample(), &AnalysisConfig::default()).unwrap();

        assert_eq!(ov.numeric_summary.len(), 2);
        assert_eq!(ov.numeric_summary[0].stats.median, Some(5.5));
        assert!(ov.numeric_summary[0].is_normal.is_some());

        assert_eq!(ov.categorical_summary.len(), 1);
        let group = &ov.categorical_summary[0];
        assert_eq!(group.unique_count, 2);
        assert_eq!(group.is_uniform, Some(true));
        assert!(!group.high_cardinality);

        assert_eq!(ov.missing_data.len(), 1);
        assert_eq!(ov.missing_data[0].column, "note");
        assert_eq!(ov.missing_data[0].percent, 30.0);
    }

    #[test]
    fn test_high_correlation_pairs() {
        let ov = overview(&sample(), &AnalysisConfig::default()).unwrap();
        let corr = &ov.correlation_matrix;

        assert_eq!(corr.columns, vec!["id", "double"]);
        assert_eq!(corr.high_correlation_pairs.len(), 1);
        assert_eq!(corr.high_correlation_pairs[0].correlation, 1.0);
    }

    #[test]
    fn test_highlights() {
        let ov = overview(&sample(), &AnalysisConfig::default()).unwrap();
        let h = &ov.highlights;

        assert_eq!(h[0], "Dataset contains 4 columns and 10 rows");
        assert!(h.contains(&"1 columns have >20% missing values".to_string()));
        assert!(h.contains(&"Strongest correlation: id and double (1.00)".to_string()));
        assert!(h.contains(&"1 categorical columns have uniform distribution".to_string()));
    }

    #[test]
    fn test_skew_and_outlier_highlights() {
        let table = Table::new(vec![Column::from_numbers(
            "spike",
            [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 2.0, 50.0],
        )])
        .unwrap();
        let ov = overview(&table, &AnalysisConfig::default()).unwrap();

        assert!(ov.highlights.contains(&"No missing data in any columns".to_string()));
        assert!(ov.highlights.contains(&"spike is right-skewed".to_string()));
        assert!(ov.highlights.contains(&"spike has 25.0% outliers".to_string()));
        assert!(ov.correlation_matrix.columns.is_empty());
    }

    #[test]
    fn test_small_column_skips_normality() {
        let table = Table::new(vec![Column::from_numbers("x", [1.0, 2.0, 3.0])]).unwrap();
        let ov = overview(&table, &AnalysisConfig::default()).unwrap();
        assert_eq!(ov.numeric_summary[0].is_normal, None);
    }

    #[test]
    fn test_serializes_flat_numeric_stats() {
        let ov = overview(&sample(), &AnalysisConfig::default()).unwrap();
        let json = serde_json::to_value(&ov).unwrap();
        assert_eq!(json["numeric_summary"][0]["name"], "id");
        assert_eq!(json["numeric_summary"][0]["median"], 5.5);
    }
}
