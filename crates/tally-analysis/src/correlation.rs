//! Correlation between columns.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tally_types::{Column, ColumnKind, Table};

use crate::error::{AnalysisError, Result};
use crate::stats;

const TOP_PAIRS: usize = 10;

/// Correlation matrices and association between categorical columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationReport {
    /// Numeric column names; rows and columns of both matrices.
    pub columns: Vec<String>,
    pub pearson: Vec<Vec<Option<f64>>>,
    pub spearman: Vec<Vec<Option<f64>>>,
    /// Cramér's V for every ordered pair of distinct text columns.
    pub cramers_v: Vec<Association>,
    /// Strongest Pearson pairs by absolute value, each pair once.
    pub top_pearson_pairs: Vec<CorrelationPair>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Association {
    pub col1: String,
    pub col2: String,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationPair {
    pub col1: String,
    pub col2: String,
    /// Signed coefficient.
    pub correlation: f64,
}

/// Correlation matrix between numeric columns.
pub type Matrix = Vec<Vec<Option<f64>>>;

/// Pairwise-complete correlation matrix of the given columns.
pub fn correlation_matrix(
    columns: &[&Column],
    coefficient: fn(&[f64], &[f64]) -> Option<f64>,
) -> Matrix {
    let values: Vec<Vec<Option<f64>>> = columns.iter().map(|c| c.optional_numbers()).collect();
    let n = values.len();
    let mut matrix = vec![vec![None; n]; n];
    for i in 0..n {
        for j in i..n {
            let (x, y) = stats::pairwise_complete(&values[i], &values[j]);
            let r = coefficient(&x, &y);
            // a defined self-correlation is exactly one
            let r = if i == j { r.map(|_| 1.0) } else { r };
            matrix[i][j] = r;
            matrix[j][i] = r;
        }
    }
    matrix
}

/// Unordered pairs above the diagonal, strongest first.
pub fn ranked_pairs(names: &[String], matrix: &Matrix) -> Vec<CorrelationPair> {
    let mut pairs = Vec::new();
    for i in 0..names.len() {
        for j in i + 1..names.len() {
            if let Some(r) = matrix[i][j] {
                pairs.push(CorrelationPair {
                    col1: names[i].clone(),
                    col2: names[j].clone(),
                    correlation: r,
                });
            }
        }
    }
    pairs.sort_by(|a, b| b.correlation.abs().total_cmp(&a.correlation.abs()));
    pairs
}

/// Pearson, Spearman and Cramér's V across the table.
pub fn correlation(table: &Table) -> Result<CorrelationReport> {
    if table.is_empty() {
        return Err(AnalysisError::EmptyTable {
            computation: "correlation",
        });
    }
    let numeric: Vec<&Column> = table.columns_of(ColumnKind::Numeric).collect();
    let text: Vec<&Column> = table.columns_of(ColumnKind::Text).collect();
    if numeric.is_empty() && text.len() < 2 {
        return Err(AnalysisError::NothingToCorrelate);
    }

    let columns: Vec<String> = numeric.iter().map(|c| c.name().to_string()).collect();
    let pearson = correlation_matrix(&numeric, stats::pearson);
    let spearman = correlation_matrix(&numeric, stats::spearman);

    let mut top_pearson_pairs = ranked_pairs(&columns, &pearson);
    top_pearson_pairs.truncate(TOP_PAIRS);

    let mut cramers_v = Vec::new();
    for a in &text {
        for b in &text {
            if a.name() == b.name() {
                continue;
            }
            cramers_v.push(Association {
                col1: a.name().to_string(),
                col2: b.name().to_string(),
                value: stats::cramers_v(&crosstab(a, b)),
            });
        }
    }

    tracing::debug!(
        numeric = columns.len(),
        categorical = text.len(),
        "Computed correlations"
    );
    Ok(CorrelationReport {
        columns,
        pearson,
        spearman,
        cramers_v,
        top_pearson_pairs,
    })
}

/// Contingency table of two columns over rows where both are present.
fn crosstab(a: &Column, b: &Column) -> Vec<Vec<f64>> {
    let mut rows = HashMap::new();
    let mut cols = HashMap::new();
    let mut cells = Vec::new();
    for (x, y) in a.cells().iter().zip(b.cells()) {
        let (Some(x), Some(y)) = (x.key(), y.key()) else {
            continue;
        };
        let next = rows.len();
        let i = *rows.entry(x).or_insert(next);
        let next = cols.len();
        let j = *cols.entry(y).or_insert(next);
        cells.push((i, j));
    }
    let mut table = vec![vec![0.0; cols.len()]; rows.len()];
    for (i, j) in cells {
        table[i][j] += 1.0;
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_pearson() {
        let table = Table::new(vec![
            Column::from_numbers("x", [1.0, 2.0, 3.0, 4.0, 5.0]),
            Column::from_numbers("double", [2.0, 4.0, 6.0, 8.0, 10.0]),
            Column::from_numbers("rev", [5.0, 4.0, 3.0, 2.0, 1.0]),
        ])
        .unwrap();
        let report = correlation(&table).unwrap();

        assert_eq!(report.pearson[0][1], Some(1.0));
        assert_eq!(report.pearson[0][2], Some(-1.0));
        assert_eq!(report.pearson[1][1], Some(1.0));
        assert_eq!(report.spearman[0][2], Some(-1.0));
    }

    #[test]
    fn test_top_pairs_unordered_and_signed() {
        let table = Table::new(vec![
            Column::from_numbers("a", [1.0, 2.0, 3.0, 4.0]),
            Column::from_numbers("b", [4.0, 3.0, 2.0, 1.0]),
            Column::from_numbers("c", [1.0, 3.0, 2.0, 4.0]),
        ])
        .unwrap();
        let report = correlation(&table).unwrap();
        let pairs = &report.top_pearson_pairs;

        assert_eq!(pairs.len(), 3);
        assert_eq!((pairs[0].col1.as_str(), pairs[0].col2.as_str()), ("a", "b"));
        assert_eq!(pairs[0].correlation, -1.0);
        assert!(pairs.iter().all(|p| p.col1 != p.col2));
        assert!(pairs[1].correlation.abs() >= pairs[2].correlation.abs());
    }

    #[test]
    fn test_pairwise_complete_observations() {
        let table = Table::new(vec![
            Column::from_optional_numbers("x", [Some(1.0), Some(2.0), None, Some(3.0)]),
            Column::from_optional_numbers("y", [Some(2.0), Some(4.0), Some(99.0), Some(6.0)]),
        ])
        .unwrap();
        let report = correlation(&table).unwrap();
        assert_eq!(report.pearson[0][1], Some(1.0));
    }

    #[test]
    fn test_constant_column_is_undefined() {
        let table = Table::new(vec![
            Column::from_numbers("x", [1.0, 2.0, 3.0]),
            Column::from_numbers("k", [5.0, 5.0, 5.0]),
        ])
        .unwrap();
        let report = correlation(&table).unwrap();
        assert_eq!(report.pearson[0][1], None);
        assert_eq!(report.pearson[1][1], None);
        assert!(report.top_pearson_pairs.is_empty());
    }

    #[test]
    fn test_cramers_v_for_text_pairs() {
        let table = Table::new(vec![
            Column::from_strings("p", ["a", "a", "b", "b", "c", "c"]),
            Column::from_strings("q", ["x", "x", "y", "y", "z", "z"]),
        ])
        .unwrap();
        let report = correlation(&table).unwrap();

        assert!(report.columns.is_empty());
        assert_eq!(report.cramers_v.len(), 2);
        assert_eq!(report.cramers_v[0].col1, "p");
        assert_eq!(report.cramers_v[1].col1, "q");
        let v = report.cramers_v[0].value.unwrap();
        assert!((v - 1.0).abs() < 1e-9, "v = {v}");
    }

    #[test]
    fn test_nothing_to_correlate() {
        let table = Table::new(vec![Column::from_strings("only", ["a", "b"])]).unwrap();
        assert_eq!(
            correlation(&table).unwrap_err(),
            AnalysisError::NothingToCorrelate
        );
    }
}
