//! Per-column descriptive statistics.

use serde::{Deserialize, Serialize};
use tally_types::{Column, ColumnKind, Table};

use crate::counts::{self, ValueCount};
use crate::error::{AnalysisError, Result};
use crate::stats;

const TOP_FREQUENT: usize = 5;

/// Descriptive statistics for every column of a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicStatistics {
    pub row_count: usize,
    pub column_count: usize,
    pub columns: Vec<ColumnStatistics>,
    /// Columns with exactly one distinct non-null value.
    pub constant_columns: Vec<String>,
}

impl BasicStatistics {
    pub fn column(&self, name: &str) -> Option<&ColumnStatistics> {
        self.columns.iter().find(|c| c.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStatistics {
    pub name: String,
    pub dtype: String,
    /// Non-null values.
    pub count: usize,
    pub missing: Missing,
    /// Distinct non-null values.
    pub cardinality: usize,
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numeric: Option<NumericStatistics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<TextStatistics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datetime: Option<DatetimeStatistics>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Missing {
    pub count: usize,
    pub percent: f64,
}

/// Statistics of a numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericStatistics {
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub variance: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub sum: Option<f64>,
    pub range: Option<f64>,
    pub median: Option<f64>,
    pub q1: Option<f64>,
    pub q3: Option<f64>,
    pub iqr: Option<f64>,
    /// Row of the first minimum.
    pub idxmin: Option<usize>,
    /// Row of the first maximum.
    pub idxmax: Option<usize>,
    pub zero_count: usize,
    /// Zeros as a percentage of all rows.
    pub zero_percent: Option<f64>,
    /// Values outside `[q1 - 1.5 iqr, q3 + 1.5 iqr]`.
    pub outlier_count: usize,
}

impl NumericStatistics {
    pub fn compute(column: &Column) -> Self {
        let rows = column.len();
        let values = column.numbers();
        let sorted = stats::sorted(&values);

        let min = sorted.first().copied();
        let max = sorted.last().copied();
        let q1 = stats::quantile_sorted(&sorted, 0.25);
        let q3 = stats::quantile_sorted(&sorted, 0.75);
        let iqr = q1.zip(q3).map(|(q1, q3)| q3 - q1);

        let outlier_count = match (q1, q3, iqr) {
            (Some(q1), Some(q3), Some(iqr)) => {
                let lower = q1 - 1.5 * iqr;
                let upper = q3 + 1.5 * iqr;
                values.iter().filter(|v| **v < lower || **v > upper).count()
            }
            _ => 0,
        };

        let (idxmin, idxmax) = extreme_rows(column);
        let zero_count = values.iter().filter(|v| **v == 0.0).count();

        Self {
            mean: stats::mean(&values),
            std: stats::std_dev(&values),
            variance: stats::variance(&values),
            min,
            max,
            sum: stats::finite(values.iter().sum()),
            range: min.zip(max).and_then(|(lo, hi)| stats::finite(hi - lo)),
            median: stats::quantile_sorted(&sorted, 0.5),
            q1,
            q3,
            iqr,
            idxmin,
            idxmax,
            zero_count,
            zero_percent: percent(zero_count, rows),
            outlier_count,
        }
    }
}

/// Statistics of a text column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStatistics {
    /// Shannon entropy (natural log) of the value distribution.
    pub entropy: Option<f64>,
    pub top_values: Vec<ValueCount>,
}

/// Range of a datetime column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatetimeStatistics {
    pub min: Option<String>,
    pub max: Option<String>,
}

/// Compute descriptive statistics for every column.
pub fn basic_statistics(table: &Table) -> Result<BasicStatistics> {
    if table.is_empty() {
        return Err(AnalysisError::EmptyTable {
            computation: "basic statistics",
        });
    }
    let columns: Vec<ColumnStatistics> = table.columns().iter().map(column_statistics).collect();
    let constant_columns = columns
        .iter()
        .filter(|c| c.cardinality == 1)
        .map(|c| c.name.clone())
        .collect();

    Ok(BasicStatistics {
        row_count: table.row_count(),
        column_count: table.column_count(),
        columns,
        constant_columns,
    })
}

fn column_statistics(column: &Column) -> ColumnStatistics {
    let rows = column.len();
    let nulls = column.null_count();
    let cells = column.cells();

    let numeric = (column.kind() == ColumnKind::Numeric).then(|| NumericStatistics::compute(column));
    let text = (column.kind() == ColumnKind::Text).then(|| {
        let freq: Vec<usize> = counts::frequencies(cells).into_iter().map(|(_, n)| n).collect();
        TextStatistics {
            entropy: stats::entropy(&freq),
            top_values: counts::top_values(cells, TOP_FREQUENT),
        }
    });
    let datetime = (column.kind() == ColumnKind::Datetime).then(|| {
        let mut values: Vec<_> = column.non_null().collect();
        values.sort_by(|a, b| a.total_cmp(b));
        DatetimeStatistics {
            min: values.first().map(|c| c.to_string()),
            max: values.last().map(|c| c.to_string()),
        }
    });

    ColumnStatistics {
        name: column.name().to_string(),
        dtype: column.dtype().to_string(),
        count: rows - nulls,
        missing: Missing {
            count: nulls,
            percent: percent(nulls, rows).unwrap_or(0.0),
        },
        cardinality: column.distinct_count(),
        mode: counts::mode(cells).map(|c| c.to_string()),
        numeric,
        text,
        datetime,
    }
}

/// Rows of the first minimum and first maximum.
fn extreme_rows(column: &Column) -> (Option<usize>, Option<usize>) {
    let mut min: Option<(usize, f64)> = None;
    let mut max: Option<(usize, f64)> = None;
    for (row, value) in column.optional_numbers().into_iter().enumerate() {
        let Some(v) = value else { continue };
        if min.is_none_or(|(_, m)| v < m) {
            min = Some((row, v));
        }
        if max.is_none_or(|(_, m)| v > m) {
            max = Some((row, v));
        }
    }
    (min.map(|(r, _)| r), max.map(|(r, _)| r))
}

pub(crate) fn percent(part: usize, whole: usize) -> Option<f64> {
    (whole > 0).then(|| part as f64 / whole as f64 * 100.0)
}
