//! Distribution shape of numeric columns.

use serde::{Deserialize, Serialize};
use tally_types::{Column, ColumnKind, Table};

use crate::error::{AnalysisError, Result};
use crate::stats::Moments;

/// Skewness and excess kurtosis per numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeStatistics {
    pub columns: Vec<ColumnShape>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnShape {
    pub name: String,
    /// Fisher-Pearson coefficient of skewness (biased).
    pub skewness: Option<f64>,
    /// Excess kurtosis (biased, normal = 0).
    pub kurtosis: Option<f64>,
}

const COMPUTATION: &str = "skewness/kurtosis";

/// Skewness and kurtosis of one numeric column over its non-null values.
pub fn column_shape(column: &Column) -> Result<ColumnShape> {
    if column.kind() != ColumnKind::Numeric {
        return Err(AnalysisError::ColumnNotNumeric {
            computation: COMPUTATION,
            column: column.name().to_string(),
        });
    }
    let moments = Moments::of(&column.numbers());
    Ok(ColumnShape {
        name: column.name().to_string(),
        skewness: moments.and_then(|m| m.skewness()),
        kurtosis: moments.and_then(|m| m.excess_kurtosis()),
    })
}

/// Skewness and kurtosis of every numeric column over its non-null values.
pub fn skewness_kurtosis(table: &Table) -> Result<ShapeStatistics> {
    if table.is_empty() {
        return Err(AnalysisError::EmptyTable {
            computation: COMPUTATION,
        });
    }
    let columns = table
        .columns_of(ColumnKind::Numeric)
        .map(column_shape)
        .collect::<Result<Vec<_>>>()?;
    if columns.is_empty() {
        return Err(AnalysisError::NoNumericColumns {
            computation: COMPUTATION,
        });
    }
    Ok(ShapeStatistics { columns })
}
