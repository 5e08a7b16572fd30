//! Individual table cells.

use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A single nullable table value.
///
/// Non-finite numbers are never stored: the `From<f64>` conversion maps NaN
/// and infinities to [`Cell::Null`], and [`Cell::is_null`] treats a
/// hand-built non-finite [`Cell::Number`] as null as well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", content = "v", rename_all = "snake_case")]
pub enum Cell {
    Null,
    Number(f64),
    Text(String),
    Datetime(NaiveDateTime),
    Bool(bool),
}

impl Cell {
    /// Build a numeric cell, mapping non-finite values to null.
    pub fn number(value: f64) -> Self {
        if value.is_finite() {
            Cell::Number(value)
        } else {
            Cell::Null
        }
    }

    /// Whether this cell holds no usable value.
    pub fn is_null(&self) -> bool {
        match self {
            Cell::Null => true,
            Cell::Number(v) => !v.is_finite(),
            _ => false,
        }
    }

    /// Numeric value, if this is a finite number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(v) if v.is_finite() => Some(*v),
            _ => None,
        }
    }

    /// Text value, if this is a text cell.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Hashable identity of the value, `None` for nulls.
    pub fn key(&self) -> Option<CellKey> {
        if self.is_null() {
            return None;
        }
        Some(match self {
            Cell::Number(v) => {
                // -0.0 and 0.0 count as the same value
                let v = if *v == 0.0 { 0.0 } else { *v };
                CellKey::Number(v.to_bits())
            }
            Cell::Text(s) => CellKey::Text(s.clone()),
            Cell::Datetime(dt) => CellKey::Datetime(*dt),
            Cell::Bool(b) => CellKey::Bool(*b),
            Cell::Null => unreachable!("nulls handled above"),
        })
    }

    /// Total order used for picking the smallest of tied values.
    ///
    /// Cells of different variants order as null, bool, number, datetime, text.
    pub fn total_cmp(&self, other: &Cell) -> Ordering {
        fn rank(cell: &Cell) -> u8 {
            match cell {
                c if c.is_null() => 0,
                Cell::Bool(_) => 1,
                Cell::Number(_) => 2,
                Cell::Datetime(_) => 3,
                Cell::Text(_) => 4,
                Cell::Null => 0,
            }
        }

        match (self, other) {
            (Cell::Number(a), Cell::Number(b)) if a.is_finite() && b.is_finite() => {
                a.total_cmp(b)
            }
            (Cell::Text(a), Cell::Text(b)) => a.cmp(b),
            (Cell::Datetime(a), Cell::Datetime(b)) => a.cmp(b),
            (Cell::Bool(a), Cell::Bool(b)) => a.cmp(b),
            _ => rank(self).cmp(&rank(other)),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            c if c.is_null() => Ok(()),
            Cell::Number(v) => write!(f, "{v}"),
            Cell::Text(s) => f.write_str(s),
            Cell::Datetime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S%.f")),
            Cell::Bool(b) => write!(f, "{b}"),
            Cell::Null => Ok(()),
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::number(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Number(value as f64)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<NaiveDateTime> for Cell {
    fn from(value: NaiveDateTime) -> Self {
        Cell::Datetime(value)
    }
}

impl From<bool> for Cell {
    fn from(value: bool) -> Self {
        Cell::Bool(value)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Cell::Null)
    }
}

/// Hashable, comparable identity of a non-null cell value.
///
/// Used for distinct counts and frequency tables.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CellKey {
    Number(u64),
    Text(String),
    Datetime(NaiveDateTime),
    Bool(bool),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_finite_numbers_become_null() {
        assert_eq!(Cell::from(f64::NAN), Cell::Null);
        assert_eq!(Cell::from(f64::INFINITY), Cell::Null);
        assert!(Cell::Number(f64::NEG_INFINITY).is_null());
        assert_eq!(Cell::from(2.5), Cell::Number(2.5));
    }

    #[test]
    fn test_signed_zero_shares_key() {
        assert_eq!(Cell::Number(0.0).key(), Cell::Number(-0.0).key());
        assert_eq!(Cell::Null.key(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Cell::Number(3.0).to_string(), "3");
        assert_eq!(Cell::Number(1.5).to_string(), "1.5");
        assert_eq!(Cell::Null.to_string(), "");
        let dt = NaiveDateTime::parse_from_str("2024-03-01 12:30:00", "%Y-%m-%d %H:%M:%S")
            .unwrap();
        assert_eq!(Cell::Datetime(dt).to_string(), "2024-03-01 12:30:00");
    }

    #[test]
    fn test_total_cmp_orders_within_variant() {
        assert_eq!(
            Cell::Number(1.0).total_cmp(&Cell::Number(2.0)),
            Ordering::Less
        );
        assert_eq!(
            Cell::from("b").total_cmp(&Cell::from("a")),
            Ordering::Greater
        );
        assert_eq!(Cell::Null.total_cmp(&Cell::Number(0.0)), Ordering::Less);
    }
}
