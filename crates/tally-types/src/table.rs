//! Columns, tables and previews.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::cell::Cell;
use crate::error::{Result, TableError};

/// Semantic type of a column, inferred from its non-null cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Numeric,
    Text,
    Datetime,
    Boolean,
}

impl ColumnKind {
    /// Infer a kind from a column's cells.
    ///
    /// Mixed or entirely null columns are treated as text.
    pub fn infer(cells: &[Cell]) -> Self {
        let mut values = cells.iter().filter(|c| !c.is_null()).peekable();
        let Some(first) = values.peek() else {
            return ColumnKind::Text;
        };
        let kind = match first {
            Cell::Number(_) => ColumnKind::Numeric,
            Cell::Datetime(_) => ColumnKind::Datetime,
            Cell::Bool(_) => ColumnKind::Boolean,
            _ => return ColumnKind::Text,
        };
        let uniform = values.all(|c| {
            matches!(
                (kind, c),
                (ColumnKind::Numeric, Cell::Number(_))
                    | (ColumnKind::Datetime, Cell::Datetime(_))
                    | (ColumnKind::Boolean, Cell::Bool(_))
            )
        });
        if uniform { kind } else { ColumnKind::Text }
    }
}

/// A named, typed column of nullable cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    name: String,
    kind: ColumnKind,
    cells: Vec<Cell>,
}

impl Column {
    /// Create a column, inferring its kind from the cells.
    pub fn new(name: impl Into<String>, cells: Vec<Cell>) -> Self {
        let kind = ColumnKind::infer(&cells);
        Self {
            name: name.into(),
            kind,
            cells,
        }
    }

    /// Numeric column without nulls.
    pub fn from_numbers(name: impl Into<String>, values: impl IntoIterator<Item = f64>) -> Self {
        Self::new(name, values.into_iter().map(Cell::from).collect())
    }

    /// Numeric column where `None` marks a missing value.
    pub fn from_optional_numbers(
        name: impl Into<String>,
        values: impl IntoIterator<Item = Option<f64>>,
    ) -> Self {
        Self::new(name, values.into_iter().map(Cell::from).collect())
    }

    /// Text column without nulls.
    pub fn from_strings<S: Into<String>>(
        name: impl Into<String>,
        values: impl IntoIterator<Item = S>,
    ) -> Self {
        Self::new(
            name,
            values.into_iter().map(|s| Cell::Text(s.into())).collect(),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ColumnKind {
        self.kind
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of null cells.
    pub fn null_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_null()).count()
    }

    /// Iterator over non-null cells.
    pub fn non_null(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().filter(|c| !c.is_null())
    }

    /// Finite numeric values in row order, skipping nulls.
    pub fn numbers(&self) -> Vec<f64> {
        self.cells.iter().filter_map(Cell::as_f64).collect()
    }

    /// Numeric values aligned with rows, `None` for nulls.
    pub fn optional_numbers(&self) -> Vec<Option<f64>> {
        self.cells.iter().map(Cell::as_f64).collect()
    }

    /// Number of distinct non-null values.
    pub fn distinct_count(&self) -> usize {
        self.cells
            .iter()
            .filter_map(Cell::key)
            .collect::<HashSet<_>>()
            .len()
    }

    /// Pandas-compatible dtype label.
    pub fn dtype(&self) -> &'static str {
        match self.kind {
            ColumnKind::Numeric => {
                let integral = self
                    .cells
                    .iter()
                    .all(|c| c.as_f64().is_some_and(|v| v.fract() == 0.0));
                if integral { "int64" } else { "float64" }
            }
            ColumnKind::Text => "object",
            ColumnKind::Datetime => "datetime64[ns]",
            ColumnKind::Boolean => "bool",
        }
    }
}

/// An ordered collection of equally long columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTable")]
pub struct Table {
    columns: Vec<Column>,
    #[serde(skip_serializing)]
    rows: usize,
}

#[derive(Deserialize)]
struct RawTable {
    columns: Vec<Column>,
}

impl TryFrom<RawTable> for Table {
    type Error = TableError;

    fn try_from(raw: RawTable) -> Result<Self> {
        Table::new(raw.columns)
    }
}

impl Table {
    /// Build a table, validating unique names and equal column lengths.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let rows = columns.first().map(Column::len).unwrap_or(0);
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(TableError::DuplicateColumn(column.name.clone()));
            }
            if column.len() != rows {
                return Err(TableError::RaggedColumns {
                    column: column.name.clone(),
                    expected: rows,
                    found: column.len(),
                });
            }
        }
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Columns of the given kind, in table order.
    pub fn columns_of(&self, kind: ColumnKind) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(move |c| c.kind == kind)
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Whether the table has no columns or no rows.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() || self.rows == 0
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&Cell> {
        self.columns.get(column).and_then(|c| c.cells.get(row))
    }

    /// Cells of one row in column order.
    pub fn row(&self, row: usize) -> Option<Vec<&Cell>> {
        (row < self.rows).then(|| self.columns.iter().map(|c| &c.cells[row]).collect())
    }

    /// Canonical CSV rendering: header line, one line per row, nulls as empty
    /// fields, RFC 4180 quoting, `\n` line endings.
    pub fn canonical_csv(&self) -> String {
        let mut out = String::new();
        push_record(&mut out, self.columns.iter().map(|c| c.name.clone()));
        for row in 0..self.rows {
            push_record(
                &mut out,
                self.columns.iter().map(|c| c.cells[row].to_string()),
            );
        }
        out
    }

    /// Lowercase hex SHA-256 of [`Table::canonical_csv`].
    pub fn content_hash(&self) -> String {
        format!("{:x}", Sha256::digest(self.canonical_csv().as_bytes()))
    }

    /// Column list plus the first `rows` rows.
    pub fn preview(&self, rows: usize) -> Preview {
        let take = rows.min(self.rows);
        Preview {
            columns: self.column_names(),
            sample_rows: (0..take)
                .filter_map(|r| self.row(r))
                .map(|cells| cells.into_iter().cloned().collect())
                .collect(),
        }
    }
}

fn push_record(out: &mut String, fields: impl Iterator<Item = String>) {
    for (i, field) in fields.enumerate() {
        if i > 0 {
            out.push(',');
        }
        if field.contains([',', '"', '\n', '\r']) {
            out.push('"');
            out.push_str(&field.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(&field);
        }
    }
    out.push('\n');
}

/// Bounded sample of a table stored with dataset metadata.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Preview {
    /// Column names in table order.
    pub columns: Vec<String>,
    /// Leading rows, each aligned with `columns`.
    pub sample_rows: Vec<Vec<Cell>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::new(vec![
            Column::from_optional_numbers("score", [Some(1.0), None, Some(3.5)]),
            Column::from_strings("city", ["Oslo", "Lima, PE", "Kyiv"]),
        ])
        .unwrap()
    }

    #[test]
    fn test_kind_inference() {
        assert_eq!(
            ColumnKind::infer(&[Cell::Null, Cell::Number(1.0)]),
            ColumnKind::Numeric
        );
        assert_eq!(
            ColumnKind::infer(&[Cell::Number(1.0), Cell::from("x")]),
            ColumnKind::Text
        );
        assert_eq!(ColumnKind::infer(&[Cell::Null]), ColumnKind::Text);
        assert_eq!(
            ColumnKind::infer(&[Cell::Bool(true), Cell::Null]),
            ColumnKind::Boolean
        );
    }

    #[test]
    fn test_dtype_labels() {
        let table = sample();
        assert_eq!(table.column("score").unwrap().dtype(), "float64");
        assert_eq!(table.column("city").unwrap().dtype(), "object");
        assert_eq!(Column::from_numbers("n", [1.0, 2.0]).dtype(), "int64");
    }

    #[test]
    fn test_ragged_columns_rejected() {
        let err = Table::new(vec![
            Column::from_numbers("a", [1.0, 2.0]),
            Column::from_numbers("b", [1.0]),
        ])
        .unwrap_err();
        assert!(matches!(err, TableError::RaggedColumns { found: 1, .. }));
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let err = Table::new(vec![
            Column::from_numbers("a", [1.0]),
            Column::from_numbers("a", [2.0]),
        ])
        .unwrap_err();
        assert!(matches!(err, TableError::DuplicateColumn(name) if name == "a"));
    }

    #[test]
    fn test_canonical_csv_quotes_and_nulls() {
        assert_eq!(
            sample().canonical_csv(),
            "score,city\n1,Oslo\n,\"Lima, PE\"\n3.5,Kyiv\n"
        );
    }

    #[test]
    fn test_content_hash_is_stable_across_copies() {
        let a = sample();
        let json = serde_json::to_string(&a).unwrap();
        let b: Table = serde_json::from_str(&json).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.content_hash(), b.content_hash());
    }

    #[test]
    fn test_content_hash_changes_with_content() {
        let other = Table::new(vec![Column::from_numbers("score", [1.0])]).unwrap();
        assert_ne!(sample().content_hash(), other.content_hash());
    }

    #[test]
    fn test_preview_is_bounded() {
        let preview = sample().preview(2);
        assert_eq!(preview.columns, vec!["score", "city"]);
        assert_eq!(preview.sample_rows.len(), 2);
        assert_eq!(preview.sample_rows[1][0], Cell::Null);

        assert_eq!(sample().preview(10).sample_rows.len(), 3);
    }

    #[test]
    fn test_row_access() {
        let table = sample();
        assert_eq!(
            table.row(1),
            Some(vec![&Cell::Null, &Cell::from("Lima, PE")])
        );
        assert_eq!(table.row(3), None);
    }

    #[test]
    fn test_deserialize_validates() {
        let json = r#"{"columns":[
            {"name":"a","kind":"numeric","cells":[{"t":"number","v":1.0}]},
            {"name":"b","kind":"numeric","cells":[]}
        ]}"#;
        assert!(serde_json::from_str::<Table>(json).is_err());
    }
}
