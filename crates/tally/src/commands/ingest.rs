//! Ingest command - caches a table read from a JSON file.
//!
//! The file holds the columns in order:
//!
//! ```json
//! {"columns": [{"name": "age", "values": [31, null, 45]},
//!              {"name": "city", "values": ["Oslo", "Lima", null]}]}
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result, bail};
use clap::Args;
use console::Style;
use serde::Deserialize;
use serde_json::Value;
use tally_domain::NewDataset;
use tally_types::{Cell, Column, Table};

use super::Context;

/// Arguments for the ingest command.
#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Session id
    pub session: String,

    /// JSON file with the table's columns
    pub file: PathBuf,

    /// Title used for duplicate detection (defaults to the file name)
    #[arg(short, long)]
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TableFile {
    columns: Vec<ColumnFile>,
}

#[derive(Debug, Deserialize)]
struct ColumnFile {
    name: String,
    values: Vec<Value>,
}

/// Run the ingest command.
pub async fn run(args: IngestArgs, ctx: &Context) -> Result<()> {
    let bytes = std::fs::read(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let table = parse_table(&bytes)
        .with_context(|| format!("invalid table file {}", args.file.display()))?;

    let mut draft = NewDataset::new(file_name(&args.file)).with_size(bytes.len() as u64);
    if let Some(title) = args.title {
        draft = draft.with_title(title);
    }

    let meta = ctx
        .services
        .datasets()
        .ingest(&args.session, draft, &table)
        .await?;

    if ctx.json_output {
        return super::print_json(&meta);
    }

    let green = Style::new().green();
    let dim = Style::new().dim();
    println!(
        "{} Cached {} as {}",
        green.apply_to("✓"),
        meta.title,
        dim.apply_to(&meta.id)
    );
    if ctx.verbose
        && let Some(summary) = &meta.summary
    {
        println!("  {}", dim.apply_to(summary));
    }
    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Build a table from the JSON column layout.
fn parse_table(bytes: &[u8]) -> Result<Table> {
    let file: TableFile = serde_json::from_slice(bytes)?;
    let mut columns = Vec::with_capacity(file.columns.len());
    for column in file.columns {
        let mut cells = Vec::with_capacity(column.values.len());
        for value in column.values {
            cells.push(match value {
                Value::Null => Cell::Null,
                Value::Bool(b) => Cell::Bool(b),
                Value::Number(n) => n.as_f64().map(Cell::number).unwrap_or(Cell::Null),
                Value::String(s) => Cell::Text(s),
                other => bail!("column '{}' has a nested value: {other}", column.name),
            });
        }
        columns.push(Column::new(column.name, cells));
    }
    Ok(Table::new(columns)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_types::ColumnKind;

    #[test]
    fn test_parse_table() {
        let table = parse_table(
            br#"{"columns": [
                {"name": "age", "values": [31, null, 45.5]},
                {"name": "city", "values": ["Oslo", "Lima", null]}
            ]}"#,
        )
        .unwrap();

        assert_eq!(table.row_count(), 3);
        assert_eq!(table.column("age").unwrap().kind(), ColumnKind::Numeric);
        assert_eq!(table.column("age").unwrap().null_count(), 1);
        assert_eq!(table.column("city").unwrap().kind(), ColumnKind::Text);
    }

    #[test]
    fn test_parse_table_rejects_nested_values() {
        let err = parse_table(br#"{"columns": [{"name": "x", "values": [[1]]}]}"#).unwrap_err();
        assert!(err.to_string().contains("nested"));
    }

    #[test]
    fn test_parse_table_rejects_ragged_columns() {
        assert!(
            parse_table(
                br#"{"columns": [{"name": "a", "values": [1, 2]}, {"name": "b", "values": [1]}]}"#
            )
            .is_err()
        );
    }
}
