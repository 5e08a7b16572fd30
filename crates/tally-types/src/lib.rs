//! Shared tabular dataset types for Tally.
//!
//! The [`Table`] is the in-memory dataset abstraction every other crate works
//! with: an ordered list of named [`Column`]s, each with an inferred
//! [`ColumnKind`] and nullable [`Cell`]s. It also owns the canonical CSV form
//! used for content hashing and the bounded [`Preview`] stored alongside cached
//! datasets.
//!
//! # Example
//!
//! ```
//! use tally_types::{Column, ColumnKind, Table};
//!
//! let table = Table::new(vec![
//!     Column::from_numbers("height", [1.62, 1.80, 1.75]),
//!     Column::from_strings("team", ["red", "blue", "red"]),
//! ])?;
//!
//! assert_eq!(table.row_count(), 3);
//! assert_eq!(table.column("team").map(|c| c.kind()), Some(ColumnKind::Text));
//! assert_eq!(table.content_hash().len(), 64);
//! # Ok::<(), tally_types::TableError>(())
//! ```

mod cell;
mod error;
mod table;

pub use cell::{Cell, CellKey};
pub use error::{Result, TableError};
pub use table::{Column, ColumnKind, Preview, Table};
