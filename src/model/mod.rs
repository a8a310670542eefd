//! Data model for indexed tabular data

mod json;
mod key;
mod schema;
mod table;

pub use key::{KeyLookup, KeySource, RowIndex};
pub use schema::{CellType, Column};
pub use table::{CellValue, Row, Table};
