//! Pulling map keys out into columns

use tracing::debug;

use crate::config::ExtractOptions;
use crate::error::Result;
use crate::model::{CellValue, Table};

/// Name of the column a key is extracted into
fn target_name(column: &str, key: &str, new_column: Option<&str>, separator: &str) -> String {
    match new_column {
        None => format!("{}{}{}", column, separator, key),
        Some("") => key.to_string(),
        Some(name) => name.to_string(),
    }
}

fn extract_into(table: &mut Table, col_idx: usize, key: &str, target: &str) -> Result<()> {
    let values = table
        .rows
        .iter()
        .map(|row| match &row.cells[col_idx] {
            CellValue::Map(map) => map.get(key).cloned().unwrap_or(CellValue::Null),
            other => other.clone(),
        })
        .collect();
    table.set_column(target, values)
}

/// Copy the value under `key` of every map in `column` into a new column.
///
/// The new column is named `new_column`, or `{column}{separator}{key}` when
/// unset; an empty `new_column` means the bare key. Maps without the key give
/// null; cells that are not maps are copied as they are. An existing column of
/// that name is overwritten. `column` itself is kept.
pub fn extract_dict_key(
    table: &Table,
    column: &str,
    key: &str,
    new_column: Option<&str>,
    separator: &str,
) -> Result<Table> {
    let col_idx = table.require_column(column)?;
    let mut out = table.clone();
    extract_into(&mut out, col_idx, key, &target_name(column, key, new_column, separator))?;
    Ok(out)
}

/// Spread the maps of `column` into one column per key and drop `column`.
///
/// Without an explicit key list, the keys of the first map found in the
/// column are used, in that map's order; a column without maps yields no new
/// columns.
pub fn extract_dictionary(table: &Table, column: &str, options: &ExtractOptions) -> Result<Table> {
    let col_idx = table.require_column(column)?;

    let keys: Vec<String> = match &options.key_list {
        Some(keys) => keys.clone(),
        None => table
            .rows
            .iter()
            .find_map(|row| row.cells[col_idx].as_map())
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default(),
    };

    let mut out = table.clone();
    for key in &keys {
        let target = match options.prefix.as_deref() {
            None => target_name(column, key, None, &options.separator),
            Some("") => key.clone(),
            Some(prefix) => format!("{}{}{}", prefix, options.separator, key),
        };
        extract_into(&mut out, col_idx, key, &target)?;
    }
    out.drop_columns(&[column]);

    debug!(column, keys = keys.len(), "extracted dictionary");
    Ok(out)
}
