//! Unpivoting columns into long form

use tracing::debug;

use crate::config::ConcatOptions;
use crate::error::{Error, Result};
use crate::model::{CellValue, Column, Table};

/// Stack `columns` into a single `result_column`, one row per source cell.
///
/// Each output row keeps the index of the row it came from. With a descriptor
/// column, every row also records its source column (or the label mapped for
/// it). Columns missing from the table are ignored. The result is stably
/// sorted by index, so rows sharing an index keep the order of `columns`.
/// Returns a new table; the input is untouched.
pub fn concatenate_columns<S: AsRef<str>>(
    table: &Table,
    columns: &[S],
    result_column: &str,
    options: &ConcatOptions,
) -> Result<Table> {
    let mut schema = vec![Column::new(result_column)];
    if let Some(descriptor) = &options.descriptor_column {
        if descriptor == result_column {
            return Err(Error::DuplicateColumns(vec![descriptor.clone()]));
        }
        schema.push(Column::new(descriptor.clone()));
    }
    let mut out = table.empty_like(schema);

    let present: Vec<(usize, &str)> = columns
        .iter()
        .map(AsRef::as_ref)
        .filter_map(|name| table.column_index(name).map(|i| (i, name)))
        .collect();

    for &(col_idx, name) in &present {
        let label = options
            .label_map
            .get(name)
            .map_or(name, String::as_str);
        for row in &table.rows {
            let mut cells = vec![row.cells[col_idx].clone()];
            if options.descriptor_column.is_some() {
                cells.push(CellValue::from(label));
            }
            out.add_row(row.index.clone(), cells)?;
        }
    }
    out.sort_by_index();

    debug!(
        columns = present.len(),
        rows = out.row_count(),
        result_column,
        "concatenated columns"
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RowIndex;
    use serde_json::json;

    fn tickets() -> Table {
        Table::from_json_records(&json!([
            {"key": "TICKET-1", "assignee": "Bob", "reporter": "Alice"},
            {"key": "TICKET-2", "assignee": "Bob", "reporter": "Alice"},
            {"key": "TICKET-3", "assignee": "Bob", "reporter": "Alice"},
        ]))
        .unwrap()
        .set_index(&["key"])
        .unwrap()
    }

    fn strings(values: &[&str]) -> Vec<CellValue> {
        values.iter().map(|v| CellValue::from(*v)).collect()
    }

    #[test]
    fn test_concatenate_without_descriptor() {
        let options = ConcatOptions::new();
        let out =
            concatenate_columns(&tickets(), &["assignee", "reporter"], "user", &options).unwrap();

        assert_eq!(out.column_names(), vec!["user"]);
        assert_eq!(out.index_names, vec![Some("key".to_string())]);
        assert_eq!(
            out.column_values("user").unwrap(),
            strings(&["Bob", "Alice", "Bob", "Alice", "Bob", "Alice"])
        );
        assert_eq!(out.rows[1].index, RowIndex::from("TICKET-1"));
        assert_eq!(out.rows[2].index, RowIndex::from("TICKET-2"));
    }

    #[test]
    fn test_concatenate_with_descriptor() {
        let options = ConcatOptions::new().with_descriptor("role");
        let out =
            concatenate_columns(&tickets(), &["assignee", "reporter"], "user", &options).unwrap();

        assert_eq!(out.column_names(), vec!["user", "role"]);
        assert_eq!(out.rows[0].cells, strings(&["Bob", "assignee"]));
        assert_eq!(out.rows[1].cells, strings(&["Alice", "reporter"]));
    }

    #[test]
    fn test_concatenate_with_label_map_and_missing_column() {
        let options = ConcatOptions::new()
            .with_descriptor("role")
            .with_label("assignee", "a")
            .with_label("reporter", "r");
        let columns = ["assignee", "reporter", "creator"];
        let out = concatenate_columns(&tickets(), &columns, "user", &options).unwrap();

        assert_eq!(out.row_count(), 6);
        assert_eq!(
            out.column_values("role").unwrap(),
            strings(&["a", "r", "a", "r", "a", "r"])
        );
    }

    #[test]
    fn test_concatenate_nothing_present() {
        let out =
            concatenate_columns(&tickets(), &["creator"], "user", &ConcatOptions::new()).unwrap();
        assert_eq!(out.row_count(), 0);
        assert_eq!(out.column_names(), vec!["user"]);
    }

    #[test]
    fn test_descriptor_clash() {
        let options = ConcatOptions::new().with_descriptor("user");
        assert_eq!(
            concatenate_columns(&tickets(), &["assignee"], "user", &options).unwrap_err(),
            Error::DuplicateColumns(vec!["user".into()])
        );
    }
}
