//! Expanding list-valued columns into rows

use indexmap::IndexMap;
use rustc_hash::{FxBuildHasher, FxHashMap};
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{CellValue, Column, Row, RowIndex, Table};

/// Values produced for one index by the expansion phase, one entry per output row
type Expanded<'t> = FxHashMap<&'t RowIndex, Vec<Vec<CellValue>>>;

/// Expand the list in `column` into one row per element.
///
/// Rows whose cell holds `n` elements become `n` rows sharing the original
/// index, with the element in `result_column` (defaults to `column`, and takes
/// its position). Rows whose cell is null, not a list, or an empty list are
/// kept once with a null result.
///
/// The output is sorted by index, keeping element order within an index.
/// Rows that share an index are cross-multiplied with every element expanded
/// under that index, so duplicated indices must be removed before chaining
/// expansions. Returns a new table; the input is untouched.
pub fn explode(table: &Table, column: &str, result_column: Option<&str>) -> Result<Table> {
    let result_column = result_column.unwrap_or(column);
    let col_idx = table.require_column(column)?;

    let mut expanded: Expanded<'_> = FxHashMap::default();
    let mut produced = 0usize;
    for row in &table.rows {
        let Some(items) = row.cells[col_idx].as_list() else {
            continue;
        };
        if items.is_empty() {
            continue;
        }
        produced += items.len();
        expanded
            .entry(&row.index)
            .or_default()
            .extend(items.iter().map(|item| vec![item.clone()]));
    }

    let out = join_back(table, &[col_idx], &[result_column], &expanded)?;
    debug!(
        column,
        input_rows = table.row_count(),
        expanded = produced,
        output_rows = out.row_count(),
        "exploded column"
    );
    Ok(out)
}

/// Expand several list columns in lockstep.
///
/// Lists of one row are paired by position and padded with null to the
/// longest. A row only expands when every listed cell is non-null; if any of
/// them is null the row is kept once with every result column null, even when
/// the other cells hold lists. `result_columns` defaults to `columns`.
///
/// A single column delegates to [`explode`]. Ordering and duplicate-index
/// behaviour are the same as there.
pub fn explode_many<S: AsRef<str>>(
    table: &Table,
    columns: &[S],
    result_columns: Option<&[S]>,
) -> Result<Table> {
    let columns: Vec<&str> = columns.iter().map(AsRef::as_ref).collect();
    let result_columns: Vec<&str> = match result_columns {
        Some(names) => names.iter().map(AsRef::as_ref).collect(),
        None => columns.clone(),
    };

    if columns.len() != result_columns.len() {
        return Err(Error::ArityMismatch {
            columns: columns.len(),
            result_columns: result_columns.len(),
        });
    }
    match columns.len() {
        0 => return Err(Error::TooFewColumns(0)),
        1 => return explode(table, columns[0], Some(result_columns[0])),
        _ => {}
    }

    let positions = columns
        .iter()
        .map(|c| table.require_column(c))
        .collect::<Result<Vec<_>>>()?;

    let mut expanded: Expanded<'_> = FxHashMap::default();
    let mut produced = 0usize;
    for row in &table.rows {
        let cells: Vec<&CellValue> = positions.iter().map(|&i| &row.cells[i]).collect();
        if cells.iter().any(|c| c.is_null()) {
            continue;
        }
        // A non-null scalar cannot be paired and fails the gate like a null
        let Some(lists) = cells.iter().map(|c| c.as_list()).collect::<Option<Vec<_>>>() else {
            continue;
        };

        let longest = lists.iter().map(|l| l.len()).max().unwrap_or(0);
        if longest == 0 {
            continue;
        }
        produced += longest;
        let entry = expanded.entry(&row.index).or_default();
        for position in 0..longest {
            entry.push(
                lists
                    .iter()
                    .map(|l| l.get(position).cloned().unwrap_or(CellValue::Null))
                    .collect(),
            );
        }
    }

    let out = join_back(table, &positions, &result_columns, &expanded)?;
    debug!(
        columns = ?columns,
        input_rows = table.row_count(),
        expanded = produced,
        output_rows = out.row_count(),
        "exploded columns in lockstep"
    );
    Ok(out)
}

/// Outer-join expanded values back onto the table without the source columns.
///
/// Every original row is emitted once per value set expanded under its index,
/// or once with nulls when nothing was expanded for it. Result columns are
/// placed where the first source column was.
fn join_back(
    table: &Table,
    dropped: &[usize],
    result_columns: &[&str],
    expanded: &Expanded<'_>,
) -> Result<Table> {
    let kept: Vec<usize> = (0..table.column_count())
        .filter(|i| !dropped.contains(i))
        .collect();
    let first_dropped = dropped.iter().copied().min().unwrap_or(table.column_count());
    let insert_at = kept.iter().filter(|&&i| i < first_dropped).count();

    let mut columns: Vec<Column> = kept
        .iter()
        .map(|&i| Column::new(table.columns[i].name.clone()))
        .collect();
    let clashes: Vec<String> = result_columns
        .iter()
        .enumerate()
        .filter(|(n, name)| {
            columns.iter().any(|c| c.name == **name) || result_columns[..*n].contains(*name)
        })
        .map(|(_, name)| name.to_string())
        .collect();
    if !clashes.is_empty() {
        return Err(Error::DuplicateColumns(clashes));
    }
    columns.splice(insert_at..insert_at, result_columns.iter().map(|n| Column::new(*n)));

    // Group rows by index, then order groups by index
    let mut groups: IndexMap<&RowIndex, Vec<&Row>, FxBuildHasher> = IndexMap::default();
    for row in &table.rows {
        groups.entry(&row.index).or_default().push(row);
    }
    groups.sort_keys();

    let missing = vec![vec![CellValue::Null; result_columns.len()]];
    let mut out = table.empty_like(columns);
    for (index, rows) in &groups {
        let values = expanded.get(index).unwrap_or(&missing);
        for value_set in values {
            for row in rows {
                let mut cells: Vec<CellValue> =
                    kept.iter().map(|&i| row.cells[i].clone()).collect();
                cells.splice(insert_at..insert_at, value_set.iter().cloned());
                out.add_row((*index).clone(), cells)?;
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn trials() -> Table {
        Table::from_json_records(&json!([
            {"test_index": 1, "trial_num": 1, "subject": 1, "samples": [1, 2, 3, 4]},
            {"test_index": 2, "trial_num": 2, "subject": 1, "samples": [1, 2, 3]},
            {"test_index": 3, "trial_num": 3, "subject": 1, "samples": [1, 2]},
            {"test_index": 4, "trial_num": 1, "subject": 2, "samples": [1]},
            {"test_index": 5, "trial_num": 2, "subject": 2, "samples": []},
            {"test_index": 6, "trial_num": 3, "subject": 2, "samples": null},
        ]))
        .unwrap()
    }

    fn ints(values: &[Option<i64>]) -> Vec<CellValue> {
        values.iter().map(|v| CellValue::from(*v)).collect()
    }

    #[test]
    fn test_explode_row_counts() {
        let table = trials().set_index(&["test_index"]).unwrap();
        let out = explode(&table, "samples", Some("newcol")).unwrap();

        assert_eq!(out.column_names(), vec!["trial_num", "subject", "newcol"]);
        assert_eq!(out.index_names, vec![Some("test_index".to_string())]);

        let per_index: Vec<usize> = (1..=6i64)
            .map(|i| out.indices().filter(|idx| **idx == RowIndex::from(i)).count())
            .collect();
        assert_eq!(per_index, vec![4, 3, 2, 1, 1, 1]);

        assert_eq!(
            out.column_values("newcol").unwrap(),
            ints(&[
                Some(1), Some(2), Some(3), Some(4), Some(1), Some(2), Some(3),
                Some(1), Some(2), Some(1), None, None,
            ])
        );
        assert_eq!(
            out.column_values("trial_num").unwrap(),
            ints(&[
                Some(1), Some(1), Some(1), Some(1), Some(2), Some(2), Some(2),
                Some(3), Some(3), Some(1), Some(2), Some(3),
            ])
        );
    }

    #[test]
    fn test_explode_composite_index_is_sorted() {
        let table = trials()
            .set_index(&["trial_num", "subject"])
            .unwrap();
        let out = explode(&table, "samples", None).unwrap();

        assert_eq!(
            out.index_names,
            vec![Some("trial_num".to_string()), Some("subject".to_string())]
        );
        assert_eq!(out.column_names(), vec!["test_index", "samples"]);
        assert_eq!(
            out.column_values("samples").unwrap(),
            ints(&[
                Some(1), Some(2), Some(3), Some(4), Some(1), Some(1), Some(2),
                Some(3), None, Some(1), Some(2), None,
            ])
        );
        let first = RowIndex::composite(vec![CellValue::Int(1), CellValue::Int(2)]);
        assert_eq!(out.rows[4].index, first);
    }

    #[test]
    fn test_explode_all_null_column_keeps_rows() {
        let table = Table::from_json_records(&json!([
            {"id": "a", "values": null},
            {"id": "b", "values": null},
            {"id": "c", "values": null},
        ]))
        .unwrap();
        let out = explode(&table, "values", Some("value")).unwrap();

        assert_eq!(out.row_count(), table.row_count());
        assert!(out.indices().eq(table.indices()));
        assert!(out.column_values("value").unwrap().iter().all(CellValue::is_null));
    }

    #[test]
    fn test_explode_scalar_cell_is_not_expanded() {
        let table = Table::from_json_records(&json!([{"values": "abc"}, {"values": [7]}])).unwrap();
        let out = explode(&table, "values", None).unwrap();
        assert_eq!(out.column_values("values").unwrap(), ints(&[None, Some(7)]));
    }

    #[test]
    fn test_explode_duplicate_index_cross_multiplies() {
        let mut table = Table::with_columns(&["values", "tag"]);
        table
            .add_row(RowIndex::from(0i64), vec![vec![1i64, 2].into(), "x".into()])
            .unwrap();
        table
            .add_row(RowIndex::from(0i64), vec![vec![3i64].into(), "y".into()])
            .unwrap();

        let out = explode(&table, "values", None).unwrap();
        // three elements under index 0, each paired with both rows
        assert_eq!(out.row_count(), 6);
        assert_eq!(
            out.column_values("tag").unwrap(),
            vec![
                CellValue::from("x"), "y".into(), "x".into(), "y".into(), "x".into(), "y".into()
            ]
        );
    }

    #[test]
    fn test_explode_errors() {
        let table = trials();
        assert_eq!(
            explode(&table, "nope", None).unwrap_err(),
            Error::ColumnNotFound("nope".into())
        );
        assert_eq!(
            explode(&table, "samples", Some("subject")).unwrap_err(),
            Error::DuplicateColumns(vec!["subject".into()])
        );
    }

    fn paired() -> Table {
        Table::from_json_records(&json!([
            {"trial_num": 1, "subject": 1, "samples": [1, 2, 3, 4], "samples2": [1, 2]},
            {"trial_num": 2, "subject": 1, "samples": [1, 2, 3], "samples2": [3]},
            {"trial_num": 3, "subject": 1, "samples": [1], "samples2": [1, 2]},
            {"trial_num": 1, "subject": 2, "samples": [1], "samples2": [1]},
            {"trial_num": 2, "subject": 2, "samples": [], "samples2": []},
            {"trial_num": 3, "subject": 2, "samples": null, "samples2": null},
        ]))
        .unwrap()
        .set_index(&["trial_num", "subject"])
        .unwrap()
    }

    #[test]
    fn test_explode_many_pads_to_longest() {
        let out = explode_many(&paired(), &["samples", "samples2"], None).unwrap();

        assert_eq!(out.column_names(), vec!["samples", "samples2"]);
        assert_eq!(
            out.column_values("samples").unwrap(),
            ints(&[
                Some(1), Some(2), Some(3), Some(4), Some(1), Some(1), Some(2),
                Some(3), None, Some(1), None, None,
            ])
        );
        assert_eq!(
            out.column_values("samples2").unwrap(),
            ints(&[
                Some(1), Some(2), None, None, Some(1), Some(3), None,
                None, None, Some(1), Some(2), None,
            ])
        );
    }

    #[test]
    fn test_explode_many_gates_on_every_column() {
        let table = Table::from_json_records(&json!([
            {"id": 1, "samples": [1, 2, 3], "samples2": null},
            {"id": 2, "samples": [4], "samples2": []},
        ]))
        .unwrap();
        let out = explode_many(&table, &["samples", "samples2"], Some(&["a", "b"][..])).unwrap();

        assert_eq!(out.column_names(), vec!["id", "a", "b"]);
        assert_eq!(out.row_count(), 2);
        assert_eq!(out.rows[0].index, RowIndex::from(0i64));
        assert!(out.rows[0].cells[1].is_null());
        assert!(out.rows[0].cells[2].is_null());
        // an empty list is not null, so the other list still expands
        assert_eq!(out.rows[1].cells[1], CellValue::Int(4));
        assert!(out.rows[1].cells[2].is_null());
    }

    #[test]
    fn test_explode_many_nested_values() {
        let table = Table::from_json_records(&json!([
            {"samples": [{"testkey": 1}, {"testkey": 2}], "other": [1, 2]},
            {"samples": ["this will be null"], "other": null},
        ]))
        .unwrap();
        let out = explode_many(
            &table,
            &["samples", "other"],
            Some(&["newcol", "newcol2"][..]),
        )
        .unwrap();

        assert_eq!(out.row_count(), 3);
        assert_eq!(
            out.cell(1, "newcol").and_then(|c| c.as_map()).and_then(|m| m.get("testkey")),
            Some(&CellValue::Int(2))
        );
        assert!(out.cell(2, "newcol").unwrap().is_null());
    }

    #[test]
    fn test_explode_many_arity() {
        let table = paired();
        assert_eq!(
            explode_many(&table, &["samples", "samples2"], Some(&["a"][..])).unwrap_err(),
            Error::ArityMismatch {
                columns: 2,
                result_columns: 1
            }
        );
        let none: [&str; 0] = [];
        assert_eq!(
            explode_many(&table, &none, None).unwrap_err(),
            Error::TooFewColumns(0)
        );
        assert_eq!(
            explode_many(&table, &["samples", "nope"], None).unwrap_err(),
            Error::ColumnNotFound("nope".into())
        );
    }

    #[test]
    fn test_explode_many_single_column_delegates() {
        let table = paired();
        let many = explode_many(&table, &["samples"], Some(&["s"][..])).unwrap();
        let single = explode(&table, "samples", Some("s")).unwrap();
        assert_eq!(many, single);
    }
}
