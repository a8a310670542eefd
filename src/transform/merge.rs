//! Collapsing several columns into one

use tracing::debug;

use crate::config::{Aggregator, Keep, MergeOptions};
use crate::error::{Error, Result};
use crate::model::{CellValue, Table};

/// How one row's values are reduced
enum Strategy<'a> {
    Keep(Keep),
    Aggregate(Aggregator<'a>),
}

impl<'a> Strategy<'a> {
    fn from_options(options: MergeOptions<'a>) -> Result<Self> {
        match (options.keep, options.aggregator) {
            (Some(_), Some(_)) => Err(Error::ConflictingMergeStrategy),
            (Some(keep), None) => Ok(Strategy::Keep(keep)),
            (None, Some(aggregator)) => Ok(Strategy::Aggregate(aggregator)),
            (None, None) => Err(Error::MissingMergeStrategy),
        }
    }

    fn apply(&self, values: &[CellValue]) -> CellValue {
        match self {
            Strategy::Keep(Keep::First) => first_valid(values.iter()),
            Strategy::Keep(Keep::Last) => first_valid(values.iter().rev()),
            Strategy::Aggregate(aggregator) => aggregator(values),
        }
    }
}

/// Reduce with "replace null by next": the first non-null value, or the last
/// value when all are null.
fn first_valid<'v>(values: impl Iterator<Item = &'v CellValue>) -> CellValue {
    values
        .reduce(|acc, next| if acc.is_null() { next } else { acc })
        .cloned()
        .unwrap_or(CellValue::Null)
}

/// Write the merge of `columns` into `result_column`, in place.
///
/// Columns that are not in the table are skipped; it is an error if none are.
/// `result_column` is overwritten when it exists. The table is mutated and the
/// same reference is returned; use [`merged_columns`] to keep the input intact.
pub fn merge_columns<'t, S: AsRef<str>>(
    table: &'t mut Table,
    columns: &[S],
    result_column: &str,
    options: MergeOptions<'_>,
) -> Result<&'t mut Table> {
    let strategy = Strategy::from_options(options)?;

    let present: Vec<usize> = columns
        .iter()
        .filter_map(|c| table.column_index(c.as_ref()))
        .collect();
    if present.is_empty() {
        return Err(Error::MissingColumns(
            columns.iter().map(|c| c.as_ref().to_string()).collect(),
        ));
    }

    let mut buffer = Vec::with_capacity(present.len());
    let merged: Vec<CellValue> = table
        .rows
        .iter()
        .map(|row| {
            buffer.clear();
            buffer.extend(present.iter().map(|&i| row.cells[i].clone()));
            strategy.apply(&buffer)
        })
        .collect();

    table.set_column(result_column, merged)?;
    debug!(
        columns = present.len(),
        rows = table.row_count(),
        result_column,
        "merged columns"
    );
    Ok(table)
}

/// Copying variant of [`merge_columns`]: the input table is left untouched.
pub fn merged_columns<S: AsRef<str>>(
    table: &Table,
    columns: &[S],
    result_column: &str,
    options: MergeOptions<'_>,
) -> Result<Table> {
    let mut copy = table.clone();
    merge_columns(&mut copy, columns, result_column, options)?;
    Ok(copy)
}
