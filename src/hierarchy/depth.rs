//! Per-row depth in a parent-pointer hierarchy

use tracing::debug;

use crate::config::{DepthOptions, MergeOptions};
use crate::error::Result;
use crate::model::{CellValue, Table};
use crate::transform::merge_columns;

use super::flatten::HierarchyFlattener;

fn count_present(values: &[CellValue]) -> CellValue {
    let count = values.iter().filter(|v| !v.is_null()).count();
    CellValue::Int(i64::try_from(count).unwrap_or(i64::MAX))
}

/// Add `result_column` with each row's number of ancestors.
///
/// Roots get 0. The ancestor columns built along the way are dropped again;
/// `parent_column` is kept. Returns a new table; the input is untouched.
pub fn hierarchy_depth(
    table: &Table,
    parent_column: &str,
    options: &DepthOptions,
) -> Result<Table> {
    let flattener = HierarchyFlattener::new(options.flatten.clone());
    let (mut flattened, generated) = flattener.flatten_chain(table, parent_column)?;

    let mut chain = Vec::with_capacity(generated.len() + 1);
    chain.push(parent_column.to_string());
    chain.extend(generated.iter().cloned());

    merge_columns(
        &mut flattened,
        &chain,
        &options.result_column,
        MergeOptions::new().with_aggregator(count_present),
    )?;
    flattened.drop_columns(&generated);

    debug!(
        parent_column,
        result_column = options.result_column.as_str(),
        generations = generated.len(),
        "computed hierarchy depth"
    );
    Ok(flattened)
}
