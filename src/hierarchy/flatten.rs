//! Flattening a parent-pointer column into one column per ancestor generation.
//!
//! Each generation is a left self-join: the previous generation's values are
//! probed against the row keys and the matched row's parent is pulled across.
//! The walk stops at the first probe that finds no parent for any row; that
//! probe is discarded.

use tracing::{debug, trace};

use crate::config::FlattenOptions;
use crate::error::{Error, Result};
use crate::model::{CellValue, KeyLookup, KeySource, Table};

/// Walks ancestor chains generation by generation
#[derive(Debug, Clone, Default)]
pub struct HierarchyFlattener {
    options: FlattenOptions,
}

impl HierarchyFlattener {
    pub fn new(options: FlattenOptions) -> Self {
        Self { options }
    }

    /// Append `{parent_column}_1`, `{parent_column}_2`, ... to a copy of `table`.
    ///
    /// Generation `k` holds the key of each row's ancestor `k + 1` steps up, or
    /// null once the chain has reached a root. Columns and index of `table` are
    /// kept as they are.
    pub fn flatten(&self, table: &Table, parent_column: &str) -> Result<Table> {
        let (flattened, _) = self.flatten_chain(table, parent_column)?;
        Ok(flattened)
    }

    /// Like [`flatten`](Self::flatten), also returning the generated column names
    pub(crate) fn flatten_chain(
        &self,
        table: &Table,
        parent_column: &str,
    ) -> Result<(Table, Vec<String>)> {
        let parent_idx = table.require_column(parent_column)?;
        let source = KeySource::resolve(table, self.options.key_column.as_deref())?;
        let lookup = KeyLookup::build(table, source, parent_idx)?;

        let mut flattened = table.clone();
        let mut generated = Vec::new();
        let mut current: Vec<CellValue> = table
            .rows
            .iter()
            .map(|row| row.cells[parent_idx].clone())
            .collect();

        for generation in 1.. {
            let probe: Vec<CellValue> = current.iter().map(|key| lookup.get(key)).collect();
            let open = probe.iter().filter(|v| !v.is_null()).count();
            trace!(generation, open, "probed ancestor generation");
            if open == 0 {
                break;
            }

            if let Some(limit) = self.options.max_generations {
                if generation > limit {
                    return Err(Error::GenerationLimitExceeded { limit });
                }
            }
            // An acyclic chain visits each key at most once
            if generation > lookup.len() {
                let key = probe
                    .iter()
                    .find(|v| !v.is_null())
                    .map(|v| v.to_string())
                    .unwrap_or_default();
                return Err(Error::CyclicHierarchy { key });
            }

            let name = format!("{}_{}", parent_column, generation);
            if flattened.column_index(&name).is_some() {
                return Err(Error::DuplicateColumns(vec![name]));
            }
            flattened.set_column(&name, probe.clone())?;
            generated.push(name);
            current = probe;
        }

        debug!(
            parent_column,
            generations = generated.len(),
            rows = flattened.row_count(),
            "flattened hierarchy"
        );
        Ok((flattened, generated))
    }
}

/// Flatten the hierarchy described by `parent_column`.
///
/// See [`HierarchyFlattener::flatten`]. Returns a new table; the input is untouched.
pub fn flatten_hierarchy(
    table: &Table,
    parent_column: &str,
    options: &FlattenOptions,
) -> Result<Table> {
    HierarchyFlattener::new(options.clone()).flatten(table, parent_column)
}
