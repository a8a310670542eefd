//! Row index and key handling utilities

use std::cmp::Ordering;
use std::fmt;

use rustc_hash::FxHashMap;

use super::table::{CellValue, Row, Table};
use crate::error::{Error, Result};

/// Row provenance: one value per index level.
///
/// A plain index has a single component; composite indices carry one
/// component per level. Values are not required to be unique within a table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RowIndex(Vec<CellValue>);

impl RowIndex {
    /// Single-level index value
    pub fn scalar(value: impl Into<CellValue>) -> Self {
        Self(vec![value.into()])
    }

    /// Multi-level index value
    pub fn composite(components: Vec<CellValue>) -> Self {
        Self(components)
    }

    /// Index components in level order
    pub fn components(&self) -> &[CellValue] {
        &self.0
    }

    /// Number of index levels
    pub fn arity(&self) -> usize {
        self.0.len()
    }

    /// The index as a single join key.
    ///
    /// A single-level index yields its value, a composite one a list of its
    /// components.
    pub fn as_key(&self) -> CellValue {
        match self.0.as_slice() {
            [single] => single.clone(),
            components => CellValue::List(components.to_vec()),
        }
    }

    pub(crate) fn into_components(self) -> Vec<CellValue> {
        self.0
    }
}

impl Ord for RowIndex {
    fn cmp(&self, other: &Self) -> Ordering {
        for (a, b) in self.0.iter().zip(&other.0) {
            match a.total_cmp(b) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        self.0.len().cmp(&other.0.len())
    }
}

impl PartialOrd for RowIndex {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for RowIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_slice() {
            [single] => write!(f, "{}", single),
            components => {
                let parts: Vec<_> = components.iter().map(|c| c.display()).collect();
                write!(f, "({})", parts.join(", "))
            }
        }
    }
}

impl From<CellValue> for RowIndex {
    fn from(value: CellValue) -> Self {
        Self::scalar(value)
    }
}

impl From<i64> for RowIndex {
    fn from(value: i64) -> Self {
        Self::scalar(value)
    }
}

impl From<&str> for RowIndex {
    fn from(value: &str) -> Self {
        Self::scalar(value)
    }
}

/// Where a row's identifying key is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    /// The row index (see [`RowIndex::as_key`])
    Index,
    /// A regular column, by position
    Column(usize),
}

impl KeySource {
    /// Resolve an optional key column name against a table
    pub fn resolve(table: &Table, key_column: Option<&str>) -> Result<Self> {
        match key_column {
            Some(name) => Ok(KeySource::Column(table.require_column(name)?)),
            None => Ok(KeySource::Index),
        }
    }

    /// Key of a row
    pub fn key_of(&self, row: &Row) -> CellValue {
        match self {
            KeySource::Index => row.index.as_key(),
            KeySource::Column(i) => row.get(*i).cloned().unwrap_or(CellValue::Null),
        }
    }
}

/// Hash lookup from a row key to one cell of that row.
///
/// This is the right-hand side of a left self-join: probing with a value that
/// has no matching key yields null.
#[derive(Debug)]
pub struct KeyLookup {
    values: FxHashMap<CellValue, CellValue>,
}

impl KeyLookup {
    /// Index `value_column` of every row by its key.
    ///
    /// Rows with a null key are never matched. Fails on duplicated keys.
    pub fn build(table: &Table, source: KeySource, value_column: usize) -> Result<Self> {
        let mut values = FxHashMap::default();
        values.reserve(table.row_count());

        for row in &table.rows {
            let key = source.key_of(row);
            if key.is_null() {
                continue;
            }
            let value = row.get(value_column).cloned().unwrap_or(CellValue::Null);
            let display = key.to_string();
            if values.insert(key, value).is_some() {
                return Err(Error::DuplicateKey(display));
            }
        }

        Ok(Self { values })
    }

    /// Value stored for `key`, or null when absent
    pub fn get(&self, key: &CellValue) -> CellValue {
        if key.is_null() {
            return CellValue::Null;
        }
        self.values.get(key).cloned().unwrap_or(CellValue::Null)
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
