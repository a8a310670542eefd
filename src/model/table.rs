//! Table, Row, and Cell data structures

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::key::RowIndex;
use super::schema::Column;
use crate::error::{Error, Result};

/// A dynamically typed cell value
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(Cow<'static, str>),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    List(Vec<CellValue>),
    Map(IndexMap<String, CellValue>),
}

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CellValue::Null, CellValue::Null) => true,
            (CellValue::Bool(a), CellValue::Bool(b)) => a == b,
            (CellValue::Int(a), CellValue::Int(b)) => a == b,
            (CellValue::Float(a), CellValue::Float(b)) => {
                // Handle NaN comparison
                if a.is_nan() && b.is_nan() {
                    true
                } else {
                    a == b
                }
            }
            (CellValue::String(a), CellValue::String(b)) => a == b,
            (CellValue::Date(a), CellValue::Date(b)) => a == b,
            (CellValue::DateTime(a), CellValue::DateTime(b)) => a == b,
            (CellValue::List(a), CellValue::List(b)) => a == b,
            (CellValue::Map(a), CellValue::Map(b)) => a == b,
            // Cross-type numbers are equal only when the float is exactly that integer
            (CellValue::Int(a), CellValue::Float(b)) => integral(*b) == Some(*a),
            (CellValue::Float(a), CellValue::Int(b)) => integral(*a) == Some(*b),
            _ => false,
        }
    }
}

impl Eq for CellValue {}

impl Hash for CellValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Integral floats hash like the equal Int so numeric keys join across types
        match self {
            CellValue::Null => 0u8.hash(state),
            CellValue::Bool(b) => {
                1u8.hash(state);
                b.hash(state);
            }
            CellValue::Int(i) => {
                2u8.hash(state);
                i.hash(state);
            }
            CellValue::Float(f) => match integral(*f) {
                Some(i) => {
                    2u8.hash(state);
                    i.hash(state);
                }
                None if f.is_nan() => {
                    3u8.hash(state);
                    f64::NAN.to_bits().hash(state);
                }
                None => {
                    3u8.hash(state);
                    f.to_bits().hash(state);
                }
            },
            CellValue::String(s) => {
                4u8.hash(state);
                s.hash(state);
            }
            CellValue::Date(d) => {
                5u8.hash(state);
                d.hash(state);
            }
            CellValue::DateTime(dt) => {
                6u8.hash(state);
                dt.hash(state);
            }
            CellValue::List(items) => {
                7u8.hash(state);
                items.hash(state);
            }
            // Map equality ignores key order, so only the size is hashed
            CellValue::Map(map) => {
                8u8.hash(state);
                map.len().hash(state);
            }
        }
    }
}

/// The i64 equal to `f`, if there is one
fn integral(f: f64) -> Option<i64> {
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

/// Exact order of an integer against a float, without rounding the integer
fn cmp_int_float(i: i64, f: f64) -> Ordering {
    if f.is_nan() {
        return (i as f64).total_cmp(&f);
    }
    if f >= i64::MAX as f64 {
        return Ordering::Less;
    }
    if f < i64::MIN as f64 {
        return Ordering::Greater;
    }
    let whole = f.trunc();
    match i.cmp(&(whole as i64)) {
        Ordering::Equal if f > whole => Ordering::Less,
        Ordering::Equal if f < whole => Ordering::Greater,
        ord => ord,
    }
}

impl CellValue {
    /// Check if the value is null. NaN floats count as null.
    pub fn is_null(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    /// Borrow the elements of a list cell
    pub fn as_list(&self) -> Option<&[CellValue]> {
        match self {
            CellValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Borrow the entries of a map cell
    pub fn as_map(&self) -> Option<&IndexMap<String, CellValue>> {
        match self {
            CellValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Borrow the text of a string cell
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Convert to a display string
    pub fn display(&self) -> Cow<'_, str> {
        match self {
            CellValue::Null => Cow::Borrowed("NULL"),
            CellValue::Bool(b) => Cow::Owned(b.to_string()),
            CellValue::Int(i) => Cow::Owned(i.to_string()),
            CellValue::Float(f) => Cow::Owned(f.to_string()),
            CellValue::String(s) => Cow::Borrowed(s.as_ref()),
            CellValue::Date(d) => Cow::Owned(d.to_string()),
            CellValue::DateTime(dt) => Cow::Owned(dt.to_string()),
            CellValue::List(items) => {
                let parts: Vec<_> = items.iter().map(|v| v.display()).collect();
                Cow::Owned(format!("[{}]", parts.join(", ")))
            }
            CellValue::Map(map) => {
                let parts: Vec<_> = map
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k, v.display()))
                    .collect();
                Cow::Owned(format!("{{{}}}", parts.join(", ")))
            }
        }
    }

    fn rank(&self) -> u8 {
        match self {
            CellValue::Null => 0,
            CellValue::Bool(_) => 1,
            CellValue::Int(_) | CellValue::Float(_) => 2,
            CellValue::String(_) => 3,
            CellValue::Date(_) | CellValue::DateTime(_) => 4,
            CellValue::List(_) => 5,
            CellValue::Map(_) => 6,
        }
    }

    /// Total order used to sort indices.
    ///
    /// Values of different kinds order as null, bool, number, string,
    /// date/datetime, list, map. Numbers compare across Int and Float.
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (CellValue::Bool(a), CellValue::Bool(b)) => a.cmp(b),
            (CellValue::Int(a), CellValue::Int(b)) => a.cmp(b),
            (CellValue::Float(a), CellValue::Float(b)) => {
                if a.is_nan() && b.is_nan() {
                    Ordering::Equal
                } else {
                    // -0.0 and 0.0 are equal, as they are under `==`
                    a.partial_cmp(b).unwrap_or_else(|| a.total_cmp(b))
                }
            }
            (CellValue::Int(a), CellValue::Float(b)) => cmp_int_float(*a, *b),
            (CellValue::Float(a), CellValue::Int(b)) => cmp_int_float(*b, *a).reverse(),
            (CellValue::String(a), CellValue::String(b)) => a.cmp(b),
            (CellValue::Date(a), CellValue::Date(b)) => a.cmp(b),
            (CellValue::DateTime(a), CellValue::DateTime(b)) => a.cmp(b),
            (CellValue::Date(a), CellValue::DateTime(b)) => {
                a.and_time(NaiveTime::MIN).cmp(b).then(Ordering::Less)
            }
            (CellValue::DateTime(a), CellValue::Date(b)) => {
                a.cmp(&b.and_time(NaiveTime::MIN)).then(Ordering::Greater)
            }
            (CellValue::List(a), CellValue::List(b)) => {
                for (x, y) in a.iter().zip(b) {
                    match x.total_cmp(y) {
                        Ordering::Equal => continue,
                        ord => return ord,
                    }
                }
                a.len().cmp(&b.len())
            }
            (CellValue::Map(a), CellValue::Map(b)) => {
                let mut left: Vec<_> = a.iter().collect();
                let mut right: Vec<_> = b.iter().collect();
                left.sort_by(|x, y| x.0.cmp(y.0));
                right.sort_by(|x, y| x.0.cmp(y.0));
                for ((ka, va), (kb, vb)) in left.iter().zip(&right) {
                    match ka.cmp(kb).then_with(|| va.total_cmp(vb)) {
                        Ordering::Equal => continue,
                        ord => return ord,
                    }
                }
                left.len().cmp(&right.len())
            }
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(Cow::Owned(s.to_string()))
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(Cow::Owned(s))
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Int(i)
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::Float(f)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(d: NaiveDate) -> Self {
        CellValue::Date(d)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(dt: NaiveDateTime) -> Self {
        CellValue::DateTime(dt)
    }
}

impl<T> From<Vec<T>> for CellValue
where
    T: Into<CellValue>,
{
    fn from(items: Vec<T>) -> Self {
        CellValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T> From<Option<T>> for CellValue
where
    T: Into<CellValue>,
{
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => CellValue::Null,
        }
    }
}

/// A row in the table
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Index value identifying the row's source record
    pub index: RowIndex,
    /// Cell values in column order
    pub cells: Vec<CellValue>,
}

impl Row {
    /// Create a new row
    pub fn new(index: RowIndex, cells: Vec<CellValue>) -> Self {
        Self { index, cells }
    }

    /// Get a cell value by column index
    pub fn get(&self, index: usize) -> Option<&CellValue> {
        self.cells.get(index)
    }
}

/// An indexed table of dynamically typed cells
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Column definitions
    pub columns: Vec<Column>,
    /// All rows in the table
    pub rows: Vec<Row>,
    /// Name of each index level; the length is the index arity
    pub index_names: Vec<Option<String>>,
}

impl Table {
    /// Create a new empty table with a single unnamed index level
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
            index_names: vec![None],
        }
    }

    /// Create an empty table from column labels
    pub fn with_columns<S: AsRef<str>>(names: &[S]) -> Self {
        Self::new(names.iter().map(|n| Column::new(n.as_ref())).collect())
    }

    /// Replace the index level names (and with them the index arity)
    pub fn with_index_names(mut self, names: Vec<Option<String>>) -> Self {
        self.index_names = names;
        self
    }

    /// An empty table with the same index levels and the given columns
    pub(crate) fn empty_like(&self, columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
            index_names: self.index_names.clone(),
        }
    }

    /// Number of index levels
    pub fn index_arity(&self) -> usize {
        self.index_names.len()
    }

    /// Add a row with an explicit index
    pub fn add_row(&mut self, index: RowIndex, cells: Vec<CellValue>) -> Result<()> {
        if index.arity() != self.index_arity() {
            return Err(Error::RowArity {
                expected: self.index_arity(),
                found: index.arity(),
            });
        }
        if cells.len() != self.column_count() {
            return Err(Error::RowArity {
                expected: self.column_count(),
                found: cells.len(),
            });
        }
        for (column, cell) in self.columns.iter_mut().zip(&cells) {
            column.observe(cell);
        }
        self.rows.push(Row::new(index, cells));
        Ok(())
    }

    /// Add a row indexed by its position
    pub fn push_row(&mut self, cells: Vec<CellValue>) -> Result<()> {
        let position = i64::try_from(self.rows.len()).unwrap_or(i64::MAX);
        self.add_row(RowIndex::scalar(position), cells)
    }

    /// Get column index by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Get column index by name, failing when absent
    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))
    }

    /// Get column by name
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Column labels in order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Row indices in row order
    pub fn indices(&self) -> impl Iterator<Item = &RowIndex> {
        self.rows.iter().map(|r| &r.index)
    }

    /// Cell at a row position and column label
    pub fn cell(&self, row: usize, column: &str) -> Option<&CellValue> {
        let col_idx = self.column_index(column)?;
        self.rows.get(row)?.get(col_idx)
    }

    /// Clone out every value of a column
    pub fn column_values(&self, name: &str) -> Result<Vec<CellValue>> {
        let col_idx = self.require_column(name)?;
        Ok(self
            .rows
            .iter()
            .map(|r| r.cells[col_idx].clone())
            .collect())
    }

    /// Overwrite a column, or append it if it does not exist yet
    pub fn set_column(&mut self, name: &str, values: Vec<CellValue>) -> Result<()> {
        if values.len() != self.row_count() {
            return Err(Error::RowArity {
                expected: self.row_count(),
                found: values.len(),
            });
        }

        let mut column = Column::new(name);
        for value in &values {
            column.observe(value);
        }

        match self.column_index(name) {
            Some(col_idx) => {
                self.columns[col_idx] = column;
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.cells[col_idx] = value;
                }
            }
            None => {
                self.columns.push(column);
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.cells.push(value);
                }
            }
        }
        Ok(())
    }

    /// Remove columns by label; absent labels are ignored
    pub fn drop_columns<S: AsRef<str>>(&mut self, names: &[S]) {
        let keep: Vec<bool> = self
            .columns
            .iter()
            .map(|c| !names.iter().any(|n| n.as_ref() == c.name))
            .collect();
        if keep.iter().all(|k| *k) {
            return;
        }

        let mut flags = keep.iter();
        self.columns.retain(|_| *flags.next().unwrap_or(&true));
        for row in &mut self.rows {
            let mut flags = keep.iter();
            row.cells.retain(|_| *flags.next().unwrap_or(&true));
        }
    }

    /// Stable sort of rows by index
    pub fn sort_by_index(&mut self) {
        self.rows.sort_by(|a, b| a.index.cmp(&b.index));
    }

    /// Stable sort of rows by a column
    pub fn sort_by_column(&mut self, column_name: &str) {
        if let Some(col_idx) = self.column_index(column_name) {
            self.rows
                .sort_by(|a, b| a.cells[col_idx].total_cmp(&b.cells[col_idx]));
        }
    }

    /// Move columns into the index, replacing the current one
    pub fn set_index<S: AsRef<str>>(&self, columns: &[S]) -> Result<Table> {
        let positions = columns
            .iter()
            .map(|c| self.require_column(c.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        let kept: Vec<Column> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(i, _)| !positions.contains(i))
            .map(|(_, c)| c.clone())
            .collect();
        let names = columns
            .iter()
            .map(|c| Some(c.as_ref().to_string()))
            .collect();
        let mut table = Table::new(kept).with_index_names(names);

        for row in &self.rows {
            let index = positions.iter().map(|&i| row.cells[i].clone()).collect();
            let cells = row
                .cells
                .iter()
                .enumerate()
                .filter(|(i, _)| !positions.contains(i))
                .map(|(_, c)| c.clone())
                .collect();
            table.rows.push(Row::new(RowIndex::composite(index), cells));
        }
        Ok(table)
    }

    /// Move the index levels back into leading columns and index by position.
    ///
    /// Unnamed levels become `index` (single level) or `level_{n}`.
    pub fn reset_index(&self) -> Table {
        let single = self.index_arity() == 1;
        let mut columns: Vec<Column> = self
            .index_names
            .iter()
            .enumerate()
            .map(|(i, name)| match name {
                Some(name) => Column::new(name.clone()),
                None if single => Column::new("index"),
                None => Column::new(format!("level_{}", i)),
            })
            .collect();
        columns.extend(self.columns.iter().cloned());

        let mut table = Table::new(columns);
        for (position, row) in self.rows.iter().enumerate() {
            let mut cells = row.index.clone().into_components();
            cells.extend(row.cells.iter().cloned());
            for (column, cell) in table.columns.iter_mut().zip(&cells) {
                column.observe(cell);
            }
            let position = i64::try_from(position).unwrap_or(i64::MAX);
            table.rows.push(Row::new(RowIndex::scalar(position), cells));
        }
        table
    }

    /// Apply a transformation to this table, for chaining
    pub fn pipe<T, F>(&self, f: F) -> T
    where
        F: FnOnce(&Table) -> T,
    {
        f(self)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut builder = tabled::builder::Builder::default();

        let headers = self
            .index_names
            .iter()
            .map(|n| n.clone().unwrap_or_default())
            .chain(self.columns.iter().map(|c| c.name.clone()));
        builder.push_record(headers);

        for row in &self.rows {
            let record = row
                .index
                .components()
                .iter()
                .chain(&row.cells)
                .map(|c| c.display().into_owned());
            builder.push_record(record);
        }

        let mut grid = builder.build();
        grid.with(tabled::settings::Style::psql());
        write!(f, "{}", grid)
    }
}
