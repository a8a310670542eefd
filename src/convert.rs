//! Per-cell type conversions

use std::borrow::Cow;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use indexmap::IndexMap;
use tracing::debug;

use crate::error::Error;
use crate::model::{CellValue, Table};

/// Target of a column conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConversionKind {
    /// Int when the value is integral, Float otherwise
    Number,
    Integer,
    Float,
    Signed,
    /// Integral values that are not negative become Int; others stay numbers
    Unsigned,
    /// Same as `DateTime`: strings, dates and epoch numbers become UTC timestamps
    Date,
    DateTime,
}

impl FromStr for ConversionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "number" => Ok(ConversionKind::Number),
            "integer" => Ok(ConversionKind::Integer),
            "float" => Ok(ConversionKind::Float),
            "signed" => Ok(ConversionKind::Signed),
            "unsigned" => Ok(ConversionKind::Unsigned),
            "date" => Ok(ConversionKind::Date),
            "datetime" => Ok(ConversionKind::DateTime),
            _ => Err(Error::UnknownConversion(s.to_string())),
        }
    }
}

/// Unit of epoch numbers converted to dates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeUnit {
    Seconds,
    Milliseconds,
    Microseconds,
    #[default]
    Nanoseconds,
}

impl TimeUnit {
    fn per_second(self) -> i64 {
        match self {
            TimeUnit::Seconds => 1,
            TimeUnit::Milliseconds => 1_000,
            TimeUnit::Microseconds => 1_000_000,
            TimeUnit::Nanoseconds => 1_000_000_000,
        }
    }
}

impl FromStr for TimeUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "s" => Ok(TimeUnit::Seconds),
            "ms" => Ok(TimeUnit::Milliseconds),
            "us" => Ok(TimeUnit::Microseconds),
            "ns" => Ok(TimeUnit::Nanoseconds),
            _ => Err(Error::UnknownTimeUnit(s.to_string())),
        }
    }
}

/// Which columns are converted to what
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeMapping {
    columns: IndexMap<ConversionKind, Vec<String>>,
    units: IndexMap<String, TimeUnit>,
}

impl TypeMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert `columns` to `kind`
    pub fn with<S: Into<String>>(
        mut self,
        kind: ConversionKind,
        columns: impl IntoIterator<Item = S>,
    ) -> Self {
        self.columns
            .entry(kind)
            .or_default()
            .extend(columns.into_iter().map(Into::into));
        self
    }

    /// Read epoch numbers of `column` in `unit`
    pub fn with_unit(mut self, column: impl Into<String>, unit: TimeUnit) -> Self {
        self.units.insert(column.into(), unit);
        self
    }

    /// Kinds in the order they were added
    pub fn kinds(&self) -> impl Iterator<Item = ConversionKind> + '_ {
        self.columns.keys().copied()
    }

    /// Columns mapped to `kind`
    pub fn columns(&self, kind: ConversionKind) -> &[String] {
        self.columns.get(&kind).map(Vec::as_slice).unwrap_or_default()
    }

    fn unit(&self, column: &str) -> TimeUnit {
        self.units.get(column).copied().unwrap_or_default()
    }
}

/// The i64 equal to `f`, if there is one
fn integral(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

fn to_number(value: &CellValue) -> CellValue {
    match value {
        CellValue::Int(_) | CellValue::Float(_) => value.clone(),
        CellValue::Bool(b) => CellValue::Int(i64::from(*b)),
        CellValue::String(s) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i64>() {
                CellValue::Int(i)
            } else if let Ok(f) = s.parse::<f64>() {
                CellValue::Float(f)
            } else {
                CellValue::Null
            }
        }
        _ => CellValue::Null,
    }
}

fn to_integer(value: &CellValue, unsigned: bool) -> CellValue {
    let number = to_number(value);
    let int = match number {
        CellValue::Int(i) => Some(i),
        CellValue::Float(f) => integral(f),
        _ => None,
    };
    match int {
        Some(i) if !unsigned || i >= 0 => CellValue::Int(i),
        _ => number,
    }
}

fn to_float(value: &CellValue) -> CellValue {
    match to_number(value) {
        CellValue::Int(i) => CellValue::Float(i as f64),
        number => number,
    }
}

/// Epoch count in `unit` to a UTC datetime
fn from_epoch(value: i64, unit: TimeUnit) -> Option<NaiveDateTime> {
    let per_second = unit.per_second();
    let secs = value.div_euclid(per_second);
    let nanos = value.rem_euclid(per_second) * (1_000_000_000 / per_second);
    let nanos = u32::try_from(nanos).ok()?;
    DateTime::from_timestamp(secs, nanos).map(|dt| dt.naive_utc())
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }
    for format in ["%Y-%m-%d", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return Some(date.and_time(NaiveTime::MIN));
        }
    }
    None
}

fn to_datetime(value: &CellValue, unit: TimeUnit) -> Option<NaiveDateTime> {
    match value {
        CellValue::DateTime(dt) => Some(*dt),
        CellValue::Date(d) => Some(d.and_time(NaiveTime::MIN)),
        CellValue::Int(i) => from_epoch(*i, unit),
        CellValue::Float(f) => {
            let scaled = f * (1_000_000_000 / unit.per_second()) as f64;
            from_epoch(integral(scaled.round())?, TimeUnit::Nanoseconds)
        }
        CellValue::String(s) => parse_datetime(s),
        _ => None,
    }
}

fn convert_cell(value: &CellValue, kind: ConversionKind, unit: TimeUnit) -> CellValue {
    if value.is_null() {
        return CellValue::Null;
    }
    match kind {
        ConversionKind::Number => to_number(value),
        ConversionKind::Integer | ConversionKind::Signed => to_integer(value, false),
        ConversionKind::Unsigned => to_integer(value, true),
        ConversionKind::Float => to_float(value),
        ConversionKind::Date | ConversionKind::DateTime => to_datetime(value, unit)
            .map(CellValue::DateTime)
            .unwrap_or(CellValue::Null),
    }
}

/// Convert the mapped columns, coercing values that cannot be converted to null.
///
/// Only `kinds` are applied, in the given order; an empty slice applies every
/// kind of the mapping. Mapped columns missing from the table are skipped.
pub fn convert_to_type(table: &Table, mapping: &TypeMapping, kinds: &[ConversionKind]) -> Table {
    let kinds: Vec<ConversionKind> = if kinds.is_empty() {
        mapping.kinds().collect()
    } else {
        kinds.to_vec()
    };

    let mut out = table.clone();
    let mut converted = 0usize;
    for kind in kinds {
        for column in mapping.columns(kind) {
            let Some(col_idx) = out.column_index(column) else {
                continue;
            };
            let unit = mapping.unit(column);
            for row in &mut out.rows {
                row.cells[col_idx] = convert_cell(&row.cells[col_idx], kind, unit);
            }
            out.columns[col_idx].inferred_type = Default::default();
            for row in &out.rows {
                out.columns[col_idx].observe(&row.cells[col_idx]);
            }
            converted += 1;
        }
    }

    debug!(columns = converted, rows = out.row_count(), "converted columns");
    out
}

/// Replace NaN floats with null
pub fn clear_nan(table: &Table) -> Table {
    let mut out = table.clone();
    for cell in out.rows.iter_mut().flat_map(|row| row.cells.iter_mut()) {
        if matches!(cell, CellValue::Float(f) if f.is_nan()) {
            *cell = CellValue::Null;
        }
    }
    out
}

/// Cut strings in the given columns to at most the given number of characters.
///
/// Other cells and absent columns are left alone.
pub fn truncate_strings(table: &Table, lengths: &[(&str, usize)]) -> Table {
    let mut out = table.clone();
    for &(column, max_chars) in lengths {
        let Some(col_idx) = out.column_index(column) else {
            continue;
        };
        for row in &mut out.rows {
            let truncated = match &row.cells[col_idx] {
                CellValue::String(s) => s
                    .char_indices()
                    .nth(max_chars)
                    .map(|(end, _)| s[..end].to_string()),
                _ => None,
            };
            if let Some(truncated) = truncated {
                row.cells[col_idx] = CellValue::String(Cow::Owned(truncated));
            }
        }
    }
    out
}
