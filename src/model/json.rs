//! Conversion between tables and JSON records

use std::borrow::Cow;

use indexmap::IndexSet;
use serde_json::{Map, Number, Value};

use super::schema::Column;
use super::table::{CellValue, Table};
use crate::error::{Error, Result};

impl CellValue {
    /// Convert a JSON value to a cell.
    ///
    /// Arrays and objects become list and map cells. Strings that look like
    /// dates or datetimes are parsed as such.
    pub fn from_json(value: &Value) -> CellValue {
        match value {
            Value::Null => CellValue::Null,
            Value::Bool(b) => CellValue::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    CellValue::Int(i)
                } else if let Some(f) = n.as_f64() {
                    CellValue::Float(f)
                } else {
                    CellValue::String(Cow::Owned(n.to_string()))
                }
            }
            Value::String(s) => {
                if let Ok(date) = chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                    return CellValue::Date(date);
                }
                if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
                    return CellValue::DateTime(dt);
                }
                if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
                    return CellValue::DateTime(dt);
                }
                CellValue::String(Cow::Owned(s.clone()))
            }
            Value::Array(items) => {
                CellValue::List(items.iter().map(CellValue::from_json).collect())
            }
            Value::Object(obj) => CellValue::Map(
                obj.iter()
                    .map(|(k, v)| (k.clone(), CellValue::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Convert a cell to a JSON value. NaN floats become null.
    pub fn to_json(&self) -> Value {
        match self {
            CellValue::Null => Value::Null,
            CellValue::Bool(b) => Value::Bool(*b),
            CellValue::Int(i) => Value::Number((*i).into()),
            CellValue::Float(f) => Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            CellValue::String(s) => Value::String(s.to_string()),
            CellValue::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
            CellValue::DateTime(dt) => Value::String(dt.format("%Y-%m-%dT%H:%M:%S").to_string()),
            CellValue::List(items) => Value::Array(items.iter().map(CellValue::to_json).collect()),
            CellValue::Map(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect::<Map<String, Value>>(),
            ),
        }
    }
}

impl Table {
    /// Build a table from an array of JSON objects (or a single object).
    ///
    /// Columns are the union of all keys in first-seen order; keys missing from
    /// a record are null. Rows are indexed by position.
    pub fn from_json_records(value: &Value) -> Result<Table> {
        let records = match value {
            Value::Array(arr) => arr.as_slice(),
            Value::Object(_) => std::slice::from_ref(value),
            _ => {
                return Err(Error::InvalidRecords(
                    "JSON must be an array or object".to_string(),
                ))
            }
        };

        // Collect all unique keys across all objects to build column list
        let mut column_names: IndexSet<&str> = IndexSet::new();
        for (position, item) in records.iter().enumerate() {
            match item {
                Value::Object(obj) => column_names.extend(obj.keys().map(String::as_str)),
                _ => {
                    return Err(Error::InvalidRecords(format!(
                        "record {} is not an object",
                        position
                    )))
                }
            }
        }

        let columns = column_names.iter().map(|name| Column::new(*name)).collect();
        let mut table = Table::new(columns);

        for item in records {
            if let Value::Object(obj) = item {
                let cells = column_names
                    .iter()
                    .map(|key| obj.get(*key).map_or(CellValue::Null, CellValue::from_json))
                    .collect();
                table.push_row(cells)?;
            }
        }

        Ok(table)
    }

    /// Export rows as an array of JSON objects. The index is not included.
    pub fn to_json_records(&self) -> Value {
        let records = self
            .rows
            .iter()
            .map(|row| {
                let obj: Map<String, Value> = self
                    .columns
                    .iter()
                    .zip(&row.cells)
                    .map(|(column, cell)| (column.name.clone(), cell.to_json()))
                    .collect();
                Value::Object(obj)
            })
            .collect();
        Value::Array(records)
    }
}
