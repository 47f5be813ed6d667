//! Conversion of JSON documents into tables.

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::FetchError;
use crate::table::{Cell, Table};

/// Parse a JSON document into a table.
pub fn table_from_slice(bytes: &[u8]) -> Result<Table, FetchError> {
    let value: Value = serde_json::from_slice(bytes).map_err(|e| FetchError::Json(e.to_string()))?;
    table_from_value(value)
}

/// Convert a JSON value into a table.
///
/// Accepts either an array of objects (one object per row; columns are the
/// union of keys in first-seen order, absent keys become null) or an object
/// mapping column names to equal-length arrays.
pub fn table_from_value(value: Value) -> Result<Table, FetchError> {
    match value {
        Value::Array(items) => from_records(items),
        Value::Object(columns) => from_columns(columns),
        other => Err(FetchError::Json(format!(
            "expected an array of records or an object of columns, got {}",
            type_name(&other)
        ))),
    }
}

fn from_records(items: Vec<Value>) -> Result<Table, FetchError> {
    let mut headers: IndexMap<String, ()> = IndexMap::new();
    let mut records = Vec::with_capacity(items.len());

    for (index, item) in items.into_iter().enumerate() {
        match item {
            Value::Object(map) => {
                for key in map.keys() {
                    headers.entry(key.clone()).or_insert(());
                }
                records.push(map);
            }
            other => {
                return Err(FetchError::Json(format!(
                    "record {} is {}, expected an object",
                    index,
                    type_name(&other)
                )));
            }
        }
    }

    let headers: Vec<String> = headers.into_keys().collect();
    let rows = records
        .into_iter()
        .map(|mut record| {
            headers
                .iter()
                .map(|h| record.remove(h).map(json_cell).unwrap_or(Cell::Null))
                .collect()
        })
        .collect();

    Ok(Table::new(headers, rows))
}

fn from_columns(columns: serde_json::Map<String, Value>) -> Result<Table, FetchError> {
    let mut headers = Vec::with_capacity(columns.len());
    let mut values: Vec<Vec<Value>> = Vec::with_capacity(columns.len());

    for (name, column) in columns {
        match column {
            Value::Array(items) => {
                headers.push(name);
                values.push(items);
            }
            other => {
                return Err(FetchError::Json(format!(
                    "column '{}' is {}, expected an array",
                    name,
                    type_name(&other)
                )));
            }
        }
    }

    let row_count = values.first().map(Vec::len).unwrap_or(0);
    if let Some(pos) = values.iter().position(|v| v.len() != row_count) {
        return Err(FetchError::Json(format!(
            "column '{}' has {} values, expected {}",
            headers[pos],
            values[pos].len(),
            row_count
        )));
    }

    let mut columns: Vec<_> = values.into_iter().map(Vec::into_iter).collect();
    let rows = (0..row_count)
        .map(|_| {
            columns
                .iter_mut()
                .map(|col| col.next().map(json_cell).unwrap_or(Cell::Null))
                .collect()
        })
        .collect();

    Ok(Table::new(headers, rows))
}

/// Map a JSON scalar to a cell. Nested values are kept as compact JSON text.
fn json_cell(value: Value) -> Cell {
    match value {
        Value::Null => Cell::Null,
        Value::Number(n) => n.as_f64().map(Cell::number).unwrap_or(Cell::Null),
        Value::String(s) => Cell::Text(s),
        Value::Bool(b) => Cell::Text(b.to_string()),
        nested => Cell::Text(nested.to_string()),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
