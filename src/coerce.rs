//! Type coercion from source JSON values to typed destination cells
//!
//! Coercion is strict: a value that does not fit its declared column type is
//! an error, never a silent NULL. JSON `null` and missing fields become NULL.

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;
use thiserror::Error;

use crate::ingestion::Row;
use crate::schema::{ColumnType, TableSpec};

/// A single typed value ready to be bound to a statement
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(Option<String>),
    Float(Option<f64>),
    Integer(Option<i32>),
    Boolean(Option<bool>),
    Date(Option<NaiveDate>),
    Json(Option<Value>),
}

impl Cell {
    pub fn null(column_type: ColumnType) -> Self {
        match column_type {
            ColumnType::Text => Cell::Text(None),
            ColumnType::Float => Cell::Float(None),
            ColumnType::Integer => Cell::Integer(None),
            ColumnType::Boolean => Cell::Boolean(None),
            ColumnType::Date => Cell::Date(None),
            ColumnType::Jsonb => Cell::Json(None),
        }
    }

    pub fn is_null(&self) -> bool {
        match self {
            Cell::Text(v) => v.is_none(),
            Cell::Float(v) => v.is_none(),
            Cell::Integer(v) => v.is_none(),
            Cell::Boolean(v) => v.is_none(),
            Cell::Date(v) => v.is_none(),
            Cell::Json(v) => v.is_none(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("row {row}: cannot coerce column '{column}' value {value} to {expected}")]
pub struct CoercionError {
    pub row: usize,
    pub column: String,
    pub expected: ColumnType,
    pub value: String,
}

/// Coerce one JSON value. Returns `None` when the value does not fit.
pub fn coerce_value(value: &Value, column_type: ColumnType) -> Option<Cell> {
    if value.is_null() {
        return Some(Cell::null(column_type));
    }

    match column_type {
        ColumnType::Text => coerce_text(value).map(|s| Cell::Text(Some(s))),
        ColumnType::Float => coerce_float(value).map(|f| Cell::Float(Some(f))),
        ColumnType::Integer => coerce_integer(value).map(|i| Cell::Integer(Some(i))),
        ColumnType::Boolean => coerce_boolean(value).map(|b| Cell::Boolean(Some(b))),
        ColumnType::Date => value.as_str().and_then(|s| parse_date(s.trim())).map(|d| Cell::Date(Some(d))),
        ColumnType::Jsonb => Some(Cell::Json(Some(value.clone()))),
    }
}

fn coerce_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn coerce_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn coerce_integer(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => i32::try_from(i).ok(),
            None => n.as_f64().and_then(integral_f64),
        },
        Value::String(s) => s.trim().parse::<i64>().ok().and_then(|i| i32::try_from(i).ok()),
        _ => None,
    }
}

fn coerce_boolean(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "t" | "1" => Some(true),
            "false" | "f" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn integral_f64(f: f64) -> Option<i32> {
    if f.fract() == 0.0 && f >= i32::MIN as f64 && f <= i32::MAX as f64 {
        Some(f as i32)
    } else {
        None
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}

/// Coerce a source row into cells ordered like `table.columns`.
///
/// `row_number` is 1-based within the run and only used for error reporting.
pub fn coerce_row(row: &Row, table: &TableSpec, row_number: usize) -> Result<Vec<Cell>, CoercionError> {
    let mut cells = Vec::with_capacity(table.columns.len());
    for column in table.columns {
        let cell = match row.get(column.name) {
            None => Cell::null(column.column_type),
            Some(value) => coerce_value(value, column.column_type).ok_or_else(|| CoercionError {
                row: row_number,
                column: column.name.to_string(),
                expected: column.column_type,
                value: preview(value),
            })?,
        };
        cells.push(cell);
    }
    Ok(cells)
}

fn preview(value: &Value) -> String {
    let rendered = value.to_string();
    if rendered.chars().count() > 64 {
        format!("{}...", rendered.chars().take(64).collect::<String>())
    } else {
        rendered
    }
}
