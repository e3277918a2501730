//! Result values and the MySQL column decoders that produce them.
//!
//! # Architecture
//!
//! Type conversion uses a two-phase approach:
//! 1. `TypeCategory` classifies column types into logical categories
//! 2. A per-category decoder extracts the value into a [`SqlValue`]
//!
//! Anything a decoder cannot make sense of is read back as raw bytes and
//! rendered as lossy UTF-8, so no column is ever dropped from a row.

use crate::error::{DbError, DbResult};
use sqlx::mysql::{MySqlRow, MySqlTypeInfo, MySqlValueRef};
use sqlx::{Column, Decode, Row, Type, TypeInfo, ValueRef};
use std::collections::HashMap;
use std::fmt;

/// A single decoded cell.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    Int(i64),
    UInt(u64),
    Float(f64),
    Null,
}

impl SqlValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Binary payloads are rendered as text; invalid sequences become U+FFFD.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self::Text(String::from_utf8_lossy(bytes).into_owned())
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Int(v) => write!(f, "{}", v),
            Self::UInt(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Null => f.write_str("NULL"),
        }
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u64> for SqlValue {
    fn from(value: u64) -> Self {
        Self::UInt(value)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(SqlValue::Null)
    }
}

/// One result row keyed by column name. When two columns share a name, the
/// later one wins.
pub type SqlRow = HashMap<String, SqlValue>;

/// Rows returned by a query together with their column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<SqlRow>,
}

impl ResultSet {
    pub fn new(columns: Vec<String>, rows: Vec<SqlRow>) -> Self {
        Self { columns, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Look up a cell, failing when the row has no such column.
    pub fn get(&self, row: usize, column: &str) -> DbResult<&SqlValue> {
        self.rows
            .get(row)
            .ok_or_else(|| DbError::internal(format!("Row index {} out of bounds", row)))?
            .get(column)
            .ok_or_else(|| DbError::missing_field(column))
    }
}

/// Outcome of a statement that does not return rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecOutcome {
    pub rows_affected: u64,
    pub last_insert_id: Option<u64>,
}

// =============================================================================
// Type Classification
// =============================================================================

/// Logical category for MySQL column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Integer,
    Float,
    Decimal,
    Temporal,
    Binary,
    Text,
}

/// Classify a MySQL type name (as reported by the driver) into a category.
pub fn categorize_type(type_name: &str) -> TypeCategory {
    let lower = type_name.to_lowercase();

    if lower.contains("decimal") || lower.contains("numeric") {
        return TypeCategory::Decimal;
    }

    // The driver names every TINYINT(1) column BOOLEAN, whatever it stores.
    if lower.contains("int") || lower == "bool" || lower == "boolean" {
        return TypeCategory::Integer;
    }

    if lower.contains("float") || lower.contains("double") || lower == "real" {
        return TypeCategory::Float;
    }

    if matches!(
        lower.as_str(),
        "date" | "datetime" | "timestamp" | "time" | "year"
    ) {
        return TypeCategory::Temporal;
    }

    // Binary-collated strings (common in SHOW output) report as VARBINARY/BLOB.
    if lower.contains("blob") || lower.contains("binary") || lower == "bit" {
        return TypeCategory::Binary;
    }

    TypeCategory::Text
}

// =============================================================================
// Decimal Type Support
// =============================================================================

/// Wrapper type for raw DECIMAL values as strings.
/// This preserves the exact database representation.
#[derive(Debug)]
pub struct RawDecimal(pub String);

impl Type<sqlx::MySql> for RawDecimal {
    fn type_info() -> MySqlTypeInfo {
        <String as Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &MySqlTypeInfo) -> bool {
        let name = ty.name().to_lowercase();
        name.contains("decimal") || name.contains("numeric")
    }
}

impl<'r> Decode<'r, sqlx::MySql> for RawDecimal {
    fn decode(value: MySqlValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as Decode<sqlx::MySql>>::decode(value)?;
        Ok(RawDecimal(s.to_string()))
    }
}

// =============================================================================
// Row Decoding
// =============================================================================

/// Column names of a row, in result order.
pub fn column_names(row: &MySqlRow) -> Vec<String> {
    row.columns().iter().map(|c| c.name().to_string()).collect()
}

/// Decode every column of a MySQL row into a name-keyed map.
pub fn decode_row(row: &MySqlRow) -> SqlRow {
    row.columns()
        .iter()
        .enumerate()
        .map(|(idx, col)| {
            let category = categorize_type(col.type_info().name());
            (col.name().to_string(), mysql::decode_column(row, idx, category))
        })
        .collect()
}

/// `YYYY-MM-DD HH:MM:SS`, followed by fractional seconds when there are any.
pub fn format_datetime(value: &chrono::NaiveDateTime) -> String {
    value.format("%Y-%m-%d %H:%M:%S%.f").to_string()
}

mod mysql {
    use super::*;

    pub fn decode_column(row: &MySqlRow, idx: usize, category: TypeCategory) -> SqlValue {
        // Check NULL first
        if row.try_get_raw(idx).map(|v| v.is_null()).unwrap_or(false) {
            return SqlValue::Null;
        }

        let decoded = match category {
            TypeCategory::Decimal => decode_decimal(row, idx),
            TypeCategory::Integer => decode_integer(row, idx),
            TypeCategory::Float => decode_float(row, idx),
            TypeCategory::Temporal => decode_temporal(row, idx),
            TypeCategory::Binary => None,
            TypeCategory::Text => decode_text(row, idx),
        };

        decoded.unwrap_or_else(|| decode_lossy(row, idx))
    }

    fn decode_decimal(row: &MySqlRow, idx: usize) -> Option<SqlValue> {
        match row.try_get::<RawDecimal, _>(idx) {
            Ok(v) => Some(SqlValue::Text(v.0)),
            Err(e) => {
                tracing::debug!(column = idx, error = %e, "DECIMAL decode fell back to raw bytes");
                None
            }
        }
    }

    fn decode_integer(row: &MySqlRow, idx: usize) -> Option<SqlValue> {
        if let Ok(v) = row.try_get::<i64, _>(idx) {
            return Some(SqlValue::Int(v));
        }
        // BIGINT UNSIGNED beyond i64::MAX
        row.try_get::<u64, _>(idx).ok().map(SqlValue::UInt)
    }

    fn decode_float(row: &MySqlRow, idx: usize) -> Option<SqlValue> {
        if let Ok(v) = row.try_get::<f64, _>(idx) {
            return Some(SqlValue::Float(v));
        }
        row.try_get::<f32, _>(idx)
            .ok()
            .map(|v| SqlValue::Float(f64::from(v)))
    }

    fn decode_temporal(row: &MySqlRow, idx: usize) -> Option<SqlValue> {
        use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

        if let Ok(v) = row.try_get::<NaiveDateTime, _>(idx) {
            return Some(SqlValue::Text(format_datetime(&v)));
        }
        if let Ok(v) = row.try_get::<DateTime<Utc>, _>(idx) {
            return Some(SqlValue::Text(format_datetime(&v.naive_utc())));
        }
        if let Ok(v) = row.try_get::<NaiveDate, _>(idx) {
            return Some(SqlValue::Text(v.to_string()));
        }
        if let Ok(v) = row.try_get::<NaiveTime, _>(idx) {
            return Some(SqlValue::Text(v.to_string()));
        }
        None
    }

    fn decode_text(row: &MySqlRow, idx: usize) -> Option<SqlValue> {
        row.try_get::<String, _>(idx).ok().map(SqlValue::Text)
    }

    /// Last resort: the raw column bytes as lossy UTF-8.
    fn decode_lossy(row: &MySqlRow, idx: usize) -> SqlValue {
        match row.try_get_unchecked::<Option<Vec<u8>>, _>(idx) {
            Ok(Some(bytes)) => SqlValue::from_bytes(&bytes),
            Ok(None) => SqlValue::Null,
            Err(e) => {
                tracing::error!(column = idx, error = %e, "Failed to decode column");
                SqlValue::Null
            }
        }
    }
}
