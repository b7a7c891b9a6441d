//! Values, rows and query results

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// A value as read from the store, before normalization
///
/// Drivers pick the most specific variant the store's type information allows;
/// anything they cannot classify arrives as `String` or `Bytes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    /// Only produced when the store distinguishes booleans from integers
    Bool(bool),
    Int64(i64),
    Float64(f64),
    /// Exact decimal text, e.g. `"2099.97"`
    Decimal(String),
    String(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Time(NaiveTime),
    /// Timestamp without zone information
    DateTime(NaiveDateTime),
    /// Timestamp that carried an offset, converted to UTC
    DateTimeUtc(DateTime<Utc>),
    Json(serde_json::Value),
    Array(Vec<Value>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Integer view of the value; numeric strings are parsed
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(i) => Some(*i),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int64(i) => write!(f, "{}", i),
            Value::Float64(x) => write!(f, "{}", x),
            Value::Decimal(s) | Value::String(s) => f.write_str(s),
            Value::Bytes(bytes) => write!(f, "<{} bytes>", bytes.len()),
            Value::Date(d) => write!(f, "{}", d),
            Value::Time(t) => write!(f, "{}", t),
            Value::DateTime(dt) => write!(f, "{}", dt),
            Value::DateTimeUtc(dt) => f.write_str(&dt.to_rfc3339()),
            Value::Json(json) => write!(f, "{}", json),
            Value::Array(items) => write!(f, "[{} items]", items.len()),
        }
    }
}

/// One result-set record: values in column order plus the column names
#[derive(Debug, Clone)]
pub struct Row {
    pub values: Vec<Value>,
    columns: Vec<String>,
}

impl Row {
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        Self { values, columns }
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// First value whose column is called `name`
    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        let idx = self.columns.iter().position(|c| c == name)?;
        self.values.get(idx)
    }

    /// Consume the row into `(column, value)` pairs, keeping column order
    pub fn into_pairs(self) -> impl Iterator<Item = (String, Value)> {
        self.columns.into_iter().zip(self.values)
    }
}

/// Column of a result set
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnMeta {
    pub name: String,
    /// Type as declared in the store's schema (`DYNAMIC` for SQLite expressions)
    #[serde(default)]
    pub data_type: String,
    /// 0-based position
    pub ordinal: usize,
}

/// Rows returned by [`Connection::query`](crate::Connection::query)
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    pub columns: Vec<ColumnMeta>,
    pub rows: Vec<Row>,
    pub execution_time_ms: u64,
}

impl QueryResult {
    pub fn has_rows(&self) -> bool {
        !self.rows.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Outcome of [`Connection::execute`](crate::Connection::execute)
#[derive(Debug, Clone, Copy, Default)]
pub struct StatementResult {
    pub affected_rows: u64,
}
