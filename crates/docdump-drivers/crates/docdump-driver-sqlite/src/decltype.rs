//! Declared column types and value conversion
//!
//! SQLite stores values in five storage classes regardless of the type a column
//! was declared with. The declared type (`sqlite3_column_decltype`) is the only
//! hint that a `TEXT` value is a calendar date or that a `REAL` is a fixed-point
//! amount, so conversion looks at both.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use docdump_core::Value;
use rusqlite::types::ValueRef;

/// The handful of declared types that change how a stored value is read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclaredType {
    Boolean,
    Date,
    Time,
    DateTime,
    Decimal { scale: Option<u8> },
    Other,
}

impl DeclaredType {
    /// Classify a declared column type. Expressions and columns without a
    /// declared type are `Other`.
    pub fn parse(decl_type: Option<&str>) -> Self {
        let Some(decl_type) = decl_type else {
            return DeclaredType::Other;
        };
        let upper = decl_type.trim().to_uppercase();
        let base = upper.split('(').next().unwrap_or("").trim();

        match base {
            "BOOLEAN" | "BOOL" => DeclaredType::Boolean,
            "DATE" => DeclaredType::Date,
            "TIME" => DeclaredType::Time,
            "DATETIME" | "TIMESTAMP" => DeclaredType::DateTime,
            "DECIMAL" | "NUMERIC" => DeclaredType::Decimal {
                scale: parse_scale(&upper),
            },
            "MONEY" => DeclaredType::Decimal { scale: Some(2) },
            _ => DeclaredType::Other,
        }
    }

    /// Convert one stored value into a native value
    pub fn convert(self, value: ValueRef<'_>, typed_booleans: bool) -> Value {
        match value {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => match self {
                DeclaredType::Boolean if typed_booleans && (i == 0 || i == 1) => {
                    Value::Bool(i == 1)
                }
                DeclaredType::Decimal { scale } => Value::Decimal(format_decimal_integer(i, scale)),
                _ => Value::Int64(i),
            },
            ValueRef::Real(f) => match self {
                DeclaredType::Decimal { scale } if f.is_finite() => {
                    Value::Decimal(format_decimal_real(f, scale))
                }
                _ => Value::Float64(f),
            },
            ValueRef::Text(bytes) => {
                let text = String::from_utf8_lossy(bytes);
                match self {
                    DeclaredType::Date | DeclaredType::DateTime => parse_temporal(&text),
                    DeclaredType::Time => parse_time(&text),
                    _ => None,
                }
                .unwrap_or_else(|| Value::String(text.into_owned()))
            }
            ValueRef::Blob(bytes) => Value::Bytes(bytes.to_vec()),
        }
    }
}

fn parse_scale(type_str: &str) -> Option<u8> {
    let start = type_str.find('(')?;
    let end = type_str[start..].find(')')? + start;
    type_str[start + 1..end]
        .split(',')
        .nth(1)
        .and_then(|s| s.trim().parse().ok())
}

/// Render an integer stored in a fixed-point column
pub(crate) fn format_decimal_integer(value: i64, scale: Option<u8>) -> String {
    match scale {
        Some(scale) if scale > 0 => format!("{}.{}", value, "0".repeat(scale as usize)),
        _ => value.to_string(),
    }
}

/// Render a real stored in a fixed-point column.
///
/// SQLite does not enforce the declared scale. The value is rendered with
/// exactly `scale` digits only when that differs from the stored float by
/// float noise (`2099.9700000000003` becomes `2099.97`); a value that really
/// carries more digits keeps them, using the shortest representation that
/// reads back to the same float.
pub(crate) fn format_decimal_real(value: f64, scale: Option<u8>) -> String {
    const MAX_ULPS: f64 = 4.0;

    if let Some(scale) = scale {
        let scaled = format!("{:.*}", scale as usize, value);
        if let Ok(parsed) = scaled.parse::<f64>()
            && (parsed - value).abs() <= value.abs() * MAX_ULPS * f64::EPSILON
        {
            return scaled;
        }
    }
    value.to_string()
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"];

/// Whether `text` starts with `shape`, where `d` stands for one ASCII digit.
///
/// chrono accepts one-digit months, days and hours; only zero-padded text is
/// converted so that re-rendering gives back the stored string.
fn matches_shape(text: &str, shape: &str) -> bool {
    text.len() >= shape.len()
        && text
            .bytes()
            .zip(shape.bytes())
            .all(|(c, s)| if s == b'd' { c.is_ascii_digit() } else { c == s })
}

fn parse_temporal(text: &str) -> Option<Value> {
    let text = text.trim();
    if !matches_shape(text, "dddd-dd-dd") {
        return None;
    }
    if text.len() > 10 && !text.get(11..).is_some_and(|time| matches_shape(time, "dd:dd")) {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(Value::Date(date));
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(Value::DateTime(dt));
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(Value::DateTimeUtc(dt.with_timezone(&Utc)));
    }
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(text, format) {
            return Some(Value::DateTimeUtc(dt.with_timezone(&Utc)));
        }
    }
    None
}

fn parse_time(text: &str) -> Option<Value> {
    let text = text.trim();
    if !matches_shape(text, "dd:dd") {
        return None;
    }
    ["%H:%M:%S%.f", "%H:%M"]
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(text, format).ok())
        .map(Value::Time)
}
