//! Type normalization
//!
//! Converts native [`Value`]s into the four value kinds a JSON document can
//! hold. Every native value has a mapping; values JSON cannot express natively
//! fall back to a string.

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use chrono::SecondsFormat;
use docdump_core::Value;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A normalized, JSON-representable value
///
/// Serializes as the bare JSON value (`null`, `true`, `42`, `1.5`, `"text"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocValue {
    Null,
    Bool(bool),
    Integer(i64),
    /// Always finite
    Float(f64),
    String(String),
}

impl DocValue {
    pub fn is_null(&self) -> bool {
        matches!(self, DocValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DocValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            DocValue::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

/// How binary values are rendered as text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinaryEncoding {
    /// Standard base64 alphabet with padding
    #[default]
    Base64,
    /// Lower-case hexadecimal
    Hex,
    /// `"<N bytes>"`, the content is dropped
    Placeholder,
}

impl BinaryEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryEncoding::Base64 => "base64",
            BinaryEncoding::Hex => "hex",
            BinaryEncoding::Placeholder => "placeholder",
        }
    }
}

impl FromStr for BinaryEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "base64" => Ok(BinaryEncoding::Base64),
            "hex" => Ok(BinaryEncoding::Hex),
            "placeholder" | "length" => Ok(BinaryEncoding::Placeholder),
            other => Err(format!(
                "unknown binary encoding '{}' (expected base64, hex or placeholder)",
                other
            )),
        }
    }
}

impl std::fmt::Display for BinaryEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings that apply to every value of one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeOptions {
    pub binary: BinaryEncoding,
}

impl NormalizeOptions {
    pub fn with_binary(mut self, binary: BinaryEncoding) -> Self {
        self.binary = binary;
        self
    }
}

fn float_special_label(value: f64) -> &'static str {
    if value.is_nan() {
        "NaN"
    } else if value.is_sign_positive() {
        "Infinity"
    } else {
        "-Infinity"
    }
}

/// Normalize one native value. Pure and infallible.
pub fn normalize(value: &Value, options: &NormalizeOptions) -> DocValue {
    match value {
        Value::Null => DocValue::Null,
        Value::Bool(b) => DocValue::Bool(*b),
        Value::Int64(i) => DocValue::Integer(*i),
        Value::Float64(f) if f.is_finite() => DocValue::Float(*f),
        Value::Float64(f) => DocValue::String(float_special_label(*f).to_string()),
        Value::Decimal(d) => DocValue::String(d.clone()),
        Value::String(s) => DocValue::String(s.clone()),
        Value::Bytes(bytes) => DocValue::String(encode_binary(bytes, options.binary)),
        Value::Date(d) => DocValue::String(d.format("%Y-%m-%d").to_string()),
        Value::Time(t) => DocValue::String(t.format("%H:%M:%S%.f").to_string()),
        Value::DateTime(dt) => DocValue::String(dt.format("%Y-%m-%d %H:%M:%S%.f").to_string()),
        Value::DateTimeUtc(dt) => {
            DocValue::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
        }
        Value::Json(json) => DocValue::String(json.to_string()),
        Value::Array(items) => {
            let normalized: Vec<DocValue> = items.iter().map(|v| normalize(v, options)).collect();
            DocValue::String(
                serde_json::to_string(&normalized).unwrap_or_else(|_| value.to_string()),
            )
        }
    }
}

fn encode_binary(bytes: &[u8], encoding: BinaryEncoding) -> String {
    match encoding {
        BinaryEncoding::Base64 => BASE64.encode(bytes),
        BinaryEncoding::Hex => hex::encode(bytes),
        BinaryEncoding::Placeholder => format!("<{} bytes>", bytes.len()),
    }
}
