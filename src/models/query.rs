//! Query-related data models.
//!
//! Inbound parameters, backend-native scalar values and serialized rows.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Default row limit for `execute_query` results.
pub const DEFAULT_ROW_LIMIT: usize = 100;

/// Maximum allowed row limit for `execute_query`.
pub const MAX_ROW_LIMIT: usize = 1000;

/// Default row limit for `get_sample_data`.
pub const DEFAULT_SAMPLE_LIMIT: usize = 10;

/// Maximum allowed row limit for `get_sample_data`.
pub const MAX_SAMPLE_LIMIT: usize = 100;

/// Upper bound on the length of a text parameter, in characters.
pub const MAX_PARAM_CHARS: usize = 10_000;

/// A parameter value for parameterized queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum SqlParam {
    /// NULL value
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Floating point value
    Float(f64),
    /// String value
    String(String),
}

impl SqlParam {
    /// Get the type name of this parameter for debugging.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
        }
    }
}

impl From<&str> for SqlParam {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for SqlParam {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<i64> for SqlParam {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

/// A backend-native scalar, decoded from a result column but not yet
/// serialized. Never leaves the adapter layer.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Decimal(Decimal),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
    Bytes(Vec<u8>),
    Text(String),
    Json(JsonValue),
}

/// One result row: column name to serialized value, in the backend's column
/// order.
pub type ResultRow = serde_json::Map<String, JsonValue>;
