//! Value serialization.
//!
//! Converts decoded [`SqlValue`]s into plain JSON. Rules apply in a fixed
//! order: null, decimal, temporal, binary, then pass-through. Serialization
//! never fails.

use crate::models::{ResultRow, SqlValue};
use chrono::{SecondsFormat, Timelike};
use rust_decimal::prelude::ToPrimitive;
use serde_json::{Number, Value as JsonValue};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";
const TIME_FORMAT_MICROS: &str = "%H:%M:%S%.6f";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const TIMESTAMP_FORMAT_MICROS: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Serialize one value.
///
/// # Examples
///
/// ```
/// use db_gateway::db::serialize::serialize;
/// use db_gateway::models::SqlValue;
/// use std::str::FromStr;
///
/// let price = rust_decimal::Decimal::from_str("12.50").unwrap();
/// assert_eq!(serialize(SqlValue::Decimal(price)), serde_json::json!(12.5));
/// ```
pub fn serialize(value: SqlValue) -> JsonValue {
    match value {
        SqlValue::Null => JsonValue::Null,
        SqlValue::Decimal(d) => d
            .to_f64()
            .map(float_to_json)
            .unwrap_or_else(|| JsonValue::String(d.to_string())),
        SqlValue::Date(d) => JsonValue::String(d.format(DATE_FORMAT).to_string()),
        SqlValue::Time(t) => {
            let format = if has_fraction(&t) { TIME_FORMAT_MICROS } else { TIME_FORMAT };
            JsonValue::String(t.format(format).to_string())
        }
        SqlValue::Timestamp(ts) => {
            let format = if has_fraction(&ts) {
                TIMESTAMP_FORMAT_MICROS
            } else {
                TIMESTAMP_FORMAT
            };
            JsonValue::String(ts.format(format).to_string())
        }
        SqlValue::TimestampTz(ts) => {
            let precision = if has_fraction(&ts) {
                SecondsFormat::Micros
            } else {
                SecondsFormat::Secs
            };
            JsonValue::String(ts.to_rfc3339_opts(precision, false))
        }
        SqlValue::Bytes(bytes) => JsonValue::String(decode_bytes(bytes)),
        SqlValue::Bool(b) => JsonValue::Bool(b),
        SqlValue::Int(i) => JsonValue::Number(i.into()),
        SqlValue::UInt(u) => JsonValue::Number(u.into()),
        SqlValue::Float(f) => float_to_json(f),
        SqlValue::Text(s) => JsonValue::String(s),
        SqlValue::Json(v) => v,
    }
}

/// Fractional seconds are printed as exactly six digits, and only when
/// non-zero.
fn has_fraction(t: &impl Timelike) -> bool {
    t.nanosecond() % 1_000_000_000 != 0
}

/// Zip values with their column names, in order.
///
/// Extra values or extra names are dropped.
pub fn serialize_row(values: Vec<SqlValue>, columns: &[String]) -> ResultRow {
    columns
        .iter()
        .cloned()
        .zip(values.into_iter().map(serialize))
        .collect()
}

/// Non-finite floats have no JSON number form, so they become text.
fn float_to_json(f: f64) -> JsonValue {
    Number::from_f64(f)
        .map(JsonValue::Number)
        .unwrap_or_else(|| JsonValue::String(f.to_string()))
}

/// UTF-8 if the bytes are valid, otherwise Latin-1 (every byte maps to a char).
fn decode_bytes(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => e.into_bytes().into_iter().map(char::from).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
    use rust_decimal::Decimal;
    use serde_json::json;
    use std::str::FromStr;

    #[test]
    fn test_null() {
        assert_eq!(serialize(SqlValue::Null), JsonValue::Null);
    }

    #[test]
    fn test_decimal_becomes_float() {
        let d = Decimal::from_str("12.50").unwrap();
        assert_eq!(serialize(SqlValue::Decimal(d)), json!(12.5));
    }

    #[test]
    fn test_date() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(serialize(SqlValue::Date(d)), json!("2024-01-01"));
    }

    #[test]
    fn test_time_with_and_without_fraction() {
        let t = NaiveTime::from_hms_opt(13, 5, 9).unwrap();
        assert_eq!(serialize(SqlValue::Time(t)), json!("13:05:09"));

        let t = NaiveTime::from_hms_micro_opt(13, 5, 9, 250_000).unwrap();
        assert_eq!(serialize(SqlValue::Time(t)), json!("13:05:09.250000"));

        let t = NaiveTime::from_hms_micro_opt(13, 5, 9, 7).unwrap();
        assert_eq!(serialize(SqlValue::Time(t)), json!("13:05:09.000007"));
    }

    #[test]
    fn test_timestamp() {
        let ts = NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();
        assert_eq!(serialize(SqlValue::Timestamp(ts)), json!("2024-03-15T08:30:00"));

        let ts = NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_milli_opt(8, 30, 0, 500)
            .unwrap();
        assert_eq!(
            serialize(SqlValue::Timestamp(ts)),
            json!("2024-03-15T08:30:00.500000")
        );
    }

    #[test]
    fn test_timestamp_tz() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 15, 8, 30, 0).unwrap();
        assert_eq!(
            serialize(SqlValue::TimestampTz(ts)),
            json!("2024-03-15T08:30:00+00:00")
        );

        let ts = ts + chrono::Duration::microseconds(1_250);
        assert_eq!(
            serialize(SqlValue::TimestampTz(ts)),
            json!("2024-03-15T08:30:00.001250+00:00")
        );
    }

    #[test]
    fn test_bytes_utf8() {
        assert_eq!(
            serialize(SqlValue::Bytes(b"hello".to_vec())),
            json!("hello")
        );
    }

    #[test]
    fn test_bytes_invalid_utf8_uses_latin1() {
        let value = serialize(SqlValue::Bytes(vec![0x48, 0xFF, 0xE9]));
        assert_eq!(value, json!("H\u{ff}\u{e9}"));
    }

    #[test]
    fn test_non_finite_float() {
        assert_eq!(serialize(SqlValue::Float(f64::NAN)), json!("NaN"));
        assert_eq!(serialize(SqlValue::Float(f64::INFINITY)), json!("inf"));
    }

    #[test]
    fn test_pass_through() {
        assert_eq!(serialize(SqlValue::Int(-7)), json!(-7));
        assert_eq!(serialize(SqlValue::UInt(u64::MAX)), json!(u64::MAX));
        assert_eq!(serialize(SqlValue::Bool(true)), json!(true));
        assert_eq!(serialize(SqlValue::Text("a".into())), json!("a"));
        assert_eq!(
            serialize(SqlValue::Json(json!({"k": [1, 2]}))),
            json!({"k": [1, 2]})
        );
    }

    #[test]
    fn test_serialize_row_preserves_order() {
        let row = serialize_row(
            vec![SqlValue::Int(1), SqlValue::Text("a".into())],
            &["id".to_string(), "name".to_string()],
        );
        assert_eq!(serde_json::to_string(&row).unwrap(), r#"{"id":1,"name":"a"}"#);
    }

    #[test]
    fn test_serialize_row_column_order_not_alphabetical() {
        let row = serialize_row(
            vec![SqlValue::Int(2), SqlValue::Int(1)],
            &["z".to_string(), "a".to_string()],
        );
        let keys: Vec<&String> = row.keys().collect();
        assert_eq!(keys, ["z", "a"]);
    }
}
