//! Row decoding for the sqlx backends.
//!
//! Decoding is two-phase:
//! 1. `TypeCategory` classifies the column's declared type name
//! 2. a backend-specific decoder extracts a [`SqlValue`] for that category
//!
//! Values only become JSON afterwards, in [`crate::db::serialize`].

use crate::db::serialize::serialize_row;
use crate::models::{DriverType, ResultRow, SqlValue};
use sqlx::mysql::{MySqlRow, MySqlTypeInfo, MySqlValueRef};
use sqlx::error::BoxDynError;
use sqlx::postgres::types::PgInterval;
use sqlx::postgres::{PgRow, PgTypeInfo, PgValueFormat, PgValueRef};
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, ColumnIndex, Decode, Row, Type, TypeInfo, ValueRef};
use std::fmt::Write as _;

// =============================================================================
// Type Classification
// =============================================================================

/// Logical category for database column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Integer,
    Float,
    Decimal,
    Boolean,
    Text,
    Binary,
    Json,
    Uuid,
    Date,
    Time,
    Timestamp,
    TimestampTz,
    Unknown,
}

/// Classify a database type name into a logical category.
pub fn categorize_type(type_name: &str, driver: DriverType) -> TypeCategory {
    let lower = type_name.to_lowercase();

    // Decimal/Numeric - check first as it overlaps with "numeric" in float checks
    if lower.contains("decimal") || lower.contains("numeric") {
        // SQLite's NUMERIC is actually a float
        if driver == DriverType::SQLite && lower == "numeric" {
            return TypeCategory::Float;
        }
        return TypeCategory::Decimal;
    }

    // SQLite stores dates and times as text
    if driver != DriverType::SQLite {
        if lower == "timestamptz" || lower.contains("with time zone") {
            return if lower.starts_with("time ") {
                TypeCategory::Unknown
            } else {
                TypeCategory::TimestampTz
            };
        }
        // MySQL TIMESTAMP is stored in UTC
        if lower == "timestamp" && driver == DriverType::MySQL {
            return TypeCategory::TimestampTz;
        }
        if lower.starts_with("timestamp") || lower == "datetime" {
            return TypeCategory::Timestamp;
        }
        if lower == "date" {
            return TypeCategory::Date;
        }
        if lower == "time" {
            return TypeCategory::Time;
        }
    }

    // "interval" and "point" contain "int"
    if lower.contains("interval") || lower.contains("point") {
        return TypeCategory::Unknown;
    }

    // Integer types
    if lower.contains("int") || lower.contains("serial") {
        return TypeCategory::Integer;
    }

    // Boolean
    if lower == "bool" || lower == "boolean" {
        return TypeCategory::Boolean;
    }

    // Float types
    if lower.contains("float")
        || lower.contains("double")
        || lower == "real"
        || lower == "float4"
        || lower == "float8"
    {
        return TypeCategory::Float;
    }

    // JSON types
    if lower == "json" || lower == "jsonb" {
        return TypeCategory::Json;
    }

    // UUID (PostgreSQL)
    if lower == "uuid" {
        return TypeCategory::Uuid;
    }

    // Binary types
    if lower.contains("blob") || lower.contains("binary") || lower == "bytea" {
        return TypeCategory::Binary;
    }

    if lower.contains("char") || lower.contains("text") || lower.contains("clob") {
        return TypeCategory::Text;
    }

    TypeCategory::Unknown
}

// =============================================================================
// Decimal Type Support
// =============================================================================

/// Raw DECIMAL text, for MySQL values outside `rust_decimal`'s range.
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

/// PostgreSQL NUMERIC as decimal text, for values `rust_decimal` cannot
/// hold: more than 28 significant digits, `NaN` and the infinities.
#[derive(Debug)]
pub struct PgNumericText(pub String);

impl Type<sqlx::Postgres> for PgNumericText {
    fn type_info() -> PgTypeInfo {
        <rust_decimal::Decimal as Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &PgTypeInfo) -> bool {
        ty.name().eq_ignore_ascii_case("numeric")
    }
}

impl<'r> Decode<'r, sqlx::Postgres> for PgNumericText {
    fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
        match value.format() {
            PgValueFormat::Text => Ok(PgNumericText(value.as_str()?.to_string())),
            PgValueFormat::Binary => numeric_binary_to_string(value.as_bytes()?).map(PgNumericText),
        }
    }
}

const NUMERIC_POS: u16 = 0x0000;
const NUMERIC_NEG: u16 = 0x4000;
const NUMERIC_NAN: u16 = 0xC000;
const NUMERIC_PINF: u16 = 0xD000;
const NUMERIC_NINF: u16 = 0xF000;

/// Render the binary NUMERIC wire format as decimal text.
///
/// Layout: `ndigits`, `weight`, `sign`, `dscale` (2 bytes each, big-endian)
/// followed by `ndigits` base-10000 digits. `weight` is the power of 10000
/// of the first digit; `dscale` is the number of decimal places to print.
pub fn numeric_binary_to_string(buf: &[u8]) -> Result<String, BoxDynError> {
    let word = |i: usize| -> Result<u16, BoxDynError> {
        buf.get(i..i + 2)
            .map(|b| u16::from_be_bytes([b[0], b[1]]))
            .ok_or_else(|| "truncated NUMERIC value".into())
    };

    let ndigits = usize::from(word(0)?);
    let weight = i64::from(word(2)? as i16);
    let sign = word(4)?;
    let dscale = usize::from(word(6)?);

    match sign {
        NUMERIC_NAN => return Ok("NaN".to_string()),
        NUMERIC_PINF => return Ok("Infinity".to_string()),
        NUMERIC_NINF => return Ok("-Infinity".to_string()),
        NUMERIC_POS | NUMERIC_NEG => {}
        other => return Err(format!("invalid NUMERIC sign: {other:#06x}").into()),
    }

    let digits = (0..ndigits)
        .map(|i| word(8 + 2 * i))
        .collect::<Result<Vec<u16>, _>>()?;
    if let Some(bad) = digits.iter().find(|d| **d > 9999) {
        return Err(format!("invalid NUMERIC digit: {bad}").into());
    }
    let digit_at = |pos: i64| -> u16 {
        usize::try_from(pos)
            .ok()
            .and_then(|i| digits.get(i).copied())
            .unwrap_or(0)
    };

    let mut out = String::new();
    if sign == NUMERIC_NEG && !digits.is_empty() {
        out.push('-');
    }
    if weight < 0 {
        out.push('0');
    } else {
        for pos in 0..=weight {
            let d = digit_at(pos);
            if pos == 0 {
                let _ = write!(out, "{d}");
            } else {
                let _ = write!(out, "{d:04}");
            }
        }
    }

    if dscale > 0 {
        let mut frac = String::with_capacity(dscale + 4);
        let mut pos = weight + 1;
        while frac.len() < dscale {
            let _ = write!(frac, "{:04}", digit_at(pos));
            pos += 1;
        }
        frac.truncate(dscale);
        out.push('.');
        out.push_str(&frac);
    }
    Ok(out)
}

/// Numbers beyond `rust_decimal` still serialize as JSON floats; anything
/// unparsable stays text.
fn numeric_text_value(text: String) -> SqlValue {
    match text.parse::<f64>() {
        Ok(f) => SqlValue::Float(f),
        Err(_) => SqlValue::Text(text),
    }
}

/// Render an INTERVAL as an ISO 8601 duration, e.g. `P1Y2M3DT4H5M6.5S`.
pub fn interval_to_iso8601(interval: &PgInterval) -> String {
    let mut out = String::from("P");
    let (years, months) = (interval.months / 12, interval.months % 12);
    if years != 0 {
        let _ = write!(out, "{years}Y");
    }
    if months != 0 {
        let _ = write!(out, "{months}M");
    }
    if interval.days != 0 {
        let _ = write!(out, "{}D", interval.days);
    }

    let micros = interval.microseconds;
    if micros != 0 {
        out.push('T');
        let hours = micros / 3_600_000_000;
        let minutes = (micros % 3_600_000_000) / 60_000_000;
        let rest = micros % 60_000_000;
        if hours != 0 {
            let _ = write!(out, "{hours}H");
        }
        if minutes != 0 {
            let _ = write!(out, "{minutes}M");
        }
        if rest != 0 {
            let sign = if rest < 0 { "-" } else { "" };
            let rest = rest.unsigned_abs();
            let _ = write!(out, "{sign}{}", rest / 1_000_000);
            let frac = rest % 1_000_000;
            if frac != 0 {
                let digits = format!("{frac:06}");
                let _ = write!(out, ".{}", digits.trim_end_matches('0'));
            }
            out.push('S');
        }
    }

    if out == "P" {
        out.push_str("T0S");
    }
    out
}

// =============================================================================
// Row Decoding Trait
// =============================================================================

/// Decode a driver row into backend-neutral values.
pub trait RowDecode {
    fn column_names(&self) -> Vec<String>;
    fn decode_values(&self) -> Vec<SqlValue>;
}

/// Decode and serialize a batch of rows.
pub fn rows_to_result<R: RowDecode>(rows: &[R]) -> Vec<ResultRow> {
    let Some(first) = rows.first() else {
        return Vec::new();
    };
    let columns = first.column_names();
    rows.iter()
        .map(|row| serialize_row(row.decode_values(), &columns))
        .collect()
}

fn column_names<R: Row>(row: &R) -> Vec<String> {
    row.columns().iter().map(|c| c.name().to_string()).collect()
}

/// Try one Rust type for a column. `None` means the type did not fit.
fn decode_as<'r, R, T>(row: &'r R, idx: usize, wrap: impl FnOnce(T) -> SqlValue) -> Option<SqlValue>
where
    R: Row,
    usize: ColumnIndex<R>,
    T: Decode<'r, R::Database> + Type<R::Database>,
{
    match row.try_get::<Option<T>, _>(idx) {
        Ok(Some(v)) => Some(wrap(v)),
        Ok(None) => Some(SqlValue::Null),
        Err(_) => None,
    }
}

fn undecodable(driver: DriverType, type_name: &str, idx: usize) -> SqlValue {
    tracing::debug!(
        driver = %driver,
        column = idx,
        type_name,
        "Column type could not be decoded, returning null"
    );
    SqlValue::Null
}

impl RowDecode for MySqlRow {
    fn column_names(&self) -> Vec<String> {
        column_names(self)
    }

    fn decode_values(&self) -> Vec<SqlValue> {
        self.columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                let type_name = col.type_info().name();
                let category = categorize_type(type_name, DriverType::MySQL);
                mysql::decode_column(self, idx, type_name, category)
            })
            .collect()
    }
}

impl RowDecode for PgRow {
    fn column_names(&self) -> Vec<String> {
        column_names(self)
    }

    fn decode_values(&self) -> Vec<SqlValue> {
        self.columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                let type_name = col.type_info().name();
                let category = categorize_type(type_name, DriverType::PostgreSQL);
                postgres::decode_column(self, idx, type_name, category)
            })
            .collect()
    }
}

impl RowDecode for SqliteRow {
    fn column_names(&self) -> Vec<String> {
        column_names(self)
    }

    fn decode_values(&self) -> Vec<SqlValue> {
        self.columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                let type_name = col.type_info().name();
                let category = categorize_type(type_name, DriverType::SQLite);
                sqlite::decode_column(self, idx, type_name, category)
            })
            .collect()
    }
}

// =============================================================================
// Database-Specific Decoders
// =============================================================================

mod mysql {
    use super::*;

    pub fn decode_column(
        row: &MySqlRow,
        idx: usize,
        type_name: &str,
        category: TypeCategory,
    ) -> SqlValue {
        let value = match category {
            TypeCategory::Decimal => decode_as(row, idx, SqlValue::Decimal)
                .or_else(|| decode_as(row, idx, |v: RawDecimal| SqlValue::Text(v.0))),
            TypeCategory::Integer => decode_integer(row, idx),
            TypeCategory::Boolean => decode_as(row, idx, SqlValue::Bool),
            TypeCategory::Float => decode_as(row, idx, SqlValue::Float)
                .or_else(|| decode_as(row, idx, |v: f32| SqlValue::Float(v.into()))),
            TypeCategory::Binary => decode_as(row, idx, SqlValue::Bytes),
            TypeCategory::Json => decode_as(row, idx, SqlValue::Json),
            TypeCategory::Date => decode_as(row, idx, SqlValue::Date),
            TypeCategory::Time => decode_as(row, idx, SqlValue::Time),
            TypeCategory::Timestamp => {
                decode_as(row, idx, SqlValue::Timestamp)
            }
            TypeCategory::TimestampTz => {
                decode_as(row, idx, SqlValue::TimestampTz)
            }
            _ => decode_as(row, idx, SqlValue::Text)
                .or_else(|| decode_as(row, idx, SqlValue::Bytes)),
        };
        value.unwrap_or_else(|| undecodable(DriverType::MySQL, type_name, idx))
    }

    fn decode_integer(row: &MySqlRow, idx: usize) -> Option<SqlValue> {
        // Signed first, then unsigned (BIGINT UNSIGNED does not fit i64)
        decode_as(row, idx, |v: i8| SqlValue::Int(v.into()))
            .or_else(|| decode_as(row, idx, |v: i16| SqlValue::Int(v.into())))
            .or_else(|| decode_as(row, idx, |v: i32| SqlValue::Int(v.into())))
            .or_else(|| decode_as(row, idx, SqlValue::Int))
            .or_else(|| decode_as(row, idx, |v: u8| SqlValue::Int(v.into())))
            .or_else(|| decode_as(row, idx, |v: u16| SqlValue::Int(v.into())))
            .or_else(|| decode_as(row, idx, |v: u32| SqlValue::Int(v.into())))
            .or_else(|| decode_as(row, idx, SqlValue::UInt))
    }
}

mod postgres {
    use super::*;

    pub fn decode_column(
        row: &PgRow,
        idx: usize,
        type_name: &str,
        category: TypeCategory,
    ) -> SqlValue {
        let value = match category {
            TypeCategory::Decimal => decode_as(row, idx, SqlValue::Decimal)
                .or_else(|| decode_as(row, idx, |v: PgNumericText| numeric_text_value(v.0))),
            TypeCategory::Integer => decode_as(row, idx, |v: i16| SqlValue::Int(v.into()))
                .or_else(|| decode_as(row, idx, |v: i32| SqlValue::Int(v.into())))
                .or_else(|| decode_as(row, idx, SqlValue::Int)),
            TypeCategory::Boolean => decode_as(row, idx, SqlValue::Bool),
            TypeCategory::Float => decode_as(row, idx, SqlValue::Float)
                .or_else(|| decode_as(row, idx, |v: f32| SqlValue::Float(v.into()))),
            TypeCategory::Binary => decode_as(row, idx, SqlValue::Bytes),
            TypeCategory::Json => decode_as(row, idx, SqlValue::Json),
            TypeCategory::Uuid => {
                decode_as(row, idx, |v: sqlx::types::Uuid| SqlValue::Text(v.to_string()))
            }
            TypeCategory::Date => decode_as(row, idx, SqlValue::Date),
            TypeCategory::Time => decode_as(row, idx, SqlValue::Time),
            TypeCategory::Timestamp => {
                decode_as(row, idx, SqlValue::Timestamp)
            }
            TypeCategory::TimestampTz => {
                decode_as(row, idx, SqlValue::TimestampTz)
            }
            _ => decode_as(row, idx, SqlValue::Text)
                .or_else(|| decode_as(row, idx, |v: PgInterval| {
                    SqlValue::Text(interval_to_iso8601(&v))
                }))
                .or_else(|| decode_as(row, idx, |v: Vec<String>| SqlValue::Json(v.into())))
                .or_else(|| decode_as(row, idx, |v: Vec<i64>| SqlValue::Json(v.into())))
                .or_else(|| decode_as(row, idx, |v: Vec<i32>| SqlValue::Json(v.into())))
                .or_else(|| decode_as(row, idx, |v: Vec<f64>| SqlValue::Json(v.into())))
                .or_else(|| decode_as(row, idx, |v: Vec<bool>| SqlValue::Json(v.into()))),
        };
        value
            .or_else(|| decode_text_format(row, idx))
            .unwrap_or_else(|| undecodable(DriverType::PostgreSQL, type_name, idx))
    }

    /// Unparameterized queries come back in the text wire format, so any
    /// type without a decoder above can still be passed through verbatim.
    fn decode_text_format(row: &PgRow, idx: usize) -> Option<SqlValue> {
        let raw = row.try_get_raw(idx).ok()?;
        if raw.is_null() {
            return Some(SqlValue::Null);
        }
        match raw.format() {
            PgValueFormat::Text => raw.as_str().ok().map(|s| SqlValue::Text(s.to_string())),
            PgValueFormat::Binary => None,
        }
    }
}

mod sqlite {
    use super::*;

    pub fn decode_column(
        row: &SqliteRow,
        idx: usize,
        type_name: &str,
        category: TypeCategory,
    ) -> SqlValue {
        let value = match category {
            TypeCategory::Integer => decode_as(row, idx, SqlValue::Int),
            TypeCategory::Boolean => decode_as(row, idx, SqlValue::Bool),
            TypeCategory::Float | TypeCategory::Decimal => decode_as(row, idx, SqlValue::Float),
            TypeCategory::Binary => decode_as(row, idx, SqlValue::Bytes),
            _ => None,
        };
        // Declared types are advisory in SQLite, so fall back on storage class
        value
            .or_else(|| decode_as(row, idx, SqlValue::Int))
            .or_else(|| decode_as(row, idx, SqlValue::Float))
            .or_else(|| decode_as(row, idx, SqlValue::Text))
            .or_else(|| decode_as(row, idx, SqlValue::Bytes))
            .unwrap_or_else(|| undecodable(DriverType::SQLite, type_name, idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorize_type_integer() {
        assert_eq!(
            categorize_type("INT", DriverType::MySQL),
            TypeCategory::Integer
        );
        assert_eq!(
            categorize_type("BIGINT", DriverType::PostgreSQL),
            TypeCategory::Integer
        );
        assert_eq!(
            categorize_type("TINYINT", DriverType::MySQL),
            TypeCategory::Integer
        );
        assert_eq!(
            categorize_type("SERIAL", DriverType::PostgreSQL),
            TypeCategory::Integer
        );
    }

    #[test]
    fn test_categorize_type_decimal() {
        assert_eq!(
            categorize_type("DECIMAL", DriverType::MySQL),
            TypeCategory::Decimal
        );
        assert_eq!(
            categorize_type("NUMERIC", DriverType::PostgreSQL),
            TypeCategory::Decimal
        );
        // SQLite NUMERIC is a float
        assert_eq!(
            categorize_type("numeric", DriverType::SQLite),
            TypeCategory::Float
        );
    }

    #[test]
    fn test_categorize_type_temporal() {
        assert_eq!(
            categorize_type("DATE", DriverType::PostgreSQL),
            TypeCategory::Date
        );
        assert_eq!(
            categorize_type("TIME", DriverType::MySQL),
            TypeCategory::Time
        );
        assert_eq!(
            categorize_type("TIMESTAMP", DriverType::PostgreSQL),
            TypeCategory::Timestamp
        );
        assert_eq!(
            categorize_type("TIMESTAMPTZ", DriverType::PostgreSQL),
            TypeCategory::TimestampTz
        );
        assert_eq!(
            categorize_type("TIMESTAMP", DriverType::MySQL),
            TypeCategory::TimestampTz
        );
        assert_eq!(
            categorize_type("DATETIME", DriverType::MySQL),
            TypeCategory::Timestamp
        );
        assert_eq!(
            categorize_type("TIMETZ", DriverType::PostgreSQL),
            TypeCategory::Unknown
        );
    }

    #[test]
    fn test_categorize_sqlite_dates_as_text() {
        assert_eq!(
            categorize_type("DATETIME", DriverType::SQLite),
            TypeCategory::Unknown
        );
        assert_eq!(
            categorize_type("DATE", DriverType::SQLite),
            TypeCategory::Unknown
        );
    }

    #[test]
    fn test_categorize_interval_is_not_integer() {
        assert_eq!(
            categorize_type("INTERVAL", DriverType::PostgreSQL),
            TypeCategory::Unknown
        );
        assert_eq!(
            categorize_type("POINT", DriverType::PostgreSQL),
            TypeCategory::Unknown
        );
    }

    #[test]
    fn test_categorize_type_json() {
        assert_eq!(
            categorize_type("json", DriverType::PostgreSQL),
            TypeCategory::Json
        );
        assert_eq!(
            categorize_type("jsonb", DriverType::PostgreSQL),
            TypeCategory::Json
        );
    }

    #[test]
    fn test_categorize_type_text() {
        assert_eq!(
            categorize_type("VARCHAR", DriverType::MySQL),
            TypeCategory::Text
        );
        assert_eq!(
            categorize_type("TEXT", DriverType::SQLite),
            TypeCategory::Text
        );
    }

    /// Build a binary NUMERIC payload from its header and base-10000 digits.
    fn numeric(weight: i16, sign: u16, dscale: u16, digits: &[u16]) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&(digits.len() as u16).to_be_bytes());
        buf.extend_from_slice(&weight.to_be_bytes());
        buf.extend_from_slice(&sign.to_be_bytes());
        buf.extend_from_slice(&dscale.to_be_bytes());
        for d in digits {
            buf.extend_from_slice(&d.to_be_bytes());
        }
        buf
    }

    #[test]
    fn test_numeric_binary_large_integer() {
        // 1e30 = 100 * 10000^7
        let buf = numeric(7, NUMERIC_POS, 0, &[100]);
        let text = numeric_binary_to_string(&buf).unwrap();
        assert_eq!(text, format!("1{}", "0".repeat(30)));
        assert_eq!(numeric_text_value(text), SqlValue::Float(1e30));
    }

    #[test]
    fn test_numeric_binary_fractions() {
        // -12.5 with two decimal places
        let buf = numeric(0, NUMERIC_NEG, 2, &[12, 5000]);
        assert_eq!(numeric_binary_to_string(&buf).unwrap(), "-12.50");
        // 0.00000001
        let buf = numeric(-2, NUMERIC_POS, 8, &[1]);
        assert_eq!(numeric_binary_to_string(&buf).unwrap(), "0.00000001");
        let buf = numeric(0, NUMERIC_POS, 0, &[]);
        assert_eq!(numeric_binary_to_string(&buf).unwrap(), "0");
    }

    #[test]
    fn test_numeric_binary_special_values() {
        let nan = numeric_binary_to_string(&numeric(0, NUMERIC_NAN, 0, &[])).unwrap();
        assert_eq!(nan, "NaN");
        assert!(matches!(numeric_text_value(nan), SqlValue::Float(f) if f.is_nan()));

        let inf = numeric_binary_to_string(&numeric(0, NUMERIC_PINF, 0, &[])).unwrap();
        assert_eq!(numeric_text_value(inf), SqlValue::Float(f64::INFINITY));
        let ninf = numeric_binary_to_string(&numeric(0, NUMERIC_NINF, 0, &[])).unwrap();
        assert_eq!(numeric_text_value(ninf), SqlValue::Float(f64::NEG_INFINITY));
    }

    #[test]
    fn test_numeric_binary_rejects_malformed() {
        assert!(numeric_binary_to_string(&[0, 1]).is_err());
        // header says one digit, none follow
        let mut truncated = numeric(0, NUMERIC_POS, 0, &[1]);
        truncated.truncate(8);
        assert!(numeric_binary_to_string(&truncated).is_err());
        assert!(numeric_binary_to_string(&numeric(0, NUMERIC_POS, 0, &[10_000])).is_err());
        assert!(numeric_binary_to_string(&numeric(0, 0x1234, 0, &[1])).is_err());
    }

    #[test]
    fn test_interval_iso8601() {
        let interval = PgInterval {
            months: 14,
            days: 3,
            microseconds: 14_706_500_000,
        };
        assert_eq!(interval_to_iso8601(&interval), "P1Y2M3DT4H5M6.5S");

        let zero = PgInterval {
            months: 0,
            days: 0,
            microseconds: 0,
        };
        assert_eq!(interval_to_iso8601(&zero), "PT0S");

        let negative = PgInterval {
            months: 0,
            days: 0,
            microseconds: -1_500_000,
        };
        assert_eq!(interval_to_iso8601(&negative), "PT-1.5S");
    }
}
