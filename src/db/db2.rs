//! DB2 adapter over ODBC.
//!
//! The ODBC API is blocking, so every call runs on the blocking thread pool
//! holding a connection checked out of [`ConnectionSlots`]. A connection is
//! used by exactly one caller at a time. Read-only connections run with
//! autocommit off and are rolled back after every operation. Nothing marks
//! the DB2 session itself read-only, so the safety gate is what keeps writes
//! from ever reaching a connection.
//!
//! Requires the IBM DB2 ODBC/CLI driver to be registered with the system
//! driver manager.

use crate::db::adapter::{DatabaseAdapter, run_guarded};
use crate::db::classify::classify;
use crate::db::pool::{ConnectionSlots, SlotGuard};
use crate::db::schema::{queries, table_not_found};
use crate::db::serialize::{serialize, serialize_row};
use crate::error::{DbError, DbResult};
use crate::models::{
    ColumnDescriptor, ConnectionStatus, DatabaseConfig, DriverType, ResultRow, SqlParam, SqlValue,
};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use odbc_api::parameter::{InputParameter, VarCharBox};
use odbc_api::{Connection, ConnectionOptions, Cursor, DataType, Environment, ResultSetMetadata};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::OnceLock;
use tracing::{debug, info, warn};

const DRIVER: DriverType = DriverType::DB2;

type Db2Connection = Connection<'static>;

fn environment() -> DbResult<&'static Environment> {
    static ENV: OnceLock<Environment> = OnceLock::new();
    if let Some(env) = ENV.get() {
        return Ok(env);
    }
    let env = Environment::new().map_err(|e| {
        DbError::driver("Failed to initialize the ODBC environment").with_details(e.to_string())
    })?;
    Ok(ENV.get_or_init(|| env))
}

fn classify_odbc(err: odbc_api::Error) -> DbError {
    classify(&err.to_string(), DRIVER)
}

/// Column names and decoded rows of one result set.
struct Fetched {
    columns: Vec<String>,
    rows: Vec<Vec<SqlValue>>,
}

#[derive(Debug)]
pub struct Db2Adapter {
    config: DatabaseConfig,
    slots: OnceLock<ConnectionSlots<Db2Connection>>,
}

impl Db2Adapter {
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            config,
            slots: OnceLock::new(),
        }
    }

    fn slots(&self) -> DbResult<&ConnectionSlots<Db2Connection>> {
        self.slots
            .get()
            .ok_or_else(|| DbError::connection("DB2 connection pool is not initialized"))
    }

    /// Run `op` on the blocking pool with an exclusively held connection.
    async fn with_connection<T, F>(&self, op: F) -> DbResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Db2Connection) -> DbResult<T> + Send + 'static,
    {
        let guard: SlotGuard<Db2Connection> = self.slots()?.checkout().await?;
        let read_only = self.config.read_only;

        tokio::task::spawn_blocking(move || {
            let result = op(&guard);
            if read_only {
                if let Err(e) = guard.rollback() {
                    warn!(error = %e, "DB2 rollback after read-only operation failed");
                }
            }
            result
        })
        .await
        .map_err(|e| DbError::unknown(format!("DB2 worker task failed: {e}")))?
    }

    async fn connection_status(&self) -> DbResult<ConnectionStatus> {
        self.with_connection(|conn| {
            let dbms = conn.database_management_system_name().map_err(classify_odbc)?;
            let database = conn.current_catalog().ok();
            let schema = first_text(conn, queries::db2::CURRENT_SCHEMA)?.unwrap_or_default();
            let table_count = match first_value(conn, queries::db2::COUNT_TABLES) {
                Ok(Some(SqlValue::Int(n))) => n,
                Ok(_) => 0,
                Err(e) => {
                    debug!(error = %e, "DB2 table count unavailable");
                    0
                }
            };

            let mut status = ConnectionStatus::connected(DRIVER, dbms, database, table_count);
            status.current_schema = Some(schema.trim().to_string());
            Ok(status)
        })
        .await
    }
}

fn to_parameter(param: &SqlParam) -> Box<dyn InputParameter> {
    match param {
        SqlParam::Null => Box::new(VarCharBox::null()),
        // Older DB2 releases have no BOOLEAN type
        SqlParam::Bool(v) => Box::new(i32::from(*v)),
        SqlParam::Int(v) => Box::new(*v),
        SqlParam::Float(v) => Box::new(*v),
        SqlParam::String(v) => Box::new(VarCharBox::from_string(v.clone())),
    }
}

fn is_binary(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Binary { .. } | DataType::Varbinary { .. } | DataType::LongVarbinary { .. }
    )
}

/// Decode the text form ODBC hands back for a column.
fn parse_text(data_type: &DataType, raw: &[u8]) -> SqlValue {
    let text = String::from_utf8_lossy(raw);
    let trimmed = text.trim();
    let parsed = match data_type {
        DataType::TinyInt { .. }
        | DataType::SmallInt { .. }
        | DataType::Integer { .. }
        | DataType::BigInt { .. } => trimmed.parse().ok().map(SqlValue::Int),
        DataType::Numeric { .. } | DataType::Decimal { .. } => {
            Decimal::from_str(trimmed).ok().map(SqlValue::Decimal)
        }
        DataType::Real { .. } | DataType::Float { .. } | DataType::Double { .. } => {
            trimmed.parse().ok().map(SqlValue::Float)
        }
        DataType::Bit { .. } => Some(SqlValue::Bool(trimmed == "1")),
        DataType::Date { .. } => NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .ok()
            .map(SqlValue::Date),
        DataType::Time { .. } => NaiveTime::parse_from_str(trimmed, "%H:%M:%S%.f")
            .ok()
            .map(SqlValue::Time),
        DataType::Timestamp { .. } => {
            NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f")
                .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d-%H.%M.%S%.f"))
                .ok()
                .map(SqlValue::Timestamp)
        }
        _ => None,
    };
    parsed.unwrap_or_else(|| SqlValue::Text(text.into_owned()))
}

fn fetch_cursor(cursor: &mut impl Cursor) -> Result<Fetched, odbc_api::Error> {
    let count = u16::try_from(cursor.num_result_cols()?).unwrap_or(0);
    let mut columns = Vec::with_capacity(count as usize);
    let mut types = Vec::with_capacity(count as usize);
    for col in 1..=count {
        columns.push(cursor.col_name(col)?);
        types.push(cursor.col_data_type(col)?);
    }

    let mut rows = Vec::new();
    let mut buf = Vec::new();
    while let Some(mut row) = cursor.next_row()? {
        let mut values = Vec::with_capacity(types.len());
        for (col, data_type) in (1..=count).zip(&types) {
            buf.clear();
            let value = if is_binary(data_type) {
                if row.get_binary(col, &mut buf)? {
                    SqlValue::Bytes(buf.clone())
                } else {
                    SqlValue::Null
                }
            } else if row.get_text(col, &mut buf)? {
                parse_text(data_type, &buf)
            } else {
                SqlValue::Null
            };
            values.push(value);
        }
        rows.push(values);
    }
    Ok(Fetched { columns, rows })
}

fn fetch(conn: &Db2Connection, sql: &str, params: &[SqlParam]) -> DbResult<Fetched> {
    let bound: Vec<Box<dyn InputParameter>> = params.iter().map(to_parameter).collect();
    let cursor = conn.execute(sql, bound.as_slice()).map_err(classify_odbc)?;
    match cursor {
        Some(mut cursor) => fetch_cursor(&mut cursor).map_err(classify_odbc),
        // Statement produced no result set
        None => Ok(Fetched {
            columns: Vec::new(),
            rows: Vec::new(),
        }),
    }
}

fn first_value(conn: &Db2Connection, sql: &str) -> DbResult<Option<SqlValue>> {
    let fetched = fetch(conn, sql, &[])?;
    Ok(fetched.rows.into_iter().next().and_then(|row| row.into_iter().next()))
}

fn first_text(conn: &Db2Connection, sql: &str) -> DbResult<Option<String>> {
    Ok(first_value(conn, sql)?.and_then(into_text))
}

fn into_text(value: SqlValue) -> Option<String> {
    match value {
        SqlValue::Text(s) => Some(s.trim_end().to_string()),
        SqlValue::Null => None,
        other => Some(match serialize(other) {
            serde_json::Value::String(s) => s,
            json => json.to_string(),
        }),
    }
}

fn text_column(fetched: Fetched) -> Vec<String> {
    fetched
        .rows
        .into_iter()
        .filter_map(|row| row.into_iter().next().and_then(into_text))
        .collect()
}

/// SYSCAT.COLUMNS row: COLNAME, TYPENAME, NULLS, DEFAULT, KEYSEQ.
fn column_from_row(row: Vec<SqlValue>) -> ColumnDescriptor {
    let mut values = row.into_iter();
    let mut next = || values.next().unwrap_or(SqlValue::Null);
    let name = into_text(next()).unwrap_or_default();
    let data_type = into_text(next()).unwrap_or_default();
    let nullable = into_text(next()).is_some_and(|n| n == "Y");
    let default = into_text(next());
    let primary_key = matches!(next(), SqlValue::Int(seq) if seq > 0);
    ColumnDescriptor::new(name, data_type, nullable, primary_key, default)
}

impl DatabaseAdapter for Db2Adapter {
    type Connection = SlotGuard<Db2Connection>;

    fn driver_type(&self) -> DriverType {
        DRIVER
    }

    fn read_only(&self) -> bool {
        self.config.read_only
    }

    async fn initialize(&self) -> DbResult<()> {
        if self.slots.get().is_some() {
            return Ok(());
        }

        let env = environment()?;
        let connection_string = self.config.connection_string.clone();
        let pool_size = self.config.pool_size;
        let read_only = self.config.read_only;

        let connections = tokio::task::spawn_blocking(move || {
            (0..pool_size)
                .map(|i| {
                    let conn = env
                        .connect_with_connection_string(
                            &connection_string,
                            ConnectionOptions::default(),
                        )
                        .map_err(classify_odbc)?;
                    if read_only {
                        conn.set_autocommit(false).map_err(classify_odbc)?;
                    }
                    debug!(connection = i + 1, pool_size, "Opened DB2 connection");
                    Ok(conn)
                })
                .collect::<DbResult<Vec<_>>>()
        })
        .await
        .map_err(|e| DbError::unknown(format!("DB2 worker task failed: {e}")))??;

        let slots = ConnectionSlots::new(connections, self.config.pool_timeout_duration());
        info!(
            pool_size,
            read_only = self.config.read_only,
            "DB2 connection pool created"
        );

        if self.slots.set(slots).is_err() {
            debug!("DB2 pool was initialized concurrently, keeping the first");
        }
        Ok(())
    }

    async fn close(&self) {
        let Some(slots) = self.slots.get() else {
            return;
        };
        let idle = slots.close();
        let count = idle.len();
        // Disconnecting blocks on the network
        if let Err(e) = tokio::task::spawn_blocking(move || drop(idle)).await {
            warn!(error = %e, "Closing DB2 connections failed");
        }
        info!(closed = count, "DB2 connection pool closed");
    }

    async fn acquire(&self) -> DbResult<SlotGuard<Db2Connection>> {
        self.slots()?.checkout().await
    }

    async fn execute_query(&self, query: &str, params: &[SqlParam]) -> DbResult<Vec<ResultRow>> {
        run_guarded(self.safety_gate(), query, params, |params| async move {
            let sql = query.to_string();
            let fetched = self
                .with_connection(move |conn| fetch(conn, &sql, &params))
                .await?;

            debug!(rows = fetched.rows.len(), "DB2 query returned rows");
            Ok(fetched
                .rows
                .into_iter()
                .map(|row| serialize_row(row, &fetched.columns))
                .collect())
        })
        .await
    }

    async fn list_tables(&self, schema: Option<&str>) -> DbResult<Vec<String>> {
        let schema = schema.map(str::to_uppercase);
        let fetched = self
            .with_connection(move |conn| match schema {
                Some(schema) => fetch(
                    conn,
                    queries::db2::LIST_TABLES_IN_SCHEMA,
                    &[SqlParam::String(schema)],
                ),
                None => fetch(conn, queries::db2::LIST_TABLES, &[]),
            })
            .await?;
        Ok(text_column(fetched))
    }

    async fn describe_table(
        &self,
        table: &str,
        schema: Option<&str>,
    ) -> DbResult<Vec<ColumnDescriptor>> {
        let table_upper = table.to_uppercase();
        let schema_upper = schema.map(str::to_uppercase);

        let fetched = {
            let table = table_upper.clone();
            let schema = schema_upper.clone();
            self.with_connection(move |conn| match schema {
                Some(schema) => fetch(
                    conn,
                    queries::db2::DESCRIBE_COLUMNS_IN_SCHEMA,
                    &[SqlParam::String(table), SqlParam::String(schema)],
                ),
                None => fetch(
                    conn,
                    queries::db2::DESCRIBE_COLUMNS,
                    &[SqlParam::String(table)],
                ),
            })
            .await?
        };

        if fetched.rows.is_empty() {
            return Err(table_not_found(&table_upper, schema_upper.as_deref()));
        }
        Ok(fetched.rows.into_iter().map(column_from_row).collect())
    }

    async fn list_schemas(&self) -> DbResult<Vec<String>> {
        let result = self
            .with_connection(|conn| fetch(conn, queries::db2::LIST_SCHEMAS, &[]))
            .await;

        match result {
            Ok(fetched) => Ok(text_column(fetched)),
            // Catalog access varies by platform and grant, so any failure is
            // reported as no schemas
            Err(err) => {
                warn!(error = %err, "Unable to query the DB2 system catalog, returning no schemas");
                Ok(Vec::new())
            }
        }
    }

    async fn test_connection(&self) -> ConnectionStatus {
        match self.connection_status().await {
            Ok(status) => status,
            Err(err) => {
                warn!(error = %err, "DB2 connection test failed");
                ConnectionStatus::failed(DRIVER, err.to_string())
            }
        }
    }
}
