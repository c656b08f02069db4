//! Backend adapter contract.
//!
//! Every backend implements [`DatabaseAdapter`]. The registry holds adapters
//! as [`AnyAdapter`], which selects the implementation from the configured
//! backend tag and dispatches to it.
//!
//! Query execution always runs the same pipeline, fixed in [`run_guarded`]:
//! safety gate, then parameter sanitizing, then the backend call. A query
//! rejected by either of the first two steps never reaches a driver.

use crate::db::mysql::MySqlAdapter;
use crate::db::params::sanitize_params;
use crate::db::postgres::PostgresAdapter;
use crate::db::safety::SafetyGate;
use crate::db::sqlite::SqliteAdapter;
use crate::error::{DbError, DbResult};
use crate::impl_adapter_dispatch;
use crate::models::{
    ColumnDescriptor, ConnectionStatus, DatabaseConfig, DriverType, ParamStyle, ResultRow,
    SqlParam,
};
use std::future::Future;

#[cfg(feature = "db2")]
use crate::db::db2::Db2Adapter;

/// Capabilities shared by all backends.
///
/// `initialize` is called once before any other operation and `close` once
/// at shutdown. Backend failures leave every method as classified
/// [`DbError`]s, never as raw driver errors.
pub trait DatabaseAdapter: Send + Sync {
    /// Scoped connection handed out by [`acquire`](Self::acquire). Dropping it
    /// returns the connection to its pool, or closes it for unpooled backends.
    type Connection: Send;

    fn driver_type(&self) -> DriverType;

    fn read_only(&self) -> bool;

    /// Placeholder syntax for building parameterized query text.
    fn paramstyle(&self) -> ParamStyle {
        self.driver_type().paramstyle()
    }

    fn safety_gate(&self) -> SafetyGate {
        SafetyGate::new(self.driver_type(), self.read_only())
    }

    /// Open the pool or verify the backend is reachable.
    fn initialize(&self) -> impl Future<Output = DbResult<()>> + Send;

    /// Release held resources. Best effort: failures are logged.
    fn close(&self) -> impl Future<Output = ()> + Send;

    fn acquire(&self) -> impl Future<Output = DbResult<Self::Connection>> + Send;

    /// Run one gated, parameterized statement and return its rows.
    fn execute_query(
        &self,
        query: &str,
        params: &[SqlParam],
    ) -> impl Future<Output = DbResult<Vec<ResultRow>>> + Send;

    /// User tables, excluding system schemas. Backends without schemas
    /// ignore `schema`.
    fn list_tables(
        &self,
        schema: Option<&str>,
    ) -> impl Future<Output = DbResult<Vec<String>>> + Send;

    /// Columns of a table. A table with no visible columns is not found.
    fn describe_table(
        &self,
        table: &str,
        schema: Option<&str>,
    ) -> impl Future<Output = DbResult<Vec<ColumnDescriptor>>> + Send;

    /// Empty when the backend has no schemas or the catalog is not readable.
    fn list_schemas(&self) -> impl Future<Output = DbResult<Vec<String>>> + Send;

    /// Never fails: errors are reported in the returned status.
    fn test_connection(&self) -> impl Future<Output = ConnectionStatus> + Send;

    fn quote_identifier(&self, name: &str) -> DbResult<String> {
        quote_identifier(name, self.driver_type().quote_char())
    }
}

/// Quote an identifier for interpolation into generated SQL.
///
/// Doubles embedded quote characters. Blank names are rejected.
///
/// # Examples
///
/// ```
/// use db_gateway::db::adapter::quote_identifier;
///
/// assert_eq!(quote_identifier("users", '"').unwrap(), "\"users\"");
/// assert_eq!(quote_identifier("we\"ird", '"').unwrap(), "\"we\"\"ird\"");
/// assert_eq!(quote_identifier("order", '`').unwrap(), "`order`");
/// assert!(quote_identifier("  ", '"').is_err());
/// ```
pub fn quote_identifier(name: &str, quote: char) -> DbResult<String> {
    if name.trim().is_empty() {
        return Err(DbError::validation("Identifier cannot be empty"));
    }
    let doubled = format!("{quote}{quote}");
    let escaped = name.replace(quote, &doubled);
    Ok(format!("{quote}{escaped}{quote}"))
}

/// Gate, sanitize, then hand the cleaned parameters to `exec`.
pub async fn run_guarded<F, Fut>(
    gate: SafetyGate,
    query: &str,
    params: &[SqlParam],
    exec: F,
) -> DbResult<Vec<ResultRow>>
where
    F: FnOnce(Vec<SqlParam>) -> Fut,
    Fut: Future<Output = DbResult<Vec<ResultRow>>>,
{
    gate.validate(query)?;
    let params = sanitize_params(params)?;
    exec(params).await
}

/// Adapter for any configured backend.
#[derive(Debug)]
pub enum AnyAdapter {
    Postgres(PostgresAdapter),
    MySql(MySqlAdapter),
    Sqlite(SqliteAdapter),
    #[cfg(feature = "db2")]
    Db2(Db2Adapter),
}

impl AnyAdapter {
    /// Build the adapter for a configured database. Does not connect.
    pub fn from_config(name: &str, config: &DatabaseConfig) -> DbResult<Self> {
        let adapter = match config.db_type {
            DriverType::PostgreSQL => Self::Postgres(PostgresAdapter::new(config.clone())),
            DriverType::MySQL => Self::MySql(MySqlAdapter::new(config.clone())),
            DriverType::SQLite => Self::Sqlite(SqliteAdapter::new(config.clone())?),
            #[cfg(feature = "db2")]
            DriverType::DB2 => Self::Db2(Db2Adapter::new(config.clone())),
            #[cfg(not(feature = "db2"))]
            DriverType::DB2 => {
                return Err(DbError::validation(format!(
                    "Database '{name}' is configured as DB2, but this build does not include DB2 support. Rebuild with the `db2` feature."
                )));
            }
        };
        tracing::debug!(database = %name, driver = %config.db_type, "Adapter created");
        Ok(adapter)
    }

    pub fn driver_type(&self) -> DriverType {
        impl_adapter_dispatch!(self, a => a.driver_type())
    }

    pub fn paramstyle(&self) -> ParamStyle {
        impl_adapter_dispatch!(self, a => a.paramstyle())
    }

    pub fn read_only(&self) -> bool {
        impl_adapter_dispatch!(self, a => a.read_only())
    }

    pub async fn initialize(&self) -> DbResult<()> {
        impl_adapter_dispatch!(self, a => a.initialize().await)
    }

    pub async fn close(&self) {
        impl_adapter_dispatch!(self, a => a.close().await)
    }

    pub async fn execute_query(
        &self,
        query: &str,
        params: &[SqlParam],
    ) -> DbResult<Vec<ResultRow>> {
        impl_adapter_dispatch!(self, a => a.execute_query(query, params).await)
    }

    pub async fn list_tables(&self, schema: Option<&str>) -> DbResult<Vec<String>> {
        impl_adapter_dispatch!(self, a => a.list_tables(schema).await)
    }

    pub async fn describe_table(
        &self,
        table: &str,
        schema: Option<&str>,
    ) -> DbResult<Vec<ColumnDescriptor>> {
        impl_adapter_dispatch!(self, a => a.describe_table(table, schema).await)
    }

    pub async fn list_schemas(&self) -> DbResult<Vec<String>> {
        impl_adapter_dispatch!(self, a => a.list_schemas().await)
    }

    pub async fn test_connection(&self) -> ConnectionStatus {
        impl_adapter_dispatch!(self, a => a.test_connection().await)
    }

    pub fn quote_identifier(&self, name: &str) -> DbResult<String> {
        impl_adapter_dispatch!(self, a => a.quote_identifier(name))
    }
}
