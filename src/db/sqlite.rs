//! SQLite adapter.
//!
//! SQLite is file-based, so there is no pool: each operation opens its own
//! connection and closes it when done. Read-only databases are opened with
//! the read-only flag and `query_only` set, which makes SQLite itself reject
//! writes.

use crate::db::adapter::{DatabaseAdapter, run_guarded};
use crate::db::classify::classify_sqlx;
use crate::db::params::bind_sqlite_param;
use crate::db::schema::{queries, table_not_found};
use crate::db::types::rows_to_result;
use crate::error::{DbError, DbResult};
use crate::models::{
    ColumnDescriptor, ConnectionStatus, DatabaseConfig, DriverType, ResultRow, SqlParam,
};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{ConnectOptions, Executor, Row};
use std::str::FromStr;
use tracing::{debug, info, warn};

const DRIVER: DriverType = DriverType::SQLite;
const URL_PREFIX: &str = "sqlite:///";
const MEMORY: &str = ":memory:";

#[derive(Debug)]
pub struct SqliteAdapter {
    config: DatabaseConfig,
    path: String,
}

/// Database path from a `sqlite:///<path>` connection string.
///
/// `sqlite:////var/data/app.db` is the absolute path `/var/data/app.db`,
/// `sqlite:///data/app.db` is relative to the working directory.
pub fn parse_sqlite_path(connection_string: &str) -> DbResult<&str> {
    connection_string
        .strip_prefix(URL_PREFIX)
        .filter(|path| !path.is_empty())
        .ok_or_else(|| {
            DbError::validation(format!(
                "Invalid SQLite connection string: {connection_string}. Expected sqlite:///<path>"
            ))
        })
}

impl SqliteAdapter {
    pub fn new(config: DatabaseConfig) -> DbResult<Self> {
        let path = parse_sqlite_path(&config.connection_string)?.to_string();
        Ok(Self { config, path })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn connect_options(&self) -> Result<SqliteConnectOptions, sqlx::Error> {
        let options = if self.path == MEMORY {
            SqliteConnectOptions::from_str("sqlite::memory:")?
        } else {
            SqliteConnectOptions::new()
                .filename(&self.path)
                .read_only(self.config.read_only)
                .create_if_missing(!self.config.read_only)
        };
        Ok(options.busy_timeout(self.config.pool_timeout_duration()))
    }

    async fn open(&self) -> Result<SqliteConnection, sqlx::Error> {
        let mut conn = self.connect_options()?.connect().await?;
        if self.config.read_only {
            conn.execute(queries::sqlite::QUERY_ONLY).await?;
        }
        Ok(conn)
    }

    async fn connection_status(&self) -> DbResult<ConnectionStatus> {
        let mut conn = self.acquire().await?;
        let version: String = sqlx::query_scalar(queries::sqlite::VERSION)
            .fetch_one(&mut conn)
            .await
            .map_err(|e| classify_sqlx(&e, DRIVER))?;
        let table_count: i64 = sqlx::query_scalar(queries::sqlite::COUNT_TABLES)
            .fetch_one(&mut conn)
            .await
            .map_err(|e| classify_sqlx(&e, DRIVER))?;

        Ok(ConnectionStatus::connected(
            DRIVER,
            version,
            Some(self.path.clone()),
            table_count,
        ))
    }
}

async fn fetch_rows(
    conn: &mut SqliteConnection,
    sql: &str,
    params: &[SqlParam],
) -> Result<Vec<SqliteRow>, sqlx::Error> {
    if params.is_empty() {
        return conn.fetch_all(sql).await;
    }
    let mut query = sqlx::query(sql);
    for param in params {
        query = bind_sqlite_param(query, param);
    }
    query.fetch_all(conn).await
}

/// `PRAGMA table_info` row: cid, name, type, notnull, dflt_value, pk.
fn column_from_row(row: &SqliteRow) -> Result<ColumnDescriptor, sqlx::Error> {
    Ok(ColumnDescriptor::new(
        row.try_get::<String, _>("name")?,
        row.try_get::<String, _>("type")?,
        row.try_get::<i64, _>("notnull")? == 0,
        row.try_get::<i64, _>("pk")? > 0,
        row.try_get::<Option<String>, _>("dflt_value")?,
    ))
}

impl DatabaseAdapter for SqliteAdapter {
    type Connection = SqliteConnection;

    fn driver_type(&self) -> DriverType {
        DRIVER
    }

    fn read_only(&self) -> bool {
        self.config.read_only
    }

    /// Opens one connection to check the file is usable.
    async fn initialize(&self) -> DbResult<()> {
        let conn = self.acquire().await?;
        if let Err(e) = sqlx::Connection::close(conn).await {
            debug!(error = %e, "Closing SQLite status connection failed");
        }
        info!(
            path = %self.path,
            read_only = self.config.read_only,
            "SQLite database ready"
        );
        Ok(())
    }

    async fn close(&self) {
        debug!(path = %self.path, "SQLite adapter closed");
    }

    async fn acquire(&self) -> DbResult<SqliteConnection> {
        self.open().await.map_err(|e| classify_sqlx(&e, DRIVER))
    }

    async fn execute_query(&self, query: &str, params: &[SqlParam]) -> DbResult<Vec<ResultRow>> {
        run_guarded(self.safety_gate(), query, params, |params| async move {
            let mut conn = self.acquire().await?;
            let rows = fetch_rows(&mut conn, query, &params)
                .await
                .map_err(|e| classify_sqlx(&e, DRIVER))?;

            debug!(rows = rows.len(), "SQLite query returned rows");
            Ok(rows_to_result(&rows))
        })
        .await
    }

    /// SQLite has no schemas; `schema` is ignored.
    async fn list_tables(&self, _schema: Option<&str>) -> DbResult<Vec<String>> {
        let mut conn = self.acquire().await?;
        sqlx::query_scalar(queries::sqlite::LIST_TABLES)
            .fetch_all(&mut conn)
            .await
            .map_err(|e| classify_sqlx(&e, DRIVER))
    }

    async fn describe_table(
        &self,
        table: &str,
        _schema: Option<&str>,
    ) -> DbResult<Vec<ColumnDescriptor>> {
        // PRAGMA arguments cannot be bound, so the name is quoted instead
        let pragma = format!("PRAGMA table_info({})", self.quote_identifier(table)?);
        let mut conn = self.acquire().await?;
        let rows = conn
            .fetch_all(pragma.as_str())
            .await
            .map_err(|e| classify_sqlx(&e, DRIVER))?;

        if rows.is_empty() {
            return Err(table_not_found(table, None));
        }

        rows.iter()
            .map(column_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| classify_sqlx(&e, DRIVER))
    }

    async fn list_schemas(&self) -> DbResult<Vec<String>> {
        Ok(Vec::new())
    }

    async fn test_connection(&self) -> ConnectionStatus {
        match self.connection_status().await {
            Ok(status) => status,
            Err(err) => {
                warn!(error = %err, path = %self.path, "SQLite connection test failed");
                ConnectionStatus::failed(DRIVER, err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;

    #[test]
    fn test_parse_sqlite_path() {
        assert_eq!(
            parse_sqlite_path("sqlite:////var/data/app.db").unwrap(),
            "/var/data/app.db"
        );
        assert_eq!(parse_sqlite_path("sqlite:///data/app.db").unwrap(), "data/app.db");
        assert_eq!(parse_sqlite_path("sqlite:///:memory:").unwrap(), ":memory:");
    }

    #[test]
    fn test_parse_sqlite_path_rejects_other_forms() {
        for bad in ["sqlite://app.db", "/var/data/app.db", "sqlite:///", "postgres://h/db"] {
            let err = parse_sqlite_path(bad).unwrap_err();
            assert_eq!(err.category(), ErrorCategory::Validation, "{bad}");
        }
    }

    #[test]
    fn test_new_rejects_bad_connection_string() {
        let config = DatabaseConfig::with_defaults(DRIVER, "file:app.db").unwrap();
        assert!(SqliteAdapter::new(config).is_err());
    }

    #[tokio::test]
    async fn test_memory_database() {
        let config = DatabaseConfig::with_defaults(DRIVER, "sqlite:///:memory:").unwrap();
        let adapter = SqliteAdapter::new(config).unwrap();
        adapter.initialize().await.unwrap();

        let rows = adapter
            .execute_query("SELECT 1 AS one, 'x' AS two", &[])
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["one"], 1);
        assert_eq!(rows[0]["two"], "x");

        assert!(adapter.list_schemas().await.unwrap().is_empty());
        let status = adapter.test_connection().await;
        assert!(status.connected);
        assert_eq!(status.database_name.as_deref(), Some(":memory:"));
    }

    #[tokio::test]
    async fn test_missing_read_only_file_fails_to_initialize() {
        let config =
            DatabaseConfig::with_defaults(DRIVER, "sqlite:////nonexistent/dir/app.db").unwrap();
        let adapter = SqliteAdapter::new(config).unwrap();
        assert!(adapter.initialize().await.is_err());
        assert!(!adapter.test_connection().await.connected);
    }
}
