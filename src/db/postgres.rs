//! PostgreSQL adapter.
//!
//! Backed by an sqlx pool sized from the database configuration. In
//! read-only mode every statement runs inside a `READ ONLY` transaction that
//! is rolled back afterwards, so the server itself refuses writes that slip
//! past the safety gate.

use crate::db::adapter::{DatabaseAdapter, run_guarded};
use crate::db::classify::classify_sqlx;
use crate::db::params::bind_postgres_param;
use crate::db::schema::{catalog_denied, queries, table_not_found};
use crate::db::types::rows_to_result;
use crate::error::{DbError, DbResult};
use crate::models::{
    ColumnDescriptor, ConnectionStatus, DatabaseConfig, DriverType, ResultRow, SqlParam,
};
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgConnection, PgPool, PgPoolOptions, PgRow};
use sqlx::{Connection, Executor, Postgres, Row};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

const DEFAULT_SCHEMA: &str = "public";
const DRIVER: DriverType = DriverType::PostgreSQL;

#[derive(Debug)]
pub struct PostgresAdapter {
    config: DatabaseConfig,
    pool: OnceLock<PgPool>,
}

impl PostgresAdapter {
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            config,
            pool: OnceLock::new(),
        }
    }

    fn pool(&self) -> DbResult<&PgPool> {
        self.pool
            .get()
            .ok_or_else(|| DbError::connection("PostgreSQL connection pool is not initialized"))
    }

    async fn connection_status(&self) -> DbResult<ConnectionStatus> {
        let pool = self.pool()?;
        let version: String = sqlx::query_scalar(queries::postgres::VERSION)
            .fetch_one(pool)
            .await
            .map_err(|e| classify_sqlx(&e, DRIVER))?;
        let database: String = sqlx::query_scalar(queries::postgres::CURRENT_DATABASE)
            .fetch_one(pool)
            .await
            .map_err(|e| classify_sqlx(&e, DRIVER))?;
        let table_count: i64 = sqlx::query_scalar(queries::postgres::COUNT_TABLES)
            .fetch_one(pool)
            .await
            .map_err(|e| classify_sqlx(&e, DRIVER))?;

        Ok(ConnectionStatus::connected(
            DRIVER,
            short_version(&version),
            Some(database),
            table_count,
        ))
    }
}

/// Version number out of `version()` output such as
/// `"PostgreSQL 16.2 on x86_64-pc-linux-gnu, ..."`.
fn short_version(full: &str) -> &str {
    full.split(' ').nth(1).unwrap_or(full)
}

async fn fetch_rows(
    conn: &mut PgConnection,
    sql: &str,
    params: &[SqlParam],
) -> Result<Vec<PgRow>, sqlx::Error> {
    // Raw SQL when there is nothing to bind, avoiding a prepared statement
    if params.is_empty() {
        return conn.fetch_all(sql).await;
    }
    let mut query = sqlx::query(sql);
    for param in params {
        query = bind_postgres_param(query, param);
    }
    query.fetch_all(conn).await
}

async fn fetch_read_only(
    conn: &mut PgConnection,
    sql: &str,
    params: &[SqlParam],
) -> Result<Vec<PgRow>, sqlx::Error> {
    let mut tx = conn.begin().await?;
    (&mut *tx).execute("SET TRANSACTION READ ONLY").await?;
    let rows = fetch_rows(&mut tx, sql, params).await?;
    tx.rollback().await?;
    Ok(rows)
}

fn column_from_row(row: &PgRow) -> Result<ColumnDescriptor, sqlx::Error> {
    let nullable: String = row.try_get("is_nullable")?;
    Ok(ColumnDescriptor::new(
        row.try_get::<String, _>("column_name")?,
        row.try_get::<String, _>("data_type")?,
        nullable.eq_ignore_ascii_case("YES"),
        row.try_get::<bool, _>("is_primary_key")?,
        row.try_get::<Option<String>, _>("column_default")?,
    ))
}

impl DatabaseAdapter for PostgresAdapter {
    type Connection = PoolConnection<Postgres>;

    fn driver_type(&self) -> DriverType {
        DRIVER
    }

    fn read_only(&self) -> bool {
        self.config.read_only
    }

    async fn initialize(&self) -> DbResult<()> {
        if self.pool.get().is_some() {
            return Ok(());
        }

        let pool = PgPoolOptions::new()
            .max_connections(self.config.pool_size)
            .acquire_timeout(self.config.pool_timeout_duration())
            .connect(&self.config.connection_string)
            .await
            .map_err(|e| classify_sqlx(&e, DRIVER))?;

        info!(
            pool_size = self.config.pool_size,
            read_only = self.config.read_only,
            "PostgreSQL connection pool created"
        );

        if self.pool.set(pool).is_err() {
            debug!("PostgreSQL pool was initialized concurrently, keeping the first");
        }
        Ok(())
    }

    async fn close(&self) {
        if let Some(pool) = self.pool.get() {
            pool.close().await;
            info!("PostgreSQL connection pool closed");
        }
    }

    async fn acquire(&self) -> DbResult<PoolConnection<Postgres>> {
        self.pool()?
            .acquire()
            .await
            .map_err(|e| classify_sqlx(&e, DRIVER))
    }

    async fn execute_query(&self, query: &str, params: &[SqlParam]) -> DbResult<Vec<ResultRow>> {
        run_guarded(self.safety_gate(), query, params, |params| async move {
            let mut conn = self.acquire().await?;
            debug!(params = params.len(), "Executing PostgreSQL query");

            let rows = if self.config.read_only {
                fetch_read_only(&mut conn, query, &params).await
            } else {
                fetch_rows(&mut conn, query, &params).await
            }
            .map_err(|e| classify_sqlx(&e, DRIVER))?;

            Ok(rows_to_result(&rows))
        })
        .await
    }

    async fn list_tables(&self, schema: Option<&str>) -> DbResult<Vec<String>> {
        let pool = self.pool()?;
        let tables = match schema {
            Some(schema) => {
                sqlx::query_scalar(queries::postgres::LIST_TABLES_IN_SCHEMA)
                    .bind(schema)
                    .fetch_all(pool)
                    .await
            }
            None => {
                sqlx::query_scalar(queries::postgres::LIST_TABLES)
                    .fetch_all(pool)
                    .await
            }
        };
        tables.map_err(|e| classify_sqlx(&e, DRIVER))
    }

    async fn describe_table(
        &self,
        table: &str,
        schema: Option<&str>,
    ) -> DbResult<Vec<ColumnDescriptor>> {
        let schema = schema.unwrap_or(DEFAULT_SCHEMA);
        let rows = sqlx::query(queries::postgres::DESCRIBE_COLUMNS)
            .bind(schema)
            .bind(table)
            .fetch_all(self.pool()?)
            .await
            .map_err(|e| classify_sqlx(&e, DRIVER))?;

        if rows.is_empty() {
            return Err(table_not_found(table, Some(schema)));
        }

        rows.iter()
            .map(column_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| classify_sqlx(&e, DRIVER))
    }

    async fn list_schemas(&self) -> DbResult<Vec<String>> {
        let result = sqlx::query_scalar(queries::postgres::LIST_SCHEMAS)
            .fetch_all(self.pool()?)
            .await
            .map_err(|e| classify_sqlx(&e, DRIVER));

        match result {
            Err(err) if catalog_denied(&err) => {
                warn!(error = %err, "Schema catalog not readable, returning no schemas");
                Ok(Vec::new())
            }
            other => other,
        }
    }

    async fn test_connection(&self) -> ConnectionStatus {
        match self.connection_status().await {
            Ok(status) => status,
            Err(err) => {
                warn!(error = %err, "PostgreSQL connection test failed");
                ConnectionStatus::failed(DRIVER, err.to_string())
            }
        }
    }
}
