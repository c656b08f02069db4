//! Query tools.
//!
//! This module implements the `execute_query` and `get_sample_data` MCP
//! tools. Both go through the adapter's gated pipeline, so read-only
//! databases reject writes here exactly as they would anywhere else.

use crate::db::AdapterRegistry;
use crate::error::DbResult;
use crate::models::{
    DEFAULT_ROW_LIMIT, DEFAULT_SAMPLE_LIMIT, DriverType, MAX_ROW_LIMIT, MAX_SAMPLE_LIMIT,
    ResultRow, SqlParam,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Input for the execute_query tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ExecuteQueryInput {
    /// Database name from list_databases
    pub database: String,
    /// SQL statement to execute. Read-only databases accept only SELECT queries.
    pub query: String,
    /// Positional parameters for placeholders ($1, $2... for PostgreSQL, ? otherwise)
    #[serde(default)]
    pub parameters: Vec<SqlParam>,
    /// Maximum rows to return. Default: 100, max: 1000
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Output from the execute_query tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ExecuteQueryOutput {
    /// Column names, in result order. Empty when no rows were returned.
    pub columns: Vec<String>,
    /// Row values, each in column order
    pub rows: Vec<Vec<JsonValue>>,
    /// Number of rows returned
    pub row_count: usize,
    /// True if more rows were produced than the limit allows
    pub truncated: bool,
    /// Number of rows the query produced before the limit was applied
    pub total_rows_before_limit: usize,
    /// Query execution time in milliseconds
    pub execution_time_ms: u64,
    /// Warning message if the requested limit was capped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Input for the get_sample_data tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SampleDataInput {
    /// Database name from list_databases
    pub database: String,
    /// Table name
    pub table: String,
    /// Schema name (optional)
    #[serde(default)]
    pub schema: Option<String>,
    /// Number of rows to return. Default: 10, max: 100
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Output from the get_sample_data tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SampleDataOutput {
    pub table: String,
    pub schema: Option<String>,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<JsonValue>>,
    pub row_count: usize,
}

/// Clamp a requested limit to `1..=max`, with a warning when it was capped.
pub fn effective_limit(requested: Option<usize>, default: usize, max: usize) -> (usize, Option<String>) {
    match requested {
        None => (default, None),
        Some(limit) if limit > max => (
            max,
            Some(format!(
                "Requested limit {limit} exceeds maximum allowed ({max}). Results capped to {max} rows."
            )),
        ),
        Some(limit) => (limit.max(1), None),
    }
}

/// Split rows into column names (taken from the first row) and value arrays.
pub fn rows_to_columns(rows: Vec<ResultRow>) -> (Vec<String>, Vec<Vec<JsonValue>>) {
    let columns = rows
        .first()
        .map(|row| row.keys().cloned().collect())
        .unwrap_or_default();
    let values = rows
        .into_iter()
        .map(|row| row.into_iter().map(|(_, value)| value).collect())
        .collect();
    (columns, values)
}

/// `SELECT *` over a quoted, optionally schema-qualified table.
fn sample_query(
    driver: DriverType,
    table: &str,
    schema: Option<&str>,
    limit: usize,
) -> DbResult<String> {
    let quote = driver.quote_char();
    let table = crate::db::adapter::quote_identifier(table, quote)?;
    let target = match schema {
        Some(schema) => format!(
            "{}.{table}",
            crate::db::adapter::quote_identifier(schema, quote)?
        ),
        None => table,
    };
    Ok(match driver {
        DriverType::DB2 => format!("SELECT * FROM {target} FETCH FIRST {limit} ROWS ONLY"),
        _ => format!("SELECT * FROM {target} LIMIT {limit}"),
    })
}

/// Handler for query tools.
pub struct QueryToolHandler {
    registry: Arc<AdapterRegistry>,
}

impl QueryToolHandler {
    /// Create a new query tool handler.
    pub fn new(registry: Arc<AdapterRegistry>) -> Self {
        Self { registry }
    }

    /// Handle the execute_query tool call.
    pub async fn execute_query(&self, input: ExecuteQueryInput) -> DbResult<ExecuteQueryOutput> {
        let adapter = self.registry.get(&input.database)?;
        let (limit, warning) = effective_limit(input.limit, DEFAULT_ROW_LIMIT, MAX_ROW_LIMIT);

        let start = Instant::now();
        let rows = adapter
            .execute_query(&input.query, &input.parameters)
            .await?;
        let execution_time_ms = start.elapsed().as_millis() as u64;

        let total_rows_before_limit = rows.len();
        let truncated = total_rows_before_limit > limit;
        let (columns, mut values) = rows_to_columns(rows);
        values.truncate(limit);

        if truncated {
            warn!(
                database = %input.database,
                total_rows = total_rows_before_limit,
                limit,
                "Query result truncated"
            );
        }
        info!(
            database = %input.database,
            rows = values.len(),
            execution_time_ms,
            "Query executed"
        );

        Ok(ExecuteQueryOutput {
            columns,
            row_count: values.len(),
            rows: values,
            truncated,
            total_rows_before_limit,
            execution_time_ms,
            warning,
        })
    }

    /// Handle the get_sample_data tool call.
    pub async fn get_sample_data(&self, input: SampleDataInput) -> DbResult<SampleDataOutput> {
        let adapter = self.registry.get(&input.database)?;
        let (limit, _) = effective_limit(input.limit, DEFAULT_SAMPLE_LIMIT, MAX_SAMPLE_LIMIT);
        let query = sample_query(
            adapter.driver_type(),
            &input.table,
            input.schema.as_deref(),
            limit,
        )?;

        let rows = adapter.execute_query(&query, &[]).await?;
        let (columns, rows) = rows_to_columns(rows);
        info!(database = %input.database, table = %input.table, rows = rows.len(), "Sampled table");

        Ok(SampleDataOutput {
            table: input.table,
            schema: input.schema,
            columns,
            row_count: rows.len(),
            rows,
        })
    }
}
