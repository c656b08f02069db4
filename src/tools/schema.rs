//! Schema introspection tools.
//!
//! This module implements the `list_tables`, `describe_table`,
//! `list_schemas`, `test_connection` and `list_databases` MCP tools.

use crate::db::AdapterRegistry;
use crate::error::DbResult;
use crate::models::{ColumnDescriptor, ConnectionStatus, DatabaseSummary};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Input for tools that only need a database name.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DatabaseInput {
    /// Database name from list_databases
    pub database: String,
}

/// Input for the list_tables tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ListTablesInput {
    /// Database name from list_databases
    pub database: String,
    /// Schema to list. Omit to list tables in all user schemas. Ignored by SQLite.
    #[serde(default)]
    pub schema: Option<String>,
}

/// Output from the list_tables tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ListTablesOutput {
    pub tables: Vec<String>,
    pub table_count: usize,
    pub schema: Option<String>,
}

/// Input for the describe_table tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DescribeTableInput {
    /// Database name from list_databases
    pub database: String,
    /// Name of the table to describe
    pub table: String,
    /// Schema containing the table (optional)
    #[serde(default)]
    pub schema: Option<String>,
}

/// Output from the describe_table tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct DescribeTableOutput {
    pub table_name: String,
    pub schema: Option<String>,
    pub columns: Vec<ColumnDescriptor>,
    pub column_count: usize,
}

/// Output from the list_schemas tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ListSchemasOutput {
    pub schemas: Vec<String>,
    pub schema_count: usize,
}

/// Output from the list_databases tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ListDatabasesOutput {
    pub databases: Vec<DatabaseSummary>,
    pub database_count: usize,
}

/// Handler for schema tools.
pub struct SchemaToolHandler {
    registry: Arc<AdapterRegistry>,
}

impl SchemaToolHandler {
    /// Create a new schema tool handler.
    pub fn new(registry: Arc<AdapterRegistry>) -> Self {
        Self { registry }
    }

    /// Handle the list_databases tool call. Never touches a backend.
    pub fn list_databases(&self) -> ListDatabasesOutput {
        let databases = self.registry.summaries();
        ListDatabasesOutput {
            database_count: databases.len(),
            databases,
        }
    }

    /// Handle the list_tables tool call.
    pub async fn list_tables(&self, input: ListTablesInput) -> DbResult<ListTablesOutput> {
        let adapter = self.registry.get(&input.database)?;
        let tables = adapter.list_tables(input.schema.as_deref()).await?;
        info!(database = %input.database, tables = tables.len(), "Listed tables");

        Ok(ListTablesOutput {
            table_count: tables.len(),
            tables,
            schema: input.schema,
        })
    }

    /// Handle the describe_table tool call.
    pub async fn describe_table(&self, input: DescribeTableInput) -> DbResult<DescribeTableOutput> {
        let adapter = self.registry.get(&input.database)?;
        let columns = adapter
            .describe_table(&input.table, input.schema.as_deref())
            .await?;
        info!(database = %input.database, table = %input.table, "Described table");

        Ok(DescribeTableOutput {
            table_name: input.table,
            schema: input.schema,
            column_count: columns.len(),
            columns,
        })
    }

    /// Handle the list_schemas tool call.
    pub async fn list_schemas(&self, input: DatabaseInput) -> DbResult<ListSchemasOutput> {
        let adapter = self.registry.get(&input.database)?;
        let schemas = adapter.list_schemas().await?;

        Ok(ListSchemasOutput {
            schema_count: schemas.len(),
            schemas,
        })
    }

    /// Handle the test_connection tool call. An unknown database is an
    /// error; a failing backend is reported in the returned status.
    pub async fn test_connection(&self, input: DatabaseInput) -> DbResult<ConnectionStatus> {
        let adapter = self.registry.get(&input.database)?;
        let status = adapter.test_connection().await;
        info!(database = %input.database, connected = status.connected, "Tested connection");
        Ok(status)
    }
}
