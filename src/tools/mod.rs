//! MCP tool implementations.
//!
//! This module contains the database tool handlers:
//! - `query`: `execute_query` and `get_sample_data`
//! - `schema`: `list_databases`, `list_tables`, `describe_table`,
//!   `list_schemas` and `test_connection`

pub mod query;
pub mod schema;

pub use query::{
    ExecuteQueryInput, ExecuteQueryOutput, QueryToolHandler, SampleDataInput, SampleDataOutput,
};
pub use schema::{
    DatabaseInput, DescribeTableInput, DescribeTableOutput, ListDatabasesOutput, ListSchemasOutput,
    ListTablesInput, ListTablesOutput, SchemaToolHandler,
};
