//! Data models for the database gateway.
//!
//! This module re-exports all model types used throughout the application.

pub mod connection;
pub mod query;
pub mod schema;

// Re-export commonly used types
pub use connection::{
    ConnectionStatus, DEFAULT_POOL_SIZE, DEFAULT_POOL_TIMEOUT_SECS, DatabaseConfig,
    DatabaseConfigError, DatabaseSummary, DriverType, ParamStyle,
};
pub use query::{
    DEFAULT_ROW_LIMIT, DEFAULT_SAMPLE_LIMIT, MAX_PARAM_CHARS, MAX_ROW_LIMIT, MAX_SAMPLE_LIMIT,
    ResultRow, SqlParam, SqlValue,
};
pub use schema::ColumnDescriptor;
