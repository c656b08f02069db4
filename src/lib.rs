//! Database Gateway Library
//!
//! Safe, read-mostly SQL access to PostgreSQL, MySQL, SQLite and DB2
//! databases, exposed to AI assistants as MCP (Model Context Protocol) tools.

pub mod config;
pub mod db;
pub mod error;
pub mod mcp;
pub mod models;
pub mod tools;
pub mod transport;

pub use config::Config;
pub use error::DbError;
pub use mcp::GatewayService;
