//! MCP server integration module.
//!
//! Connects the MCP protocol to the database tool handlers using the rmcp
//! framework.

pub mod service;

pub use service::GatewayService;
