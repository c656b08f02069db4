//! Database abstraction layer.
//!
//! This module provides database access functionality:
//! - The adapter contract and one adapter per backend
//! - Query safety checks and parameter sanitizing
//! - Error classification and value serialization
//! - The registry of configured adapters

pub mod adapter;
pub mod classify;
#[cfg(feature = "db2")]
pub mod db2;
#[macro_use]
pub mod macros;
pub mod mysql;
pub mod params;
pub mod pool;
pub mod postgres;
pub mod registry;
pub mod safety;
pub mod schema;
pub mod serialize;
pub mod sqlite;
pub mod types;

pub use adapter::{AnyAdapter, DatabaseAdapter};
pub use registry::AdapterRegistry;
pub use safety::SafetyGate;
