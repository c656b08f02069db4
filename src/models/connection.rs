//! Connection-related data models.
//!
//! This module defines the backend tags, per-database configuration and the
//! connection-test report.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const DEFAULT_POOL_SIZE: u32 = 5;
pub const MIN_POOL_SIZE: u32 = 1;
pub const MAX_POOL_SIZE: u32 = 20;

pub const DEFAULT_POOL_TIMEOUT_SECS: u64 = 30;
pub const MIN_POOL_TIMEOUT_SECS: u64 = 5;
pub const MAX_POOL_TIMEOUT_SECS: u64 = 300;

/// Supported backend types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum DriverType {
    PostgreSQL,
    /// Includes MariaDB
    MySQL,
    SQLite,
    /// IBM DB2, including DB2 for iSeries
    DB2,
}

impl DriverType {
    /// Parse a configured backend tag (case-insensitive).
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "postgresql" | "postgres" => Some(Self::PostgreSQL),
            "mysql" | "mariadb" => Some(Self::MySQL),
            "sqlite" => Some(Self::SQLite),
            "db2" => Some(Self::DB2),
            _ => None,
        }
    }

    /// Lowercase tag, as configured.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::PostgreSQL => "postgresql",
            Self::MySQL => "mysql",
            Self::SQLite => "sqlite",
            Self::DB2 => "db2",
        }
    }

    /// Get the display name for this backend.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::PostgreSQL => "PostgreSQL",
            Self::MySQL => "MySQL",
            Self::SQLite => "SQLite",
            Self::DB2 => "DB2",
        }
    }

    /// Get the default port for this backend.
    pub fn default_port(&self) -> Option<u16> {
        match self {
            Self::PostgreSQL => Some(5432),
            Self::MySQL => Some(3306),
            Self::DB2 => Some(50000),
            Self::SQLite => None,
        }
    }

    /// Placeholder syntax the native driver expects.
    pub fn paramstyle(&self) -> ParamStyle {
        match self {
            Self::PostgreSQL => ParamStyle::Numeric,
            Self::MySQL | Self::SQLite | Self::DB2 => ParamStyle::Qmark,
        }
    }

    /// Character used to delimit identifiers.
    pub fn quote_char(&self) -> char {
        match self {
            Self::MySQL => '`',
            Self::PostgreSQL | Self::SQLite | Self::DB2 => '"',
        }
    }
}

impl std::fmt::Display for DriverType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Placeholder syntax for parameterized queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ParamStyle {
    /// `?`
    Qmark,
    /// `$1`, `$2`, ...
    Numeric,
}

impl ParamStyle {
    /// Placeholder text for the parameter at `index` (zero-based).
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            Self::Qmark => "?".to_string(),
            Self::Numeric => format!("${}", index + 1),
        }
    }
}

/// Configuration for one logical database. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub db_type: DriverType,
    /// Contains credentials - only log through `mask_credentials`
    pub connection_string: String,
    /// Default: true
    pub read_only: bool,
    /// 1..=20, default 5
    pub pool_size: u32,
    /// Seconds, 5..=300, default 30
    pub pool_timeout: u64,
}

impl DatabaseConfig {
    /// Create a validated configuration.
    pub fn new(
        db_type: DriverType,
        connection_string: impl Into<String>,
        read_only: bool,
        pool_size: u32,
        pool_timeout: u64,
    ) -> Result<Self, DatabaseConfigError> {
        let connection_string = connection_string.into();
        if connection_string.trim().is_empty() {
            return Err(DatabaseConfigError::EmptyConnectionString);
        }
        if !(MIN_POOL_SIZE..=MAX_POOL_SIZE).contains(&pool_size) {
            return Err(DatabaseConfigError::PoolSizeOutOfRange(pool_size));
        }
        if !(MIN_POOL_TIMEOUT_SECS..=MAX_POOL_TIMEOUT_SECS).contains(&pool_timeout) {
            return Err(DatabaseConfigError::PoolTimeoutOutOfRange(pool_timeout));
        }
        Ok(Self {
            db_type,
            connection_string,
            read_only,
            pool_size,
            pool_timeout,
        })
    }

    /// Configuration with default read-only flag and pool settings.
    pub fn with_defaults(
        db_type: DriverType,
        connection_string: impl Into<String>,
    ) -> Result<Self, DatabaseConfigError> {
        Self::new(
            db_type,
            connection_string,
            true,
            DEFAULT_POOL_SIZE,
            DEFAULT_POOL_TIMEOUT_SECS,
        )
    }

    pub fn pool_timeout_duration(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.pool_timeout)
    }
}

/// Errors that can occur when creating a database configuration.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum DatabaseConfigError {
    #[error("Connection string cannot be empty")]
    EmptyConnectionString,

    #[error("pool_size must be between 1 and 20, got {0}")]
    PoolSizeOutOfRange(u32),

    #[error("pool_timeout must be between 5 and 300 seconds, got {0}")]
    PoolTimeoutOutOfRange(u64),
}

/// Result of `test_connection`. Failures are reported in-band, never raised.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct ConnectionStatus {
    pub connected: bool,
    /// "PostgreSQL", "MySQL", "SQLite" or "DB2"
    pub database_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_count: Option<i64>,
    /// DB2 only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_schema: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConnectionStatus {
    pub fn connected(
        driver: DriverType,
        version: impl Into<String>,
        database_name: Option<String>,
        table_count: i64,
    ) -> Self {
        Self {
            connected: true,
            database_type: driver.display_name().to_string(),
            version: Some(version.into()),
            database_name,
            table_count: Some(table_count),
            current_schema: None,
            error: None,
        }
    }

    pub fn failed(driver: DriverType, error: impl Into<String>) -> Self {
        Self {
            connected: false,
            database_type: driver.display_name().to_string(),
            version: None,
            database_name: None,
            table_count: None,
            current_schema: None,
            error: Some(error.into()),
        }
    }
}

/// Configured database as reported by `list_databases` (no secrets).
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct DatabaseSummary {
    pub name: String,
    #[serde(rename = "type")]
    pub db_type: DriverType,
    pub read_only: bool,
}
