//! Error types for the database gateway.
//!
//! Every failure that leaves an adapter is a [`DbError`]: a closed taxonomy of
//! categories, each carrying a user-facing message and, where one exists, the
//! text of the underlying driver error. Raw driver errors never cross the
//! adapter boundary; the classifier in [`crate::db::classify`] is the only
//! place that turns them into a `DbError`.

use schemars::JsonSchema;
use serde::Serialize;
use thiserror::Error;

/// Closed set of error categories reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, JsonSchema)]
pub enum ErrorCategory {
    #[serde(rename = "connection_error")]
    Connection,
    #[serde(rename = "authentication_error")]
    Authentication,
    #[serde(rename = "query_error")]
    Query,
    #[serde(rename = "validation_error")]
    Validation,
    #[serde(rename = "security_error")]
    Security,
    #[serde(rename = "timeout_error")]
    Timeout,
    #[serde(rename = "not_found_error")]
    NotFound,
    #[serde(rename = "driver_specific_error")]
    DriverSpecific,
    #[serde(rename = "unknown_error")]
    Unknown,
}

impl ErrorCategory {
    /// Wire name of the category, as serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connection => "connection_error",
            Self::Authentication => "authentication_error",
            Self::Query => "query_error",
            Self::Validation => "validation_error",
            Self::Security => "security_error",
            Self::Timeout => "timeout_error",
            Self::NotFound => "not_found_error",
            Self::DriverSpecific => "driver_specific_error",
            Self::Unknown => "unknown_error",
        }
    }

    /// Connection and timeout failures are worth retrying; nothing else is.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Connection | Self::Timeout)
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DbError {
    #[error("{message}")]
    Connection {
        message: String,
        details: Option<String>,
    },

    #[error("{message}")]
    Authentication {
        message: String,
        details: Option<String>,
    },

    #[error("{message}")]
    Query {
        message: String,
        details: Option<String>,
    },

    #[error("{message}")]
    Validation { message: String },

    #[error("{message}")]
    Security { message: String },

    #[error("{message}")]
    Timeout {
        message: String,
        details: Option<String>,
    },

    #[error("{message}")]
    NotFound {
        message: String,
        details: Option<String>,
    },

    #[error("{message}")]
    Driver {
        message: String,
        details: Option<String>,
    },

    #[error("Unexpected error: {message}")]
    Unknown { message: String },
}

impl DbError {
    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            details: None,
        }
    }

    /// Create an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
            details: None,
        }
    }

    /// Create a query error.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
            details: None,
        }
    }

    /// Create a validation error (bad input, rejected before any backend call).
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a security error (query rejected by the safety gate).
    pub fn security(message: impl Into<String>) -> Self {
        Self::Security {
            message: message.into(),
        }
    }

    /// Create a timeout error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
            details: None,
        }
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            details: None,
        }
    }

    /// Create a driver-specific error.
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
            details: None,
        }
    }

    /// Create an error for a failure outside the taxonomy (panics, join errors).
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::Unknown {
            message: message.into(),
        }
    }

    /// Attach the underlying cause text. No-op for categories that never
    /// originate from a driver.
    pub fn with_details(mut self, cause: impl Into<String>) -> Self {
        match &mut self {
            Self::Connection { details, .. }
            | Self::Authentication { details, .. }
            | Self::Query { details, .. }
            | Self::Timeout { details, .. }
            | Self::NotFound { details, .. }
            | Self::Driver { details, .. } => *details = Some(cause.into()),
            Self::Validation { .. } | Self::Security { .. } | Self::Unknown { .. } => {}
        }
        self
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Connection { .. } => ErrorCategory::Connection,
            Self::Authentication { .. } => ErrorCategory::Authentication,
            Self::Query { .. } => ErrorCategory::Query,
            Self::Validation { .. } => ErrorCategory::Validation,
            Self::Security { .. } => ErrorCategory::Security,
            Self::Timeout { .. } => ErrorCategory::Timeout,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Driver { .. } => ErrorCategory::DriverSpecific,
            Self::Unknown { .. } => ErrorCategory::Unknown,
        }
    }

    /// Check if this error is worth retrying.
    pub fn is_recoverable(&self) -> bool {
        self.category().is_recoverable()
    }

    /// Underlying cause text, if the error was derived from a driver failure.
    pub fn details(&self) -> Option<&str> {
        match self {
            Self::Connection { details, .. }
            | Self::Authentication { details, .. }
            | Self::Query { details, .. }
            | Self::Timeout { details, .. }
            | Self::NotFound { details, .. }
            | Self::Driver { details, .. } => details.as_deref(),
            Self::Validation { .. } | Self::Security { .. } | Self::Unknown { .. } => None,
        }
    }

    /// Serializable error envelope handed to the dispatch layer.
    pub fn payload(&self) -> ErrorPayload {
        ErrorPayload {
            message: self.to_string(),
            category: self.category(),
            recoverable: self.is_recoverable(),
            details: self.details().map(str::to_string),
        }
    }
}

/// Result type alias for database operations.
pub type DbResult<T> = Result<T, DbError>;

/// Error envelope reported to callers. The only error shape the gateway
/// exposes.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct ErrorPayload {
    pub message: String,
    pub category: ErrorCategory,
    pub recoverable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Convert DbError to MCP ErrorData, carrying the payload in `data`.
impl From<DbError> for rmcp::ErrorData {
    fn from(err: DbError) -> Self {
        let data = serde_json::to_value(err.payload()).ok();
        let message = err.to_string();
        match err.category() {
            ErrorCategory::Validation | ErrorCategory::Security | ErrorCategory::Query => {
                rmcp::ErrorData::invalid_params(message, data)
            }
            ErrorCategory::NotFound => rmcp::ErrorData::resource_not_found(message, data),
            ErrorCategory::Connection
            | ErrorCategory::Authentication
            | ErrorCategory::Timeout
            | ErrorCategory::DriverSpecific
            | ErrorCategory::Unknown => rmcp::ErrorData::internal_error(message, data),
        }
    }
}
