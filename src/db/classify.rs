//! Driver error classification.
//!
//! Turns backend-native failures into [`DbError`]s. Classification works on
//! the lower-cased error text against a fixed per-backend rule table; sqlx
//! errors are first checked structurally (pool state, SQLSTATE, MySQL error
//! numbers). Anything unmatched becomes a query error. Classification is
//! total: every input yields an error value and nothing here can panic.

use crate::error::{DbError, ErrorCategory};
use crate::models::DriverType;

/// One text-matching rule.
///
/// Matches when any of `any` and all of `all` occur in the lower-cased text.
struct Rule {
    any: &'static [&'static str],
    all: &'static [&'static str],
    category: ErrorCategory,
    message: &'static str,
}

impl Rule {
    const fn new(
        any: &'static [&'static str],
        category: ErrorCategory,
        message: &'static str,
    ) -> Self {
        Self {
            any,
            all: &[],
            category,
            message,
        }
    }

    const fn requiring(mut self, all: &'static [&'static str]) -> Self {
        self.all = all;
        self
    }

    fn matches(&self, text: &str) -> bool {
        self.any.iter().any(|p| text.contains(p)) && self.all.iter().all(|p| text.contains(p))
    }
}

const POSTGRES_RULES: &[Rule] = &[
    Rule::new(
        &["connection refused"],
        ErrorCategory::Connection,
        "Cannot connect to PostgreSQL server. Check if the server is running and that the connection details are correct.",
    ),
    Rule::new(
        &["authentication failed"],
        ErrorCategory::Authentication,
        "Invalid username or password for PostgreSQL database.",
    ),
    Rule::new(
        &["does not exist"],
        ErrorCategory::NotFound,
        "PostgreSQL database does not exist.",
    )
    .requiring(&["database"]),
    Rule::new(
        &["does not exist"],
        ErrorCategory::NotFound,
        "Table or column does not exist in the database.",
    ),
];

const MYSQL_RULES: &[Rule] = &[
    Rule::new(
        &["access denied"],
        ErrorCategory::Authentication,
        "Access denied for MySQL user. Check username and password.",
    ),
    Rule::new(
        &["unknown database"],
        ErrorCategory::NotFound,
        "MySQL database does not exist.",
    ),
    Rule::new(
        &["can't connect", "connection refused"],
        ErrorCategory::Connection,
        "Cannot connect to MySQL server. Check if the server is running and connection details are correct.",
    ),
    Rule::new(
        &["doesn't exist"],
        ErrorCategory::NotFound,
        "Table does not exist in MySQL database.",
    ),
];

const SQLITE_RULES: &[Rule] = &[
    Rule::new(
        &["no such table"],
        ErrorCategory::NotFound,
        "Table does not exist in SQLite database.",
    ),
    Rule::new(
        &["no such column"],
        ErrorCategory::NotFound,
        "Column does not exist in SQLite database.",
    ),
    Rule::new(
        &["database is locked"],
        ErrorCategory::Connection,
        "SQLite database is locked by another process. Try again in a moment.",
    ),
    Rule::new(
        &["unable to open database file"],
        ErrorCategory::Connection,
        "Cannot open SQLite database file. Check file path and permissions.",
    ),
];

const DB2_RULES: &[Rule] = &[
    Rule::new(
        &["sql0204n"],
        ErrorCategory::NotFound,
        "Table or view not found in DB2 database.",
    ),
    Rule::new(
        &["sql30081n"],
        ErrorCategory::Connection,
        "Cannot connect to DB2 server. Check network connectivity and connection details.",
    ),
    Rule::new(
        &["sql30082n"],
        ErrorCategory::Authentication,
        "DB2 authentication failed. Check username and password.",
    ),
];

fn rules_for(driver: DriverType) -> &'static [Rule] {
    match driver {
        DriverType::PostgreSQL => POSTGRES_RULES,
        DriverType::MySQL => MYSQL_RULES,
        DriverType::SQLite => SQLITE_RULES,
        DriverType::DB2 => DB2_RULES,
    }
}

fn build(category: ErrorCategory, message: impl Into<String>) -> DbError {
    match category {
        ErrorCategory::Connection => DbError::connection(message),
        ErrorCategory::Authentication => DbError::authentication(message),
        ErrorCategory::Query => DbError::query(message),
        ErrorCategory::Validation => DbError::validation(message),
        ErrorCategory::Security => DbError::security(message),
        ErrorCategory::Timeout => DbError::timeout(message),
        ErrorCategory::NotFound => DbError::not_found(message),
        ErrorCategory::DriverSpecific => DbError::driver(message),
        ErrorCategory::Unknown => DbError::unknown(message),
    }
}

/// Classify a native error message for the given backend.
///
/// # Examples
///
/// ```
/// use db_gateway::db::classify::classify;
/// use db_gateway::error::ErrorCategory;
/// use db_gateway::models::DriverType;
///
/// let err = classify("Access denied for user 'app'@'localhost'", DriverType::MySQL);
/// assert_eq!(err.category(), ErrorCategory::Authentication);
/// assert!(!err.is_recoverable());
/// ```
pub fn classify(native: &str, driver: DriverType) -> DbError {
    let text = native.to_lowercase();
    let classified = rules_for(driver)
        .iter()
        .find(|rule| rule.matches(&text))
        .map(|rule| build(rule.category, rule.message))
        .unwrap_or_else(|| DbError::query(format!("Database error: {native}")));
    classified.with_details(native)
}

/// Classify an sqlx error.
///
/// Pool state and server error codes are checked before falling back to the
/// text rules.
pub fn classify_sqlx(err: &sqlx::Error, driver: DriverType) -> DbError {
    let native = err.to_string();
    let structural = match err {
        sqlx::Error::PoolTimedOut => Some(DbError::timeout(format!(
            "Timed out waiting for a {} connection from the pool",
            driver.display_name()
        ))),
        sqlx::Error::PoolClosed => Some(DbError::connection(format!(
            "{} connection pool is closed",
            driver.display_name()
        ))),
        sqlx::Error::Configuration(_) => Some(DbError::driver(format!(
            "Invalid {} connection settings",
            driver.display_name()
        ))),
        sqlx::Error::Database(db_err) => match driver {
            DriverType::MySQL => db_err
                .try_downcast_ref::<sqlx::mysql::MySqlDatabaseError>()
                .and_then(|e| classify_mysql_number(e.number())),
            _ => db_err.code().and_then(|code| classify_sqlstate(&code)),
        },
        _ => None,
    };

    match structural {
        Some(err) => err.with_details(native),
        None => classify(&native, driver),
    }
}

/// PostgreSQL SQLSTATE codes with a fixed meaning.
fn classify_sqlstate(code: &str) -> Option<DbError> {
    let err = match code {
        "28P01" | "28000" => {
            DbError::authentication("Invalid username or password for PostgreSQL database.")
        }
        "3D000" => DbError::not_found("PostgreSQL database does not exist."),
        "42P01" | "42703" => DbError::not_found("Table or column does not exist in the database."),
        "57014" => DbError::timeout("Query was cancelled by the server (statement timeout)."),
        "53300" => DbError::connection("PostgreSQL server has too many connections."),
        c if c.starts_with("08") => DbError::connection(
            "Cannot connect to PostgreSQL server. Check if the server is running and that the connection details are correct.",
        ),
        _ => return None,
    };
    Some(err)
}

/// MySQL server error numbers with a fixed meaning.
fn classify_mysql_number(number: u16) -> Option<DbError> {
    let err = match number {
        1044 | 1045 => {
            DbError::authentication("Access denied for MySQL user. Check username and password.")
        }
        1049 => DbError::not_found("MySQL database does not exist."),
        1146 => DbError::not_found("Table does not exist in MySQL database."),
        1054 => DbError::not_found("Column does not exist in MySQL table."),
        2002 | 2003 => DbError::connection(
            "Cannot connect to MySQL server. Check if the server is running and connection details are correct.",
        ),
        3024 => DbError::timeout("Query exceeded the MySQL maximum execution time."),
        _ => return None,
    };
    Some(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postgres_connection_refused_is_recoverable() {
        let err = classify(
            "error connecting to server: Connection refused (os error 111)",
            DriverType::PostgreSQL,
        );
        assert_eq!(err.category(), ErrorCategory::Connection);
        assert!(err.is_recoverable());
        assert!(err.details().unwrap().contains("Connection refused"));
    }

    #[test]
    fn test_postgres_missing_database_vs_table() {
        let db = classify("database \"shop\" does not exist", DriverType::PostgreSQL);
        assert_eq!(db.to_string(), "PostgreSQL database does not exist.");

        let table = classify("relation \"users\" does not exist", DriverType::PostgreSQL);
        assert_eq!(
            table.to_string(),
            "Table or column does not exist in the database."
        );
        assert_eq!(table.category(), ErrorCategory::NotFound);
    }

    #[test]
    fn test_password_authentication_failed() {
        let err = classify(
            "password authentication failed for user \"app\"",
            DriverType::PostgreSQL,
        );
        assert_eq!(err.category(), ErrorCategory::Authentication);
    }

    #[test]
    fn test_rules_are_per_backend() {
        // "no such table" only means something to SQLite
        let err = classify("no such table: users", DriverType::PostgreSQL);
        assert_eq!(err.category(), ErrorCategory::Query);

        let err = classify("no such table: users", DriverType::SQLite);
        assert_eq!(err.category(), ErrorCategory::NotFound);
    }

    #[test]
    fn test_sqlite_locked_is_recoverable() {
        let err = classify("database is locked", DriverType::SQLite);
        assert_eq!(err.category(), ErrorCategory::Connection);
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_db2_codes() {
        let err = classify(
            "[IBM][CLI Driver][DB2] SQL0204N  \"APP.USERS\" is an undefined name.",
            DriverType::DB2,
        );
        assert_eq!(err.category(), ErrorCategory::NotFound);

        let err = classify("SQL30082N Security processing failed", DriverType::DB2);
        assert_eq!(err.category(), ErrorCategory::Authentication);

        let err = classify("SQL30081N A communication error", DriverType::DB2);
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_fallback_is_query() {
        let err = classify("syntax error at or near \"SELEC\"", DriverType::PostgreSQL);
        assert_eq!(err.category(), ErrorCategory::Query);
        assert!(!err.is_recoverable());
        assert!(err.to_string().starts_with("Database error: "));
    }

    #[test]
    fn test_empty_text_is_classified() {
        let err = classify("", DriverType::MySQL);
        assert_eq!(err.category(), ErrorCategory::Query);
    }

    #[test]
    fn test_sqlx_pool_timeout() {
        let err = classify_sqlx(&sqlx::Error::PoolTimedOut, DriverType::PostgreSQL);
        assert_eq!(err.category(), ErrorCategory::Timeout);
        assert!(err.is_recoverable());
        assert!(err.details().is_some());
    }

    #[test]
    fn test_sqlx_pool_closed() {
        let err = classify_sqlx(&sqlx::Error::PoolClosed, DriverType::MySQL);
        assert_eq!(err.category(), ErrorCategory::Connection);
    }

    #[test]
    fn test_sqlx_row_not_found_falls_back_to_text() {
        let err = classify_sqlx(&sqlx::Error::RowNotFound, DriverType::SQLite);
        assert_eq!(err.category(), ErrorCategory::Query);
    }

    #[test]
    fn test_sqlstate_codes() {
        assert_eq!(
            classify_sqlstate("28P01").map(|e| e.category()),
            Some(ErrorCategory::Authentication)
        );
        assert_eq!(
            classify_sqlstate("08006").map(|e| e.category()),
            Some(ErrorCategory::Connection)
        );
        assert_eq!(
            classify_sqlstate("57014").map(|e| e.category()),
            Some(ErrorCategory::Timeout)
        );
        assert!(classify_sqlstate("42601").is_none());
    }

    #[test]
    fn test_mysql_numbers() {
        assert_eq!(
            classify_mysql_number(1045).map(|e| e.category()),
            Some(ErrorCategory::Authentication)
        );
        assert_eq!(
            classify_mysql_number(1146).map(|e| e.category()),
            Some(ErrorCategory::NotFound)
        );
        assert!(classify_mysql_number(1064).is_none());
    }
}
