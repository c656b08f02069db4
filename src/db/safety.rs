//! Query safety gate.
//!
//! Every query passes through [`SafetyGate::validate`] before it reaches a
//! driver. The gate enforces, in order:
//!
//! 1. non-empty text
//! 2. no `--` or `/*` anywhere in the text (comments can hide a second
//!    statement, so they are banned outright rather than trusted to a parser)
//! 3. the text parses, with the backend's dialect, into exactly one statement
//! 4. in read-only mode, no write keyword appears as a whole word and the
//!    parsed statement is a `SELECT` or something unclassifiable
//!
//! The keyword scan is purely textual: a banned keyword standing alone inside
//! a string literal is still rejected.
//!
//! Uses [sqlparser](https://docs.rs/sqlparser/) for parsing.

use crate::error::{DbError, DbResult};
use crate::models::DriverType;
use sqlparser::ast::{Query, SetExpr, Statement};
use sqlparser::dialect::{
    Dialect, GenericDialect, MySqlDialect, PostgreSqlDialect, SQLiteDialect,
};
use sqlparser::parser::Parser;
use sqlparser::tokenizer::{Token, Tokenizer};

/// Keywords rejected as whole words in read-only mode.
pub const READ_ONLY_BANNED_KEYWORDS: &[&str] = &[
    "INSERT", "UPDATE", "DELETE", "DROP", "CREATE", "ALTER", "TRUNCATE", "GRANT", "REVOKE",
    "EXEC", "EXECUTE",
];

mod error_messages {
    pub const EMPTY: &str = "Query cannot be empty";
    pub const NO_STATEMENT: &str = "No valid SQL statement found";
    pub const MULTIPLE_STATEMENTS: &str =
        "Multiple SQL statements are not allowed. Submit one statement per query.";
    pub const COMMENTS: &str = "SQL comments (-- or /*) are not allowed in queries";
    pub const READ_ONLY: &str = "Only SELECT queries are allowed.";
}

/// Kind of SQL statement detected by the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// SELECT, VALUES, and EXPLAIN of a read
    Select,
    /// INSERT, UPDATE, DELETE, MERGE, COPY
    DmlWrite,
    /// CREATE, DROP, ALTER, TRUNCATE, COMMENT
    Ddl,
    /// BEGIN, COMMIT, ROLLBACK, SAVEPOINT
    Transaction,
    /// CALL, EXECUTE, PREPARE
    ProcedureCall,
    /// GRANT, REVOKE, SET, VACUUM, assigning PRAGMA, ...
    Administrative,
    /// SHOW, DESCRIBE, reading PRAGMA and anything else without a write meaning
    Unknown,
}

impl StatementKind {
    /// Whether a read-only gate lets this kind through.
    pub fn allowed_read_only(&self) -> bool {
        matches!(self, Self::Select | Self::Unknown)
    }
}

/// Get the appropriate SQL dialect for the given backend.
fn get_dialect(driver: DriverType) -> Box<dyn Dialect> {
    match driver {
        DriverType::PostgreSQL => Box::new(PostgreSqlDialect {}),
        DriverType::MySQL => Box::new(MySqlDialect {}),
        DriverType::SQLite => Box::new(SQLiteDialect {}),
        DriverType::DB2 => Box::new(GenericDialect {}),
    }
}

/// Per-adapter query validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SafetyGate {
    driver: DriverType,
    read_only: bool,
}

impl SafetyGate {
    pub fn new(driver: DriverType, read_only: bool) -> Self {
        Self { driver, read_only }
    }

    pub fn driver(&self) -> DriverType {
        self.driver
    }

    pub fn read_only(&self) -> bool {
        self.read_only
    }

    /// Validate query text. Fails with a validation or security error.
    pub fn validate(&self, query: &str) -> DbResult<()> {
        validate_query(query, self.driver, self.read_only)
    }
}

/// Validate query text for the given backend.
///
/// # Examples
///
/// ```
/// use db_gateway::db::safety::validate_query;
/// use db_gateway::error::ErrorCategory;
/// use db_gateway::models::DriverType;
///
/// assert!(validate_query("SELECT * FROM users", DriverType::PostgreSQL, true).is_ok());
///
/// let err = validate_query("SELECT 1; DROP TABLE users", DriverType::PostgreSQL, false)
///     .unwrap_err();
/// assert_eq!(err.category(), ErrorCategory::Security);
/// ```
pub fn validate_query(query: &str, driver: DriverType, read_only: bool) -> DbResult<()> {
    if query.trim().is_empty() {
        return Err(DbError::validation(error_messages::EMPTY));
    }

    if query.contains("--") || query.contains("/*") {
        return Err(DbError::security(error_messages::COMMENTS));
    }

    let dialect = get_dialect(driver);
    let statements = match Parser::parse_sql(dialect.as_ref(), query) {
        Ok(statements) => statements,
        Err(e) => {
            if count_statements(dialect.as_ref(), query) > 1 {
                return Err(DbError::security(error_messages::MULTIPLE_STATEMENTS));
            }
            return Err(DbError::validation(format!("Invalid SQL syntax: {e}")));
        }
    };

    let statement = match statements.as_slice() {
        [] => return Err(DbError::validation(error_messages::NO_STATEMENT)),
        [statement] => statement,
        _ => return Err(DbError::security(error_messages::MULTIPLE_STATEMENTS)),
    };

    if read_only {
        if let Some(keyword) = find_banned_keyword(query) {
            return Err(DbError::security(format!(
                "Query contains '{keyword}' but server is in read-only mode. {}",
                error_messages::READ_ONLY
            )));
        }

        let (kind, name) = classify_statement(statement);
        if !kind.allowed_read_only() {
            return Err(DbError::security(format!(
                "{name} statements are not allowed in read-only mode. {}",
                error_messages::READ_ONLY
            )));
        }
    }

    Ok(())
}

/// Return the first banned keyword appearing as a whole word.
///
/// Any whitespace counts as a word boundary, as do the start and end of the
/// text.
pub fn find_banned_keyword(query: &str) -> Option<&'static str> {
    let normalized: String = query
        .chars()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .collect();
    let padded = format!(" {} ", normalized.to_uppercase());

    READ_ONLY_BANNED_KEYWORDS
        .iter()
        .copied()
        .find(|kw| padded.contains(&format!(" {kw} ")))
}

/// Count non-empty `;`-separated statements without parsing them.
///
/// Used only when the parser rejects the text, to tell statement smuggling
/// apart from a plain syntax error.
fn count_statements(dialect: &dyn Dialect, query: &str) -> usize {
    let Ok(tokens) = Tokenizer::new(dialect, query).tokenize() else {
        return usize::from(!query.trim().is_empty());
    };

    let mut count = 0;
    let mut current_has_content = false;
    for token in tokens {
        match token {
            Token::SemiColon => {
                if current_has_content {
                    count += 1;
                }
                current_has_content = false;
            }
            Token::Whitespace(_) | Token::EOF => {}
            _ => current_has_content = true,
        }
    }
    if current_has_content {
        count += 1;
    }
    count
}

/// Whether a query body (or any CTE it defines) writes data.
fn query_writes(query: &Query) -> bool {
    let cte_writes = query
        .with
        .as_ref()
        .is_some_and(|with| with.cte_tables.iter().any(|cte| query_writes(&cte.query)));
    cte_writes || set_expr_writes(&query.body)
}

fn set_expr_writes(expr: &SetExpr) -> bool {
    match expr {
        SetExpr::Insert(_) | SetExpr::Update(_) | SetExpr::Delete(_) | SetExpr::Merge(_) => true,
        // `SELECT ... INTO t` creates a table
        SetExpr::Select(select) => select.into.is_some(),
        SetExpr::Query(query) => query_writes(query),
        SetExpr::SetOperation { left, right, .. } => {
            set_expr_writes(left) || set_expr_writes(right)
        }
        _ => false,
    }
}

/// Classify a parsed statement into a statement kind.
pub fn classify_statement(stmt: &Statement) -> (StatementKind, &'static str) {
    match stmt {
        // =====================================================================
        // Reads
        // =====================================================================
        Statement::Query(query) => {
            if query_writes(query) {
                (StatementKind::DmlWrite, "Data-modifying query")
            } else {
                (StatementKind::Select, "SELECT")
            }
        }

        // EXPLAIN inherits the kind of the statement it wraps
        Statement::Explain { statement, .. } => {
            let (inner_kind, inner_name) = classify_statement(statement);
            if inner_kind == StatementKind::Select {
                (StatementKind::Select, "EXPLAIN")
            } else {
                (inner_kind, inner_name)
            }
        }

        // `PRAGMA x = v` changes connection state; `PRAGMA x(v)` only reads
        Statement::Pragma { is_eq: true, .. } => {
            (StatementKind::Administrative, "PRAGMA assignment")
        }

        // =====================================================================
        // DML writes
        // =====================================================================
        Statement::Insert(_) => (StatementKind::DmlWrite, "INSERT"),
        Statement::Update { .. } => (StatementKind::DmlWrite, "UPDATE"),
        Statement::Delete(_) => (StatementKind::DmlWrite, "DELETE"),
        Statement::Merge { .. } => (StatementKind::DmlWrite, "MERGE"),
        Statement::Copy { .. } => (StatementKind::DmlWrite, "COPY"),

        // =====================================================================
        // DDL
        // =====================================================================
        Statement::CreateTable { .. } => (StatementKind::Ddl, "CREATE TABLE"),
        Statement::CreateView { .. } => (StatementKind::Ddl, "CREATE VIEW"),
        Statement::CreateIndex(_) => (StatementKind::Ddl, "CREATE INDEX"),
        Statement::CreateSchema { .. } => (StatementKind::Ddl, "CREATE SCHEMA"),
        Statement::CreateDatabase { .. } => (StatementKind::Ddl, "CREATE DATABASE"),
        Statement::CreateSequence { .. } => (StatementKind::Ddl, "CREATE SEQUENCE"),
        Statement::CreateType { .. } => (StatementKind::Ddl, "CREATE TYPE"),
        Statement::CreateFunction { .. } => (StatementKind::Ddl, "CREATE FUNCTION"),
        Statement::CreateProcedure { .. } => (StatementKind::Ddl, "CREATE PROCEDURE"),
        Statement::CreateTrigger { .. } => (StatementKind::Ddl, "CREATE TRIGGER"),
        Statement::CreateRole { .. } => (StatementKind::Ddl, "CREATE ROLE"),
        Statement::CreateVirtualTable { .. } => (StatementKind::Ddl, "CREATE VIRTUAL TABLE"),
        Statement::CreateExtension { .. } => (StatementKind::Ddl, "CREATE EXTENSION"),

        Statement::AlterTable { .. } => (StatementKind::Ddl, "ALTER TABLE"),
        Statement::AlterView { .. } => (StatementKind::Ddl, "ALTER VIEW"),
        Statement::AlterIndex { .. } => (StatementKind::Ddl, "ALTER INDEX"),
        Statement::AlterRole { .. } => (StatementKind::Ddl, "ALTER ROLE"),

        Statement::Drop { .. } => (StatementKind::Ddl, "DROP"),
        Statement::DropFunction { .. } => (StatementKind::Ddl, "DROP FUNCTION"),
        Statement::DropProcedure { .. } => (StatementKind::Ddl, "DROP PROCEDURE"),
        Statement::DropTrigger { .. } => (StatementKind::Ddl, "DROP TRIGGER"),

        Statement::Truncate { .. } => (StatementKind::Ddl, "TRUNCATE"),
        Statement::Comment { .. } => (StatementKind::Ddl, "COMMENT"),

        // =====================================================================
        // Transaction control
        // =====================================================================
        Statement::StartTransaction { .. } => (StatementKind::Transaction, "BEGIN"),
        Statement::Commit { .. } => (StatementKind::Transaction, "COMMIT"),
        Statement::Rollback { .. } => (StatementKind::Transaction, "ROLLBACK"),
        Statement::Savepoint { .. } => (StatementKind::Transaction, "SAVEPOINT"),
        Statement::ReleaseSavepoint { .. } => (StatementKind::Transaction, "RELEASE SAVEPOINT"),

        // =====================================================================
        // Procedures
        // =====================================================================
        Statement::Call { .. } => (StatementKind::ProcedureCall, "CALL"),
        Statement::Execute { .. } => (StatementKind::ProcedureCall, "EXECUTE"),
        Statement::Prepare { .. } => (StatementKind::ProcedureCall, "PREPARE"),

        // =====================================================================
        // Administrative
        // =====================================================================
        Statement::Grant { .. } => (StatementKind::Administrative, "GRANT"),
        Statement::Revoke { .. } => (StatementKind::Administrative, "REVOKE"),
        Statement::Set(_) => (StatementKind::Administrative, "SET"),
        Statement::Use(_) => (StatementKind::Administrative, "USE"),
        Statement::Kill { .. } => (StatementKind::Administrative, "KILL"),
        Statement::Vacuum { .. } => (StatementKind::Administrative, "VACUUM"),
        Statement::Analyze { .. } => (StatementKind::Administrative, "ANALYZE"),
        Statement::LockTables { .. } => (StatementKind::Administrative, "LOCK"),
        Statement::UnlockTables => (StatementKind::Administrative, "UNLOCK"),
        Statement::Flush { .. } => (StatementKind::Administrative, "FLUSH"),
        Statement::AttachDatabase { .. } => (StatementKind::Administrative, "ATTACH"),
        Statement::LISTEN { .. } => (StatementKind::Administrative, "LISTEN"),
        Statement::NOTIFY { .. } => (StatementKind::Administrative, "NOTIFY"),

        // SHOW, DESCRIBE, reading PRAGMA, ...
        _ => (StatementKind::Unknown, "Unknown"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;

    const PG: DriverType = DriverType::PostgreSQL;

    fn category(query: &str, read_only: bool) -> Option<ErrorCategory> {
        validate_query(query, PG, read_only).err().map(|e| e.category())
    }

    #[test]
    fn test_select_allowed() {
        assert!(validate_query("SELECT * FROM users", PG, true).is_ok());
    }

    #[test]
    fn test_trailing_semicolon_is_single_statement() {
        assert!(validate_query("SELECT 1;", PG, true).is_ok());
    }

    #[test]
    fn test_empty_is_validation() {
        assert_eq!(category("", true), Some(ErrorCategory::Validation));
        assert_eq!(category(" \n\t ", false), Some(ErrorCategory::Validation));
    }

    #[test]
    fn test_parse_error_is_validation_with_detail() {
        let err = validate_query("SELEC * FROM users", PG, true).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Validation);
        assert!(err.to_string().starts_with("Invalid SQL syntax"));
    }

    #[test]
    fn test_multiple_statements_is_security() {
        assert_eq!(
            category("SELECT * FROM users; DROP TABLE users", true),
            Some(ErrorCategory::Security)
        );
        assert_eq!(
            category("SELECT 1; SELECT 2", false),
            Some(ErrorCategory::Security)
        );
    }

    #[test]
    fn test_unparseable_second_statement_is_security() {
        assert_eq!(
            category("SELECT 1; FROBNICATE everything", false),
            Some(ErrorCategory::Security)
        );
    }

    #[test]
    fn test_comments_are_security_regardless_of_mode() {
        assert_eq!(category("SELECT 1 -- hi", true), Some(ErrorCategory::Security));
        assert_eq!(category("SELECT /* x */ 1", false), Some(ErrorCategory::Security));
        assert_eq!(category("SELECT '--'", false), Some(ErrorCategory::Security));
    }

    #[test]
    fn test_read_only_keyword_scan() {
        let err = validate_query("select * from t where note = ' delete '", PG, true).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Security);
        assert!(err.to_string().contains("'DELETE'"));
    }

    #[test]
    fn test_keyword_substring_not_flagged() {
        assert!(validate_query("SELECT created_at, update_count FROM t", PG, true).is_ok());
        assert_eq!(find_banned_keyword("SELECT CREATE_DATE FROM t"), None);
    }

    #[test]
    fn test_keyword_boundaries_include_tabs_and_newlines() {
        assert_eq!(find_banned_keyword("DELETE\tFROM t"), Some("DELETE"));
        assert_eq!(find_banned_keyword("x\nupdate\ny"), Some("UPDATE"));
    }

    #[test]
    fn test_writes_pass_when_not_read_only() {
        assert!(validate_query("INSERT INTO users (id) VALUES (1)", PG, false).is_ok());
        assert!(validate_query("UPDATE users SET name = 'x' WHERE id = 1", PG, false).is_ok());
        assert!(validate_query("DELETE FROM users WHERE id = 1", PG, false).is_ok());
    }

    #[test]
    fn test_statement_type_check_catches_unpadded_keyword() {
        // "(INSERT" has no space before the keyword, so only the parse-based check fires
        assert_eq!(
            category("WITH x AS (INSERT INTO t VALUES (1) RETURNING *) SELECT * FROM x", true),
            Some(ErrorCategory::Security)
        );
    }

    #[test]
    fn test_delete_inside_cte_is_a_write() {
        assert_eq!(
            category("WITH d AS (DELETE FROM t RETURNING *) SELECT * FROM d", true),
            Some(ErrorCategory::Security)
        );
        assert_eq!(
            category("WITH u AS (UPDATE t SET a = 1 RETURNING *) SELECT * FROM u", true),
            Some(ErrorCategory::Security)
        );
        assert!(category("WITH d AS (DELETE FROM t RETURNING *) SELECT * FROM d", false).is_none());
    }

    #[test]
    fn test_select_into_is_a_write() {
        assert_eq!(
            category("SELECT * INTO archived_users FROM users", true),
            Some(ErrorCategory::Security)
        );
        assert!(category("SELECT * INTO archived_users FROM users", false).is_none());
    }

    #[test]
    fn test_set_blocked_in_read_only() {
        assert_eq!(
            category("SET search_path = public", true),
            Some(ErrorCategory::Security)
        );
    }

    #[test]
    fn test_show_is_unclassified_and_allowed() {
        assert!(validate_query("SHOW TABLES", DriverType::MySQL, true).is_ok());
    }

    #[test]
    fn test_explain_select_allowed() {
        assert!(validate_query("EXPLAIN SELECT * FROM users", PG, true).is_ok());
    }

    #[test]
    fn test_sqlite_pragma_assignment_blocked() {
        let gate = SafetyGate::new(DriverType::SQLite, true);
        assert!(gate.validate("PRAGMA table_info('users')").is_ok());
        assert!(gate.validate("PRAGMA user_version").is_ok());
        assert_eq!(
            gate.validate("PRAGMA query_only = 0").unwrap_err().category(),
            ErrorCategory::Security
        );
    }

    #[test]
    fn test_db2_uses_generic_dialect() {
        let gate = SafetyGate::new(DriverType::DB2, true);
        assert!(
            gate.validate("SELECT CURRENT SCHEMA FROM SYSIBM.SYSDUMMY1")
                .is_ok()
        );
    }

    #[test]
    fn test_count_statements() {
        let dialect = GenericDialect {};
        assert_eq!(count_statements(&dialect, "SELECT 1"), 1);
        assert_eq!(count_statements(&dialect, "SELECT 1;"), 1);
        assert_eq!(count_statements(&dialect, "SELECT 1; ;"), 1);
        assert_eq!(count_statements(&dialect, "SELECT 1; bogus"), 2);
        assert_eq!(count_statements(&dialect, "SELECT ';'"), 1);
    }
}
