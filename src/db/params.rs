//! Parameter sanitizing and binding.
//!
//! [`sanitize_params`] runs on every parameter list before it reaches a
//! driver. The `bind_*` helpers attach sanitized parameters to sqlx queries.

use crate::error::{DbError, DbResult};
use crate::models::{MAX_PARAM_CHARS, SqlParam};
use sqlx::mysql::MySqlArguments;
use sqlx::postgres::PgArguments;
use sqlx::sqlite::SqliteArguments;
use sqlx::{MySql, Postgres, Sqlite};

/// Strip NUL characters from text parameters and enforce the length ceiling.
///
/// Non-text values pass through unchanged.
pub fn sanitize_params(params: &[SqlParam]) -> DbResult<Vec<SqlParam>> {
    params.iter().map(sanitize_param).collect()
}

fn sanitize_param(param: &SqlParam) -> DbResult<SqlParam> {
    match param {
        SqlParam::String(s) => {
            let cleaned: String = s.chars().filter(|c| *c != '\0').collect();
            if cleaned.chars().count() > MAX_PARAM_CHARS {
                return Err(DbError::validation(format!(
                    "Parameter value too long (max {MAX_PARAM_CHARS} characters)"
                )));
            }
            Ok(SqlParam::String(cleaned))
        }
        other => Ok(other.clone()),
    }
}

/// Bind a parameter to a MySQL query.
pub(crate) fn bind_mysql_param<'q>(
    query: sqlx::query::Query<'q, MySql, MySqlArguments>,
    param: &'q SqlParam,
) -> sqlx::query::Query<'q, MySql, MySqlArguments> {
    match param {
        SqlParam::Null => query.bind(None::<String>),
        SqlParam::Bool(v) => query.bind(*v),
        SqlParam::Int(v) => query.bind(*v),
        SqlParam::Float(v) => query.bind(*v),
        SqlParam::String(v) => query.bind(v.as_str()),
    }
}

/// Bind a parameter to a PostgreSQL query.
pub(crate) fn bind_postgres_param<'q>(
    query: sqlx::query::Query<'q, Postgres, PgArguments>,
    param: &'q SqlParam,
) -> sqlx::query::Query<'q, Postgres, PgArguments> {
    match param {
        SqlParam::Null => query.bind(None::<String>),
        SqlParam::Bool(v) => query.bind(*v),
        SqlParam::Int(v) => query.bind(*v),
        SqlParam::Float(v) => query.bind(*v),
        SqlParam::String(v) => query.bind(v.as_str()),
    }
}

/// Bind a parameter to a SQLite query.
pub(crate) fn bind_sqlite_param<'q>(
    query: sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>,
    param: &'q SqlParam,
) -> sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>> {
    match param {
        SqlParam::Null => query.bind(None::<String>),
        SqlParam::Bool(v) => query.bind(*v),
        SqlParam::Int(v) => query.bind(*v),
        SqlParam::Float(v) => query.bind(*v),
        SqlParam::String(v) => query.bind(v.as_str()),
    }
}
