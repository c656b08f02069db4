//! End-to-end tests for the gateway over SQLite files.
//!
//! Tests verify that:
//! - Read-write databases accept writes through `execute_query`
//! - Read-only databases reject writes before they reach SQLite
//! - Result shaping (columns, truncation, limits) and the schema tools work
//!   against a real database file

use db_gateway::db::AdapterRegistry;
use db_gateway::error::ErrorCategory;
use db_gateway::models::{DatabaseConfig, DriverType, SqlParam};
use db_gateway::tools::query::{ExecuteQueryInput, QueryToolHandler, SampleDataInput};
use db_gateway::tools::schema::{
    DatabaseInput, DescribeTableInput, ListTablesInput, SchemaToolHandler,
};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use tempfile::TempDir;

struct Fixture {
    // Dropping the directory deletes the database file
    _dir: TempDir,
    registry: Arc<AdapterRegistry>,
}

impl Fixture {
    fn query(&self) -> QueryToolHandler {
        QueryToolHandler::new(self.registry.clone())
    }

    fn schema(&self) -> SchemaToolHandler {
        SchemaToolHandler::new(self.registry.clone())
    }
}

fn input(database: &str, query: &str, parameters: Vec<SqlParam>) -> ExecuteQueryInput {
    ExecuteQueryInput {
        database: database.to_string(),
        query: query.to_string(),
        parameters,
        limit: None,
    }
}

/// Seed a database file, then register it twice: `rw` and `ro`.
async fn setup() -> Fixture {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shop.db");
    let url = format!("sqlite:///{}", path.display());

    let mut seed = BTreeMap::new();
    seed.insert(
        "rw".to_string(),
        DatabaseConfig::new(DriverType::SQLite, url.clone(), false, 5, 30).unwrap(),
    );
    let writer = QueryToolHandler::new(Arc::new(AdapterRegistry::start(seed).await.unwrap()));
    writer
        .execute_query(input(
            "rw",
            "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL, score REAL DEFAULT 0)",
            vec![],
        ))
        .await
        .unwrap();
    for i in 1..=25 {
        writer
            .execute_query(input(
                "rw",
                "INSERT INTO users (id, name, score) VALUES (?, ?, ?)",
                vec![
                    SqlParam::Int(i),
                    SqlParam::String(format!("user{i}")),
                    SqlParam::Float(i as f64 / 2.0),
                ],
            ))
            .await
            .unwrap();
    }

    let mut configs = BTreeMap::new();
    configs.insert(
        "rw".to_string(),
        DatabaseConfig::new(DriverType::SQLite, url.clone(), false, 5, 30).unwrap(),
    );
    configs.insert(
        "ro".to_string(),
        DatabaseConfig::new(DriverType::SQLite, url, true, 5, 30).unwrap(),
    );
    let registry = Arc::new(AdapterRegistry::start(configs).await.unwrap());

    Fixture {
        _dir: dir,
        registry,
    }
}

#[tokio::test]
async fn test_select_returns_columns_and_rows() {
    let fx = setup().await;
    let output = fx
        .query()
        .execute_query(input(
            "ro",
            "SELECT id, name FROM users WHERE id <= ? ORDER BY id",
            vec![SqlParam::Int(2)],
        ))
        .await
        .unwrap();

    assert_eq!(output.columns, vec!["id", "name"]);
    assert_eq!(output.rows, vec![vec![json!(1), json!("user1")], vec![json!(2), json!("user2")]]);
    assert_eq!(output.row_count, 2);
    assert!(!output.truncated);
    assert_eq!(output.total_rows_before_limit, 2);
}

#[tokio::test]
async fn test_limit_truncates() {
    let fx = setup().await;
    let mut request = input("ro", "SELECT * FROM users ORDER BY id", vec![]);
    request.limit = Some(10);
    let output = fx.query().execute_query(request).await.unwrap();

    assert_eq!(output.row_count, 10);
    assert!(output.truncated);
    assert_eq!(output.total_rows_before_limit, 25);
    assert!(output.warning.is_none());
}

#[tokio::test]
async fn test_oversized_limit_is_capped_with_warning() {
    let fx = setup().await;
    let mut request = input("ro", "SELECT id FROM users", vec![]);
    request.limit = Some(50_000);
    let output = fx.query().execute_query(request).await.unwrap();

    assert_eq!(output.row_count, 25);
    assert!(!output.truncated);
    assert!(output.warning.unwrap().contains("50000"));
}

#[tokio::test]
async fn test_read_only_rejects_writes() {
    let fx = setup().await;
    for sql in [
        "INSERT INTO users (id, name) VALUES (100, 'x')",
        "UPDATE users SET name = 'x'",
        "DELETE FROM users",
        "DROP TABLE users",
    ] {
        let err = fx.query().execute_query(input("ro", sql, vec![])).await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Security, "{sql}");
    }

    let output = fx
        .query()
        .execute_query(input("ro", "SELECT COUNT(*) AS n FROM users", vec![]))
        .await
        .unwrap();
    assert_eq!(output.rows, vec![vec![json!(25)]]);
}

#[tokio::test]
async fn test_read_write_accepts_writes() {
    let fx = setup().await;
    fx.query()
        .execute_query(input(
            "rw",
            "UPDATE users SET name = ? WHERE id = ?",
            vec![SqlParam::String("renamed".to_string()), SqlParam::Int(1)],
        ))
        .await
        .unwrap();

    let output = fx
        .query()
        .execute_query(input("ro", "SELECT name FROM users WHERE id = 1", vec![]))
        .await
        .unwrap();
    assert_eq!(output.rows, vec![vec![json!("renamed")]]);
}

#[tokio::test]
async fn test_nul_bytes_are_stripped_from_parameters() {
    let fx = setup().await;
    let output = fx
        .query()
        .execute_query(input(
            "ro",
            "SELECT id FROM users WHERE name = ?",
            vec![SqlParam::String("user\u{0}7".to_string())],
        ))
        .await
        .unwrap();
    assert_eq!(output.rows, vec![vec![json!(7)]]);
}

#[tokio::test]
async fn test_oversized_parameter_is_validation_error() {
    let fx = setup().await;
    let err = fx
        .query()
        .execute_query(input(
            "ro",
            "SELECT id FROM users WHERE name = ?",
            vec![SqlParam::String("x".repeat(10_001))],
        ))
        .await
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Validation);
}

#[tokio::test]
async fn test_missing_table_is_not_found() {
    let fx = setup().await;
    let err = fx
        .query()
        .execute_query(input("ro", "SELECT * FROM nope", vec![]))
        .await
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::NotFound);
    assert!(err.details().unwrap().contains("no such table"));
}

#[tokio::test]
async fn test_sample_data() {
    let fx = setup().await;
    let output = fx
        .query()
        .get_sample_data(SampleDataInput {
            database: "ro".to_string(),
            table: "users".to_string(),
            schema: None,
            limit: Some(500),
        })
        .await
        .unwrap();

    assert_eq!(output.table, "users");
    assert_eq!(output.columns, vec!["id", "name", "score"]);
    assert_eq!(output.row_count, 25);
}

#[tokio::test]
async fn test_schema_tools() {
    let fx = setup().await;
    let schema = fx.schema();

    let tables = schema
        .list_tables(ListTablesInput {
            database: "ro".to_string(),
            schema: None,
        })
        .await
        .unwrap();
    assert_eq!(tables.tables, vec!["users"]);
    assert_eq!(tables.table_count, 1);

    let described = schema
        .describe_table(DescribeTableInput {
            database: "ro".to_string(),
            table: "users".to_string(),
            schema: None,
        })
        .await
        .unwrap();
    assert_eq!(described.column_count, 3);
    let id = &described.columns[0];
    assert_eq!(id.name, "id");
    assert!(id.primary_key);
    let name = &described.columns[1];
    assert!(!name.nullable);
    assert_eq!(described.columns[2].default.as_deref(), Some("0"));

    let err = schema
        .describe_table(DescribeTableInput {
            database: "ro".to_string(),
            table: "ghost".to_string(),
            schema: None,
        })
        .await
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::NotFound);

    let status = schema
        .test_connection(DatabaseInput {
            database: "ro".to_string(),
        })
        .await
        .unwrap();
    assert!(status.connected);
    assert_eq!(status.table_count, Some(1));

    let databases = schema.list_databases();
    let names: Vec<_> = databases.databases.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["ro", "rw"]);

    fx.registry.close_all().await;
}
