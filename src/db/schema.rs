//! Catalog introspection SQL.
//!
//! Each backend has its own submodule with queries against its system
//! catalogs. Adapters run these directly, bypassing the safety gate, since
//! the text is fixed and only values are bound.

use crate::error::{DbError, ErrorCategory};

/// Error for a table with no visible columns.
pub(crate) fn table_not_found(table: &str, schema: Option<&str>) -> DbError {
    let qualified = match schema {
        Some(schema) => format!("{schema}.{table}"),
        None => table.to_string(),
    };
    DbError::not_found(format!("Table '{qualified}' not found"))
}

/// Whether a catalog query failed because the user may not read the catalog.
pub(crate) fn catalog_denied(err: &DbError) -> bool {
    if err.category() == ErrorCategory::Authentication {
        return true;
    }
    let text = err.details().unwrap_or_default().to_lowercase();
    ["permission denied", "access denied", "42501", "sql0551n"]
        .iter()
        .any(|marker| text.contains(marker))
}

pub(crate) mod queries {
    pub mod postgres {
        pub const LIST_TABLES_IN_SCHEMA: &str = r#"
            SELECT tablename::text
            FROM pg_tables
            WHERE schemaname = $1
            ORDER BY tablename
            "#;

        pub const LIST_TABLES: &str = r#"
            SELECT tablename::text
            FROM pg_tables
            WHERE schemaname NOT IN ('pg_catalog', 'information_schema')
            ORDER BY tablename
            "#;

        pub const DESCRIBE_COLUMNS: &str = r#"
        SELECT
            c.column_name::text AS column_name,
            c.data_type::text AS data_type,
            c.is_nullable::text AS is_nullable,
            c.column_default::text AS column_default,
            CASE WHEN pk.column_name IS NOT NULL THEN true ELSE false END AS is_primary_key
        FROM information_schema.columns c
        LEFT JOIN (
            SELECT ku.column_name
            FROM information_schema.table_constraints tc
            JOIN information_schema.key_column_usage ku
                ON tc.constraint_name = ku.constraint_name
                AND tc.table_schema = ku.table_schema
            WHERE tc.constraint_type = 'PRIMARY KEY'
                AND tc.table_schema = $1
                AND tc.table_name = $2
        ) pk ON c.column_name = pk.column_name
        WHERE c.table_schema = $1
            AND c.table_name = $2
        ORDER BY c.ordinal_position
        "#;

        pub const LIST_SCHEMAS: &str = r#"
            SELECT schema_name::text
            FROM information_schema.schemata
            WHERE schema_name NOT IN ('pg_catalog', 'information_schema', 'pg_toast')
            ORDER BY schema_name
            "#;

        pub const VERSION: &str = "SELECT version()";
        pub const CURRENT_DATABASE: &str = "SELECT current_database()::text";
        pub const COUNT_TABLES: &str = r#"
            SELECT COUNT(*)
            FROM pg_tables
            WHERE schemaname NOT IN ('pg_catalog', 'information_schema')
            "#;
    }

    pub mod mysql {
        pub const LIST_TABLES: &str = r#"
            SELECT CONVERT(TABLE_NAME USING utf8) AS TABLE_NAME
            FROM information_schema.tables
            WHERE TABLE_SCHEMA = COALESCE(?, DATABASE())
            AND TABLE_TYPE = 'BASE TABLE'
            ORDER BY TABLE_NAME
            "#;

        pub const DESCRIBE_COLUMNS: &str = r#"
        SELECT
            CONVERT(COLUMN_NAME USING utf8) AS COLUMN_NAME,
            CONVERT(DATA_TYPE USING utf8) AS DATA_TYPE,
            CONVERT(IS_NULLABLE USING utf8) AS IS_NULLABLE,
            CONVERT(COLUMN_DEFAULT USING utf8) AS COLUMN_DEFAULT,
            CONVERT(COLUMN_KEY USING utf8) AS COLUMN_KEY
        FROM information_schema.columns
        WHERE TABLE_NAME = ? AND TABLE_SCHEMA = COALESCE(?, DATABASE())
        ORDER BY ORDINAL_POSITION
        "#;

        pub const LIST_SCHEMAS: &str = r#"
            SELECT CONVERT(SCHEMA_NAME USING utf8) AS SCHEMA_NAME
            FROM information_schema.schemata
            WHERE SCHEMA_NAME NOT IN ('information_schema', 'mysql', 'performance_schema', 'sys')
            ORDER BY SCHEMA_NAME
            "#;

        pub const VERSION: &str = "SELECT CONVERT(VERSION() USING utf8)";
        pub const CURRENT_DATABASE: &str = "SELECT CONVERT(DATABASE() USING utf8)";
        pub const COUNT_TABLES: &str = r#"
            SELECT COUNT(*)
            FROM information_schema.tables
            WHERE TABLE_SCHEMA = DATABASE()
            AND TABLE_TYPE = 'BASE TABLE'
            "#;

        pub const SET_READ_ONLY: &str = "SET SESSION TRANSACTION READ ONLY";
    }

    pub mod sqlite {
        pub const LIST_TABLES: &str = r#"
            SELECT name FROM sqlite_master
            WHERE type = 'table'
            AND name NOT LIKE 'sqlite_%'
            ORDER BY name
            "#;

        pub const VERSION: &str = "SELECT sqlite_version()";
        pub const COUNT_TABLES: &str = "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'";
        pub const QUERY_ONLY: &str = "PRAGMA query_only = ON";
    }

    #[cfg_attr(not(feature = "db2"), allow(dead_code))]
    pub mod db2 {
        pub const LIST_TABLES_IN_SCHEMA: &str = r#"
            SELECT TABNAME
            FROM SYSCAT.TABLES
            WHERE TYPE = 'T' AND TABSCHEMA = ?
            ORDER BY TABNAME
            "#;

        pub const LIST_TABLES: &str = r#"
            SELECT TABNAME
            FROM SYSCAT.TABLES
            WHERE TYPE = 'T' AND TABSCHEMA NOT LIKE 'SYS%'
            ORDER BY TABNAME
            "#;

        pub const DESCRIBE_COLUMNS_IN_SCHEMA: &str = r#"
        SELECT COLNAME, TYPENAME, NULLS, DEFAULT, KEYSEQ
        FROM SYSCAT.COLUMNS
        WHERE TABNAME = ? AND TABSCHEMA = ?
        ORDER BY COLNO
        "#;

        pub const DESCRIBE_COLUMNS: &str = r#"
        SELECT COLNAME, TYPENAME, NULLS, DEFAULT, KEYSEQ
        FROM SYSCAT.COLUMNS
        WHERE TABNAME = ? AND TABSCHEMA NOT LIKE 'SYS%'
        ORDER BY TABSCHEMA, COLNO
        "#;

        pub const LIST_SCHEMAS: &str = r#"
            SELECT SCHEMANAME
            FROM SYSCAT.SCHEMATA
            WHERE SCHEMANAME NOT LIKE 'SYS%'
            ORDER BY SCHEMANAME
            "#;

        pub const CURRENT_SCHEMA: &str = "SELECT CURRENT SCHEMA FROM SYSIBM.SYSDUMMY1";
        pub const COUNT_TABLES: &str = r#"
            SELECT COUNT(*)
            FROM SYSCAT.TABLES
            WHERE TYPE = 'T'
            AND TABSCHEMA NOT LIKE 'SYS%'
            "#;
    }
}
