//! Schema bootstrap
//!
//! Creates the tables on startup if they are missing. There are no
//! migrations: existing tables are left exactly as found.

use pbxlog_core::{AppError, AppResult};
use sqlx::PgPool;
use tracing::{error, info, instrument};

/// Append-only call legs. No primary key: a call id repeats across legs.
pub const CREATE_CALLS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS calls (
        callid     BIGINT,
        extension  BIGINT,
        auth       TEXT,
        calltime   TEXT,
        duration   TEXT,
        code       TEXT,
        dialed     TEXT,
        account    TEXT,
        cost       NUMERIC,
        clid       TEXT,
        clidname   TEXT,
        gpno       TEXT,
        ringtime   TEXT
    )
"#;

/// Supports the canonical listing order
pub const CREATE_CALLS_ORDER_INDEX: &str = r#"
    CREATE INDEX IF NOT EXISTS calls_calltime_callid_idx
        ON calls (calltime DESC, callid DESC)
"#;

/// Code -> display name directory, filled by an external process
pub const CREATE_DIRECTORY_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS directory (
        code  TEXT PRIMARY KEY,
        name  TEXT NOT NULL
    )
"#;

/// Create the calls table, its ordering index and, when enabled, the directory table.
///
/// Safe to run on every start.
///
/// # Errors
///
/// Returns `AppError::Schema` if any statement fails.
#[instrument(skip(pool))]
pub async fn ensure_schema(pool: &PgPool, lookup_table: bool) -> AppResult<()> {
    let mut statements = vec![
        ("calls", CREATE_CALLS_TABLE),
        ("calls_calltime_callid_idx", CREATE_CALLS_ORDER_INDEX),
    ];
    if lookup_table {
        statements.push(("directory", CREATE_DIRECTORY_TABLE));
    }

    for (name, sql) in statements {
        sqlx::query(sql).execute(pool).await.map_err(|e| {
            error!("Failed to create {}: {}", name, e);
            AppError::Schema(format!("Failed to create {}: {}", name, e))
        })?;
    }

    info!(lookup_table, "Database schema ready");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statements_are_idempotent() {
        for sql in [
            CREATE_CALLS_TABLE,
            CREATE_CALLS_ORDER_INDEX,
            CREATE_DIRECTORY_TABLE,
        ] {
            assert!(sql.contains("IF NOT EXISTS"));
        }
    }

    #[test]
    fn test_calls_table_has_no_primary_key() {
        assert!(!CREATE_CALLS_TABLE.contains("PRIMARY KEY"));
        assert!(CREATE_CALLS_TABLE.contains("cost       NUMERIC"));
    }

    #[tokio::test]
    #[ignore] // Requires database
    async fn test_ensure_schema_twice() {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgresql://localhost/pbxlog".to_string());
        let pool = crate::create_pool(&database_url, Some(2)).await.unwrap();

        ensure_schema(&pool, true).await.unwrap();
        ensure_schema(&pool, true).await.unwrap();
    }
}
