//! Persistence gateway over a local SQLite database.
//!
//! This module handles:
//! - Connection pool management with WAL mode
//! - Schema migrations
//! - The store-error vocabulary the error classifier depends on
//! - Point reads and writes for users, teams and pull requests

pub mod lookup;
pub mod pool;
pub mod pull_requests;
pub mod teams;
pub mod users;

pub use lookup::Lookup;

use sqlx::error::ErrorKind;
use std::path::Path;
use thiserror::Error;

/// Store-level failures.
///
/// The variants are the contract between the gateway and the error classifier:
/// a unique-key clash, a missing required reference (not-null or foreign key),
/// an absent row, or anything else the driver reports.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("required reference missing: {0}")]
    ConstraintViolation(String),

    #[error("no matching row")]
    NoRows,

    #[error("SQLite error: {0}")]
    Sqlite(sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(String),
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        if matches!(err, sqlx::Error::RowNotFound) {
            return Self::NoRows;
        }

        let kind = err.as_database_error().map(|db_err| db_err.kind());
        match kind {
            Some(ErrorKind::UniqueViolation) => Self::UniqueViolation(err.to_string()),
            Some(ErrorKind::ForeignKeyViolation) | Some(ErrorKind::NotNullViolation) => {
                Self::ConstraintViolation(err.to_string())
            }
            _ => Self::Sqlite(err),
        }
    }
}

/// Ordered list of schema migrations. Names are recorded once applied.
const MIGRATIONS: &[(&str, &str)] = &[(
    "0001_initial_schema",
    include_str!("migrations/0001_initial_schema.sql"),
)];

/// Initialize the database with the default connection limit.
///
/// # Arguments
/// * `db_path` - Path to the SQLite database file
///
/// # Returns
/// A migrated connection pool
pub async fn initialize(db_path: &Path) -> Result<pool::DbPool, DbError> {
    initialize_with_limit(db_path, pool::DEFAULT_MAX_CONNECTIONS).await
}

/// Initialize the database: create the file if needed and run migrations.
///
/// # Arguments
/// * `db_path` - Path to the SQLite database file
/// * `max_connections` - Bound on concurrent store sessions
pub async fn initialize_with_limit(
    db_path: &Path,
    max_connections: u32,
) -> Result<pool::DbPool, DbError> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DbError::Migration(format!("Failed to create database directory: {}", e))
            })?;
        }
    }

    let pool = pool::create_pool(db_path, max_connections).await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

/// Apply every migration that has not been recorded yet.
///
/// Each migration runs in its own transaction together with its bookkeeping
/// row, so a failed migration leaves no trace.
async fn run_migrations(pool: &pool::DbPool) -> Result<(), DbError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS _migrations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            applied_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    for (name, sql) in MIGRATIONS {
        let applied: Option<(i64,)> = sqlx::query_as("SELECT id FROM _migrations WHERE name = ?")
            .bind(name)
            .fetch_optional(pool)
            .await?;

        if applied.is_some() {
            continue;
        }

        let mut tx = pool.begin().await?;
        for statement in split_statements(sql) {
            sqlx::query(&statement)
                .execute(&mut *tx)
                .await
                .map_err(|e| DbError::Migration(format!("{}: {}", name, e)))?;
        }
        sqlx::query("INSERT INTO _migrations (name) VALUES (?)")
            .bind(name)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        log::info!("[db] Applied migration {}", name);
    }

    Ok(())
}

/// Split a migration script into individual statements.
///
/// `--` comments are dropped and semicolons inside quoted literals do not end
/// a statement.
fn split_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut in_quote = false;

    for line in sql.lines() {
        let mut chars = line.chars().peekable();
        while let Some(ch) = chars.next() {
            match ch {
                '\'' => {
                    in_quote = !in_quote;
                    current.push(ch);
                }
                '-' if !in_quote && chars.peek() == Some(&'-') => break,
                ';' if !in_quote => {
                    let stmt = current.trim();
                    if !stmt.is_empty() {
                        statements.push(stmt.to_string());
                    }
                    current.clear();
                }
                _ => current.push(ch),
            }
        }
        if !current.is_empty() {
            current.push(' ');
        }
    }

    let tail = current.trim();
    if !tail.is_empty() {
        statements.push(tail.to_string());
    }

    statements
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_initialize_creates_schema() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");

        let pool = initialize(&db_path).await.unwrap();
        assert!(db_path.exists());

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' AND name != '_migrations' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();

        let table_names: Vec<&str> = tables.iter().map(|(n,)| n.as_str()).collect();
        assert_eq!(
            table_names,
            vec!["pr_reviewers", "pull_requests", "team_members", "teams", "users"]
        );
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");

        let _pool1 = initialize(&db_path).await.unwrap();
        let pool2 = initialize(&db_path).await.unwrap();

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM _migrations")
            .fetch_one(&pool2)
            .await
            .unwrap();
        assert_eq!(count.0, MIGRATIONS.len() as i64);
    }

    #[tokio::test]
    async fn test_store_errors_are_classified_by_kind() {
        let dir = tempdir().unwrap();
        let pool = initialize(&dir.path().join("test.db")).await.unwrap();

        sqlx::query("INSERT INTO users (user_id, username) VALUES ('u1', 'alice')")
            .execute(&pool)
            .await
            .unwrap();

        let duplicate: DbError =
            sqlx::query("INSERT INTO users (user_id, username) VALUES ('u1', 'again')")
                .execute(&pool)
                .await
                .unwrap_err()
                .into();
        assert!(matches!(duplicate, DbError::UniqueViolation(_)), "{duplicate:?}");

        let dangling: DbError = sqlx::query(
            "INSERT INTO pull_requests (pull_request_id, pull_request_name, author_id, created_at) VALUES ('pr', 'x', 'ghost', '2024-01-01T00:00:00Z')",
        )
        .execute(&pool)
        .await
        .unwrap_err()
        .into();
        assert!(matches!(dangling, DbError::ConstraintViolation(_)), "{dangling:?}");

        let missing_name: DbError =
            sqlx::query("INSERT INTO users (user_id, username) VALUES ('u2', NULL)")
                .execute(&pool)
                .await
                .unwrap_err()
                .into();
        assert!(matches!(missing_name, DbError::ConstraintViolation(_)), "{missing_name:?}");

        let absent: DbError =
            sqlx::query_scalar::<_, String>("SELECT user_id FROM users WHERE user_id = 'nobody'")
                .fetch_one(&pool)
                .await
                .unwrap_err()
                .into();
        assert!(matches!(absent, DbError::NoRows));
    }

    #[test]
    fn test_split_statements_handles_comments_and_quotes() {
        let sql = "-- header\nCREATE TABLE a (x TEXT DEFAULT 'a;b'); -- trailing\n\nINSERT INTO a VALUES ('c')";
        let statements = split_statements(sql);
        assert_eq!(statements.len(), 2);
        assert!(statements[0].contains("'a;b'"));
        assert!(!statements[0].contains("trailing"));
        assert_eq!(statements[1], "INSERT INTO a VALUES ('c')");
    }
}
