mod models;

pub use models::*;

use anyhow::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

pub type DbPool = SqlitePool;

/// Execute a SQL migration file, properly handling comments
async fn execute_sql(pool: &SqlitePool, sql: &str) -> Result<()> {
    for statement in sql.split(';') {
        // Strip SQL comment lines (lines starting with --)
        let cleaned: String = statement
            .lines()
            .filter(|line| !line.trim().starts_with("--"))
            .collect::<Vec<_>>()
            .join("\n");
        let trimmed = cleaned.trim();
        if !trimmed.is_empty() {
            sqlx::query(trimmed).execute(pool).await?;
        }
    }
    Ok(())
}

pub async fn init(data_dir: &Path) -> Result<DbPool> {
    let db_path = data_dir.join("shelfkeeper.db");
    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    info!("Initializing database at {}", db_path.display());

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await?;

    // Enable WAL mode for better concurrency
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await?;

    // Run migrations
    run_migrations(&pool).await?;

    info!("Database initialized successfully");
    Ok(pool)
}

/// Open an existing database without creating or migrating it. A missing
/// database file is an error; the diagnostic subcommands need to report
/// absence rather than mask it by creating an empty catalog.
pub async fn connect(data_dir: &Path) -> Result<DbPool> {
    let db_path = data_dir.join("shelfkeeper.db");
    if !db_path.exists() {
        anyhow::bail!("Database not found at {}", db_path.display());
    }

    let db_url = format!("sqlite:{}?mode=rw", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&db_url)
        .await?;

    Ok(pool)
}

async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    info!("Running database migrations...");

    // Migration 001: Initial catalog schema
    execute_sql(pool, include_str!("../../migrations/001_initial.sql")).await?;

    // Migration 002: Session store
    execute_sql(pool, include_str!("../../migrations/002_sessions.sql")).await?;

    // Migration 003: Add admin_notes column to book requests
    let has_admin_notes: Option<(String,)> = sqlx::query_as(
        "SELECT name FROM pragma_table_info('book_requests') WHERE name = 'admin_notes'",
    )
    .fetch_optional(pool)
    .await?;
    if has_admin_notes.is_none() {
        execute_sql(pool, include_str!("../../migrations/003_admin_notes.sql")).await?;

        // `ALTER TABLE ADD COLUMN` lands in the WAL but is not yet checkpointed
        // into the main database file. Other pooled connections (and any opened
        // afterwards) can then decode `SELECT *` rows against the pre-ALTER,
        // 11-column schema and panic with an out-of-bounds index in
        // sqlx-sqlite. Folding the WAL back into the main file makes the new
        // column visible to every connection. This changes no data, only when
        // the schema change becomes visible pool-wide.
        sqlx::query("PRAGMA wal_checkpoint(TRUNCATE)")
            .execute(pool)
            .await?;
    }

    info!("Database migrations complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn init_creates_all_tables() {
        let dir = tempfile::tempdir().unwrap();
        let pool = init(dir.path()).await.unwrap();

        for table in ["books", "subjects", "book_requests", "admin_users", "sessions"] {
            let found: Option<(String,)> = sqlx::query_as(
                "SELECT name FROM sqlite_master WHERE type='table' AND name = ?",
            )
            .bind(table)
            .fetch_optional(&pool)
            .await
            .unwrap();
            assert!(found.is_some(), "missing table {table}");
        }
    }

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let pool = init(dir.path()).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM pragma_table_info('book_requests') WHERE name = 'admin_notes'",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(count.0, 1);
    }
}
