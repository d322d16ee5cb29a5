use std::path::Path;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

use crate::error::StoreError;

const CREATE_JOBS: &str = r#"
CREATE TABLE IF NOT EXISTS jobs (
    source      TEXT NOT NULL,
    company     TEXT NOT NULL,
    job_id      TEXT NOT NULL,
    title       TEXT,
    location    TEXT,
    url         TEXT,
    score       INTEGER DEFAULT 0,
    is_new      INTEGER DEFAULT 0,
    is_applied  INTEGER DEFAULT 0,
    first_seen  TEXT NOT NULL,
    last_seen   TEXT NOT NULL,
    PRIMARY KEY (source, company, job_id)
)
"#;

/// Columns added after the first release; older stores get them on startup.
const LATER_COLUMNS: [(&str, &str); 3] = [
    ("score", "INTEGER DEFAULT 0"),
    ("is_new", "INTEGER DEFAULT 0"),
    ("is_applied", "INTEGER DEFAULT 0"),
];

pub async fn create_pool(path: &Path) -> Result<SqlitePool, StoreError> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal);
    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// Single-connection in-memory store. Every connection to `:memory:` is a
/// separate database, hence the cap.
pub async fn memory_pool() -> Result<SqlitePool, StoreError> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    Ok(pool)
}

/// Idempotent: creates the table when absent and adds any missing later
/// columns without touching existing rows.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), StoreError> {
    sqlx::query(CREATE_JOBS).execute(pool).await?;

    let existing: Vec<(String,)> = sqlx::query_as("SELECT name FROM pragma_table_info('jobs')")
        .fetch_all(pool)
        .await?;
    for (column, definition) in LATER_COLUMNS {
        if existing.iter().any(|(name,)| name == column) {
            continue;
        }
        tracing::info!("Adding column '{column}' to jobs");
        sqlx::query(&format!("ALTER TABLE jobs ADD COLUMN {column} {definition}"))
            .execute(pool)
            .await?;
    }

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_jobs_new_score ON jobs (is_new, score DESC)")
        .execute(pool)
        .await?;
    Ok(())
}
