use chrono::Local;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

use crate::model::attendance::TIME_FORMAT;

pub async fn init_db(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .busy_timeout(Duration::from_secs(5))
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationReport {
    pub time_column_added: bool,
    pub rows_backfilled: u64,
}

/// Brings an existing store up to the current schema. Safe to run repeatedly.
pub async fn run_migrations(pool: &SqlitePool) -> Result<MigrationReport, sqlx::Error> {
    initialize_schema(pool).await?;
    info!("Schema ensured for student and attendance tables");

    let time_column_added = ensure_time_column(pool).await?;
    if time_column_added {
        info!("Added missing time column to attendance");
    }

    let rows_backfilled = backfill_time_for_existing_rows(pool).await?;
    if rows_backfilled > 0 {
        // every row is overwritten, including rows that already carried a real time
        warn!(rows = rows_backfilled, "Backfilled attendance time with current time");
    }

    Ok(MigrationReport {
        time_column_added,
        rows_backfilled,
    })
}

pub async fn initialize_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS student (
            id INTEGER PRIMARY KEY,
            name VARCHAR(50) NOT NULL,
            serial_id VARCHAR(20) NOT NULL UNIQUE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS attendance (
            id INTEGER PRIMARY KEY,
            date DATE NOT NULL,
            time TIME NOT NULL,
            student_id INTEGER NOT NULL REFERENCES student (id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Adds `attendance.time` for stores created before the column existed.
/// Returns whether the column had to be added.
pub async fn ensure_time_column(pool: &SqlitePool) -> Result<bool, sqlx::Error> {
    let existing = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM pragma_table_info('attendance') WHERE name = 'time'",
    )
    .fetch_one(pool)
    .await?;

    if existing > 0 {
        return Ok(false);
    }

    sqlx::query("ALTER TABLE attendance ADD COLUMN time TIME NOT NULL DEFAULT '00:00:00'")
        .execute(pool)
        .await?;

    Ok(true)
}

/// Stamps every attendance row with the current time of day.
pub async fn backfill_time_for_existing_rows(pool: &SqlitePool) -> Result<u64, sqlx::Error> {
    let now = Local::now().time().format(TIME_FORMAT).to_string();

    let result = sqlx::query("UPDATE attendance SET time = ?")
        .bind(now)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Single-connection in-memory store; the database lives as long as that connection.
#[cfg(test)]
pub async fn memory_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .unwrap()
}
