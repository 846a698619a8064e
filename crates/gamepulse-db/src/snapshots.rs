//! Database operations for the `metric_snapshots` table.

use chrono::NaiveDate;
use gamepulse_core::DailySnapshot;
use sqlx::SqlitePool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `metric_snapshots` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SnapshotRow {
    pub stream: String,
    pub date: NaiveDate,
    pub value: Option<i64>,
    pub source: String,
    pub recorded_at: String,
}

impl From<SnapshotRow> for DailySnapshot {
    fn from(row: SnapshotRow) -> Self {
        Self {
            date: row.date,
            stream: row.stream,
            value: row.value,
            source: row.source,
        }
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Insert or replace the snapshot for `(stream, date)`.
///
/// A later write for the same key overwrites both value and source; writing
/// the same value twice leaves the table observably unchanged.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the statement fails.
pub async fn upsert_snapshot(
    pool: &SqlitePool,
    date: NaiveDate,
    stream: &str,
    value: Option<i64>,
    source: &str,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO metric_snapshots (stream, date, value, source) \
         VALUES (?, ?, ?, ?) \
         ON CONFLICT (stream, date) DO UPDATE SET \
             value = excluded.value, \
             source = excluded.source, \
             recorded_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now')",
    )
    .bind(stream)
    .bind(date)
    .bind(value)
    .bind(source)
    .execute(pool)
    .await?;

    Ok(())
}

/// Return the snapshot for `(stream, date)`, or `None` if none was recorded.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_snapshot(
    pool: &SqlitePool,
    date: NaiveDate,
    stream: &str,
) -> Result<Option<SnapshotRow>, DbError> {
    let row = sqlx::query_as::<_, SnapshotRow>(
        "SELECT stream, date, value, source, recorded_at \
         FROM metric_snapshots \
         WHERE stream = ? AND date = ?",
    )
    .bind(stream)
    .bind(date)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// List snapshots of `stream` with `start <= date < end`, ordered by date.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_snapshots(
    pool: &SqlitePool,
    stream: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<SnapshotRow>, DbError> {
    let rows = sqlx::query_as::<_, SnapshotRow>(
        "SELECT stream, date, value, source, recorded_at \
         FROM metric_snapshots \
         WHERE stream = ? AND date >= ? AND date < ? \
         ORDER BY date ASC",
    )
    .bind(stream)
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
