//! Database operations for the `mention_counts` table.

use chrono::NaiveDate;
use gamepulse_core::MentionCount;
use sqlx::SqlitePool;

use crate::DbError;

/// A row from the `mention_counts` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MentionCountRow {
    pub date: NaiveDate,
    pub category: String,
    pub count: i64,
    pub recorded_at: String,
}

impl From<MentionCountRow> for MentionCount {
    fn from(row: MentionCountRow) -> Self {
        Self {
            date: row.date,
            category: row.category,
            count: row.count,
        }
    }
}

/// Insert or replace the count for `(date, category)`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the statement fails, including when `count`
/// is negative (rejected by the table's `CHECK` constraint).
pub async fn upsert_mention_count(
    pool: &SqlitePool,
    date: NaiveDate,
    category: &str,
    count: i64,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO mention_counts (date, category, count) \
         VALUES (?, ?, ?) \
         ON CONFLICT (date, category) DO UPDATE SET \
             count = excluded.count, \
             recorded_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now')",
    )
    .bind(date)
    .bind(category)
    .bind(count)
    .execute(pool)
    .await?;

    Ok(())
}

/// Sum of all category counts recorded for `date`; 0 when none exist.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_mention_sum(pool: &SqlitePool, date: NaiveDate) -> Result<i64, DbError> {
    let total: i64 =
        sqlx::query_scalar("SELECT COALESCE(SUM(count), 0) FROM mention_counts WHERE date = ?")
            .bind(date)
            .fetch_one(pool)
            .await?;

    Ok(total)
}

/// Every category count recorded for `date`, ordered by category.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_mention_counts(
    pool: &SqlitePool,
    date: NaiveDate,
) -> Result<Vec<MentionCountRow>, DbError> {
    let rows = sqlx::query_as::<_, MentionCountRow>(
        "SELECT date, category, count, recorded_at \
         FROM mention_counts \
         WHERE date = ? \
         ORDER BY category ASC",
    )
    .bind(date)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Per-day mention totals for `start <= date < end`, ordered by date.
///
/// Days without any recorded category are absent from the result.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_mention_sums(
    pool: &SqlitePool,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<(NaiveDate, i64)>, DbError> {
    let rows: Vec<(NaiveDate, i64)> = sqlx::query_as(
        "SELECT date, SUM(count) AS total \
         FROM mention_counts \
         WHERE date >= ? AND date < ? \
         GROUP BY date \
         ORDER BY date ASC",
    )
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
