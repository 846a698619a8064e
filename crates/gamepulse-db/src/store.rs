//! Explicitly constructed handle over the snapshot and mention tables.

use std::path::Path;

use chrono::NaiveDate;
use gamepulse_core::{DailySnapshot, MentionCount};
use sqlx::SqlitePool;

use crate::{
    connect_in_memory, connect_pool, mentions, run_migrations, snapshots, DbError, PoolConfig,
};

/// Owns the pool for one run; every read and write of the pipeline goes
/// through this handle.
#[derive(Debug, Clone)]
pub struct MetricStore {
    pool: SqlitePool,
}

impl MetricStore {
    /// Wrap an existing pool. Migrations are the caller's responsibility.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open the store file at `path` and bring its schema up to date.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the file cannot be opened or a migration fails.
    pub async fn open(path: &Path, config: PoolConfig) -> Result<Self, DbError> {
        let pool = connect_pool(path, config).await?;
        let applied = run_migrations(&pool).await?;
        if applied > 0 {
            tracing::info!(applied, path = %path.display(), "applied store migrations");
        }
        Ok(Self { pool })
    }

    /// Fresh, migrated in-memory store.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the connection or a migration fails.
    pub async fn in_memory() -> Result<Self, DbError> {
        let pool = connect_in_memory().await?;
        run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// # Errors
    ///
    /// Returns [`DbError::Sqlx`] if the query fails.
    pub async fn get_snapshot(
        &self,
        date: NaiveDate,
        stream: &str,
    ) -> Result<Option<DailySnapshot>, DbError> {
        let row = snapshots::get_snapshot(&self.pool, date, stream).await?;
        Ok(row.map(DailySnapshot::from))
    }

    /// # Errors
    ///
    /// Returns [`DbError::Sqlx`] if the statement fails.
    pub async fn upsert_snapshot(
        &self,
        date: NaiveDate,
        stream: &str,
        value: Option<i64>,
        source: &str,
    ) -> Result<(), DbError> {
        snapshots::upsert_snapshot(&self.pool, date, stream, value, source).await
    }

    /// # Errors
    ///
    /// Returns [`DbError::Sqlx`] if the query fails.
    pub async fn get_mention_sum(&self, date: NaiveDate) -> Result<i64, DbError> {
        mentions::get_mention_sum(&self.pool, date).await
    }

    /// # Errors
    ///
    /// Returns [`DbError::Sqlx`] if the statement fails.
    pub async fn upsert_mention_count(
        &self,
        date: NaiveDate,
        category: &str,
        count: i64,
    ) -> Result<(), DbError> {
        mentions::upsert_mention_count(&self.pool, date, category, count).await
    }

    /// Per-category counts recorded for `date`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlx`] if the query fails.
    pub async fn list_mention_counts(&self, date: NaiveDate) -> Result<Vec<MentionCount>, DbError> {
        let rows = mentions::list_mention_counts(&self.pool, date).await?;
        Ok(rows.into_iter().map(MentionCount::from).collect())
    }

    /// Snapshots of `stream` with `start <= date < end`, ascending.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlx`] if the query fails.
    pub async fn list_snapshots(
        &self,
        stream: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailySnapshot>, DbError> {
        let rows = snapshots::list_snapshots(&self.pool, stream, start, end).await?;
        Ok(rows.into_iter().map(DailySnapshot::from).collect())
    }

    /// # Errors
    ///
    /// Returns [`DbError::Sqlx`] if the query fails.
    pub async fn list_mention_sums(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<(NaiveDate, i64)>, DbError> {
        mentions::list_mention_sums(&self.pool, start, end).await
    }

    /// # Errors
    ///
    /// Returns [`sqlx::Error`] if the store does not answer.
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        crate::ping(&self.pool).await
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
