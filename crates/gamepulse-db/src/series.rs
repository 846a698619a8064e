//! Dense daily series read back from the store.

use std::collections::HashMap;

use chrono::NaiveDate;
use gamepulse_core::{reconcile, DateWindow, SeriesRow};

use crate::{DbError, MetricStore};

/// Build the reconciled series for `stream` over `window`.
///
/// Snapshot rows whose value is null do not count as observations, so the
/// previous value keeps being carried across them.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if either range read fails.
pub async fn build_series(
    store: &MetricStore,
    window: &DateWindow,
    stream: &str,
) -> Result<Vec<SeriesRow>, DbError> {
    if window.is_empty() {
        return Ok(Vec::new());
    }

    let metrics: HashMap<NaiveDate, i64> = store
        .list_snapshots(stream, window.start, window.end)
        .await?
        .into_iter()
        .filter_map(|snapshot| snapshot.value.map(|value| (snapshot.date, value)))
        .collect();

    let mentions: HashMap<NaiveDate, i64> = store
        .list_mention_sums(window.start, window.end)
        .await?
        .into_iter()
        .collect();

    let rows = reconcile(
        window,
        |date| metrics.get(&date).copied(),
        |date| mentions.get(&date).copied(),
    );

    tracing::debug!(
        stream,
        window = %window,
        rows = rows.len(),
        observed = metrics.len(),
        "built series"
    );
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    const STREAM: &str = "steam:730";

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    #[tokio::test]
    async fn forward_fills_stored_metric_and_zero_fills_mentions() {
        let store = MetricStore::in_memory().await.unwrap();
        store.upsert_snapshot(d(2), STREAM, Some(100), "a").await.unwrap();
        store.upsert_snapshot(d(4), STREAM, Some(150), "a").await.unwrap();
        store.upsert_mention_count(d(1), "cs2_tags", 3).await.unwrap();
        store.upsert_mention_count(d(4), "cs2_tags", 2).await.unwrap();
        store.upsert_mention_count(d(4), "patch", 5).await.unwrap();

        let window = DateWindow::new(d(1), d(6));
        let rows = build_series(&store, &window, STREAM).await.unwrap();

        let metrics: Vec<Option<i64>> = rows.iter().map(|r| r.metric).collect();
        let mentions: Vec<i64> = rows.iter().map(|r| r.mentions).collect();
        assert_eq!(metrics, vec![None, Some(100), Some(100), Some(150), Some(150)]);
        assert_eq!(mentions, vec![3, 0, 0, 7, 0]);
    }

    #[tokio::test]
    async fn null_snapshot_does_not_break_the_carry() {
        let store = MetricStore::in_memory().await.unwrap();
        store.upsert_snapshot(d(1), STREAM, Some(1000), "a").await.unwrap();
        store
            .upsert_snapshot(d(2), STREAM, None, "b (unavailable)")
            .await
            .unwrap();

        let window = DateWindow::new(d(1), d(4));
        let rows = build_series(&store, &window, STREAM).await.unwrap();
        let metrics: Vec<Option<i64>> = rows.iter().map(|r| r.metric).collect();
        assert_eq!(metrics, vec![Some(1000), Some(1000), Some(1000)]);
    }

    #[tokio::test]
    async fn observation_before_the_window_is_not_carried_in() {
        let store = MetricStore::in_memory().await.unwrap();
        store.upsert_snapshot(d(1), STREAM, Some(9), "a").await.unwrap();

        let window = DateWindow::new(d(2), d(4));
        let rows = build_series(&store, &window, STREAM).await.unwrap();
        assert!(rows.iter().all(|r| r.metric.is_none()));
    }

    #[tokio::test]
    async fn other_streams_are_ignored() {
        let store = MetricStore::in_memory().await.unwrap();
        store.upsert_snapshot(d(1), "steam:570", Some(5), "a").await.unwrap();

        let window = DateWindow::new(d(1), d(2));
        let rows = build_series(&store, &window, STREAM).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].metric, None);
    }

    #[tokio::test]
    async fn empty_window_is_empty_series() {
        let store = MetricStore::in_memory().await.unwrap();
        let rows = build_series(&store, &DateWindow::new(d(3), d(3)), STREAM)
            .await
            .unwrap();
        assert!(rows.is_empty());
    }
}
