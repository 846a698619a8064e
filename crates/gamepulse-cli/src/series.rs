//! `series` command: rebuild and print the stored series without fetching.

use chrono::NaiveDate;
use gamepulse_core::{compute_growth, DateWindow, SeriesRow};
use gamepulse_db::{build_series, MetricStore};

/// Print the series for the `days`-long window ending at `today`, followed
/// by the growth line.
///
/// # Errors
///
/// Returns an error if the window is empty or the store cannot be read.
pub(crate) async fn run_series(
    store: &MetricStore,
    stream: &str,
    days: u32,
    today: NaiveDate,
) -> anyhow::Result<()> {
    let window = DateWindow::ending_at(today, days)?;
    let rows = build_series(store, &window, stream).await?;

    println!("{stream} {window}");
    println!("{:<12} {:>14} {:>10}", "date", "steam_metric", "mentions");
    for row in &rows {
        println!("{}", format_row(row));
    }

    match compute_growth(&rows) {
        Some(growth) => println!("growth: {growth}"),
        None => println!("growth: no metric observations in window"),
    }
    Ok(())
}

fn format_row(row: &SeriesRow) -> String {
    let metric = row
        .metric
        .map_or_else(|| "-".to_string(), |value| value.to_string());
    format!("{:<12} {:>14} {:>10}", row.date.to_string(), metric, row.mentions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_metric_prints_as_dash() {
        let row = SeriesRow {
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            metric: None,
            mentions: 0,
        };
        let line = format_row(&row);
        assert!(line.starts_with("2024-06-01"));
        assert!(line.contains(" - "));
        assert!(line.trim_end().ends_with('0'));
    }

    #[tokio::test]
    async fn series_reads_store_only() {
        let store = MetricStore::in_memory().await.unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        store
            .upsert_snapshot(today, "steam:730", Some(10), "local_history")
            .await
            .unwrap();
        run_series(&store, "steam:730", 3, today).await.unwrap();
    }
}
