//! One full monitoring run: today's metric, the window's mentions, the
//! reconciled series and the output artifacts.

use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;
use gamepulse_core::{compute_growth, AppConfig, DateWindow, GrowthSummary, SeriesRow};
use gamepulse_db::{build_series, MetricStore};
use gamepulse_sources::metric::SteamTierConfig;
use gamepulse_sources::{
    CollectorSettings, MentionCollector, MentionSource, MetricFallbackChain, PushshiftSource,
    RedditCredentials, RedditSearchSource, RetryPolicy,
};

use crate::output::{write_chart, write_csv, ChartLabels};

/// What a run reads and writes, independent of where the values came from.
#[derive(Debug, Clone)]
pub(crate) struct RunSettings {
    pub days: u32,
    pub stream: String,
    pub mention_category: String,
    pub game_name: String,
    pub output_csv: PathBuf,
    pub chart_path: PathBuf,
}

impl RunSettings {
    pub(crate) fn from_config(config: &AppConfig) -> Self {
        Self {
            days: config.days,
            stream: metric_stream(&config.steam_app_id),
            mention_category: config.mention_category.clone(),
            game_name: config.game_name.clone(),
            output_csv: config.output_csv.clone(),
            chart_path: config.chart_path.clone(),
        }
    }
}

#[derive(Debug)]
pub(crate) struct RunReport {
    pub window: DateWindow,
    pub metric_source: String,
    pub rows: Vec<SeriesRow>,
    pub growth: Option<GrowthSummary>,
    pub outputs_failed: usize,
}

/// Store key of the Steam metric for `app_id`.
pub(crate) fn metric_stream(app_id: &str) -> String {
    format!("steam:{app_id}")
}

fn retry_policy(config: &AppConfig) -> RetryPolicy {
    RetryPolicy::new(
        config.retry_attempts,
        Duration::from_millis(config.retry_delay_ms),
    )
}

/// The production tier chain for `config`.
pub(crate) fn build_metric_chain(config: &AppConfig) -> anyhow::Result<MetricFallbackChain> {
    let tiers = SteamTierConfig {
        app_id: config.steam_app_id.clone(),
        history_path: config.steam_history_path.clone(),
        timeout_secs: config.request_timeout_secs,
    };
    Ok(MetricFallbackChain::standard(&tiers, retry_policy(config))?)
}

/// Pushshift as primary; Reddit search as secondary when credentials exist.
pub(crate) fn build_mention_collector(config: &AppConfig) -> anyhow::Result<MentionCollector> {
    let primary = PushshiftSource::new(config.request_timeout_secs)?;
    let secondary: Option<Box<dyn MentionSource>> = match config.reddit_credentials() {
        Some((client_id, client_secret)) => {
            let credentials = RedditCredentials {
                client_id: client_id.to_string(),
                client_secret: client_secret.to_string(),
                user_agent: config.reddit_user_agent.clone(),
            };
            Some(Box::new(RedditSearchSource::new(
                credentials,
                config.request_timeout_secs,
            )?))
        }
        None => {
            tracing::warn!("Reddit credentials not set; mentions come from Pushshift only");
            None
        }
    };

    Ok(MentionCollector::new(
        Box::new(primary),
        secondary,
        config.keywords.clone(),
        CollectorSettings {
            retry: retry_policy(config),
            fallback_error_threshold: config.fallback_error_threshold,
        },
    ))
}

/// Execute one run ending at `today`.
///
/// Storage failures abort the run. Upstream failures degrade to missing
/// values, and output failures are counted in the report.
///
/// # Errors
///
/// Returns an error if the window cannot be built or the store fails.
pub(crate) async fn run_pipeline(
    store: &MetricStore,
    metric: &MetricFallbackChain,
    mentions: &MentionCollector,
    settings: &RunSettings,
    today: NaiveDate,
) -> anyhow::Result<RunReport> {
    let window = DateWindow::ending_at(today, settings.days)?;
    tracing::info!(%window, stream = %settings.stream, "starting run");

    let metric_source = ensure_today_snapshot(store, metric, &settings.stream, today).await?;

    for date in window.days() {
        let day = mentions.collect_day(date).await;
        let count = i64::try_from(day.unique)?;
        store
            .upsert_mention_count(date, &settings.mention_category, count)
            .await?;
        tracing::info!(
            %date,
            category = %settings.mention_category,
            count,
            fallback_categories = day.fallback_categories.len(),
            "recorded daily mentions"
        );
    }

    let rows = build_series(store, &window, &settings.stream).await?;
    let growth = compute_growth(&rows);
    match &growth {
        Some(summary) => tracing::info!(growth = %summary, "metric growth"),
        None => tracing::warn!("no metric observations in window; growth undefined"),
    }

    let outputs_failed = write_outputs(&rows, settings, &metric_source);

    Ok(RunReport {
        window,
        metric_source,
        rows,
        growth,
        outputs_failed,
    })
}

/// Reuse today's snapshot if one is recorded, otherwise fetch and store it.
/// Returns the provenance of today's value.
async fn ensure_today_snapshot(
    store: &MetricStore,
    metric: &MetricFallbackChain,
    stream: &str,
    today: NaiveDate,
) -> anyhow::Result<String> {
    if let Some(existing) = store.get_snapshot(today, stream).await? {
        tracing::info!(
            date = %today,
            stream,
            source = %existing.source,
            "snapshot already recorded; skipping fetch"
        );
        return Ok(existing.source);
    }

    let reading = metric.fetch(today).await;
    store
        .upsert_snapshot(today, stream, reading.value, &reading.source)
        .await?;
    tracing::info!(
        date = %today,
        stream,
        value = ?reading.value,
        source = %reading.source,
        "recorded snapshot"
    );
    Ok(reading.source)
}

fn write_outputs(rows: &[SeriesRow], settings: &RunSettings, metric_source: &str) -> usize {
    let mut failed = 0;

    if let Err(error) = write_csv(&settings.output_csv, rows) {
        tracing::error!(path = %settings.output_csv.display(), %error, "csv output failed");
        failed += 1;
    }

    let labels = ChartLabels {
        game_name: &settings.game_name,
        metric_source,
    };
    if let Err(error) = write_chart(&settings.chart_path, rows, &labels) {
        tracing::error!(path = %settings.chart_path.display(), %error, "chart output failed");
        failed += 1;
    }

    failed
}

#[cfg(test)]
#[path = "run_test.rs"]
mod tests;
