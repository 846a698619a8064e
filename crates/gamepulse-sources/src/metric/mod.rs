//! Daily game-popularity metric, fetched through an ordered list of tiers.

mod local_history;
mod steam_api;
mod steamdb;

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::SourceError;
use crate::retry::{retry_fixed, RetryPolicy};

pub use local_history::{parse_history, LocalSteamHistory};
pub use steam_api::SteamCurrentPlayers;
pub use steamdb::{parse_followers, SteamDbFollowers};

/// One way of obtaining the metric for a day.
#[async_trait]
pub trait MetricSource: Send + Sync {
    /// Provenance label recorded alongside a value from this tier.
    fn label(&self) -> &str;

    /// `Ok(None)` means the tier answered but had no value for `date`.
    async fn fetch(&self, date: NaiveDate) -> Result<Option<i64>, SourceError>;
}

/// Value chosen by the fallback chain together with its provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricReading {
    pub value: Option<i64>,
    pub source: String,
}

/// Tries each tier in order and keeps the first value produced.
pub struct MetricFallbackChain {
    tiers: Vec<Box<dyn MetricSource>>,
    retry: RetryPolicy,
}

/// Settings for [`MetricFallbackChain::standard`].
#[derive(Debug, Clone)]
pub struct SteamTierConfig {
    pub app_id: String,
    pub history_path: PathBuf,
    pub timeout_secs: u64,
}

impl MetricFallbackChain {
    #[must_use]
    pub fn new(tiers: Vec<Box<dyn MetricSource>>, retry: RetryPolicy) -> Self {
        Self { tiers, retry }
    }

    /// SteamDB followers, then the local history file, then the Steam
    /// current-players API.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if an HTTP client cannot be built.
    pub fn standard(config: &SteamTierConfig, retry: RetryPolicy) -> Result<Self, SourceError> {
        let tiers: Vec<Box<dyn MetricSource>> = vec![
            Box::new(SteamDbFollowers::new(&config.app_id, config.timeout_secs)?),
            Box::new(LocalSteamHistory::new(config.history_path.clone())),
            Box::new(SteamCurrentPlayers::new(&config.app_id, config.timeout_secs)?),
        ];
        Ok(Self::new(tiers, retry))
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.tiers.iter().map(|tier| tier.label())
    }

    /// Fetch the metric for `date`. Never fails: when every tier comes up
    /// empty the reading has no value and its source names the last tier
    /// tried, suffixed with `(unavailable)`.
    pub async fn fetch(&self, date: NaiveDate) -> MetricReading {
        for tier in &self.tiers {
            let attempted = retry_fixed(self.retry, tier.label(), || tier.fetch(date)).await;
            match attempted.outcome {
                Ok(Some(value)) => {
                    tracing::info!(%date, tier = tier.label(), value, "metric fetched");
                    return MetricReading {
                        value: Some(value),
                        source: tier.label().to_string(),
                    };
                }
                Ok(None) => {
                    tracing::info!(%date, tier = tier.label(), "tier has no value, falling through");
                }
                Err(error) => {
                    tracing::warn!(%date, tier = tier.label(), %error, "tier failed, falling through");
                }
            }
        }

        let last = self.tiers.last().map_or("metric", |tier| tier.label());
        tracing::warn!(%date, "every metric tier failed");
        MetricReading {
            value: None,
            source: format!("{last} (unavailable)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;

    struct Fixed {
        label: &'static str,
        result: fn() -> Result<Option<i64>, SourceError>,
        calls: Arc<AtomicU32>,
    }

    #[async_trait]
    impl MetricSource for Fixed {
        fn label(&self) -> &str {
            self.label
        }

        async fn fetch(&self, _date: NaiveDate) -> Result<Option<i64>, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.result)()
        }
    }

    fn tier(
        label: &'static str,
        result: fn() -> Result<Option<i64>, SourceError>,
    ) -> (Box<dyn MetricSource>, Arc<AtomicU32>) {
        let calls = Arc::new(AtomicU32::new(0));
        let boxed = Box::new(Fixed {
            label,
            result,
            calls: Arc::clone(&calls),
        });
        (boxed, calls)
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn failing() -> Result<Option<i64>, SourceError> {
        Err(SourceError::UnexpectedStatus {
            source_name: "tier".to_string(),
            status: 503,
        })
    }

    fn retry() -> RetryPolicy {
        RetryPolicy::new(2, Duration::ZERO)
    }

    #[tokio::test]
    async fn first_tier_with_a_value_wins() {
        let (first, first_calls) = tier("first", || Ok(Some(10)));
        let (second, second_calls) = tier("second", || Ok(Some(20)));
        let chain = MetricFallbackChain::new(vec![first, second], retry());

        let reading = chain.fetch(today()).await;
        assert_eq!(reading.value, Some(10));
        assert_eq!(reading.source, "first");
        assert_eq!(first_calls.load(Ordering::SeqCst), 1);
        assert_eq!(second_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn falls_through_errors_and_empty_tiers_in_order() {
        let (first, first_calls) = tier("followers (SteamDB)", failing);
        let (second, _) = tier("local_history", || Ok(None));
        let (third, _) = tier("concurrent_players (Steam API)", || Ok(Some(812_345)));
        let chain = MetricFallbackChain::new(vec![first, second, third], retry());

        let reading = chain.fetch(today()).await;
        assert_eq!(reading.value, Some(812_345));
        assert_eq!(reading.source, "concurrent_players (Steam API)");
        // A transient failure is retried before moving on.
        assert_eq!(first_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn total_failure_names_the_last_tier() {
        let (first, _) = tier("followers (SteamDB)", failing);
        let (second, _) = tier("concurrent_players (Steam API)", || Ok(None));
        let chain = MetricFallbackChain::new(vec![first, second], retry());

        let reading = chain.fetch(today()).await;
        assert_eq!(reading.value, None);
        assert_eq!(reading.source, "concurrent_players (Steam API) (unavailable)");
    }

    #[tokio::test]
    async fn zero_is_a_real_value() {
        let (first, _) = tier("first", || Ok(Some(0)));
        let chain = MetricFallbackChain::new(vec![first], retry());
        assert_eq!(chain.fetch(today()).await.value, Some(0));
    }

    #[test]
    fn standard_chain_tier_order() {
        let config = SteamTierConfig {
            app_id: "730".to_string(),
            history_path: PathBuf::from("data/steam_history.csv"),
            timeout_secs: 5,
        };
        let chain = MetricFallbackChain::standard(&config, RetryPolicy::once()).unwrap();
        let labels: Vec<&str> = chain.labels().collect();
        assert_eq!(
            labels,
            vec![
                "followers (SteamDB)",
                "local_history",
                "concurrent_players (Steam API)"
            ]
        );
    }
}
