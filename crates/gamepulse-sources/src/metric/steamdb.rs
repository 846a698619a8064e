//! Follower count scraped from the SteamDB charts page.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use regex::Regex;
use reqwest::Client;

use super::MetricSource;
use crate::error::SourceError;

const DEFAULT_BASE_URL: &str = "https://steamdb.info";
const LABEL: &str = "followers (SteamDB)";
// SteamDB rejects obvious bot user agents.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36";

static FOLLOWERS_SERIES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)name:\s*'Followers'.*?data:\s*(\[\[.*?\]\])").expect("valid followers regex")
});
static DATA_POINT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\s*(\d+)\s*,\s*([\d,]+)\s*\]").expect("valid point regex"));

pub struct SteamDbFollowers {
    client: Client,
    charts_url: String,
    referer: String,
}

impl SteamDbFollowers {
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the HTTP client cannot be built.
    pub fn new(app_id: &str, timeout_secs: u64) -> Result<Self, SourceError> {
        Self::with_base_url(app_id, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Point the scraper at a different host (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the HTTP client cannot be built.
    pub fn with_base_url(
        app_id: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(BROWSER_USER_AGENT)
            .build()?;
        let base = base_url.trim_end_matches('/');
        Ok(Self {
            client,
            charts_url: format!("{base}/app/{app_id}/charts/"),
            referer: format!("{base}/"),
        })
    }
}

#[async_trait]
impl MetricSource for SteamDbFollowers {
    fn label(&self) -> &str {
        LABEL
    }

    /// The page only carries the current series, so `date` is not used.
    async fn fetch(&self, _date: NaiveDate) -> Result<Option<i64>, SourceError> {
        let response = self
            .client
            .get(&self.charts_url)
            .header("Referer", &self.referer)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::UnexpectedStatus {
                source_name: "SteamDB".to_string(),
                status: status.as_u16(),
            });
        }

        let html = response.text().await?;
        let followers = parse_followers(&html);
        if followers.is_none() {
            tracing::info!(url = %self.charts_url, "no Followers series on SteamDB page");
        }
        Ok(followers)
    }
}

/// Last point of the `Followers` chart series embedded in a SteamDB page.
///
/// Thousands separators inside the value are ignored.
#[must_use]
pub fn parse_followers(html: &str) -> Option<i64> {
    let series = FOLLOWERS_SERIES.captures(html)?.get(1)?.as_str();
    let last = DATA_POINT.captures_iter(series).last()?;
    last.get(2)?.as_str().replace(',', "").parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_last_point_of_followers_series() {
        let html = r"
            series: [{
                name: 'Players',
                data: [[1700000000000, 5]]
            }, {
                name: 'Followers',
                color: '#fff',
                data: [[1700000000000, 1200], [1700086400000, 1,250,300]]
            }]
        ";
        assert_eq!(parse_followers(html), Some(1_250_300));
    }

    #[test]
    fn missing_series_yields_none() {
        assert_eq!(parse_followers("<html>name: 'Players', data: [[1, 2]]</html>"), None);
    }

    #[test]
    fn empty_series_yields_none() {
        assert_eq!(parse_followers("name: 'Followers', data: [[]]"), None);
    }
}
