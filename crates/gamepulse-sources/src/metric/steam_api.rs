//! Concurrent player count from the Steam Web API.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;

use super::MetricSource;
use crate::error::SourceError;

const DEFAULT_BASE_URL: &str = "https://api.steampowered.com";
const LABEL: &str = "concurrent_players (Steam API)";

#[derive(Debug, Deserialize)]
struct PlayerCountEnvelope {
    response: PlayerCountResponse,
}

#[derive(Debug, Deserialize)]
struct PlayerCountResponse {
    player_count: Option<i64>,
}

pub struct SteamCurrentPlayers {
    client: Client,
    endpoint: String,
    app_id: String,
}

impl SteamCurrentPlayers {
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the HTTP client cannot be built.
    pub fn new(app_id: &str, timeout_secs: u64) -> Result<Self, SourceError> {
        Self::with_base_url(app_id, timeout_secs, DEFAULT_BASE_URL)
    }

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
            .build()?;
        Ok(Self {
            client,
            endpoint: format!(
                "{}/ISteamUserStats/GetNumberOfCurrentPlayers/v1/",
                base_url.trim_end_matches('/')
            ),
            app_id: app_id.to_string(),
        })
    }
}

#[async_trait]
impl MetricSource for SteamCurrentPlayers {
    fn label(&self) -> &str {
        LABEL
    }

    /// Live value; `date` is not consulted.
    async fn fetch(&self, _date: NaiveDate) -> Result<Option<i64>, SourceError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("appid", self.app_id.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::UnexpectedStatus {
                source_name: "Steam API".to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let envelope: PlayerCountEnvelope = serde_json::from_str(&body)
            .map_err(|e| SourceError::parse(format!("GetNumberOfCurrentPlayers({})", self.app_id), e))?;

        if let Some(count) = envelope.response.player_count {
            tracing::info!(app_id = %self.app_id, count, "steam concurrent players");
        }
        Ok(envelope.response.player_count)
    }
}
