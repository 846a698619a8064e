//! Pushshift-style submission search.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;

use super::matching::{category_token, day_bounds, matches_category};
use super::MentionSource;
use crate::error::SourceError;

const DEFAULT_BASE_URL: &str = "https://api.pushshift.io";
const PAGE_SIZE: u32 = 500;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<Submission>,
}

#[derive(Debug, Deserialize)]
struct Submission {
    id: Option<String>,
    title: Option<String>,
    selftext: Option<String>,
}

pub struct PushshiftSource {
    client: Client,
    endpoint: String,
}

impl PushshiftSource {
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the HTTP client cannot be built.
    pub fn new(timeout_secs: u64) -> Result<Self, SourceError> {
        Self::with_base_url(timeout_secs, DEFAULT_BASE_URL)
    }

    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the HTTP client cannot be built.
    pub fn with_base_url(timeout_secs: u64, base_url: &str) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: format!(
                "{}/reddit/search/submission/",
                base_url.trim_end_matches('/')
            ),
        })
    }
}

#[async_trait]
impl MentionSource for PushshiftSource {
    fn label(&self) -> &str {
        "pushshift"
    }

    async fn fetch_day(
        &self,
        date: NaiveDate,
        category: &str,
    ) -> Result<HashSet<String>, SourceError> {
        let (after, before) = day_bounds(date);
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("q", category.to_string()),
                ("after", after.to_string()),
                ("before", before.to_string()),
                ("size", PAGE_SIZE.to_string()),
                ("sort", "desc".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::UnexpectedStatus {
                source_name: "Pushshift".to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let parsed: SearchResponse = serde_json::from_str(&body)
            .map_err(|e| SourceError::parse(format!("pushshift search '{category}' {date}"), e))?;

        let token = category_token(category);
        let ids: HashSet<String> = parsed
            .data
            .into_iter()
            .filter(|s| matches_category(s.title.as_deref(), s.selftext.as_deref(), &token))
            .filter_map(|s| s.id.filter(|id| !id.is_empty()))
            .collect();

        tracing::debug!(%date, category, matched = ids.len(), "pushshift search");
        Ok(ids)
    }
}
