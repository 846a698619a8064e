//! Reddit API search of `r/all` (client-credentials OAuth).

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::OnceCell;

use super::matching::{category_token, day_bounds, matches_category};
use super::MentionSource;
use crate::error::SourceError;

const DEFAULT_AUTH_BASE_URL: &str = "https://www.reddit.com";
const DEFAULT_API_BASE_URL: &str = "https://oauth.reddit.com";
const PAGE_LIMIT: usize = 100;
const PAGE_COUNT: usize = 3;

/// Reddit OAuth token response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Reddit search listing wrapper.
#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    children: Vec<Post>,
    after: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Post {
    data: PostData,
}

#[derive(Debug, Deserialize)]
struct PostData {
    id: String,
    title: Option<String>,
    selftext: Option<String>,
    created_utc: f64,
}

/// Credentials and endpoints for [`RedditSearchSource`].
#[derive(Debug, Clone)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
}

/// Searches newest submissions across Reddit. The access token is
/// exchanged on first use and kept for the life of the source.
pub struct RedditSearchSource {
    client: Client,
    credentials: RedditCredentials,
    auth_base: String,
    api_base: String,
    token: OnceCell<String>,
}

impl RedditSearchSource {
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the HTTP client cannot be built.
    pub fn new(credentials: RedditCredentials, timeout_secs: u64) -> Result<Self, SourceError> {
        Self::with_base_urls(
            credentials,
            timeout_secs,
            DEFAULT_AUTH_BASE_URL,
            DEFAULT_API_BASE_URL,
        )
    }

    /// Point token exchange and search at other hosts (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the HTTP client cannot be built.
    pub fn with_base_urls(
        credentials: RedditCredentials,
        timeout_secs: u64,
        auth_base: &str,
        api_base: &str,
    ) -> Result<Self, SourceError> {
        // oauth.reddit.com sometimes blocks rustls via TLS fingerprinting.
        // If rejected, enable `native-tls` on reqwest and call `.use_native_tls()`.
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            credentials,
            auth_base: auth_base.trim_end_matches('/').to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
            token: OnceCell::new(),
        })
    }

    async fn token(&self) -> Result<&str, SourceError> {
        let token = self.token.get_or_try_init(|| self.fetch_token()).await?;
        Ok(token.as_str())
    }

    async fn fetch_token(&self) -> Result<String, SourceError> {
        let response = self
            .client
            .post(format!("{}/api/v1/access_token", self.auth_base))
            .header("User-Agent", &self.credentials.user_agent)
            .basic_auth(
                &self.credentials.client_id,
                Some(&self.credentials.client_secret),
            )
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SourceError::Reddit(format!(
                "token exchange failed with status {}",
                response.status()
            )));
        }

        let token_resp: TokenResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Reddit(format!("token parse error: {e}")))?;

        Ok(token_resp.access_token)
    }
}

#[async_trait]
impl MentionSource for RedditSearchSource {
    fn label(&self) -> &str {
        "reddit"
    }

    async fn fetch_day(
        &self,
        date: NaiveDate,
        category: &str,
    ) -> Result<HashSet<String>, SourceError> {
        let token = self.token().await?;
        let (day_start, day_end) = day_bounds(date);
        #[allow(clippy::cast_precision_loss)]
        let (day_start, day_end) = (day_start as f64, day_end as f64);
        let needle = category_token(category);

        let mut ids = HashSet::new();
        let mut after: Option<String> = None;

        for _ in 0..PAGE_COUNT {
            let mut params: Vec<(&str, String)> = vec![
                ("q", category.to_string()),
                ("sort", "new".to_string()),
                ("limit", PAGE_LIMIT.to_string()),
                ("type", "link".to_string()),
            ];
            if let Some(cursor) = &after {
                params.push(("after", cursor.clone()));
            }

            let response = self
                .client
                .get(format!("{}/r/all/search", self.api_base))
                .header("Authorization", format!("Bearer {token}"))
                .header("User-Agent", &self.credentials.user_agent)
                .query(&params)
                .send()
                .await?;

            if !response.status().is_success() {
                return Err(SourceError::Reddit(format!(
                    "search failed with status {}",
                    response.status()
                )));
            }

            let listing: Listing = response
                .json()
                .await
                .map_err(|e| SourceError::Reddit(format!("Reddit response parse error: {e}")))?;

            let mut reached_older = false;
            for post in listing.data.children {
                let post = post.data;
                if post.created_utc < day_start {
                    reached_older = true;
                    continue;
                }
                if post.created_utc >= day_end {
                    continue;
                }
                if matches_category(post.title.as_deref(), post.selftext.as_deref(), &needle) {
                    ids.insert(post.id);
                }
            }

            // Results are newest first; once a page dips below the day there
            // is nothing further to find.
            after = listing.data.after;
            if reached_older || after.is_none() {
                break;
            }
        }

        tracing::debug!(%date, category, matched = ids.len(), "reddit search");
        Ok(ids)
    }
}
