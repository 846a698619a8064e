//! Daily mention counting across keyword categories.

mod matching;
mod pushshift;
mod reddit;

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::SourceError;
use crate::retry::{retry_fixed, RetryPolicy};

pub use matching::{category_token, day_bounds, matches_category};
pub use pushshift::PushshiftSource;
pub use reddit::{RedditCredentials, RedditSearchSource};

/// A searchable index of posts.
#[async_trait]
pub trait MentionSource: Send + Sync {
    fn label(&self) -> &str;

    /// Ids of posts created on `date` (UTC) whose title or body mention
    /// `category`.
    async fn fetch_day(
        &self,
        date: NaiveDate,
        category: &str,
    ) -> Result<HashSet<String>, SourceError>;
}

/// Tunables for [`MentionCollector`].
#[derive(Debug, Clone, Copy)]
pub struct CollectorSettings {
    pub retry: RetryPolicy,
    /// Consecutive failed primary attempts within a day before the
    /// secondary source is consulted.
    pub fallback_error_threshold: u32,
}

/// Outcome of collecting one day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DayMentions {
    /// Number of distinct posts matched across all categories.
    pub unique: usize,
    /// Categories for which the secondary source was queried.
    pub fallback_categories: Vec<String>,
}

pub struct MentionCollector {
    primary: Box<dyn MentionSource>,
    secondary: Option<Box<dyn MentionSource>>,
    categories: Vec<String>,
    settings: CollectorSettings,
}

impl MentionCollector {
    #[must_use]
    pub fn new(
        primary: Box<dyn MentionSource>,
        secondary: Option<Box<dyn MentionSource>>,
        categories: Vec<String>,
        settings: CollectorSettings,
    ) -> Self {
        Self {
            primary,
            secondary,
            categories,
            settings,
        }
    }

    #[must_use]
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    #[must_use]
    pub fn has_secondary(&self) -> bool {
        self.secondary.is_some()
    }

    /// Count distinct matching posts for `date` across every category.
    ///
    /// Source failures never abort the day: a category whose primary and
    /// secondary both fail simply contributes nothing.
    pub async fn collect_day(&self, date: NaiveDate) -> DayMentions {
        let mut seen: HashSet<String> = HashSet::new();
        let mut fallback_categories = Vec::new();
        // Failed primary attempts in a row, across categories of this day.
        let mut error_streak = 0u32;

        for category in &self.categories {
            let attempted = retry_fixed(self.settings.retry, self.primary.label(), || {
                self.primary.fetch_day(date, category)
            })
            .await;

            match attempted.outcome {
                Ok(ids) => {
                    error_streak = 0;
                    seen.extend(ids);
                    tracing::info!(
                        %date,
                        category = %category,
                        source = self.primary.label(),
                        unique = seen.len(),
                        "collected mentions"
                    );
                }
                Err(error) => {
                    error_streak += attempted.failures;
                    tracing::warn!(
                        %date,
                        category = %category,
                        source = self.primary.label(),
                        error_streak,
                        %error,
                        "primary mention source failed"
                    );
                }
            }

            if error_streak < self.settings.fallback_error_threshold {
                continue;
            }
            let Some(secondary) = &self.secondary else {
                continue;
            };

            fallback_categories.push(category.clone());
            match secondary.fetch_day(date, category).await {
                Ok(ids) => {
                    seen.extend(ids);
                    tracing::info!(
                        %date,
                        category = %category,
                        source = secondary.label(),
                        unique = seen.len(),
                        "collected mentions (fallback)"
                    );
                }
                Err(error) => {
                    tracing::error!(
                        %date,
                        category = %category,
                        source = secondary.label(),
                        %error,
                        "fallback mention source failed"
                    );
                }
            }
        }

        DayMentions {
            unique: seen.len(),
            fallback_categories,
        }
    }
}
