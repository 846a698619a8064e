//! Upstream sources for the daily metric and mention counts.

pub mod error;
pub mod mentions;
pub mod metric;
pub mod retry;

pub use error::SourceError;
pub use mentions::{
    CollectorSettings, DayMentions, MentionCollector, MentionSource, PushshiftSource,
    RedditCredentials, RedditSearchSource,
};
pub use metric::{
    LocalSteamHistory, MetricFallbackChain, MetricReading, MetricSource, SteamCurrentPlayers,
    SteamDbFollowers, SteamTierConfig,
};
pub use retry::RetryPolicy;
