use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub env: Environment,
    pub log_level: String,
    pub log_path: Option<PathBuf>,
    pub steam_app_id: String,
    pub game_name: String,
    pub days: u32,
    pub output_csv: PathBuf,
    pub chart_path: PathBuf,
    pub steam_history_path: PathBuf,
    pub keywords: Vec<String>,
    pub mention_category: String,
    pub request_timeout_secs: u64,
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
    pub fallback_error_threshold: u32,
    pub reddit_client_id: Option<String>,
    pub reddit_client_secret: Option<String>,
    pub reddit_user_agent: String,
}

impl AppConfig {
    /// Reddit OAuth credentials, present only when both halves are set.
    #[must_use]
    pub fn reddit_credentials(&self) -> Option<(&str, &str)> {
        match (&self.reddit_client_id, &self.reddit_client_secret) {
            (Some(id), Some(secret)) => Some((id.as_str(), secret.as_str())),
            _ => None,
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("database_path", &self.database_path)
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("log_path", &self.log_path)
            .field("steam_app_id", &self.steam_app_id)
            .field("game_name", &self.game_name)
            .field("days", &self.days)
            .field("output_csv", &self.output_csv)
            .field("chart_path", &self.chart_path)
            .field("steam_history_path", &self.steam_history_path)
            .field("keywords", &self.keywords)
            .field("mention_category", &self.mention_category)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("retry_attempts", &self.retry_attempts)
            .field("retry_delay_ms", &self.retry_delay_ms)
            .field("fallback_error_threshold", &self.fallback_error_threshold)
            .field(
                "reddit_client_id",
                &self.reddit_client_id.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "reddit_client_secret",
                &self.reddit_client_secret.as_ref().map(|_| "[redacted]"),
            )
            .field("reddit_user_agent", &self.reddit_user_agent)
            .finish()
    }
}
