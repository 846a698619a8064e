use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Tags searched for mentions when `GAMEPULSE_KEYWORDS` is unset.
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "#CS2",
    "#CounterStrike2",
    "CS2 launch",
    "CS2 update",
    "CS2 skins",
    "CS2 trade",
    "Counter-Strike 2",
    "CS2 reddit",
];

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but cannot be parsed.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but cannot be parsed.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
pub fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let non_empty = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let env = parse_environment(&or_default("GAMEPULSE_ENV", "development"))?;

    let database_path = PathBuf::from(or_default("GAMEPULSE_DATABASE_PATH", "db/gamepulse.db"));
    let log_level = or_default("GAMEPULSE_LOG_LEVEL", "info");
    let log_path = non_empty("GAMEPULSE_LOG_PATH").map(PathBuf::from);

    let steam_app_id = or_default("STEAM_APP_ID", "730");
    if steam_app_id.is_empty() || !steam_app_id.chars().all(|c| c.is_ascii_digit()) {
        return Err(ConfigError::InvalidEnvVar {
            var: "STEAM_APP_ID".to_string(),
            reason: format!("expected a numeric app id, got '{steam_app_id}'"),
        });
    }
    let game_name = or_default("GAMEPULSE_GAME_NAME", "Counter-Strike 2");

    let days = parse_u32("GAMEPULSE_DAYS", "30")?;
    if days == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "GAMEPULSE_DAYS".to_string(),
            reason: "window must span at least one day".to_string(),
        });
    }

    let output_csv = PathBuf::from(or_default(
        "GAMEPULSE_OUTPUT_CSV",
        "output/reddit_steam_timeseries.csv",
    ));
    let chart_path = PathBuf::from(or_default("GAMEPULSE_CHART_PATH", "output/plot.svg"));
    let steam_history_path = PathBuf::from(or_default(
        "GAMEPULSE_STEAM_HISTORY_PATH",
        "data/steam_history.csv",
    ));

    let keywords = match non_empty("GAMEPULSE_KEYWORDS") {
        Some(raw) => parse_keywords(&raw),
        None => DEFAULT_KEYWORDS.iter().map(|k| (*k).to_string()).collect(),
    };
    if keywords.is_empty() {
        return Err(ConfigError::InvalidEnvVar {
            var: "GAMEPULSE_KEYWORDS".to_string(),
            reason: "at least one keyword is required".to_string(),
        });
    }
    let mention_category = or_default("GAMEPULSE_MENTION_CATEGORY", "cs2_tags");

    let request_timeout_secs = parse_u64("GAMEPULSE_REQUEST_TIMEOUT_SECS", "10")?;
    let retry_attempts = parse_u32("GAMEPULSE_RETRY_ATTEMPTS", "3")?;
    let retry_delay_ms = parse_u64("GAMEPULSE_RETRY_DELAY_MS", "2000")?;
    let fallback_error_threshold = parse_u32("GAMEPULSE_FALLBACK_ERROR_THRESHOLD", "3")?;
    if fallback_error_threshold == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "GAMEPULSE_FALLBACK_ERROR_THRESHOLD".to_string(),
            reason: "threshold must be at least one failed attempt".to_string(),
        });
    }

    let reddit_client_id = non_empty("REDDIT_CLIENT_ID");
    let reddit_client_secret = non_empty("REDDIT_CLIENT_SECRET");
    let reddit_user_agent = or_default("REDDIT_USER_AGENT", "gamepulse/0.1");

    Ok(AppConfig {
        database_path,
        env,
        log_level,
        log_path,
        steam_app_id,
        game_name,
        days,
        output_csv,
        chart_path,
        steam_history_path,
        keywords,
        mention_category,
        request_timeout_secs,
        retry_attempts,
        retry_delay_ms,
        fallback_error_threshold,
        reddit_client_id,
        reddit_client_secret,
        reddit_user_agent,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "GAMEPULSE_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

/// Split a comma-separated keyword list, dropping blanks and duplicates
/// while preserving order.
fn parse_keywords(raw: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .filter(|k| seen.insert(k.to_lowercase()))
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
