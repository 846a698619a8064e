//! Shared types, configuration and pure time-series logic for gamepulse.
//!
//! Everything in this crate is free of I/O apart from reading environment
//! variables in [`load_app_config`]. Storage lives in `gamepulse-db` and the
//! upstream fetchers live in `gamepulse-sources`.

pub mod app_config;
pub mod config;
pub mod growth;
pub mod series;
pub mod types;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{build_app_config, load_app_config, load_app_config_from_env};
pub use growth::compute_growth;
pub use series::reconcile;
pub use types::{DailySnapshot, DateWindow, GrowthSummary, MentionCount, SeriesRow};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("window must span at least one day, got {0}")]
    EmptyWindow(u32),

    #[error("window ending {date} overflows the calendar")]
    DateOverflow { date: chrono::NaiveDate },
}
