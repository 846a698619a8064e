//! Follower history exported to a local semicolon-separated file.
//!
//! Expected layout (quotes optional):
//!
//! ```text
//! "DateTime";"Followers"
//! "2024-06-01 00:00:00";"1200"
//! "2024-06-01 12:00:00";"1250"
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::NaiveDate;

use super::MetricSource;
use crate::error::SourceError;

const LABEL: &str = "local_history";

pub struct LocalSteamHistory {
    path: PathBuf,
}

impl LocalSteamHistory {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl MetricSource for LocalSteamHistory {
    fn label(&self) -> &str {
        LABEL
    }

    async fn fetch(&self, date: NaiveDate) -> Result<Option<i64>, SourceError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %self.path.display(), "local steam history not found");
                return Ok(None);
            }
            Err(source) => {
                return Err(SourceError::Io {
                    path: self.path.display().to_string(),
                    source,
                })
            }
        };

        let history = parse_history(&content)?;
        Ok(history.get(&date).copied())
    }
}

/// Parse the history file into one value per day, keeping the latest
/// reading of each day.
///
/// # Errors
///
/// Returns [`SourceError::Parse`] when the header lacks a required column or
/// a row has an unparseable timestamp or follower count.
pub fn parse_history(content: &str) -> Result<BTreeMap<NaiveDate, i64>, SourceError> {
    let mut lines = content.lines().filter(|line| !line.trim().is_empty());
    let header: Vec<String> = lines
        .next()
        .map(split_row)
        .ok_or_else(|| SourceError::parse(LABEL, "empty file"))?;

    let column = |name: &str| {
        header
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| SourceError::parse(LABEL, format!("missing {name} column")))
    };
    let datetime_col = column("DateTime")?;
    let followers_col = column("Followers")?;

    let mut readings: Vec<(String, NaiveDate, i64)> = Vec::new();
    for (index, line) in lines.enumerate() {
        let fields = split_row(line);
        let row = index + 2;
        let datetime = fields
            .get(datetime_col)
            .ok_or_else(|| SourceError::parse(LABEL, format!("row {row}: missing DateTime")))?;
        let followers = fields
            .get(followers_col)
            .ok_or_else(|| SourceError::parse(LABEL, format!("row {row}: missing Followers")))?;

        let date = datetime
            .get(..10)
            .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
            .ok_or_else(|| {
                SourceError::parse(LABEL, format!("row {row}: bad DateTime '{datetime}'"))
            })?;
        let value: i64 = followers.parse().map_err(|e| {
            SourceError::parse(LABEL, format!("row {row}: bad Followers '{followers}': {e}"))
        })?;
        readings.push((datetime.clone(), date, value));
    }

    // Stable sort keeps file order for identical timestamps.
    readings.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(readings
        .into_iter()
        .map(|(_, date, value)| (date, value))
        .collect())
}

fn split_row(line: &str) -> Vec<String> {
    line.split(';')
        .map(|field| field.trim().trim_matches('"').trim().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    const SAMPLE: &str = "\"DateTime\";\"Followers\"\n\
        \"2024-06-01 12:00:00\";\"1250\"\n\
        \"2024-06-01 00:00:00\";\"1200\"\n\
        \"2024-06-02 00:00:00\";\"1300\"\n";

    #[test]
    fn keeps_latest_reading_per_day_regardless_of_file_order() {
        let history = parse_history(SAMPLE).unwrap();
        assert_eq!(history.get(&d(1)), Some(&1250));
        assert_eq!(history.get(&d(2)), Some(&1300));
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn unquoted_columns_in_any_order() {
        let history = parse_history("Followers;DateTime\n99;2024-06-03\n").unwrap();
        assert_eq!(history.get(&d(3)), Some(&99));
    }

    #[test]
    fn missing_column_is_a_parse_error() {
        let err = parse_history("DateTime;Players\n2024-06-01;5\n").unwrap_err();
        assert!(matches!(err, SourceError::Parse { .. }));
    }

    #[test]
    fn bad_count_is_a_parse_error() {
        let err = parse_history("DateTime;Followers\n2024-06-01;many\n").unwrap_err();
        assert!(err.to_string().contains("row 2"));
    }

    #[tokio::test]
    async fn fetch_returns_value_for_requested_day_only() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let source = LocalSteamHistory::new(file.path().to_path_buf());

        assert_eq!(source.fetch(d(2)).await.unwrap(), Some(1300));
        assert_eq!(source.fetch(d(9)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn missing_file_has_no_value() {
        let dir = tempfile::tempdir().unwrap();
        let source = LocalSteamHistory::new(dir.path().join("absent.csv"));
        assert_eq!(source.fetch(d(1)).await.unwrap(), None);
    }
}
