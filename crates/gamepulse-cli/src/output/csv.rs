use std::fmt::Write as _;
use std::path::Path;

use gamepulse_core::SeriesRow;

use super::{write_file, OutputError};

const HEADER: &str = "date,steam_metric,reddit_mentions";

/// Series as CSV text. A missing metric is an empty field, never `0`.
pub(crate) fn render_csv(rows: &[SeriesRow]) -> String {
    let mut out = String::with_capacity(HEADER.len() + rows.len() * 24);
    out.push_str(HEADER);
    out.push('\n');
    for row in rows {
        let metric = row.metric.map(|v| v.to_string()).unwrap_or_default();
        // Writing into a String cannot fail.
        let _ = writeln!(out, "{},{metric},{}", row.date, row.mentions);
    }
    out
}

pub(crate) fn write_csv(path: &Path, rows: &[SeriesRow]) -> Result<(), OutputError> {
    write_file(path, &render_csv(rows))?;
    tracing::info!(path = %path.display(), rows = rows.len(), "wrote series csv");
    Ok(())
}
