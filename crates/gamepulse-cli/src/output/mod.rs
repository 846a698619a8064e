//! File artifacts produced from a reconciled series.

mod chart;
mod csv;

use std::path::Path;

use thiserror::Error;

pub(crate) use chart::{write_chart, ChartLabels};
pub(crate) use csv::write_csv;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Write `contents` to `path`, creating missing parent directories.
fn write_file(path: &Path, contents: &str) -> Result<(), OutputError> {
    let io_err = |source| OutputError::Io {
        path: path.display().to_string(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    std::fs::write(path, contents).map_err(io_err)
}
