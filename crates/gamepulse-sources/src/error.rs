use thiserror::Error;

/// Errors returned by metric and mention sources.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The upstream answered with a non-success status.
    #[error("{source_name} returned status {status}")]
    UnexpectedStatus { source_name: String, status: u16 },

    /// The response body did not have the expected shape.
    #[error("parse error for {context}: {message}")]
    Parse { context: String, message: String },

    /// A local file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// OAuth token exchange or search against the Reddit API failed.
    #[error("Reddit API error: {0}")]
    Reddit(String),
}

impl SourceError {
    pub(crate) fn parse(context: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Parse {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Returns `true` for failures that may clear up on a later attempt.
    ///
    /// Transport failures and any non-success status are worth another try.
    /// Malformed payloads and local I/O errors are not.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::Http(e) => !e.is_decode() && !e.is_builder(),
            Self::UnexpectedStatus { .. } | Self::Reddit(_) => true,
            Self::Parse { .. } | Self::Io { .. } => false,
        }
    }
}
