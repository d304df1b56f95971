use thiserror::Error;

/// Failure to obtain a snapshot from an upstream source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP {status} from {url}")]
    Http {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid snapshot JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("all data sources failed (snapshot: {primary}; spreadsheet: {fallback})")]
    Unavailable {
        primary: Box<SourceError>,
        fallback: Box<SourceError>,
    },
}

impl SourceError {
    /// HTTP status of the failure, when the upstream answered.
    pub fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            SourceError::Http { status, .. } => Some(*status),
            SourceError::Transport(e) => e.status(),
            SourceError::Unavailable { fallback, .. } => fallback.status(),
            _ => None,
        }
    }
}
