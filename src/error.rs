use thiserror::Error;

/// Failure inside a single adapter call. Never crosses the adapter boundary:
/// `StationSource` implementations log it and return an empty result.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("unexpected response shape: {0}")]
    Parse(String),
    #[error("no matching station")]
    NotFound,
}

impl SourceError {
    pub fn kind(&self) -> &'static str {
        match self {
            SourceError::Transport(_) => "transport",
            SourceError::Parse(_) => "parse",
            SourceError::NotFound => "not_found",
        }
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            SourceError::Parse(error.to_string())
        } else {
            SourceError::Transport(error.to_string())
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(error: serde_json::Error) -> Self {
        SourceError::Parse(error.to_string())
    }
}

impl From<url::ParseError> for SourceError {
    fn from(error: url::ParseError) -> Self {
        SourceError::Transport(format!("invalid request url: {error}"))
    }
}

/// Failures surfaced by the listing and resolve operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("country '{0}' is not a two-letter code")]
    InvalidCountry(String),
    /// Every strategy came up empty.
    #[error("radio '{0}' not found")]
    NotFound(String),
}
