//! Error types for the citydata client.

/// A whole-zone fetch failure. The zone yields no samples this cycle.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("upstream responded with HTTP {status}")]
    Status { status: u16 },
    #[error("upstream error {code}: {message}")]
    Upstream { code: String, message: String },
    #[error("response body is not valid XML")]
    Parse(#[source] roxmltree::Error),
}

impl FetchError {
    /// Short machine-friendly label for logs and counters.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Request(e) if e.is_timeout() => "timeout",
            FetchError::Request(_) => "request",
            FetchError::Status { .. } => "status",
            FetchError::Upstream { .. } => "upstream",
            FetchError::Parse(_) => "parse",
        }
    }
}

/// A single nested record that could not be normalized. Only that record is dropped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("missing required field {0}")]
    MissingField(&'static str),
    #[error("invalid value {value:?} for field {field}")]
    InvalidField { field: &'static str, value: String },
}
