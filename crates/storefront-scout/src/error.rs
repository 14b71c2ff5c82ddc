//! Error types for acquisition and enrichment.

/// A single source failed to produce products.
#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    #[error("browser error: {0}")]
    Browser(String),

    #[error("timed out after {timeout_ms}ms waiting for {what}")]
    Timeout { what: String, timeout_ms: u64 },

    #[error("no products found")]
    NoResults,

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("decode error: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            SourceError::Decode(e.to_string())
        } else {
            SourceError::Http(e.to_string())
        }
    }
}

/// Acquisition failed on every tier.
#[derive(thiserror::Error, Debug)]
pub enum AcquireError {
    #[error("fallback catalog failed after {primary_attempts} primary attempt(s): {source}")]
    FallbackFailed {
        primary_attempts: usize,
        #[source]
        source: SourceError,
    },
}

/// Errors from the text-completion service.
#[derive(thiserror::Error, Debug)]
pub enum CompletionError {
    /// Missing credential or invalid settings.
    #[error("configuration error: {0}")]
    Config(String),

    /// Connection failure or timeout.
    #[error("network error: {0}")]
    Network(String),

    /// Non-2xx response.
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// Response did not have the expected shape.
    #[error("parse error: {0}")]
    Parse(String),
}
