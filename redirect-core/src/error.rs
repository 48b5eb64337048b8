//! Error types for request interception

use thiserror::Error;

/// Main error type for interceptor operations
#[derive(Debug, Error)]
pub enum RedirectError {
    #[error("Invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Request carries no body")]
    MissingBody,

    #[error("Request body is not valid UTF-8: {0}")]
    BodyEncoding(#[from] std::str::Utf8Error),

    #[error("Failed to parse player payload: {0}")]
    PayloadParse(#[from] serde_json::Error),

    #[error("Invalid player payload: {0}")]
    InvalidPayload(String),

    #[error("Tab navigation failed: {0}")]
    Navigation(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RedirectError {
    pub(crate) fn invalid_url(url: &str, source: url::ParseError) -> Self {
        RedirectError::InvalidUrl {
            url: url.to_string(),
            source,
        }
    }

    /// True for errors caused by the shape of the request payload rather than
    /// by the host or the configuration.
    pub fn is_payload_error(&self) -> bool {
        matches!(
            self,
            RedirectError::MissingBody
                | RedirectError::BodyEncoding(_)
                | RedirectError::PayloadParse(_)
                | RedirectError::InvalidPayload(_)
        )
    }
}
