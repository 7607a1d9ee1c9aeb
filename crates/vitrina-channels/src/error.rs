//! Error types for vitrina-channels

use thiserror::Error;

/// Channel error type
#[derive(Debug, Error)]
pub enum Error {
    /// Adapter not configured
    #[error("channel not configured: {0}")]
    NotConfigured(String),

    /// API error from the transport provider
    #[error("api error: {0}")]
    Api(String),

    /// Network error
    #[error("network error: {0}")]
    Network(String),

    /// Malformed webhook payload
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Network(e.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
