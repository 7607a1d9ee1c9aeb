//! Error types for vitrina-core

use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// Field extraction failed
    #[error("extraction error: {0}")]
    Extraction(String),

    /// Retrieval service failed
    #[error("retrieval error: {0}")]
    Retrieval(String),

    /// Inventory lookup failed
    #[error("inventory error: {0}")]
    Inventory(String),

    /// Photo index lookup failed
    #[error("photo index error: {0}")]
    PhotoIndex(String),

    /// Completion provider error
    #[error("llm error: {0}")]
    Llm(#[from] vitrina_llm::Error),

    /// Durable store error
    #[error("storage error: {0}")]
    Storage(#[from] vitrina_storage::Error),

    /// Outbound channel error
    #[error("channel error: {0}")]
    Channel(#[from] vitrina_channels::Error),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Short apology sent to the client when a turn fails.
///
/// Never exposes internal detail; the real error goes to the log.
#[must_use]
pub fn apology_text() -> &'static str {
    "Извините, произошла небольшая ошибка. Наш менеджер скоро с вами свяжется!"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Retrieval("timeout".to_string());
        assert_eq!(err.to_string(), "retrieval error: timeout");
    }

    #[test]
    fn test_apology_has_no_internals() {
        assert!(!apology_text().contains("error:"));
    }
}
