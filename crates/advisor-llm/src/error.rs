//! Error types for decision-model operations

use std::time::Duration;
use thiserror::Error;

/// Result type for decision-model operations
pub type Result<T> = std::result::Result<T, LLMError>;

/// Errors that can occur when calling the decision model
#[derive(Error, Debug)]
pub enum LLMError {
    /// API request failed
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Invalid API key or authentication failed
    #[error("Invalid API key or authentication failed")]
    AuthenticationFailed,

    /// Rate limit exceeded; `retry_after` carries the service-suggested
    /// wait when the response included one
    #[error("Rate limit exceeded: {message}")]
    RateLimited {
        message: String,
        retry_after: Option<Duration>,
    },

    /// Invalid request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP error
    #[cfg(feature = "gemini")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Unexpected response format
    #[error("Unexpected response format: {0}")]
    UnexpectedResponse(String),

    /// Configuration error (e.g. missing credential)
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl LLMError {
    /// Whether retrying the call can possibly succeed
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Self::AuthenticationFailed
                | Self::InvalidRequest(_)
                | Self::Configuration(_)
                | Self::Serialization(_)
        )
    }
}
