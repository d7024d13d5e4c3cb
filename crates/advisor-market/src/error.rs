//! Error types for market-data operations

use thiserror::Error;

/// Market-data specific errors
#[derive(Debug, Error)]
pub enum MarketError {
    /// Ticker unknown to the upstream source - terminal, never retried
    #[error("Symbol not found: {0}")]
    NotFound(String),

    /// Upstream signalled a rate limit - retried with extended backoff
    #[error("Rate limited by upstream: {0}")]
    RateLimited(String),

    /// Network hiccup, timeout, or malformed upstream payload - retried
    /// with standard backoff
    #[error("Transient upstream failure: {0}")]
    Transient(String),

    /// Network or HTTP error
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for market-data operations
pub type Result<T> = std::result::Result<T, MarketError>;

impl MarketError {
    /// Whether retrying the fetch can possibly succeed
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::NotFound(_))
    }

    /// Whether this failure is an upstream rate-limit signal
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }
}

/// Convert MarketError to advisor_core::Error
impl From<MarketError> for advisor_core::Error {
    fn from(err: MarketError) -> Self {
        advisor_core::Error::ProcessingFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MarketError::NotFound("INVALID".to_string());
        assert_eq!(err.to_string(), "Symbol not found: INVALID");

        let err = MarketError::RateLimited("429 Too Many Requests".to_string());
        assert!(err.to_string().contains("Rate limited"));
    }

    #[test]
    fn test_retry_classification() {
        assert!(!MarketError::NotFound("X".to_string()).is_retryable());
        assert!(MarketError::RateLimited("quota".to_string()).is_retryable());
        assert!(MarketError::Transient("timeout".to_string()).is_retryable());

        assert!(MarketError::RateLimited("quota".to_string()).is_rate_limit());
        assert!(!MarketError::Transient("timeout".to_string()).is_rate_limit());
    }
}
