//! Error types for analysis operations

use thiserror::Error;

/// Analysis-specific errors
#[derive(Debug, Error)]
pub enum AdvisorError {
    /// Invalid ticker symbol at the request boundary
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// Market-data failure that survived the gateway's retries
    #[error("Market data error: {0}")]
    Market(#[from] advisor_market::MarketError),

    /// Decision-model failure that survived the client's retries
    #[error("Decision model error: {0}")]
    Llm(#[from] advisor_llm::LLMError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Result type alias for analysis operations
pub type Result<T> = std::result::Result<T, AdvisorError>;

/// Convert AdvisorError to advisor_core::Error
impl From<AdvisorError> for advisor_core::Error {
    fn from(err: AdvisorError) -> Self {
        advisor_core::Error::ProcessingFailed(err.to_string())
    }
}

/// Convert advisor_core::Error to AdvisorError
impl From<advisor_core::Error> for AdvisorError {
    fn from(err: advisor_core::Error) -> Self {
        AdvisorError::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AdvisorError::InvalidSymbol("??".to_string());
        assert_eq!(err.to_string(), "Invalid symbol: ??");

        let err = AdvisorError::Config("no credential".to_string());
        assert!(err.to_string().contains("no credential"));
    }

    #[test]
    fn test_error_conversion() {
        let err = AdvisorError::Other("boom".to_string());
        let core_err: advisor_core::Error = err.into();
        assert!(matches!(
            core_err,
            advisor_core::Error::ProcessingFailed(_)
        ));
    }
}
