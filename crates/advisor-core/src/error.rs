//! Error types for advisor-core

use thiserror::Error;

/// Result type alias for advisor-core
pub type Result<T> = std::result::Result<T, Error>;

/// Error type shared across advisor components
#[derive(Error, Debug)]
pub enum Error {
    /// Generic error message
    #[error("{0}")]
    Generic(String),

    /// Component initialization failed
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    /// Processing failed
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),

    /// A tool invocation was rejected before dispatch (unknown tool name
    /// or arguments that do not satisfy the tool's schema)
    #[error("Invalid tool request: {0}")]
    InvalidToolRequest(String),
}
