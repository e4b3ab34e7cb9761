//! Error types for the campus task service.
//!
//! This module defines a unified error enum that covers all error categories
//! in the application: configuration, I/O, generation, knowledge, prompt,
//! rate limiting, invalid input and uninitialized state.

use thiserror::Error;

/// Unified error type for the campus task service.
///
/// All fallible functions return `Result<T, AppError>`.
/// Errors are represented and propagated, never panicked on.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Answer generation backend errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// An operation exceeded its time budget
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Knowledge base and retrieval errors
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// A service was used before its data was loaded
    #[error("Not initialized: {0}")]
    NotInitialized(String),

    /// A client exceeded its request quota
    #[error("Rate limit exceeded for '{client}', retry after {retry_after_secs}s")]
    RateLimited {
        client: String,
        retry_after_secs: u64,
    },

    /// Caller supplied an out-of-range or malformed argument
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Whether this error represents an exceeded time budget.
    pub fn is_timeout(&self) -> bool {
        matches!(self, AppError::Timeout(_))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_timeout() {
        assert!(AppError::Timeout("llm".to_string()).is_timeout());
        assert!(!AppError::Llm("boom".to_string()).is_timeout());
    }

    #[test]
    fn test_rate_limited_message() {
        let err = AppError::RateLimited {
            client: "10.0.0.1".to_string(),
            retry_after_secs: 60,
        };
        let msg = err.to_string();
        assert!(msg.contains("10.0.0.1"));
        assert!(msg.contains("60s"));
    }

    #[test]
    fn test_from_serde_json() {
        let err: AppError = serde_json::from_str::<u32>("not json").unwrap_err().into();
        assert!(matches!(err, AppError::Serialization(_)));
    }
}
