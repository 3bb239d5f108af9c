//! Error types for cinch-memory.

use thiserror::Error;

/// Result type alias using cinch-memory's [`MemoryError`].
pub type Result<T> = std::result::Result<T, MemoryError>;

/// Errors surfaced by memories.
#[derive(Error, Debug)]
pub enum MemoryError {
    /// Invalid construction-time configuration (zero capacity, missing estimator).
    #[error("Configuration error: {0}")]
    Config(String),

    /// The token estimator failed while pricing the window.
    #[error("Token estimation failed: {0}")]
    Estimate(#[from] EstimateError),
}

/// Errors raised by a [`TokenEstimator`](crate::estimate::TokenEstimator).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EstimateError {
    /// No tokenizer is known for the requested model.
    #[error("no tokenizer known for model '{0}'")]
    UnknownModel(String),

    /// The tokenizer itself failed.
    #[error("tokenizer error: {0}")]
    Tokenizer(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_error_converts_into_memory_error() {
        let err: MemoryError = EstimateError::Tokenizer("bad input".into()).into();
        assert!(matches!(err, MemoryError::Estimate(_)));
        assert_eq!(
            err.to_string(),
            "Token estimation failed: tokenizer error: bad input"
        );
    }
}
