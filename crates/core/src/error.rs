//! Error types for Nearmatch.
//!
//! A single application-level error enum covering configuration, I/O,
//! embedding providers, retrieval and serialization failures.

use thiserror::Error;

/// Unified error type for Nearmatch.
///
/// Library crates keep their own typed errors and convert into this one at
/// the application boundary. We never panic; errors are propagated.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Embedding provider errors (upstream unavailable, bad response, ...)
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Retrieval engine input-contract violations
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
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
    fn test_json_error_maps_to_serialization() {
        let err: AppError = serde_json::from_str::<Vec<f32>>("not json")
            .unwrap_err()
            .into();
        assert!(matches!(err, AppError::Serialization(_)));
    }

    #[test]
    fn test_display_prefixes() {
        let err = AppError::Embedding("upstream down".to_string());
        assert_eq!(err.to_string(), "Embedding error: upstream down");
    }
}
