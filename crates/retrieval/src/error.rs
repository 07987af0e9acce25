//! Error taxonomy for the retrieval engine.

use nearmatch_core::AppError;
use thiserror::Error;

/// Failures raised by ranking operations.
///
/// All variants are deterministic input-contract violations except
/// `EmbeddingProvider`, which wraps the collaborator's own error unchanged.
#[derive(Error, Debug)]
pub enum RetrievalError {
    /// A vector to be normalized has zero norm.
    ///
    /// `row` is the candidate position, or `None` for a query vector.
    #[error("Degenerate vector{}: norm is zero", fmt_row(.row))]
    DegenerateVector { row: Option<usize> },

    /// A vector to be normalized has a NaN or infinite component.
    #[error("Non-finite vector{}: components must be finite", fmt_row(.row))]
    NonFiniteVector { row: Option<usize> },

    /// Query and candidate embeddings differ in dimensionality.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Requested match count is negative.
    #[error("Invalid top-k: {0} (must be >= 0)")]
    InvalidTopK(i64),

    /// The embedding collaborator failed.
    #[error("Embedding provider failed: {0}")]
    EmbeddingProvider(#[source] AppError),

    /// The provider returned a different number of vectors than requested.
    #[error("Embedding provider returned {actual} vectors for {expected} texts")]
    EmbeddingCountMismatch { expected: usize, actual: usize },

    /// A candidate collection mixes bare and labeled rows.
    #[error("Candidate row {index} does not match the shape of row 0")]
    MixedCandidateShapes { index: usize },

    /// Candidate input could not be parsed.
    #[error("Invalid candidate input: {0}")]
    InvalidCandidates(String),
}

fn fmt_row(row: &Option<usize>) -> String {
    match row {
        Some(row) => format!(" at candidate {}", row),
        None => " in query".to_string(),
    }
}

/// Convenience alias for engine results.
pub type RetrievalResult<T> = Result<T, RetrievalError>;

impl From<RetrievalError> for AppError {
    fn from(err: RetrievalError) -> Self {
        match err {
            RetrievalError::EmbeddingProvider(inner) => inner,
            other => AppError::Retrieval(other.to_string()),
        }
    }
}
