//! Similarity-based retrieval.
//!
//! Given a query and a collection of precomputed embeddings, return the N
//! most similar items ranked by cosine similarity:
//!
//! - [`normalize`]: unit-length scaling with zero-norm detection
//! - [`similarity`]: cosine scores through `ndarray` or an explicit fallback
//! - [`topk`]: partition-then-sort selection with index tie-break
//! - [`matches`]: binding indices back to labels
//! - [`engine`]: single-query and batched entry points
//!
//! Embeddings come from an injected [`EmbeddingProvider`].
//!
//! # Example
//! ```
//! use std::sync::Arc;
//! use nearmatch_retrieval::{Candidates, RetrievalEngine, TopK};
//! use nearmatch_retrieval::embeddings::providers::TrigramProvider;
//!
//! # #[tokio::main]
//! # async fn main() -> nearmatch_core::AppResult<()> {
//! let engine = RetrievalEngine::new(Arc::new(TrigramProvider::new(128)?));
//! let candidates = Candidates::Labeled(vec![
//!     ("sad".to_string(), vec![1.0, 0.0]),
//!     ("happy".to_string(), vec![0.0, 1.0]),
//!     ("okay".to_string(), vec![0.7, 0.7]),
//! ]);
//!
//! let prepared = engine.prepare(&candidates)?;
//! let matches = engine.rank_vector(&[1.0, 0.0], &prepared, TopK::from(2))?;
//! assert_eq!(matches[0].label.as_deref(), Some("sad"));
//! assert_eq!(matches[1].label.as_deref(), Some("okay"));
//! # Ok(())
//! # }
//! ```

pub mod candidates;
pub mod embeddings;
pub mod engine;
pub mod error;
pub mod matches;
pub mod normalize;
pub mod similarity;
pub mod topk;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use candidates::{Candidates, PreparedCandidates};
pub use embeddings::{create_provider, EmbeddingProvider};
pub use engine::{QueryMatches, RetrievalEngine};
pub use error::{RetrievalError, RetrievalResult};
pub use matches::MatchRecord;
pub use similarity::SimilarityBackend;
pub use topk::TopK;
