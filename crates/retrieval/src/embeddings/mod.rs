//! Embedding providers: the collaborator that turns text into vectors.
//!
//! The engine never reaches for a global embedder; a provider is built from
//! configuration (or a test stub) and injected into
//! [`crate::engine::RetrievalEngine`].

pub mod provider;
pub mod providers;

pub use provider::{create_provider, EmbeddingProvider};
