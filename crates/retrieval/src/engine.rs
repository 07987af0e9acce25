//! Query entry points: single-query ranking and the batch orchestrator.
//!
//! The engine keeps no candidate data between calls. Each call embeds its
//! queries through the injected provider, prepares the candidate matrix
//! once, scores every query against it and selects the top k per query.

use std::sync::Arc;

use nearmatch_core::{AppResult, RetrievalSettings};
use rayon::prelude::*;
use serde::Serialize;

use crate::candidates::{Candidates, PreparedCandidates};
use crate::embeddings::EmbeddingProvider;
use crate::error::{RetrievalError, RetrievalResult};
use crate::matches::{assemble_matches, MatchRecord};
use crate::similarity::SimilarityBackend;
use crate::topk::{select_top_k, TopK};

/// Matches for one query of a batch, keyed by its position.
///
/// Duplicate query strings get one entry each.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryMatches<L> {
    pub position: usize,
    pub query: String,
    pub matches: Vec<MatchRecord<L>>,
}

/// Similarity retrieval over caller-supplied candidates.
#[derive(Debug, Clone)]
pub struct RetrievalEngine {
    provider: Arc<dyn EmbeddingProvider>,
    backend: SimilarityBackend,
    parallel: bool,
}

impl RetrievalEngine {
    /// Create an engine with the default backend and parallel batches.
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            provider,
            backend: SimilarityBackend::default(),
            parallel: true,
        }
    }

    /// Create an engine from the `retrieval` config section.
    pub fn from_settings(
        provider: Arc<dyn EmbeddingProvider>,
        settings: &RetrievalSettings,
    ) -> AppResult<Self> {
        Ok(Self::new(provider)
            .with_backend(settings.backend.parse()?)
            .with_parallel(settings.parallel))
    }

    pub fn with_backend(mut self, backend: SimilarityBackend) -> Self {
        self.backend = backend;
        self
    }

    /// Rank batch rows on the rayon pool instead of sequentially.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.provider
    }

    pub fn backend(&self) -> SimilarityBackend {
        self.backend
    }

    /// Embed one query text.
    pub async fn embed_query(&self, query: &str) -> RetrievalResult<Vec<f32>> {
        self.provider
            .embed(query)
            .await
            .map_err(RetrievalError::EmbeddingProvider)
    }

    /// Embed many texts in one provider call, one vector per text.
    pub async fn embed_texts(&self, texts: &[String]) -> RetrievalResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let embeddings = self
            .provider
            .embed_batch(texts)
            .await
            .map_err(RetrievalError::EmbeddingProvider)?;

        if embeddings.len() != texts.len() {
            return Err(RetrievalError::EmbeddingCountMismatch {
                expected: texts.len(),
                actual: embeddings.len(),
            });
        }

        tracing::debug!(
            texts = texts.len(),
            provider = self.provider.provider_name(),
            model = self.provider.model_name(),
            "Embedded texts"
        );

        Ok(embeddings)
    }

    /// Build a labeled collection by embedding each text; the label is the text.
    pub async fn embed_candidates(&self, texts: &[String]) -> RetrievalResult<Candidates<String>> {
        let embeddings = self.embed_texts(texts).await?;
        Ok(Candidates::Labeled(
            texts.iter().cloned().zip(embeddings).collect(),
        ))
    }

    /// Prepare a candidate collection for repeated scoring with this engine's backend.
    pub fn prepare<L: Clone>(
        &self,
        candidates: &Candidates<L>,
    ) -> RetrievalResult<PreparedCandidates<L>> {
        candidates.prepare(self.backend)
    }

    /// The `k` candidates most similar to `query`, best first.
    ///
    /// Returns `min(k, N)` records.
    pub async fn top_k_matches<L>(
        &self,
        query: &str,
        candidates: &Candidates<L>,
        k: TopK,
    ) -> RetrievalResult<Vec<MatchRecord<L>>>
    where
        L: Clone + Send + Sync,
    {
        let embedding = self.embed_query(query).await?;
        let prepared = self.prepare(candidates)?;
        self.rank_vector(&embedding, &prepared, k)
    }

    /// Rank every query against the same candidates.
    ///
    /// Entry `i` equals `top_k_matches(&queries[i], candidates, k)`. Queries
    /// are embedded in one provider call, the candidate matrix is prepared
    /// once and all similarities come from one Q×N computation.
    pub async fn top_k_matches_batch<L>(
        &self,
        queries: &[String],
        candidates: &Candidates<L>,
        k: TopK,
    ) -> RetrievalResult<Vec<QueryMatches<L>>>
    where
        L: Clone + Send + Sync,
    {
        let embeddings = self.embed_texts(queries).await?;
        let prepared = self.prepare(candidates)?;
        let ranked = self.rank_vectors(&embeddings, &prepared, k)?;

        Ok(queries
            .iter()
            .zip(ranked)
            .enumerate()
            .map(|(position, (query, matches))| QueryMatches {
                position,
                query: query.clone(),
                matches,
            })
            .collect())
    }

    /// Rank a query vector that is already embedded.
    pub fn rank_vector<L>(
        &self,
        query: &[f32],
        prepared: &PreparedCandidates<L>,
        k: TopK,
    ) -> RetrievalResult<Vec<MatchRecord<L>>>
    where
        L: Clone + Send + Sync,
    {
        let mut ranked = self.rank_vectors(std::slice::from_ref(&query.to_vec()), prepared, k)?;
        Ok(ranked.pop().unwrap_or_default())
    }

    /// Rank already-embedded query vectors, one result list per query.
    ///
    /// An empty candidate collection yields empty lists without inspecting
    /// the queries.
    pub fn rank_vectors<L>(
        &self,
        queries: &[Vec<f32>],
        prepared: &PreparedCandidates<L>,
        k: TopK,
    ) -> RetrievalResult<Vec<Vec<MatchRecord<L>>>>
    where
        L: Clone + Send + Sync,
    {
        if prepared.is_empty() {
            return Ok(vec![Vec::new(); queries.len()]);
        }

        let scores = prepared.matrix().score_matrix(queries)?;
        let labels = prepared.labels();

        tracing::debug!(
            queries = queries.len(),
            candidates = prepared.len(),
            k = k.get(),
            backend = %prepared.matrix().backend(),
            parallel = self.parallel,
            "Ranking queries"
        );

        let rank_row = |row: &Vec<f32>| assemble_matches(&select_top_k(row, k), row, labels);

        Ok(if self.parallel && scores.len() > 1 {
            scores.par_iter().map(rank_row).collect()
        } else {
            scores.iter().map(rank_row).collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::stub::{FailingProvider, StubProvider};

    fn engine() -> RetrievalEngine {
        RetrievalEngine::new(Arc::new(StubProvider::new(&[
            ("down", vec![1.0, 0.0]),
            ("up", vec![0.0, 1.0]),
            ("nothing", vec![0.0, 0.0]),
            ("wide", vec![1.0, 0.0, 0.0]),
        ])))
    }

    #[test]
    fn test_from_settings() {
        let settings = RetrievalSettings {
            backend: "explicit".to_string(),
            parallel: false,
            ..Default::default()
        };
        let engine =
            RetrievalEngine::from_settings(Arc::new(StubProvider::new(&[])), &settings).unwrap();
        assert_eq!(engine.backend(), SimilarityBackend::Explicit);
        assert!(!engine.parallel);

        let bad = RetrievalSettings {
            backend: "gpu".to_string(),
            ..Default::default()
        };
        assert!(RetrievalEngine::from_settings(Arc::new(StubProvider::new(&[])), &bad).is_err());
    }

    #[tokio::test]
    async fn test_empty_collection_returns_nothing() {
        let candidates: Candidates<String> = Candidates::Plain(Vec::new());
        let matches = engine()
            .top_k_matches("down", &candidates, TopK::from(5))
            .await
            .unwrap();
        assert!(matches.is_empty());
    }

    #[tokio::test]
    async fn test_zero_query_is_degenerate() {
        let candidates: Candidates<String> = Candidates::Plain(vec![vec![1.0, 1.0]]);
        let err = engine()
            .top_k_matches("nothing", &candidates, TopK::from(1))
            .await
            .unwrap_err();
        assert!(matches!(err, RetrievalError::DegenerateVector { row: None }));
    }

    #[tokio::test]
    async fn test_dimension_mismatch() {
        let candidates: Candidates<String> = Candidates::Plain(vec![vec![1.0, 1.0]]);
        let err = engine()
            .top_k_matches("wide", &candidates, TopK::from(1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RetrievalError::DimensionMismatch {
                expected: 2,
                actual: 3
            }
        ));
    }

    #[tokio::test]
    async fn test_provider_failure_propagates() {
        let engine = RetrievalEngine::new(Arc::new(FailingProvider));
        let candidates: Candidates<String> = Candidates::Plain(vec![vec![1.0]]);

        let err = engine
            .top_k_matches("anything", &candidates, TopK::from(1))
            .await
            .unwrap_err();
        assert!(matches!(err, RetrievalError::EmbeddingProvider(_)));

        let err = engine
            .top_k_matches_batch(&["a".to_string()], &candidates, TopK::from(1))
            .await
            .unwrap_err();
        assert!(matches!(err, RetrievalError::EmbeddingProvider(_)));
    }

    #[tokio::test]
    async fn test_short_batch_from_provider_is_an_error() {
        let provider = StubProvider::new(&[("down", vec![1.0])]).dropping_last();
        let engine = RetrievalEngine::new(Arc::new(provider));
        let err = engine
            .embed_texts(&["down".to_string(), "down".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RetrievalError::EmbeddingCountMismatch {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[tokio::test]
    async fn test_embed_candidates_labels_with_text() {
        let texts = vec!["up".to_string(), "down".to_string()];
        let candidates = engine().embed_candidates(&texts).await.unwrap();

        let matches = engine()
            .top_k_matches("down", &candidates, TopK::from(1))
            .await
            .unwrap();
        assert_eq!(matches[0].index, 1);
        assert_eq!(matches[0].label.as_deref(), Some("down"));
        assert!((matches[0].score - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let candidates: Candidates<String> = Candidates::Plain(vec![vec![1.0, 0.0]]);
        let results = engine()
            .top_k_matches_batch(&[], &candidates, TopK::from(3))
            .await
            .unwrap();
        assert!(results.is_empty());
    }
}
