//! Deterministic embedding providers for tests.

use std::collections::HashMap;

use crate::embeddings::EmbeddingProvider;
use nearmatch_core::{AppError, AppResult};

/// Looks each text up in a fixed table.
#[derive(Debug, Default)]
pub(crate) struct StubProvider {
    table: HashMap<String, Vec<f32>>,
    dimensions: usize,
    drop_last: bool,
}

impl StubProvider {
    pub(crate) fn new(entries: &[(&str, Vec<f32>)]) -> Self {
        Self {
            table: entries
                .iter()
                .map(|(text, v)| (text.to_string(), v.clone()))
                .collect(),
            dimensions: entries.first().map_or(0, |(_, v)| v.len()),
            drop_last: false,
        }
    }

    /// Misbehave by returning one vector fewer than asked for.
    pub(crate) fn dropping_last(mut self) -> Self {
        self.drop_last = true;
        self
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for StubProvider {
    fn provider_name(&self) -> &str {
        "stub"
    }

    fn model_name(&self) -> &str {
        "table"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let mut out = texts
            .iter()
            .map(|text| {
                self.table
                    .get(text)
                    .cloned()
                    .ok_or_else(|| AppError::Embedding(format!("no stub vector for '{}'", text)))
            })
            .collect::<AppResult<Vec<_>>>()?;
        if self.drop_last {
            out.pop();
        }
        Ok(out)
    }
}

/// Always fails, like an unreachable upstream.
#[derive(Debug)]
pub(crate) struct FailingProvider;

#[async_trait::async_trait]
impl EmbeddingProvider for FailingProvider {
    fn provider_name(&self) -> &str {
        "failing"
    }

    fn model_name(&self) -> &str {
        "none"
    }

    fn dimensions(&self) -> usize {
        0
    }

    async fn embed_batch(&self, _texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Err(AppError::Embedding("upstream unavailable".to_string()))
    }
}
