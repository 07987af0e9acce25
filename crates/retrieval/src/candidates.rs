//! Candidate collections and their prepared (dense, normalized) form.
//!
//! The shape of a collection, bare vectors or `(label, vector)` pairs, is
//! fixed when the [`Candidates`] value is built. Labels are split off during
//! preparation and only rejoin the results in [`crate::matches`].

use serde::Deserialize;

use crate::error::{RetrievalError, RetrievalResult};
use crate::similarity::{CandidateMatrix, SimilarityBackend};

/// The items a query is ranked against.
#[derive(Debug, Clone, PartialEq)]
pub enum Candidates<L> {
    /// Bare embedding vectors; matches are identified by index only
    Plain(Vec<Vec<f32>>),
    /// Embedding vectors paired with a caller-defined label
    Labeled(Vec<(L, Vec<f32>)>),
}

impl<L> Candidates<L> {
    /// Number of candidates (N).
    pub fn len(&self) -> usize {
        match self {
            Candidates::Plain(vectors) => vectors.len(),
            Candidates::Labeled(pairs) => pairs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_labeled(&self) -> bool {
        matches!(self, Candidates::Labeled(_))
    }

    /// Embedding vectors in collection order.
    pub fn vectors(&self) -> Box<dyn Iterator<Item = &[f32]> + '_> {
        match self {
            Candidates::Plain(vectors) => Box::new(vectors.iter().map(Vec::as_slice)),
            Candidates::Labeled(pairs) => Box::new(pairs.iter().map(|(_, v)| v.as_slice())),
        }
    }
}

impl<L: Clone> Candidates<L> {
    /// Extract, validate and normalize the candidate matrix once.
    pub fn prepare(&self, backend: SimilarityBackend) -> RetrievalResult<PreparedCandidates<L>> {
        let matrix = CandidateMatrix::prepare(self.vectors(), backend)?;
        let labels = match self {
            Candidates::Plain(_) => None,
            Candidates::Labeled(pairs) => Some(pairs.iter().map(|(l, _)| l.clone()).collect()),
        };

        tracing::debug!(
            candidates = matrix.len(),
            dimension = matrix.dimension(),
            labeled = labels.is_some(),
            %backend,
            "Prepared candidate matrix"
        );

        Ok(PreparedCandidates { matrix, labels })
    }
}

/// One row of a candidate JSON document.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CandidateRow {
    Plain(Vec<f32>),
    Labeled(String, Vec<f32>),
}

impl Candidates<String> {
    /// Parse a JSON array of candidate rows.
    ///
    /// Rows are either numeric arrays (`[0.1, 0.2]`) or `[label, [0.1, 0.2]]`
    /// pairs. The first row decides the shape; any row that disagrees fails
    /// with [`RetrievalError::MixedCandidateShapes`]. An empty array is an
    /// empty plain collection.
    pub fn from_json_str(json: &str) -> RetrievalResult<Self> {
        let rows: Vec<CandidateRow> = serde_json::from_str(json)
            .map_err(|e| RetrievalError::InvalidCandidates(e.to_string()))?;

        match rows.first() {
            None | Some(CandidateRow::Plain(_)) => rows
                .into_iter()
                .enumerate()
                .map(|(index, row)| match row {
                    CandidateRow::Plain(v) => Ok(v),
                    CandidateRow::Labeled(..) => {
                        Err(RetrievalError::MixedCandidateShapes { index })
                    }
                })
                .collect::<RetrievalResult<_>>()
                .map(Candidates::Plain),
            Some(CandidateRow::Labeled(..)) => rows
                .into_iter()
                .enumerate()
                .map(|(index, row)| match row {
                    CandidateRow::Labeled(label, v) => Ok((label, v)),
                    CandidateRow::Plain(_) => Err(RetrievalError::MixedCandidateShapes { index }),
                })
                .collect::<RetrievalResult<_>>()
                .map(Candidates::Labeled),
        }
    }
}

/// A candidate collection ready for scoring.
#[derive(Debug, Clone)]
pub struct PreparedCandidates<L> {
    matrix: CandidateMatrix,
    labels: Option<Vec<L>>,
}

impl<L> PreparedCandidates<L> {
    pub fn matrix(&self) -> &CandidateMatrix {
        &self.matrix
    }

    pub fn labels(&self) -> Option<&[L]> {
        self.labels.as_deref()
    }

    pub fn len(&self) -> usize {
        self.matrix.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matrix.is_empty()
    }
}
