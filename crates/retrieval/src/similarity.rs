//! Cosine similarity between query vectors and a prepared candidate matrix.
//!
//! Two interchangeable backends are provided and must agree within float
//! tolerance:
//! - [`SimilarityBackend::Ndarray`] normalizes with array-wide ops and scores
//!   through `ndarray`'s matrix product (one Q×N product for a batch).
//! - [`SimilarityBackend::Explicit`] normalizes each row with
//!   [`crate::normalize`] and takes plain inner products. It needs nothing
//!   beyond the standard library and is the fallback path.

use std::fmt;
use std::str::FromStr;

use ndarray::{Array2, ArrayView1, Axis, Zip};
use nearmatch_core::AppError;
use serde::{Deserialize, Serialize};

use crate::error::{RetrievalError, RetrievalResult};
use crate::normalize::{checked_norm, norm_of, normalize, normalize_at, scale};

/// How cosine similarity is computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimilarityBackend {
    /// Matrix products via `ndarray`
    #[default]
    Ndarray,
    /// Row-by-row normalization and inner products
    Explicit,
}

impl fmt::Display for SimilarityBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimilarityBackend::Ndarray => write!(f, "ndarray"),
            SimilarityBackend::Explicit => write!(f, "explicit"),
        }
    }
}

impl FromStr for SimilarityBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ndarray" => Ok(SimilarityBackend::Ndarray),
            "explicit" => Ok(SimilarityBackend::Explicit),
            other => Err(AppError::Config(format!(
                "Unknown similarity backend: '{}'. Supported: ndarray, explicit",
                other
            ))),
        }
    }
}

/// Dense matrix of unit-length candidate rows (N×D).
///
/// Built once per call and reused for every query scored against it.
#[derive(Debug, Clone)]
pub struct CandidateMatrix {
    rows: Array2<f32>,
    backend: SimilarityBackend,
}

impl CandidateMatrix {
    /// Validate and normalize candidate rows.
    ///
    /// Every row must share the dimension of row 0 and have a non-zero norm.
    pub fn prepare<'a, I>(rows: I, backend: SimilarityBackend) -> RetrievalResult<Self>
    where
        I: IntoIterator<Item = &'a [f32]>,
    {
        let rows: Vec<&[f32]> = rows.into_iter().collect();
        let dimension = rows.first().map_or(0, |row| row.len());

        for row in &rows {
            if row.len() != dimension {
                return Err(RetrievalError::DimensionMismatch {
                    expected: dimension,
                    actual: row.len(),
                });
            }
        }

        let rows = match backend {
            SimilarityBackend::Ndarray => {
                let flat: Vec<f32> = rows.iter().flat_map(|row| row.iter().copied()).collect();
                let matrix = dense(rows.len(), dimension, flat)?;
                unit_rows(matrix, Some)?
            }
            SimilarityBackend::Explicit => {
                let mut flat = Vec::with_capacity(rows.len() * dimension);
                for (i, row) in rows.iter().enumerate() {
                    flat.extend(normalize_at(row, Some(i))?);
                }
                dense(rows.len(), dimension, flat)?
            }
        };

        Ok(Self { rows, backend })
    }

    /// Number of candidate rows (N).
    pub fn len(&self) -> usize {
        self.rows.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Shared vector dimension (D); zero for an empty matrix.
    pub fn dimension(&self) -> usize {
        self.rows.ncols()
    }

    pub fn backend(&self) -> SimilarityBackend {
        self.backend
    }

    /// Cosine similarity of every query against every candidate (Q×N).
    ///
    /// Dimensions are checked for all queries before any scoring happens.
    pub fn score_matrix(&self, queries: &[Vec<f32>]) -> RetrievalResult<Vec<Vec<f32>>> {
        if self.is_empty() {
            return Ok(vec![Vec::new(); queries.len()]);
        }

        let dimension = self.dimension();
        if let Some(query) = queries.iter().find(|q| q.len() != dimension) {
            return Err(RetrievalError::DimensionMismatch {
                expected: dimension,
                actual: query.len(),
            });
        }

        match self.backend {
            SimilarityBackend::Ndarray => self.score_ndarray(queries),
            SimilarityBackend::Explicit => self.score_explicit(queries),
        }
    }

    /// Cosine similarity of one query against every candidate (N).
    pub fn scores(&self, query: &[f32]) -> RetrievalResult<Vec<f32>> {
        let mut rows = self.score_matrix(std::slice::from_ref(&query.to_vec()))?;
        Ok(rows.pop().unwrap_or_default())
    }

    fn score_ndarray(&self, queries: &[Vec<f32>]) -> RetrievalResult<Vec<Vec<f32>>> {
        let flat: Vec<f32> = queries.iter().flat_map(|q| q.iter().copied()).collect();
        let queries = unit_rows(dense(queries.len(), self.dimension(), flat)?, |_| None)?;

        let product = queries.dot(&self.rows.t());
        Ok(product
            .outer_iter()
            .map(|row| row.iter().map(|&s| bounded(s)).collect())
            .collect())
    }

    fn score_explicit(&self, queries: &[Vec<f32>]) -> RetrievalResult<Vec<Vec<f32>>> {
        queries
            .iter()
            .map(|query| {
                let unit = normalize(query)?;
                Ok(self
                    .rows
                    .outer_iter()
                    .map(|candidate| bounded(inner_product(&unit, candidate)))
                    .collect())
            })
            .collect()
    }
}

fn dense(rows: usize, cols: usize, flat: Vec<f32>) -> RetrievalResult<Array2<f32>> {
    Array2::from_shape_vec((rows, cols), flat)
        .map_err(|e| RetrievalError::InvalidCandidates(format!("bad matrix shape: {}", e)))
}

/// Divide every row by its L2 norm; `row_of` maps a failing row to its report.
fn unit_rows(
    mut matrix: Array2<f32>,
    row_of: impl Fn(usize) -> Option<usize>,
) -> RetrievalResult<Array2<f32>> {
    let norms = matrix.map_axis(Axis(1), norm_of);
    for (i, &norm) in norms.iter().enumerate() {
        checked_norm(norm, row_of(i))?;
    }
    Zip::from(matrix.rows_mut())
        .and(&norms)
        .for_each(|mut row, &norm| row.mapv_inplace(|x| scale(x, norm)));
    Ok(matrix)
}

fn inner_product(query: &[f32], candidate: ArrayView1<'_, f32>) -> f32 {
    query.iter().zip(candidate.iter()).map(|(a, b)| a * b).sum()
}

/// Clamp rounding overshoot into [-1, 1]; `+ 0.0` folds -0.0 into 0.0 so
/// exact-zero scores tie.
fn bounded(score: f32) -> f32 {
    score.clamp(-1.0, 1.0) + 0.0
}
