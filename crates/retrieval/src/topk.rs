//! Top-k selection over a score vector.
//!
//! Ranking order is score descending, then candidate index ascending. For
//! `k < n` the top k are first isolated with a linear-time partition
//! (`select_nth_unstable_by`) and only those k are sorted; the lower
//! `n - k` entries are never ordered. Because the comparator already
//! includes the index, ties straddling the partition boundary resolve to the
//! lower index and the result is identical to a stable full sort.

use std::cmp::Ordering;
use std::fmt;

use crate::error::{RetrievalError, RetrievalResult};

/// A validated, non-negative match count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TopK(usize);

impl TopK {
    /// Three matches per query unless the caller asks otherwise.
    pub const DEFAULT: TopK = TopK(3);

    /// Validate a caller-supplied count; negative values are rejected.
    pub fn new(k: i64) -> RetrievalResult<Self> {
        usize::try_from(k)
            .map(TopK)
            .map_err(|_| RetrievalError::InvalidTopK(k))
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for TopK {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<usize> for TopK {
    fn from(k: usize) -> Self {
        TopK(k)
    }
}

impl TryFrom<i64> for TopK {
    type Error = RetrievalError;

    fn try_from(k: i64) -> Result<Self, Self::Error> {
        TopK::new(k)
    }
}

impl fmt::Display for TopK {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Indices of the `k` best scores, best first.
///
/// Returns `min(k, scores.len())` indices.
pub fn select_top_k(scores: &[f32], k: TopK) -> Vec<usize> {
    let n = scores.len();
    let k = k.get().min(n);
    if k == 0 {
        return Vec::new();
    }

    let by_rank = |a: &usize, b: &usize| rank_order(scores, *a, *b);
    let mut indices: Vec<usize> = (0..n).collect();

    if k < n {
        indices.select_nth_unstable_by(k - 1, by_rank);
        indices.truncate(k);
    }
    indices.sort_by(by_rank);
    indices
}

fn rank_order(scores: &[f32], a: usize, b: usize) -> Ordering {
    scores[b].total_cmp(&scores[a]).then_with(|| a.cmp(&b))
}
