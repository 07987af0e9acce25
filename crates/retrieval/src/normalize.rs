//! Unit-length normalization of embedding vectors.

use crate::error::{RetrievalError, RetrievalResult};

/// Euclidean (L2) norm of a vector.
///
/// Squares are summed in f64, which holds the square of every finite f32
/// without overflowing or flushing to zero.
pub fn l2_norm(vector: &[f32]) -> f64 {
    norm_of(vector)
}

pub(crate) fn norm_of<'a>(components: impl IntoIterator<Item = &'a f32>) -> f64 {
    components
        .into_iter()
        .map(|&x| f64::from(x) * f64::from(x))
        .sum::<f64>()
        .sqrt()
}

/// Check that `norm` can divide a vector; `row` tags the failure.
pub(crate) fn checked_norm(norm: f64, row: Option<usize>) -> RetrievalResult<f64> {
    if norm == 0.0 {
        return Err(RetrievalError::DegenerateVector { row });
    }
    if !norm.is_finite() {
        return Err(RetrievalError::NonFiniteVector { row });
    }
    Ok(norm)
}

/// Divide one component by a norm from [`checked_norm`].
pub(crate) fn scale(x: f32, norm: f64) -> f32 {
    (f64::from(x) / norm) as f32
}

/// Scale a query vector to unit length, preserving its direction.
///
/// Fails with [`RetrievalError::DegenerateVector`] when the norm is zero
/// instead of letting NaN leak into the similarity scores, and with
/// [`RetrievalError::NonFiniteVector`] when a component is NaN or infinite.
pub fn normalize(vector: &[f32]) -> RetrievalResult<Vec<f32>> {
    normalize_at(vector, None)
}

/// Same as [`normalize`], tagging a failure with the candidate row.
pub(crate) fn normalize_at(vector: &[f32], row: Option<usize>) -> RetrievalResult<Vec<f32>> {
    let norm = checked_norm(l2_norm(vector), row)?;
    Ok(vector.iter().map(|&x| scale(x, norm)).collect())
}
