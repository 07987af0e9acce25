//! Binding selected indices back to candidate identity.

use serde::{Deserialize, Serialize};

/// One ranked candidate.
///
/// Owns its label; nothing points back into the candidate collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord<L> {
    /// Zero-based position in the original collection
    pub index: usize,

    /// Caller-defined identity, when the collection carried labels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<L>,

    /// Cosine similarity in [-1, 1]
    pub score: f32,
}

/// Build match records in the order of `indices`.
pub fn assemble_matches<L: Clone>(
    indices: &[usize],
    scores: &[f32],
    labels: Option<&[L]>,
) -> Vec<MatchRecord<L>> {
    indices
        .iter()
        .map(|&index| MatchRecord {
            index,
            label: labels.map(|labels| labels[index].clone()),
            score: scores[index],
        })
        .collect()
}
