use crate::candidates::CandidatePair;
use crate::index::Slot;
use crate::join_key::JoinKey;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// A verified match: the candidate's ids and keys plus its Jaccard similarity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultPair<I> {
    pub id1: I,
    pub id2: I,
    pub join_key1: JoinKey,
    pub join_key2: JoinKey,
    pub jaccard: f64,
    #[serde(skip)]
    pub(crate) slots: (Slot, Slot),
}

/// `|A ∩ B| / |A ∪ B|`, with two empty keys defined as 0.0.
pub fn jaccard(a: &JoinKey, b: &JoinKey) -> f64 {
    let inter = a.intersection_len(b);
    let union = a.len() + b.len() - inter;
    if union == 0 {
        return 0.0;
    }
    inter as f64 / union as f64
}

/// Keep candidates whose similarity is at least `threshold` (inclusive). Input order is kept.
pub fn verify<I: Clone + Send + Sync>(candidates: &[CandidatePair<'_, I>], threshold: f64) -> Vec<ResultPair<I>> {
    candidates
        .par_iter()
        .filter_map(|c| {
            let score = jaccard(c.key1(), c.key2());
            if score >= threshold {
                Some(ResultPair {
                    id1: c.id1().clone(),
                    id2: c.id2().clone(),
                    join_key1: c.key1().clone(),
                    join_key2: c.key2().clone(),
                    jaccard: score,
                    slots: (c.left_slot, c.right_slot),
                })
            } else {
                None
            }
        })
        .collect()
}
