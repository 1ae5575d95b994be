use crate::index::{InvertedIndex, Slot};
use crate::join_key::{JoinKey, KeyedRecord};
use rayon::prelude::*;
use std::collections::HashSet;

/// A left/right record pair sharing at least one token, borrowed from the keyed inputs.
#[derive(Debug, Clone, Copy)]
pub struct CandidatePair<'a, I> {
    pub left_slot: Slot,
    pub right_slot: Slot,
    pub left: &'a KeyedRecord<I>,
    pub right: &'a KeyedRecord<I>,
}

impl<'a, I> CandidatePair<'a, I> {
    pub fn id1(&self) -> &'a I { &self.left.id }
    pub fn id2(&self) -> &'a I { &self.right.id }
    pub fn key1(&self) -> &'a JoinKey { &self.left.key }
    pub fn key2(&self) -> &'a JoinKey { &self.right.key }
}

/// Every (left, right) pair whose join keys share a token, each exactly once.
///
/// The right side is indexed, then each left record probes the index with its own tokens.
/// Work is proportional to the total key sizes plus the number of (pair, shared token)
/// occurrences. Output is grouped by left record in input order, and within one left record
/// ordered by first discovery. Pairs are identified by slot, so duplicate ids never merge.
pub fn generate_candidates<'a, I: Sync>(
    left: &'a [KeyedRecord<I>],
    right: &'a [KeyedRecord<I>],
) -> Vec<CandidatePair<'a, I>> {
    let index = InvertedIndex::build(right);
    probe(&index, left, right)
}

/// Probe a prebuilt index over `right` with every record of `left`.
pub fn probe<'a, I: Sync>(
    index: &InvertedIndex<'_>,
    left: &'a [KeyedRecord<I>],
    right: &'a [KeyedRecord<I>],
) -> Vec<CandidatePair<'a, I>> {
    left.par_iter()
        .enumerate()
        .flat_map_iter(move |(left_slot, l)| {
            let mut seen: HashSet<Slot> = HashSet::new();
            let mut out = Vec::new();
            for token in l.key.iter() {
                for &right_slot in index.postings(token) {
                    if seen.insert(right_slot) {
                        out.push(CandidatePair { left_slot, right_slot, left: l, right: &right[right_slot] });
                    }
                }
            }
            out
        })
        .collect()
}
