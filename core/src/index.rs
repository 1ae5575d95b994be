use crate::join_key::KeyedRecord;
use std::collections::HashMap;

/// Position of a record inside the slice an index was built from.
pub type Slot = usize;

/// Token -> postings over one side of a join.
///
/// Built once per join from a slice of keyed records, then only read. Tokens borrow from the
/// records, so the index never outlives them. Postings are in ascending slot order and each slot
/// appears at most once per token, since join keys are sets.
#[derive(Debug, Default)]
pub struct InvertedIndex<'a> {
    postings: HashMap<&'a str, Vec<Slot>>,
}

impl<'a> InvertedIndex<'a> {
    pub fn build<I>(records: &'a [KeyedRecord<I>]) -> Self {
        let mut postings: HashMap<&'a str, Vec<Slot>> = HashMap::new();
        for (slot, rec) in records.iter().enumerate() {
            for token in rec.key.iter() {
                postings.entry(token).or_default().push(slot);
            }
        }
        let index = Self { postings };
        tracing::debug!(
            num_docs = records.len(),
            num_terms = index.num_terms(),
            num_postings = index.num_postings(),
            "built inverted index"
        );
        index
    }

    /// Slots whose join key contains `token`; empty if none.
    pub fn postings(&self, token: &str) -> &[Slot] {
        self.postings.get(token).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn num_terms(&self) -> usize { self.postings.len() }

    /// Total number of (token, record) entries.
    pub fn num_postings(&self) -> usize { self.postings.values().map(Vec::len).sum() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::join_key::JoinKey;

    fn rec(id: u32, tokens: &[&str]) -> KeyedRecord<u32> {
        KeyedRecord::new(id, tokens.iter().copied().collect::<JoinKey>())
    }

    #[test]
    fn postings_follow_record_order() {
        let recs = vec![rec(10, &["a", "b"]), rec(11, &["b"]), rec(12, &[]), rec(13, &["b", "c"])];
        let idx = InvertedIndex::build(&recs);
        assert_eq!(idx.postings("b"), &[0, 1, 3]);
        assert_eq!(idx.postings("a"), &[0]);
        assert!(idx.postings("zzz").is_empty());
        assert_eq!(idx.num_terms(), 3);
        assert_eq!(idx.num_postings(), 5);
    }
}
