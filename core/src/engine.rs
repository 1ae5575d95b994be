use crate::candidates::probe;
use crate::error::JoinError;
use crate::index::InvertedIndex;
use crate::join_key::{JoinKeyBuilder, KeyedRecord};
use crate::record::{Dataset, RecordId};
use crate::tokenizer::TokenizerOptions;
use crate::verify::{verify, ResultPair};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinConfig {
    /// Fields concatenated, in order, into each left record's join key.
    pub left_fields: Vec<String>,
    pub right_fields: Vec<String>,
    /// Minimum Jaccard similarity kept, inclusive. Closer to 1.0 is stricter; 0.0 keeps every
    /// pair sharing a token.
    pub threshold: f64,
    /// Worker count for a dedicated pool; `None` runs on the global rayon pool.
    #[serde(default)]
    pub threads: Option<usize>,
    #[serde(default)]
    pub tokenizer: TokenizerOptions,
}

impl JoinConfig {
    pub fn new<S: AsRef<str>>(left_fields: &[S], right_fields: &[S], threshold: f64) -> Self {
        Self {
            left_fields: left_fields.iter().map(|s| s.as_ref().to_string()).collect(),
            right_fields: right_fields.iter().map(|s| s.as_ref().to_string()).collect(),
            threshold,
            threads: None,
            tokenizer: TokenizerOptions::default(),
        }
    }

    pub fn validate_threshold(&self) -> Result<(), JoinError> {
        if (0.0..=1.0).contains(&self.threshold) {
            Ok(())
        } else {
            Err(JoinError::InvalidThreshold(self.threshold))
        }
    }
}

/// Stage sizes of one join run. Diagnostics only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinStats {
    pub left_records: usize,
    pub right_records: usize,
    /// Pairs a naive all-pairs comparison would have evaluated.
    pub cross_product: u64,
    pub index_terms: usize,
    /// (token, record) entries in the right-side index.
    #[serde(default)]
    pub index_postings: usize,
    pub candidates: usize,
    pub matches: usize,
}

#[derive(Debug, Clone)]
pub struct JoinOutput<I> {
    /// Sorted by `(id1, id2)`, ties broken by record position.
    pub pairs: Vec<ResultPair<I>>,
    pub stats: JoinStats,
}

impl<I: Clone> JoinOutput<I> {
    /// Just the id pairs, in output order.
    pub fn id_pairs(&self) -> Vec<(I, I)> {
        self.pairs.iter().map(|p| (p.id1.clone(), p.id2.clone())).collect()
    }
}

/// Stateless similarity-join driver: keys both inputs, filters through an inverted index and
/// verifies exact Jaccard similarity. Nothing is cached between calls.
#[derive(Debug, Clone)]
pub struct SimilarityJoin {
    config: JoinConfig,
}

impl SimilarityJoin {
    /// Rejects a bad threshold before any data is seen.
    pub fn new(config: JoinConfig) -> Result<Self, JoinError> {
        config.validate_threshold()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &JoinConfig { &self.config }

    /// Join `left` against `right`. An empty input is a valid join with no matches.
    pub fn run<I: RecordId>(&self, left: &Dataset<I>, right: &Dataset<I>) -> Result<JoinOutput<I>, JoinError> {
        left.require_fields(&self.config.left_fields)?;
        right.require_fields(&self.config.right_fields)?;

        match self.config.threads {
            Some(n) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| JoinError::ThreadPool(e.to_string()))?;
                pool.install(|| self.run_in_pool(left, right))
            }
            None => self.run_in_pool(left, right),
        }
    }

    fn run_in_pool<I: RecordId>(&self, left: &Dataset<I>, right: &Dataset<I>) -> Result<JoinOutput<I>, JoinError> {
        let left_builder = JoinKeyBuilder::new(left.side(), &self.config.left_fields).with_tokenizer(self.config.tokenizer);
        let right_builder = JoinKeyBuilder::new(right.side(), &self.config.right_fields).with_tokenizer(self.config.tokenizer);
        let left_keyed = preprocess(left, &left_builder)?;
        let right_keyed = preprocess(right, &right_builder)?;

        let cross_product = (left.len() as u64).saturating_mul(right.len() as u64);
        tracing::info!(cross_product, "before filtering");

        let index = InvertedIndex::build(&right_keyed);
        let candidates = probe(&index, &left_keyed, &right_keyed);
        tracing::info!(candidates = candidates.len(), "after filtering");

        let mut pairs = verify(&candidates, self.config.threshold);
        pairs.sort_by(|a, b| (&a.id1, &a.id2, a.slots).cmp(&(&b.id1, &b.id2, b.slots)));
        tracing::info!(matches = pairs.len(), threshold = self.config.threshold, "after verification");

        let stats = JoinStats {
            left_records: left.len(),
            right_records: right.len(),
            cross_product,
            index_terms: index.num_terms(),
            index_postings: index.num_postings(),
            candidates: candidates.len(),
            matches: pairs.len(),
        };
        Ok(JoinOutput { pairs, stats })
    }
}

/// Key every record of a dataset in parallel; any bad field aborts the whole batch.
pub fn preprocess<I: RecordId>(dataset: &Dataset<I>, builder: &JoinKeyBuilder) -> Result<Vec<KeyedRecord<I>>, JoinError> {
    dataset.records().par_iter().map(|r| builder.keyed(r)).collect()
}

/// One-shot convenience over [`SimilarityJoin`].
pub fn similarity_join<I: RecordId>(
    left: &Dataset<I>,
    right: &Dataset<I>,
    config: JoinConfig,
) -> Result<JoinOutput<I>, JoinError> {
    SimilarityJoin::new(config)?.run(left, right)
}
