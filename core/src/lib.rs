//! Token-overlap similarity join for record matching.
//!
//! Two datasets are keyed by tokenizing selected fields into sets, candidate pairs are found
//! through an inverted index over the right side (pairs sharing no token are never compared),
//! and candidates are kept when their exact Jaccard similarity reaches a threshold.
//!
//! ```
//! use simjoin_core::{similarity_join, Dataset, JoinConfig, Record, Side};
//!
//! let mut left = Dataset::new(Side::Left, ["title", "manufacturer"]);
//! left.push(Record::new(1).with("title", Some("Widget Pro")).with("manufacturer", Some("Acme"))).unwrap();
//! let mut right = Dataset::new(Side::Right, ["name", "manufacturer"]);
//! right.push(Record::new(9).with("name", Some("widget pro")).with("manufacturer", Some("ACME"))).unwrap();
//!
//! let cfg = JoinConfig::new(&["title", "manufacturer"], &["name", "manufacturer"], 0.5);
//! let out = similarity_join(&left, &right, cfg).unwrap();
//! assert_eq!(out.id_pairs(), vec![(1, 9)]);
//! ```

pub mod candidates;
pub mod engine;
pub mod error;
pub mod eval;
pub mod index;
pub mod join_key;
pub mod persist;
pub mod record;
pub mod tokenizer;
pub mod verify;

pub use candidates::{generate_candidates, CandidatePair};
pub use engine::{similarity_join, JoinConfig, JoinOutput, JoinStats, SimilarityJoin};
pub use error::{EvalError, JoinError, Side};
pub use eval::{evaluate, Evaluation};
pub use index::InvertedIndex;
pub use join_key::{JoinKey, JoinKeyBuilder, KeyedRecord};
pub use record::{Dataset, Record, RecordId};
pub use tokenizer::{tokenize, tokenize_with, TokenizerOptions};
pub use verify::{jaccard, verify, ResultPair};
