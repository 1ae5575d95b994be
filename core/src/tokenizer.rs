use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    // Maximal runs of Unicode word characters (letters, marks, digits, connector punctuation).
    // Matching the runs is the same as splitting on runs of non-word characters and dropping empties.
    static ref WORD_RE: Regex = Regex::new(r"\w+").expect("valid regex");
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenizerOptions {
    /// Apply NFKC normalization before splitting, so compatibility forms ("ﬁ", full-width digits) fold together.
    #[serde(default)]
    pub nfkc: bool,
}

/// Split text into lower-cased word tokens, in order of first appearance, duplicates kept.
///
/// Word characters follow the Unicode `\w` table of the `regex` crate, which is fixed and
/// locale-independent. Empty or all-punctuation input yields no tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    tokenize_with(text, TokenizerOptions::default())
}

pub fn tokenize_with(text: &str, options: TokenizerOptions) -> Vec<String> {
    if options.nfkc {
        let normalized = text.nfkc().collect::<String>();
        split_lower(&normalized)
    } else {
        split_lower(text)
    }
}

fn split_lower(text: &str) -> Vec<String> {
    WORD_RE
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}
