use crate::error::EvalError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::hash::Hash;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Pairs present in both the result and the ground truth.
    pub true_matches: usize,
    pub precision: f64,
    pub recall: f64,
    pub f_measure: f64,
}

/// Precision, recall and F-measure of `result` against `ground_truth`.
///
/// Both sides are compared as sets of `(id1, id2)`, so repeated pairs count once. An empty
/// side, or no pair in common, makes a ratio undefined and is reported as an error.
pub fn evaluate<I, R, G>(result: R, ground_truth: G) -> Result<Evaluation, EvalError>
where
    I: Eq + Hash,
    R: IntoIterator<Item = (I, I)>,
    G: IntoIterator<Item = (I, I)>,
{
    let result: HashSet<(I, I)> = result.into_iter().collect();
    let truth: HashSet<(I, I)> = ground_truth.into_iter().collect();
    if result.is_empty() {
        return Err(EvalError::NoResults);
    }
    if truth.is_empty() {
        return Err(EvalError::EmptyGroundTruth);
    }

    let t = result.intersection(&truth).count();
    if t == 0 {
        return Err(EvalError::NoTrueMatches);
    }
    let precision = t as f64 / result.len() as f64;
    let recall = t as f64 / truth.len() as f64;
    let f_measure = 2.0 * precision * recall / (precision + recall);
    tracing::debug!(true_matches = t, precision, recall, f_measure, "evaluated result");
    Ok(Evaluation { true_matches: t, precision, recall, f_measure })
}
