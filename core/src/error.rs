//! Error types for the similarity join and its evaluation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which input of a join an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => f.write_str("left"),
            Side::Right => f.write_str("right"),
        }
    }
}

/// Errors raised before or while running a join. All are deterministic functions of the input.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum JoinError {
    /// A requested field is not part of the dataset schema or record.
    #[error("unknown field '{field}' on {side} input")]
    InvalidField {
        /// The field name as requested.
        field: String,
        /// Input the field was looked up on.
        side: Side,
    },

    /// Threshold is NaN or outside [0, 1].
    #[error("similarity threshold {0} is outside [0, 1]")]
    InvalidThreshold(f64),

    /// A dedicated worker pool could not be created.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),
}

/// Errors from precision/recall evaluation, where a ratio would be undefined.
#[derive(Debug, Clone, Copy, thiserror::Error, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvalError {
    /// The join produced no pairs, so precision has a zero denominator.
    #[error("no result pairs to evaluate: precision is undefined")]
    NoResults,

    /// The ground truth is empty, so recall has a zero denominator.
    #[error("ground truth is empty: recall is undefined")]
    EmptyGroundTruth,

    /// Result and ground truth share no pair, so precision + recall is zero and the F-measure is undefined.
    #[error("result shares no pair with the ground truth: F-measure is undefined")]
    NoTrueMatches,
}
