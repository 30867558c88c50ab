//! Predictor capability and prediction error types.

use crate::codec::Frame;

/// A trained classifier that scores a row-oriented frame.
///
/// Implementations must be safe to call concurrently; the service shares a
/// single instance across every request for the lifetime of the process.
pub trait Predictor: Send + Sync {
    /// One class index per row.
    fn predict(&self, frame: &Frame) -> Result<Vec<usize>, PredictionError>;

    /// One probability vector per row, ordered like [`crate::LABELS`].
    fn predict_proba(&self, frame: &Frame) -> Result<Vec<Vec<f64>>, PredictionError>;
}

#[derive(Debug, thiserror::Error)]
pub enum PredictionError {
    #[error("Prediction failed: {0}")]
    Failed(String),

    #[error("Column '{0}' is missing from the input")]
    MissingColumn(String),

    #[error("Invalid value in column '{column}' at row {row}: {reason}")]
    InvalidValue {
        column: String,
        row: usize,
        reason: String,
    },

    #[error("Predictor returned {got} {what} for {expected} rows")]
    RowCountMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },

    #[error("Predictor returned unknown class index {class} at row {row}")]
    UnknownClass { row: usize, class: usize },

    #[error("Predictor returned {got} probabilities at row {row}, expected {expected}")]
    ProbabilityWidth {
        row: usize,
        got: usize,
        expected: usize,
    },
}
