//! Engine error taxonomy.
//!
//! Every error is raised synchronously at the point of detection. Malformed
//! input is a caller bug, so nothing here is retried. An empty-but-valid result
//! (a direction with zero completed trades) is a success, not an error.

use thiserror::Error;

/// Errors produced by the core engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Malformed bar data: empty sequence, non-finite values, unordered timestamps.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Length mismatch between parallel series, or too few bars to run.
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// Bad caller-supplied parameter: non-positive span, negative slippage, etc.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl CoreError {
    pub(crate) fn length_mismatch(what: &str, expected: usize, actual: usize) -> Self {
        CoreError::InsufficientData(format!(
            "{what} has length {actual}, expected {expected}"
        ))
    }
}

/// Check that every value in a series is finite.
pub(crate) fn ensure_finite(series: &[f64], what: &str) -> Result<(), CoreError> {
    match series.iter().position(|v| !v.is_finite()) {
        Some(i) => Err(CoreError::InvalidInput(format!(
            "{what} has non-finite value {} at index {i}",
            series[i]
        ))),
        None => Ok(()),
    }
}
