// pendula_core/src/error.rs

use thiserror::Error;

/// Every failure an estimator or model can report to its caller.
///
/// A failing `predict` or `update` never mutates the filter belief, so the
/// caller may skip the step and continue with the previous estimate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EstimationError {
    /// Dynamics evaluation produced a non-finite value (e.g. a vanishing
    /// mass-matrix denominator).
    #[error("numerical degeneracy: {0}")]
    NumericalDegeneracy(String),

    /// The innovation covariance `S` could not be inverted safely.
    #[error("singular innovation covariance (condition number {condition:e} exceeds limit {limit:e})")]
    SingularInnovationCovariance { condition: f64, limit: f64 },

    /// A vector or matrix handed across the API boundary has the wrong shape.
    #[error("dimension mismatch for {what}: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        what: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    /// A physical, noise or timing parameter is out of its valid range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

pub type EstimationResult<T> = Result<T, EstimationError>;

impl EstimationError {
    /// Shorthand for a shape check on a runtime-sized input.
    pub(crate) fn check_shape(
        what: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    ) -> EstimationResult<()> {
        if expected == actual {
            Ok(())
        } else {
            Err(EstimationError::DimensionMismatch {
                what,
                expected,
                actual,
            })
        }
    }
}
