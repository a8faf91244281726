//! Error types for cut generation.

use thiserror::Error;

/// Errors that can occur while building or emitting constraints.
///
/// Overflow inside a cut derivation is not an error: the helpers give up on
/// the candidate and return `false`. This type covers the narrow boundary
/// where caller-provided data is validated or a finished cut is converted
/// back to a 64-bit row.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CutError {
    /// Coefficient, bound or activity outside the 64-bit safe range
    #[error("Constraint exceeds 64-bit activity limits")]
    Overflow,

    /// Structural validation failed
    #[error("Invalid constraint: {0}")]
    InvalidConstraint(String),
}

/// Result type for constraint-building operations.
pub type CutResult<T> = Result<T, CutError>;
