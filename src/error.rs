//! Error types for tensorgrad

use thiserror::Error;

/// Result type for tensor and graph operations
pub type TensorResult<T> = Result<T, TensorError>;

/// Error types for tensor and graph operations
#[derive(Debug, Error)]
pub enum TensorError {
    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Invalid dimension: {dim}")]
    InvalidDimension { dim: usize },

    #[error("Shape not resolved: {0}")]
    ShapeNotResolved(String),

    #[error("No {format} op name found for {op}")]
    NameNotFound {
        op: &'static str,
        format: &'static str,
    },

    #[error("Invalid tensor operation: {0}")]
    InvalidOperation(String),
}
