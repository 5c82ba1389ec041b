//! Error types for kd-tree queries and tree validation.
//!
//! Every failure is local to one call: a failed query never touches the
//! shared tree, so subsequent queries are unaffected.

use thiserror::Error;

/// Errors reported by tree construction, validation and search.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KdError {
    /// A caller supplied argument is out of range (`k == 0`, negative epsilon, empty tree, ...).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// More neighbors were requested than the index holds.
    #[error("Insufficient data: requested {requested} neighbors but only {available} points are indexed")]
    InsufficientData { requested: usize, available: usize },

    /// A point or bounding box does not match the dimension of the index.
    #[error("Dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    /// A tree handed over by an external builder violates a structural invariant.
    #[error("Invalid tree: {0}")]
    InvalidTree(String),
}

impl KdError {
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        KdError::InvalidArgument(msg.into())
    }

    pub fn invalid_tree<S: Into<String>>(msg: S) -> Self {
        KdError::InvalidTree(msg.into())
    }

    pub fn dimension_mismatch(expected: usize, found: usize) -> Self {
        KdError::DimensionMismatch { expected, found }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, KdError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = KdError::InsufficientData { requested: 5, available: 2 };
        assert_eq!(
            err.to_string(),
            "Insufficient data: requested 5 neighbors but only 2 points are indexed"
        );

        let err = KdError::invalid_argument("k must be at least 1");
        assert_eq!(err.to_string(), "Invalid argument: k must be at least 1");

        let err = KdError::dimension_mismatch(4, 3);
        assert_eq!(err.to_string(), "Dimension mismatch: expected 4, found 3");
    }
}
