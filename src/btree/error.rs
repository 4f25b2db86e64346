use thiserror::Error;

use crate::book::Isbn;

/// Errors that can occur during B-tree operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BTreeError {
    #[error("Duplicate key: {0}")]
    DuplicateKey(Isbn),

    #[error("Key not found: {0}")]
    NotFound(Isbn),

    /// Structural bug: the tree reached a state its algorithms never produce
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Invalid minimum degree: {0} (must be >= 2 and at most usize::MAX / 2)")]
    InvalidDegree(usize),
}

pub type BTreeResult<T> = Result<T, BTreeError>;
