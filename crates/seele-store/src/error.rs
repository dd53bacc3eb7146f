use seele_core::ErrorKind;
use thiserror::Error;

/// Errors raised by store operations. No silent partial writes: an `Err`
/// means the statement (or transaction) did not commit.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    /// Uniqueness violation, schema/dimension mismatch, or an invariant
    /// the schema enforces (e.g. empty turn text).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Malformed full-text query (unbalanced quotes/parentheses, operator
    /// at an edge).
    #[error("bad query: {0}")]
    BadQuery(String),

    #[error("store unavailable: {0}")]
    Unavailable(#[from] rusqlite::Error),
}

impl StoreError {
    /// Stable taxonomy kind for logs and tests.
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::NotFound(_) => ErrorKind::NotFound,
            StoreError::Conflict(_) => ErrorKind::Conflict,
            StoreError::BadQuery(_) => ErrorKind::BadQuery,
            StoreError::Unavailable(_) => ErrorKind::StoreUnavailable,
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
