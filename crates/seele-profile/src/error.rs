use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProfileError {
    /// A patch operation referenced a path that does not resolve.
    #[error("bad pointer: {0}")]
    BadPointer(String),

    /// Unknown op, missing value, or an op applied to the wrong node kind.
    #[error("bad patch operation: {0}")]
    BadOp(String),

    /// The patched document no longer matches the profile shape.
    #[error("schema validation failed: {0}")]
    Validation(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ProfileError>;
