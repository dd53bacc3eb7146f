use seele_core::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error(transparent)]
    Store(#[from] seele_store::StoreError),

    #[error(transparent)]
    Provider(#[from] seele_providers::ProviderError),
}

impl MemoryError {
    /// Stable taxonomy kind for logs and tests.
    pub fn kind(&self) -> ErrorKind {
        match self {
            MemoryError::Store(e) => e.kind(),
            MemoryError::Provider(e) => e.kind(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MemoryError>;
