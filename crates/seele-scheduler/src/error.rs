use seele_core::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Unparsable trigger specification or other invalid caller input.
    #[error("bad argument: {0}")]
    BadArgument(String),

    #[error(transparent)]
    Store(#[from] seele_store::StoreError),

    #[error("seed file error: {0}")]
    Seed(String),
}

impl SchedulerError {
    /// Stable taxonomy kind for logs and tests.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SchedulerError::BadArgument(_) => ErrorKind::BadArgument,
            SchedulerError::Store(e) => e.kind(),
            SchedulerError::Seed(_) => ErrorKind::BadArgument,
        }
    }
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
