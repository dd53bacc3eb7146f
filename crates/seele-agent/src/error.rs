use seele_core::ErrorKind;
use seele_profile::ProfileError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Store(#[from] seele_store::StoreError),

    #[error(transparent)]
    Provider(#[from] seele_providers::ProviderError),

    #[error(transparent)]
    Profile(#[from] ProfileError),

    #[error(transparent)]
    Scheduler(#[from] seele_scheduler::SchedulerError),

    /// The model's reply did not match the expected strict shape.
    #[error("malformed model reply: {0}")]
    MalformedReply(String),
}

impl From<seele_memory::MemoryError> for AgentError {
    fn from(e: seele_memory::MemoryError) -> Self {
        match e {
            seele_memory::MemoryError::Store(e) => AgentError::Store(e),
            seele_memory::MemoryError::Provider(e) => AgentError::Provider(e),
        }
    }
}

impl AgentError {
    /// Stable taxonomy kind for logs and tests.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AgentError::Store(e) => e.kind(),
            AgentError::Provider(e) => e.kind(),
            // A patch that doesn't apply is bad input; a failed disk write
            // or rename is a storage failure.
            AgentError::Profile(
                ProfileError::Io(_) | ProfileError::Serialization(_),
            ) => ErrorKind::StoreUnavailable,
            AgentError::Profile(_) => ErrorKind::BadArgument,
            AgentError::Scheduler(e) => e.kind(),
            AgentError::MalformedReply(_) => ErrorKind::UpstreamFailure,
        }
    }
}

pub type Result<T> = std::result::Result<T, AgentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_kinds_separate_bad_input_from_storage_failure() {
        let bad_patch = AgentError::Profile(ProfileError::BadOp("move".into()));
        assert_eq!(bad_patch.kind(), ErrorKind::BadArgument);

        let bad_pointer = AgentError::Profile(ProfileError::BadPointer("/nope".into()));
        assert_eq!(bad_pointer.kind(), ErrorKind::BadArgument);

        let invalid = AgentError::Profile(ProfileError::Validation("shape".into()));
        assert_eq!(invalid.kind(), ErrorKind::BadArgument);

        let disk = AgentError::Profile(ProfileError::Io(std::io::Error::other("disk full")));
        assert_eq!(disk.kind(), ErrorKind::StoreUnavailable);
    }
}
