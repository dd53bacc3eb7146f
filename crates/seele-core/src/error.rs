use thiserror::Error;

/// Stable error taxonomy shared by every subsystem.
///
/// Logged alongside each failure so tests (and operators) can assert on
/// the kind rather than on message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BadArgument,
    BadQuery,
    NotFound,
    Conflict,
    StoreUnavailable,
    Timeout,
    UpstreamFailure,
    PolicyViolation,
}

impl ErrorKind {
    /// Stable taxonomy key.
    pub fn key(&self) -> &'static str {
        match self {
            ErrorKind::BadArgument => "BAD_ARGUMENT",
            ErrorKind::BadQuery => "BAD_QUERY",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Conflict => "CONFLICT",
            ErrorKind::StoreUnavailable => "STORE_UNAVAILABLE",
            ErrorKind::Timeout => "TIMEOUT",
            ErrorKind::UpstreamFailure => "UPSTREAM_FAILURE",
            ErrorKind::PolicyViolation => "POLICY_VIOLATION",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Top-level errors raised by the core crate itself.
#[derive(Debug, Error)]
pub enum SeeleError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SeeleError>;
