use seele_core::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum McpError {
    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("request timed out")]
    Timeout,

    /// The server executed the tool and reported a failure. Surfaced to
    /// the LLM as a tool-error result; the turn continues.
    #[error("tool failed: {0}")]
    Tool(String),
}

impl From<reqwest::Error> for McpError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            McpError::Timeout
        } else {
            McpError::Http(e)
        }
    }
}

impl McpError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            McpError::Config(_) => ErrorKind::BadArgument,
            McpError::Timeout => ErrorKind::Timeout,
            _ => ErrorKind::UpstreamFailure,
        }
    }
}

pub type Result<T> = std::result::Result<T, McpError>;
