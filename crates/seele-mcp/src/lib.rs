//! `seele-mcp` — clients for external tool servers.
//!
//! Servers are declared in a JSON config file: either a child process
//! spoken to over line-delimited JSON-RPC 2.0 on stdio, or an HTTP
//! endpoint (plain JSON or SSE responses). `${NAME}` in config strings is
//! substituted from the environment. Tool schemas are fetched once on
//! connect and cached; calls forward arguments and return the textual
//! result for the LLM.

pub mod client;
pub mod config;
pub mod error;

pub use client::{McpClient, ToolInfo};
pub use config::{McpConfig, ServerConfig};
pub use error::{McpError, Result};
