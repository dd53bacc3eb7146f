//! Shared context interface for the agent pipelines.
//!
//! Implemented by the binary's `App` and by test fixtures. Defined here to
//! avoid a dependency cycle: the transport crates depend on `seele-agent`,
//! which depends only on the subsystem crates.

use std::sync::Arc;

use seele_core::Config;
use seele_memory::{ContextWindow, Retriever};
use seele_mcp::McpClient;
use seele_profile::ProfileStore;
use seele_providers::{Embedder, LlmProvider};
use seele_store::Store;

use crate::prompt::PromptAssembler;

/// The startup-initialised, per-process resources, threaded into handlers
/// instead of living in globals.
pub trait BotContext: Send + Sync {
    fn config(&self) -> &Config;
    fn store(&self) -> &Arc<Store>;
    fn window(&self) -> &ContextWindow;
    fn retriever(&self) -> &Retriever;
    fn profile(&self) -> &ProfileStore;
    fn assembler(&self) -> &PromptAssembler;
    fn chat(&self) -> &dyn LlmProvider;
    fn embedder(&self) -> &Arc<dyn Embedder>;

    /// Serialises turn processing: user turns and scheduler firings take
    /// this lock for their whole duration and never interleave.
    fn turn_lock(&self) -> &tokio::sync::Mutex<()>;

    /// Connected external tool servers. Empty when MCP is disabled.
    fn mcp_clients(&self) -> &[Arc<McpClient>] {
        &[]
    }
}
