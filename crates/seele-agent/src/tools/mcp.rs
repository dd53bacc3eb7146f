//! Adapter presenting an external server's tool as a registry [`Tool`].

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use seele_mcp::{McpClient, ToolInfo};

use super::{Tool, ToolResult};

pub struct McpTool {
    client: Arc<McpClient>,
    info: ToolInfo,
}

impl McpTool {
    pub fn new(client: Arc<McpClient>, info: ToolInfo) -> Self {
        Self { client, info }
    }

    /// Wrap every tool a connected server advertises.
    pub fn all_from(client: &Arc<McpClient>) -> Vec<Box<dyn Tool>> {
        client
            .tools()
            .iter()
            .map(|info| {
                Box::new(McpTool::new(Arc::clone(client), info.clone())) as Box<dyn Tool>
            })
            .collect()
    }
}

#[async_trait]
impl Tool for McpTool {
    fn name(&self) -> &str {
        &self.info.name
    }

    fn description(&self) -> &str {
        &self.info.description
    }

    fn input_schema(&self) -> Value {
        self.info.input_schema.clone()
    }

    async fn execute(&self, input: Value) -> ToolResult {
        match self.client.call_tool(&self.info.name, input).await {
            Ok(text) => ToolResult::success(text),
            Err(e) => {
                warn!(
                    server = %self.client.server_name(),
                    tool = %self.info.name,
                    kind = %e.kind(),
                    error = %e,
                    "external tool failed"
                );
                ToolResult::error(format!("{}: {e}", e.kind()))
            }
        }
    }
}
