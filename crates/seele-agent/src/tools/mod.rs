//! Tool system for the agent's tool-calling loop.
//!
//! Every tool — in-process or external — satisfies the same capability:
//! metadata plus `execute(args) → result`. The registry is rebuilt per
//! turn through [`build::build_tools`], which applies the invocation
//! filter (recursion prevention).

pub mod build;
pub mod mcp;
pub mod memory_search;
pub mod task;
pub mod tool_loop;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use seele_providers::ToolDefinition;

/// Why the registry is being assembled. Scheduled turns must not schedule
/// further tasks; summarisation must not query memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invocation {
    UserTurn,
    Scheduled,
    Summarize,
}

/// Result of executing a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Text content returned to the LLM.
    pub content: String,
    /// Whether the tool execution failed.
    pub is_error: bool,
}

impl ToolResult {
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: message.into(),
            is_error: true,
        }
    }
}

/// Trait that all tools must implement.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name for this tool (e.g. "search_memories").
    fn name(&self) -> &str;
    /// Human-readable description of what this tool does.
    fn description(&self) -> &str;
    /// JSON Schema for the tool's input parameters.
    fn input_schema(&self) -> serde_json::Value;
    /// Execute the tool with the given input.
    async fn execute(&self, input: serde_json::Value) -> ToolResult;
}

/// Convert a slice of tools to API-level tool definitions.
pub fn to_definitions(tools: &[Box<dyn Tool>]) -> Vec<ToolDefinition> {
    tools
        .iter()
        .map(|t| ToolDefinition {
            name: t.name().to_string(),
            description: t.description().to_string(),
            input_schema: t.input_schema(),
        })
        .collect()
}
