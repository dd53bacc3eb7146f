//! Tool execution loop — the agentic core.
//!
//! Flow: prompt → LLM → if tool calls → execute → inject results → LLM →
//! repeat. Stops when the model answers with plain text or the iteration
//! bound is hit. Intermediate tool traffic lives only in the loop's
//! message list; it is never persisted as turns.

use tracing::{debug, info, warn};

use seele_providers::{ChatRequest, ChatResponse, LlmProvider, ProviderError, ToolCall};

use super::{Tool, ToolResult};

/// Assistant text returned when the iteration bound is exceeded.
pub const MAX_ITERATIONS_MESSAGE: &str =
    "I hit the maximum number of tool iterations for this turn. \
     Let's continue without the remaining tool calls.";

/// Run the full tool loop. `max_iterations` bounds the number of LLM calls
/// per turn; on overrun the loop returns a final response carrying
/// [`MAX_ITERATIONS_MESSAGE`].
///
/// Returns the final response plus the names of every executed tool.
pub async fn run_tool_loop(
    provider: &dyn LlmProvider,
    initial_request: ChatRequest,
    tools: &[Box<dyn Tool>],
    max_iterations: usize,
) -> Result<(ChatResponse, Vec<String>), ProviderError> {
    let mut raw_messages: Vec<serde_json::Value> =
        if let Some(ref raw) = initial_request.raw_messages {
            raw.clone()
        } else {
            initial_request
                .messages
                .iter()
                .map(|m| serde_json::json!({ "role": m.role, "content": m.content }))
                .collect()
        };

    let mut called_tools: Vec<String> = Vec::new();

    for iteration in 0..max_iterations {
        let mut req = initial_request.clone();
        req.raw_messages = Some(raw_messages.clone());

        debug!(iteration, "tool loop iteration");

        let response = provider.send(&req).await?;

        if response.tool_calls.is_empty() || response.stop_reason != "tool_use" {
            info!(iteration, "tool loop complete");
            return Ok((response, called_tools));
        }

        // Echo the assistant turn, then append one tool-role message per
        // executed call.
        raw_messages.push(assistant_message(&response));
        for call in &response.tool_calls {
            called_tools.push(call.name.clone());
            let result = execute_tool(tools, call).await;
            raw_messages.push(serde_json::json!({
                "role": "tool",
                "tool_call_id": call.id,
                "content": render_result(&result),
            }));
        }
    }

    warn!(max_iterations, "tool loop hit the iteration bound");
    Ok((
        ChatResponse {
            content: MAX_ITERATIONS_MESSAGE.to_string(),
            model: initial_request.model,
            tokens_in: 0,
            tokens_out: 0,
            stop_reason: "max_tool_iterations".to_string(),
            tool_calls: Vec::new(),
        },
        called_tools,
    ))
}

fn assistant_message(response: &ChatResponse) -> serde_json::Value {
    let tool_calls: Vec<serde_json::Value> = response
        .tool_calls
        .iter()
        .map(|call| {
            serde_json::json!({
                "id": call.id,
                "type": "function",
                "function": {
                    "name": call.name,
                    "arguments": call.input.to_string(),
                }
            })
        })
        .collect();
    let content = if response.content.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::Value::String(response.content.clone())
    };
    serde_json::json!({
        "role": "assistant",
        "content": content,
        "tool_calls": tool_calls,
    })
}

fn render_result(result: &ToolResult) -> String {
    if result.is_error {
        format!("ERROR: {}", result.content)
    } else {
        result.content.clone()
    }
}

/// Find and execute the named tool. An unknown name — including a tool
/// hidden by the invocation filter — comes back as a policy error for the
/// LLM to read; the loop continues.
async fn execute_tool(tools: &[Box<dyn Tool>], call: &ToolCall) -> ToolResult {
    match tools.iter().find(|t| t.name() == call.name) {
        Some(tool) => {
            debug!(tool = %call.name, "executing tool");
            tool.execute(call.input.clone()).await
        }
        None => ToolResult::error(format!(
            "POLICY_VIOLATION: tool '{}' is not available in this context",
            call.name
        )),
    }
}
