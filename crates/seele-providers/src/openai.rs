use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::ProviderError;
use crate::provider::{ChatRequest, ChatResponse, LlmProvider, ToolCall};

/// OpenAI-compatible chat completions client. Works against any endpoint
/// that speaks `/v1/chat/completions` with function calling.
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    provider_name: String,
}

impl OpenAiProvider {
    /// `base_url` should NOT include a trailing slash.
    pub fn new(api_key: String, base_url: Option<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            provider_name: "openai-compatible".into(),
            api_key,
            base_url: base_url.unwrap_or_else(|| "https://api.openai.com".to_string()),
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        &self.provider_name
    }

    async fn send(&self, req: &ChatRequest) -> Result<ChatResponse, ProviderError> {
        let body = build_request_body(req);
        let url = format!("{}/v1/chat/completions", self.base_url);

        debug!(model = %req.model, "sending chat request");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if status == 429 {
            let retry = resp
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(|s| s * 1000)
                .unwrap_or(5000);
            return Err(ProviderError::RateLimited {
                retry_after_ms: retry,
            });
        }

        if !resp.status().is_success() {
            let text = resp.text().await.unwrap_or_default();
            warn!(status, body = %text, "chat API error");
            return Err(ProviderError::Api {
                status,
                message: text,
            });
        }

        let api_resp: ApiResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        Ok(parse_response(api_resp))
    }
}

pub(crate) fn build_request_body(req: &ChatRequest) -> serde_json::Value {
    // raw_messages (tool loop) are already in OpenAI wire format; the simple
    // path converts the structured Message list.
    let mut messages = vec![serde_json::json!({
        "role": "system",
        "content": req.system,
    })];
    if let Some(ref raw) = req.raw_messages {
        messages.extend(raw.iter().cloned());
    } else {
        for m in &req.messages {
            messages.push(serde_json::json!({
                "role": m.role,
                "content": m.content,
            }));
        }
    }

    let mut body = serde_json::json!({
        "model": req.model,
        "messages": messages,
        "max_tokens": req.max_tokens,
    });

    if !req.tools.is_empty() {
        let tools: Vec<serde_json::Value> = req
            .tools
            .iter()
            .map(|t| {
                serde_json::json!({
                    "type": "function",
                    "function": {
                        "name": t.name,
                        "description": t.description,
                        "parameters": t.input_schema,
                    }
                })
            })
            .collect();
        body["tools"] = serde_json::json!(tools);
    }

    body
}

pub(crate) fn parse_response(resp: ApiResponse) -> ChatResponse {
    let choice = resp.choices.into_iter().next();
    let content = choice
        .as_ref()
        .and_then(|c| c.message.content.as_deref())
        .unwrap_or("")
        .to_string();

    let tool_calls: Vec<ToolCall> = choice
        .as_ref()
        .and_then(|c| c.message.tool_calls.as_ref())
        .map(|calls| {
            calls
                .iter()
                .map(|tc| {
                    let input: serde_json::Value =
                        serde_json::from_str(&tc.function.arguments).unwrap_or_default();
                    ToolCall {
                        id: tc.id.clone(),
                        name: tc.function.name.clone(),
                        input,
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    // Canonicalise the finish reason: the tool loop keys on "tool_use".
    let raw_reason = choice.and_then(|c| c.finish_reason).unwrap_or_default();
    let stop_reason = if raw_reason == "tool_calls" {
        "tool_use".to_string()
    } else {
        raw_reason
    };

    ChatResponse {
        content,
        model: resp.model,
        tokens_in: resp.usage.as_ref().map(|u| u.prompt_tokens).unwrap_or(0),
        tokens_out: resp
            .usage
            .as_ref()
            .map(|u| u.completion_tokens)
            .unwrap_or(0),
        stop_reason,
        tool_calls,
    }
}

// API response types — private deserialization targets.

#[derive(Deserialize)]
pub(crate) struct ApiResponse {
    pub(crate) model: String,
    pub(crate) choices: Vec<Choice>,
    pub(crate) usage: Option<Usage>,
}

#[derive(Deserialize)]
pub(crate) struct Choice {
    pub(crate) message: ApiMessage,
    pub(crate) finish_reason: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct ApiMessage {
    pub(crate) content: Option<String>,
    pub(crate) tool_calls: Option<Vec<ApiToolCall>>,
}

#[derive(Deserialize)]
pub(crate) struct ApiToolCall {
    pub(crate) id: String,
    pub(crate) function: ApiFunction,
}

#[derive(Deserialize)]
pub(crate) struct ApiFunction {
    pub(crate) name: String,
    pub(crate) arguments: String,
}

#[derive(Deserialize)]
pub(crate) struct Usage {
    pub(crate) prompt_tokens: u32,
    pub(crate) completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{Message, Role, ToolDefinition};

    fn request() -> ChatRequest {
        ChatRequest {
            model: "test-model".into(),
            system: "persona".into(),
            messages: vec![Message {
                role: Role::User,
                content: "hi".into(),
            }],
            max_tokens: 512,
            tools: vec![ToolDefinition {
                name: "search_memories".into(),
                description: "search".into(),
                input_schema: serde_json::json!({"type": "object"}),
            }],
            raw_messages: None,
        }
    }

    #[test]
    fn body_carries_system_first_and_function_tools() {
        let body = build_request_body(&request());
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hi");
        assert_eq!(body["tools"][0]["type"], "function");
        assert_eq!(body["tools"][0]["function"]["name"], "search_memories");
    }

    #[test]
    fn raw_messages_override_structured_history() {
        let mut req = request();
        req.raw_messages = Some(vec![serde_json::json!({
            "role": "tool", "tool_call_id": "c1", "content": "result"
        })]);
        let body = build_request_body(&req);
        assert_eq!(body["messages"][1]["role"], "tool");
    }

    #[test]
    fn parse_maps_tool_calls_and_canonical_stop_reason() {
        let raw = serde_json::json!({
            "model": "test-model",
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {
                            "name": "scheduled_task",
                            "arguments": "{\"action\":\"list\"}"
                        }
                    }]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 3}
        });
        let parsed: ApiResponse = serde_json::from_value(raw).unwrap();
        let resp = parse_response(parsed);
        assert_eq!(resp.stop_reason, "tool_use");
        assert_eq!(resp.tool_calls.len(), 1);
        assert_eq!(resp.tool_calls[0].name, "scheduled_task");
        assert_eq!(resp.tool_calls[0].input["action"], "list");
        assert_eq!(resp.tokens_in, 10);
    }

    #[test]
    fn parse_plain_text_response() {
        let raw = serde_json::json!({
            "model": "test-model",
            "choices": [{
                "message": {"content": "hello"},
                "finish_reason": "stop"
            }],
            "usage": null
        });
        let parsed: ApiResponse = serde_json::from_value(raw).unwrap();
        let resp = parse_response(parsed);
        assert_eq!(resp.content, "hello");
        assert_eq!(resp.stop_reason, "stop");
        assert!(resp.tool_calls.is_empty());
    }
}
