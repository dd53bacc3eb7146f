//! JSON-RPC 2.0 clients for tool servers.
//!
//! Lifecycle per server: `initialize` → `notifications/initialized` →
//! `tools/list` (cached) → any number of `tools/call`. Stdio servers
//! speak one JSON object per line; HTTP servers answer a POST with either
//! a JSON body or an SSE stream whose `data:` lines carry the response.

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::{HttpServerConfig, ServerConfig, StdioServerConfig};
use crate::error::{McpError, Result};

const PROTOCOL_VERSION: &str = "2025-06-18";
const CLIENT_NAME: &str = "seele";

/// A tool schema advertised by a server, cached at connect time.
#[derive(Debug, Clone)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Connected client for one tool server.
pub struct McpClient {
    server_name: String,
    transport: Transport,
    tools: Vec<ToolInfo>,
    next_id: AtomicI64,
    timeout: Duration,
}

enum Transport {
    Stdio {
        _child: Child,
        stdin: Mutex<ChildStdin>,
        stdout: Mutex<BufReader<ChildStdout>>,
    },
    Http {
        client: reqwest::Client,
        config: HttpServerConfig,
    },
}

impl McpClient {
    /// Spawn/connect the server, run the initialize handshake and cache its
    /// tool list.
    pub async fn connect(config: &ServerConfig, timeout: Duration) -> Result<Self> {
        let transport = match config {
            ServerConfig::Stdio(c) => spawn_stdio(c).await?,
            ServerConfig::Http(c) => Transport::Http {
                client: reqwest::Client::builder()
                    .timeout(timeout)
                    .build()
                    .unwrap_or_default(),
                config: c.clone(),
            },
        };

        let mut client = Self {
            server_name: config.name().to_string(),
            transport,
            tools: Vec::new(),
            next_id: AtomicI64::new(1),
            timeout,
        };

        client
            .request(
                "initialize",
                json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": {},
                    "clientInfo": {
                        "name": CLIENT_NAME,
                        "version": env!("CARGO_PKG_VERSION"),
                    }
                }),
            )
            .await?;
        client.notify("notifications/initialized").await?;

        let listed = client.request("tools/list", json!({})).await?;
        client.tools = parse_tool_list(&listed)?;
        info!(
            server = %client.server_name,
            tools = client.tools.len(),
            "tool server connected"
        );
        Ok(client)
    }

    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    /// The cached tool schemas from connect time.
    pub fn tools(&self) -> &[ToolInfo] {
        &self.tools
    }

    /// Invoke a tool and return its textual result. A server-reported tool
    /// failure comes back as `McpError::Tool`.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<String> {
        debug!(server = %self.server_name, tool = %name, "calling external tool");
        let result = self
            .request("tools/call", json!({ "name": name, "arguments": arguments }))
            .await?;
        parse_tool_result(&result)
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let payload = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        let response = match &self.transport {
            Transport::Stdio { stdin, stdout, .. } => {
                tokio::time::timeout(
                    self.timeout,
                    stdio_round_trip(stdin, stdout, &payload, id),
                )
                .await
                .map_err(|_| McpError::Timeout)??
            }
            Transport::Http { client, config } => {
                http_round_trip(client, config, &payload, id).await?
            }
        };

        if let Some(error) = response.get("error") {
            return Err(McpError::Protocol(format!(
                "{method} failed: {error}"
            )));
        }
        Ok(response.get("result").cloned().unwrap_or(Value::Null))
    }

    async fn notify(&self, method: &str) -> Result<()> {
        let payload = json!({ "jsonrpc": "2.0", "method": method });
        match &self.transport {
            Transport::Stdio { stdin, .. } => {
                let mut stdin = stdin.lock().await;
                let mut line = serde_json::to_string(&payload)
                    .map_err(|e| McpError::Protocol(e.to_string()))?;
                line.push('\n');
                stdin.write_all(line.as_bytes()).await?;
                stdin.flush().await?;
            }
            Transport::Http { client, config } => {
                // Servers are expected to accept (and ignore) notifications.
                let _ = send_http(client, config, &payload).await;
            }
        }
        Ok(())
    }
}

async fn spawn_stdio(config: &StdioServerConfig) -> Result<Transport> {
    let mut command = Command::new(&config.command);
    command
        .args(&config.args)
        .envs(&config.env)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true);

    let mut child = command.spawn().map_err(|e| {
        McpError::Config(format!("failed to spawn '{}': {e}", config.command))
    })?;
    let stdin = child
        .stdin
        .take()
        .ok_or_else(|| McpError::Protocol("child stdin unavailable".into()))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| McpError::Protocol("child stdout unavailable".into()))?;

    Ok(Transport::Stdio {
        _child: child,
        stdin: Mutex::new(stdin),
        stdout: Mutex::new(BufReader::new(stdout)),
    })
}

/// Write one request line, then read lines until the response with our id
/// arrives (skipping server-initiated notifications).
async fn stdio_round_trip(
    stdin: &Mutex<ChildStdin>,
    stdout: &Mutex<BufReader<ChildStdout>>,
    payload: &Value,
    id: i64,
) -> Result<Value> {
    {
        let mut stdin = stdin.lock().await;
        let mut line =
            serde_json::to_string(payload).map_err(|e| McpError::Protocol(e.to_string()))?;
        line.push('\n');
        stdin.write_all(line.as_bytes()).await?;
        stdin.flush().await?;
    }

    let mut stdout = stdout.lock().await;
    let mut line = String::new();
    loop {
        line.clear();
        let read = stdout.read_line(&mut line).await?;
        if read == 0 {
            return Err(McpError::Protocol("server closed its stdout".into()));
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let message: Value = match serde_json::from_str(trimmed) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "skipping unparsable server line");
                continue;
            }
        };
        if message.get("id").and_then(Value::as_i64) == Some(id) {
            return Ok(message);
        }
        // Notification or response to someone else — keep reading.
    }
}

async fn http_round_trip(
    client: &reqwest::Client,
    config: &HttpServerConfig,
    payload: &Value,
    id: i64,
) -> Result<Value> {
    let response = send_http(client, config, payload).await?;
    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        return Err(McpError::Protocol(format!(
            "HTTP {status} from {}: {text}",
            config.name
        )));
    }

    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    let body = response.text().await?;

    if content_type.contains("text/event-stream") {
        extract_sse_response(&body, id)
    } else {
        serde_json::from_str(&body).map_err(|e| McpError::Protocol(e.to_string()))
    }
}

async fn send_http(
    client: &reqwest::Client,
    config: &HttpServerConfig,
    payload: &Value,
) -> Result<reqwest::Response> {
    let mut builder = client
        .post(&config.url)
        .header("content-type", "application/json")
        .header("accept", "application/json, text/event-stream")
        .json(payload);
    if let Some(token) = &config.bearer_token {
        builder = builder.bearer_auth(token);
    }
    for (key, value) in &config.headers {
        builder = builder.header(key.as_str(), value.as_str());
    }
    Ok(builder.send().await?)
}

/// Pull the JSON-RPC response with the given id out of an SSE body.
fn extract_sse_response(body: &str, id: i64) -> Result<Value> {
    for line in body.lines() {
        let Some(data) = line.strip_prefix("data:") else {
            continue;
        };
        let data = data.trim();
        if data.is_empty() || data == "[DONE]" {
            continue;
        }
        if let Ok(message) = serde_json::from_str::<Value>(data) {
            if message.get("id").and_then(Value::as_i64) == Some(id) {
                return Ok(message);
            }
        }
    }
    Err(McpError::Protocol(format!(
        "no response with id {id} in event stream"
    )))
}

fn parse_tool_list(result: &Value) -> Result<Vec<ToolInfo>> {
    let tools = result
        .get("tools")
        .and_then(Value::as_array)
        .ok_or_else(|| McpError::Protocol("tools/list result missing 'tools'".into()))?;
    Ok(tools
        .iter()
        .filter_map(|t| {
            let name = t.get("name")?.as_str()?.to_string();
            Some(ToolInfo {
                name,
                description: t
                    .get("description")
                    .and_then(Value::as_str)
                    .unwrap_or("")
                    .to_string(),
                input_schema: t
                    .get("inputSchema")
                    .cloned()
                    .unwrap_or_else(|| json!({ "type": "object" })),
            })
        })
        .collect())
}

/// Flatten a tools/call result into text; `isError` becomes `McpError::Tool`.
fn parse_tool_result(result: &Value) -> Result<String> {
    let text: String = result
        .get("content")
        .and_then(Value::as_array)
        .map(|blocks| {
            blocks
                .iter()
                .filter_map(|b| b.get("text").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default();

    if result
        .get("isError")
        .and_then(Value::as_bool)
        .unwrap_or(false)
    {
        return Err(McpError::Tool(if text.is_empty() {
            "tool reported an error".into()
        } else {
            text
        }));
    }
    Ok(text)
}
