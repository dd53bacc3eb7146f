//! Tool-server configuration.
//!
//! ```json
//! { "servers": [
//!     { "name": "notes", "command": "notes-server", "args": ["--stdio"],
//!       "env": { "NOTES_TOKEN": "${NOTES_TOKEN}" } },
//!     { "name": "web", "type": "STREAMABLE_HTTP",
//!       "url": "https://tools.example/mcp", "bearerToken": "${WEB_TOKEN}" }
//! ] }
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{McpError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct McpConfig {
    #[serde(default)]
    pub servers: Vec<ServerConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ServerConfig {
    Http(HttpServerConfig),
    Stdio(StdioServerConfig),
}

impl ServerConfig {
    pub fn name(&self) -> &str {
        match self {
            ServerConfig::Http(c) => &c.name,
            ServerConfig::Stdio(c) => &c.name,
        }
    }
}

/// HTTP transport flavours. SSE servers answer POSTs with an event stream;
/// streamable-HTTP servers may answer with either plain JSON or a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum HttpFlavor {
    #[serde(rename = "STREAMABLE_HTTP")]
    StreamableHttp,
    #[serde(rename = "SSE")]
    Sse,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpServerConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub flavor: HttpFlavor,
    pub url: String,
    #[serde(default)]
    pub bearer_token: Option<String>,
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StdioServerConfig {
    pub name: String,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl McpConfig {
    /// Load the config file and substitute `${NAME}` from the environment.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| McpError::Config(format!("{}: {e}", path.display())))?;
        let mut config: McpConfig = serde_json::from_str(&raw)
            .map_err(|e| McpError::Config(format!("{}: {e}", path.display())))?;
        config.substitute(&|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Apply `${NAME}` substitution to every string value.
    pub fn substitute(&mut self, lookup: &dyn Fn(&str) -> Option<String>) {
        for server in &mut self.servers {
            match server {
                ServerConfig::Http(c) => {
                    c.url = substitute_vars(&c.url, lookup);
                    if let Some(token) = &c.bearer_token {
                        c.bearer_token = Some(substitute_vars(token, lookup));
                    }
                    for value in c.headers.values_mut() {
                        *value = substitute_vars(value, lookup);
                    }
                }
                ServerConfig::Stdio(c) => {
                    c.command = substitute_vars(&c.command, lookup);
                    for arg in &mut c.args {
                        *arg = substitute_vars(arg, lookup);
                    }
                    for value in c.env.values_mut() {
                        *value = substitute_vars(value, lookup);
                    }
                }
            }
        }
    }
}

/// Replace every `${NAME}` with the lookup result; unknown names resolve
/// to the empty string.
fn substitute_vars(input: &str, lookup: &dyn Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let name = &after[..end];
                out.push_str(&lookup(name).unwrap_or_default());
                rest = &after[end + 1..];
            }
            None => {
                // No closing brace — keep the literal remainder.
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_server_shapes() {
        let raw = r#"{ "servers": [
            { "name": "notes", "command": "notes-server",
              "args": ["--stdio"], "env": {"TOKEN": "${T}"} },
            { "name": "web", "type": "SSE", "url": "https://x/mcp",
              "bearerToken": "${B}", "headers": {"X-Org": "${ORG}"} }
        ]}"#;
        let config: McpConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.servers.len(), 2);
        assert!(matches!(config.servers[0], ServerConfig::Stdio(_)));
        match &config.servers[1] {
            ServerConfig::Http(c) => {
                assert_eq!(c.flavor, HttpFlavor::Sse);
                assert_eq!(c.url, "https://x/mcp");
            }
            _ => panic!("expected http server"),
        }
    }

    #[test]
    fn substitutes_env_placeholders() {
        let raw = r#"{ "servers": [
            { "name": "notes", "command": "${BIN}", "args": ["--key", "${KEY}"],
              "env": {"TOKEN": "prefix-${KEY}-suffix"} }
        ]}"#;
        let mut config: McpConfig = serde_json::from_str(raw).unwrap();
        config.substitute(&|name| match name {
            "BIN" => Some("notes-server".into()),
            "KEY" => Some("abc".into()),
            _ => None,
        });
        match &config.servers[0] {
            ServerConfig::Stdio(c) => {
                assert_eq!(c.command, "notes-server");
                assert_eq!(c.args, vec!["--key", "abc"]);
                assert_eq!(c.env["TOKEN"], "prefix-abc-suffix");
            }
            _ => panic!("expected stdio server"),
        }
    }

    #[test]
    fn unknown_names_become_empty() {
        assert_eq!(substitute_vars("a-${NOPE}-b", &|_| None), "a--b");
    }

    #[test]
    fn unterminated_placeholder_is_kept_literally() {
        assert_eq!(substitute_vars("x${OPEN", &|_| None), "x${OPEN");
    }
}
