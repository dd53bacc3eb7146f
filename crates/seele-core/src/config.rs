use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Scheduler granularity (seconds) when not overridden.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;
/// Tool-loop iteration bound per turn.
pub const DEFAULT_MAX_TOOL_ITERATIONS: usize = 8;
/// Outbound network call timeout (seconds).
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Top-level config (seele.toml + raw env overrides).
///
/// Every key can be supplied as an environment variable with the same name
/// uppercased, e.g. `TIMEZONE`, `CHAT_MODEL`, `TELEGRAM_BOT_TOKEN`. Env
/// values win over the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// IANA zone for human-readable renderings. Never affects stored values.
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Deployment profile name — selects `data/<profile>/`.
    #[serde(default = "default_profile")]
    pub profile: String,
    /// Root of the persistent state tree.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    // Context window (§ tail buffer)
    #[serde(default = "default_keep_min")]
    pub context_window_keep_min: usize,
    #[serde(default = "default_trigger_summary")]
    pub context_window_trigger_summary: usize,
    #[serde(default = "default_recent_summaries_max")]
    pub recent_summaries_max: usize,

    // Retrieval
    #[serde(default = "default_recall_summary_per_query")]
    pub recall_summary_per_query: usize,
    #[serde(default = "default_recall_conv_per_summary")]
    pub recall_conv_per_summary: usize,
    #[serde(default = "default_rerank_top_summaries")]
    pub rerank_top_summaries: usize,
    #[serde(default = "default_rerank_top_convs")]
    pub rerank_top_convs: usize,

    // Models
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    /// Model used for summarisation and other internal calls. Falls back to
    /// the chat model when unset.
    pub tool_model: Option<String>,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    /// Deploy-time embedding dimension D. A store created with one dimension
    /// refuses to open under another.
    #[serde(default = "default_embedding_dimension")]
    pub embedding_dimension: usize,
    pub rerank_model: Option<String>,

    // Provider endpoints
    pub chat_api_base: Option<String>,
    pub chat_api_key: Option<String>,
    pub embedding_api_base: Option<String>,
    pub embedding_api_key: Option<String>,
    pub rerank_api_base: Option<String>,
    pub rerank_api_key: Option<String>,

    // Transport — the single authorised correspondent.
    pub telegram_bot_token: Option<String>,
    pub telegram_user_id: Option<i64>,

    // External tool servers
    #[serde(default)]
    pub enable_mcp: bool,
    pub mcp_config_path: Option<String>,

    /// Seed-task JSON file merged on startup.
    pub scheduled_tasks_config_path: Option<String>,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_max_tool_iterations")]
    pub max_tool_iterations: usize,
}

impl Default for Config {
    fn default() -> Self {
        // An empty Figment yields every serde default.
        Figment::new()
            .extract()
            .expect("default config must deserialize")
    }
}

impl Config {
    /// Load config from a TOML file with raw env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. ./seele.toml
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path.unwrap_or("seele.toml");

        let config: Config = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::raw())
            .extract()
            .map_err(|e| crate::error::SeeleError::Config(e.to_string()))?;

        Ok(config)
    }

    /// Directory holding this deployment profile's state
    /// (`chatbot.db`, `seele.json`, optional `scheduled_tasks.json`).
    pub fn profile_dir(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.data_dir).join(&self.profile)
    }

    /// Summarisation model: `TOOL_MODEL` or the chat model.
    pub fn tool_model(&self) -> &str {
        self.tool_model.as_deref().unwrap_or(&self.chat_model)
    }

    /// Parse the configured IANA zone, falling back to UTC with a warning.
    pub fn tz(&self) -> chrono_tz::Tz {
        self.timezone.parse().unwrap_or_else(|_| {
            tracing::warn!(zone = %self.timezone, "unknown IANA zone, falling back to UTC");
            chrono_tz::Tz::UTC
        })
    }
}

fn default_timezone() -> String {
    "UTC".to_string()
}
fn default_profile() -> String {
    "default".to_string()
}
fn default_data_dir() -> String {
    "data".to_string()
}
fn default_keep_min() -> usize {
    12
}
fn default_trigger_summary() -> usize {
    24
}
fn default_recent_summaries_max() -> usize {
    3
}
fn default_recall_summary_per_query() -> usize {
    3
}
fn default_recall_conv_per_summary() -> usize {
    4
}
fn default_rerank_top_summaries() -> usize {
    3
}
fn default_rerank_top_convs() -> usize {
    6
}
fn default_chat_model() -> String {
    "gpt-4o".to_string()
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}
fn default_embedding_dimension() -> usize {
    1536
}
fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}
fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}
fn default_max_tool_iterations() -> usize {
    DEFAULT_MAX_TOOL_ITERATIONS
}
