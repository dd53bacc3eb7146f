//! Process-wide wiring. Everything that used to be a global in designs
//! like this lives on one `App` value threaded into the handlers.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use seele_agent::pipeline::process_scheduled_turn;
use seele_agent::prompt::PromptAssembler;
use seele_agent::BotContext;
use seele_core::time::now_epoch;
use seele_core::Config;
use seele_memory::{ContextWindow, Retriever, RetrieverParams, WindowParams};
use seele_mcp::{McpClient, McpConfig};
use seele_profile::ProfileStore;
use seele_providers::{
    Embedder, HttpEmbedder, HttpReranker, LlmProvider, OpenAiProvider, Reranker,
};
use seele_scheduler::TaskRunner;
use seele_store::{ScheduledTask, Store};

pub struct App {
    config: Config,
    store: Arc<Store>,
    window: ContextWindow,
    retriever: Retriever,
    profile: ProfileStore,
    assembler: PromptAssembler,
    chat: Box<dyn LlmProvider>,
    embedder: Arc<dyn Embedder>,
    mcp: Vec<Arc<McpClient>>,
    turn_lock: tokio::sync::Mutex<()>,
    /// Scheduler-produced assistant messages flow out here; the transport
    /// delivers them to the authorised chat.
    proactive_tx: tokio::sync::mpsc::Sender<String>,
}

impl App {
    pub async fn bootstrap(
        config: Config,
        proactive_tx: tokio::sync::mpsc::Sender<String>,
    ) -> anyhow::Result<Arc<Self>> {
        let dir = config.profile_dir();
        std::fs::create_dir_all(&dir)?;
        let timeout = Duration::from_secs(config.request_timeout_secs);
        let tz = config.tz();

        let store = Arc::new(Store::open(
            &dir.join("chatbot.db"),
            config.embedding_dimension,
        )?);
        let profile = ProfileStore::open(&dir.join("seele.json"))?;
        let window = ContextWindow::open(
            Arc::clone(&store),
            WindowParams {
                keep_min: config.context_window_keep_min,
                trigger: config.context_window_trigger_summary,
                recent_summaries_max: config.recent_summaries_max,
            },
            now_epoch(),
        )?;

        let chat: Box<dyn LlmProvider> = Box::new(OpenAiProvider::new(
            config.chat_api_key.clone().unwrap_or_default(),
            config.chat_api_base.clone(),
            timeout,
        ));
        let embedder: Arc<dyn Embedder> = Arc::new(HttpEmbedder::new(
            config
                .embedding_api_key
                .clone()
                .or_else(|| config.chat_api_key.clone())
                .unwrap_or_default(),
            config
                .embedding_api_base
                .clone()
                .or_else(|| config.chat_api_base.clone()),
            config.embedding_model.clone(),
            config.embedding_dimension,
            timeout,
        ));

        // Rerank is optional: both a model and an endpoint must be set.
        let reranker: Option<Arc<dyn Reranker>> =
            match (&config.rerank_model, &config.rerank_api_base) {
                (Some(model), Some(base)) => Some(Arc::new(HttpReranker::new(
                    config.rerank_api_key.clone().unwrap_or_default(),
                    base.clone(),
                    model.clone(),
                    timeout,
                ))),
                _ => None,
            };

        let retriever = Retriever::new(
            Arc::clone(&store),
            Arc::clone(&embedder),
            reranker,
            RetrieverParams {
                recall_summary_per_query: config.recall_summary_per_query,
                recall_conv_per_summary: config.recall_conv_per_summary,
                rerank_top_summaries: config.rerank_top_summaries,
                rerank_top_convs: config.rerank_top_convs,
            },
            tz,
        );

        let assembler = PromptAssembler::new(None, tz, config.chat_model.clone(), 4096);

        let mcp = connect_mcp_servers(&config, timeout).await;

        if let Some(path) = &config.scheduled_tasks_config_path {
            match seele_scheduler::seed::load_seed_file(
                &store,
                std::path::Path::new(path),
                now_epoch(),
            ) {
                Ok(added) if added > 0 => info!(added, "seed tasks merged"),
                Ok(_) => {}
                Err(e) => warn!(kind = %e.kind(), error = %e, "seed task loading failed"),
            }
        }

        Ok(Arc::new(Self {
            config,
            store,
            window,
            retriever,
            profile,
            assembler,
            chat,
            embedder,
            mcp,
            turn_lock: tokio::sync::Mutex::new(()),
            proactive_tx,
        }))
    }
}

async fn connect_mcp_servers(config: &Config, timeout: Duration) -> Vec<Arc<McpClient>> {
    if !config.enable_mcp {
        return Vec::new();
    }
    let Some(path) = &config.mcp_config_path else {
        warn!("ENABLE_MCP is set but MCP_CONFIG_PATH is not");
        return Vec::new();
    };
    let mcp_config = match McpConfig::load(std::path::Path::new(path)) {
        Ok(c) => c,
        Err(e) => {
            warn!(kind = %e.kind(), error = %e, "tool server config unreadable");
            return Vec::new();
        }
    };

    let mut clients = Vec::new();
    for server in &mcp_config.servers {
        match McpClient::connect(server, timeout).await {
            Ok(client) => clients.push(Arc::new(client)),
            Err(e) => {
                // A dead tool server must not take the agent down with it.
                warn!(
                    server = server.name(),
                    kind = %e.kind(),
                    error = %e,
                    "tool server connection failed, skipping"
                );
            }
        }
    }
    clients
}

impl BotContext for App {
    fn config(&self) -> &Config {
        &self.config
    }
    fn store(&self) -> &Arc<Store> {
        &self.store
    }
    fn window(&self) -> &ContextWindow {
        &self.window
    }
    fn retriever(&self) -> &Retriever {
        &self.retriever
    }
    fn profile(&self) -> &ProfileStore {
        &self.profile
    }
    fn assembler(&self) -> &PromptAssembler {
        &self.assembler
    }
    fn chat(&self) -> &dyn LlmProvider {
        &*self.chat
    }
    fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }
    fn turn_lock(&self) -> &tokio::sync::Mutex<()> {
        &self.turn_lock
    }
    fn mcp_clients(&self) -> &[Arc<McpClient>] {
        &self.mcp
    }
}

/// Scheduler → orchestrator bridge. Runs the scheduled turn (recursion
/// guard active) and forwards the assistant's reply for proactive
/// delivery.
pub struct AppRunner(pub Arc<App>);

#[async_trait]
impl TaskRunner for AppRunner {
    async fn run_scheduled(
        &self,
        task: &ScheduledTask,
        prompt: &str,
    ) -> std::result::Result<(), String> {
        let outcome = process_scheduled_turn(&self.0, prompt)
            .await
            .map_err(|e| format!("{}: {e}", e.kind()))?;

        if !outcome.content.is_empty() {
            if let Err(e) = self.0.proactive_tx.send(outcome.content).await {
                warn!(task_id = %task.task_id, error = %e, "proactive delivery channel closed");
            }
        }
        Ok(())
    }
}
