//! End-to-end pipeline tests with a scripted chat provider: persistence
//! rules, the tool loop, the recursion guards, compaction, and profile
//! patch freshness.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use seele_agent::pipeline::{process_scheduled_turn, process_user_turn, summarize_slice};
use seele_agent::prompt::PromptAssembler;
use seele_agent::tools::{build::build_tools, tool_loop::MAX_ITERATIONS_MESSAGE, Invocation};
use seele_agent::BotContext;
use seele_core::Config;
use seele_memory::{ContextWindow, Retriever, RetrieverParams, WindowParams};
use seele_profile::ProfileStore;
use seele_providers::{
    ChatRequest, ChatResponse, Embedder, LlmProvider, ProviderError, ToolCall,
};
use seele_store::{Role, Store};

const DIM: usize = 4;

struct StubEmbedder;

#[async_trait]
impl Embedder for StubEmbedder {
    fn dim(&self) -> usize {
        DIM
    }
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        Ok(texts.iter().map(|_| vec![1.0, 0.0, 0.0, 0.0]).collect())
    }
}

/// Pops scripted responses in order and records every request it saw.
struct ScriptedProvider {
    responses: Mutex<VecDeque<ChatResponse>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedProvider {
    fn new(responses: Vec<ChatResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn recorded(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }
    async fn send(&self, req: &ChatRequest) -> Result<ChatResponse, ProviderError> {
        self.requests.lock().unwrap().push(req.clone());
        Ok(self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| text_response("ok")))
    }
}

fn text_response(content: &str) -> ChatResponse {
    ChatResponse {
        content: content.into(),
        model: "scripted-model".into(),
        tokens_in: 1,
        tokens_out: 1,
        stop_reason: "stop".into(),
        tool_calls: Vec::new(),
    }
}

fn tool_call_response(name: &str, input: serde_json::Value) -> ChatResponse {
    ChatResponse {
        content: String::new(),
        model: "scripted-model".into(),
        tokens_in: 1,
        tokens_out: 1,
        stop_reason: "tool_use".into(),
        tool_calls: vec![ToolCall {
            id: "call_1".into(),
            name: name.into(),
            input,
        }],
    }
}

struct TestCtx {
    config: Config,
    store: Arc<Store>,
    window: ContextWindow,
    retriever: Retriever,
    profile: ProfileStore,
    assembler: PromptAssembler,
    chat: ScriptedProvider,
    embedder: Arc<dyn Embedder>,
    lock: tokio::sync::Mutex<()>,
    _dir: tempfile::TempDir,
}

impl TestCtx {
    fn new(responses: Vec<ChatResponse>, trigger: usize, keep_min: usize) -> Arc<Self> {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(Store::open_in_memory(DIM).unwrap());
        let embedder: Arc<dyn Embedder> = Arc::new(StubEmbedder);
        let window = ContextWindow::open(
            Arc::clone(&store),
            WindowParams {
                keep_min,
                trigger,
                recent_summaries_max: 3,
            },
            100,
        )
        .unwrap();
        let retriever = Retriever::new(
            Arc::clone(&store),
            Arc::clone(&embedder),
            None,
            RetrieverParams::default(),
            chrono_tz::Tz::UTC,
        );
        let profile = ProfileStore::open(&dir.path().join("seele.json")).unwrap();
        let assembler =
            PromptAssembler::new(None, chrono_tz::Tz::UTC, "scripted-model".into(), 1024);

        Arc::new(Self {
            config: Config::default(),
            store,
            window,
            retriever,
            profile,
            assembler,
            chat: ScriptedProvider::new(responses),
            embedder,
            lock: tokio::sync::Mutex::new(()),
            _dir: dir,
        })
    }
}

impl BotContext for TestCtx {
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
        &self.chat
    }
    fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }
    fn turn_lock(&self) -> &tokio::sync::Mutex<()> {
        &self.lock
    }
}

#[tokio::test]
async fn user_turn_persists_user_and_final_assistant_text_only() {
    let ctx = TestCtx::new(
        vec![
            tool_call_response("search_memories", serde_json::json!({"query": "piano"})),
            text_response("here is what I remember"),
        ],
        24,
        12,
    );

    let outcome = process_user_turn(&ctx, "what do you remember?").await.unwrap();
    assert_eq!(outcome.content, "here is what I remember");

    let turns = ctx
        .store
        .recent_turns(ctx.window.active_session_id(), 10)
        .unwrap();
    // Tool traffic never becomes turns.
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].role, Role::User);
    assert_eq!(turns[0].text, "what do you remember?");
    assert_eq!(turns[1].role, Role::Assistant);
    assert_eq!(turns[1].text, "here is what I remember");

    // Both turns got vectors from the (healthy) embedder.
    assert!(ctx.store.has_turn_vector(turns[0].turn_id).unwrap());
    assert!(ctx.store.has_turn_vector(turns[1].turn_id).unwrap());
}

#[tokio::test]
async fn tool_results_are_fed_back_to_the_model() {
    let ctx = TestCtx::new(
        vec![
            tool_call_response("search_memories", serde_json::json!({"query": "piano"})),
            text_response("done"),
        ],
        24,
        12,
    );

    process_user_turn(&ctx, "hi").await.unwrap();

    let requests = ctx.chat.recorded();
    assert_eq!(requests.len(), 2);
    // Second request carries the assistant tool call and a tool result.
    let raw = requests[1].raw_messages.as_ref().unwrap();
    let roles: Vec<&str> = raw
        .iter()
        .map(|m| m.get("role").and_then(|r| r.as_str()).unwrap_or(""))
        .collect();
    assert!(roles.contains(&"tool"));
    let tool_msg = raw
        .iter()
        .find(|m| m.get("role").and_then(|r| r.as_str()) == Some("tool"))
        .unwrap();
    assert_eq!(tool_msg["tool_call_id"], "call_1");
}

#[tokio::test]
async fn runaway_tool_loop_is_bounded() {
    let responses: Vec<ChatResponse> = (0..20)
        .map(|_| tool_call_response("search_memories", serde_json::json!({"query": "x"})))
        .collect();
    let ctx = TestCtx::new(responses, 24, 12);

    let outcome = process_user_turn(&ctx, "loop forever").await.unwrap();
    assert_eq!(outcome.content, MAX_ITERATIONS_MESSAGE);

    // One LLM call per allowed iteration, no more.
    assert_eq!(ctx.chat.recorded().len(), ctx.config.max_tool_iterations);
}

#[tokio::test]
async fn scheduled_prompt_is_never_stored() {
    let ctx = TestCtx::new(vec![text_response("good morning!")], 24, 12);

    let prompt = "[SYSTEM_SCHEDULED_TASK]\nTask: wake\nBriefing: say good morning";
    let outcome = process_scheduled_turn(&ctx, prompt).await.unwrap();
    assert_eq!(outcome.content, "good morning!");

    let turns = ctx
        .store
        .recent_turns(ctx.window.active_session_id(), 10)
        .unwrap();
    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0].role, Role::Assistant);
    assert_eq!(turns[0].text, "good morning!");
}

#[tokio::test]
async fn scheduled_turns_cannot_see_the_task_tool() {
    let ctx = TestCtx::new(vec![text_response("ok")], 24, 12);

    process_scheduled_turn(&ctx, "[SYSTEM_SCHEDULED_TASK] briefing")
        .await
        .unwrap();

    let requests = ctx.chat.recorded();
    let names: Vec<&str> = requests[0].tools.iter().map(|t| t.name.as_str()).collect();
    assert!(names.contains(&"search_memories"));
    assert!(!names.contains(&"scheduled_task"));
}

#[tokio::test]
async fn registry_filter_by_invocation() {
    let ctx = TestCtx::new(vec![], 24, 12);

    let names = |invocation| -> Vec<String> {
        build_tools(Arc::clone(&ctx), invocation)
            .iter()
            .map(|t| t.name().to_string())
            .collect()
    };

    let user = names(Invocation::UserTurn);
    assert!(user.contains(&"search_memories".to_string()));
    assert!(user.contains(&"scheduled_task".to_string()));

    let scheduled = names(Invocation::Scheduled);
    assert!(!scheduled.contains(&"scheduled_task".to_string()));

    let summarize = names(Invocation::Summarize);
    assert!(!summarize.contains(&"search_memories".to_string()));
}

#[tokio::test]
async fn compaction_fires_at_the_trigger_and_condenses_the_oldest_turns() {
    // trigger=4, keep_min=2: the 4th stored turn (2nd assistant reply)
    // trips compaction; the scripted summariser reply is the 3rd response.
    let ctx = TestCtx::new(
        vec![
            text_response("reply one"),
            text_response("reply two"),
            text_response(r#"{"summary": "first exchange condensed", "profile_patch": []}"#),
        ],
        4,
        2,
    );

    process_user_turn(&ctx, "message one").await.unwrap();
    let session = ctx.window.active_session_id();
    assert_eq!(ctx.store.recent_summaries(session, 5).unwrap().len(), 0);

    process_user_turn(&ctx, "message two").await.unwrap();

    let summaries = ctx.store.recent_summaries(session, 5).unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].text, "first exchange condensed");

    // Tail shrank to KEEP_MIN; condensed turns are still in the store.
    assert_eq!(ctx.window.tail().unwrap().len(), 2);
    assert_eq!(ctx.store.count_turns(session).unwrap(), 4);
}

#[tokio::test]
async fn profile_patch_is_visible_to_the_very_next_assembly() {
    let ctx = TestCtx::new(
        vec![
            text_response(
                r#"{"summary": "met the user", "profile_patch":
                    [{"op": "replace", "path": "/user/name", "value": "Anna"}]}"#,
            ),
            text_response("hello Anna"),
        ],
        24,
        12,
    );

    // Seed one turn so there is something to summarise.
    let session = ctx.window.active_session_id();
    ctx.store
        .append_turn(session, Role::User, "my name is Anna", 1000)
        .unwrap();
    let slice = ctx.store.unsummarized_turns(session).unwrap();
    summarize_slice(&ctx, &slice).await.unwrap();

    assert_eq!(ctx.profile.snapshot()["user"]["name"], "Anna");

    // The very next assembled request embeds the patched profile without
    // any disk re-read.
    process_user_turn(&ctx, "hi again").await.unwrap();
    let requests = ctx.chat.recorded();
    let chat_request = requests.last().unwrap();
    assert!(chat_request.system.contains("\"Anna\""));
}

#[tokio::test]
async fn summariser_embeds_the_new_summary() {
    let ctx = TestCtx::new(
        vec![text_response(r#"{"summary": "condensed", "profile_patch": []}"#)],
        24,
        12,
    );
    let session = ctx.window.active_session_id();
    ctx.store
        .append_turn(session, Role::User, "hello", 1000)
        .unwrap();
    let slice = ctx.store.unsummarized_turns(session).unwrap();

    let summary_id = summarize_slice(&ctx, &slice).await.unwrap().unwrap();

    // The summary vector landed, so it is recallable.
    let hits = ctx
        .store
        .vector_search(
            seele_store::VectorKind::Summary,
            &[1.0, 0.0, 0.0, 0.0],
            5,
            seele_store::VectorFilter::None,
        )
        .unwrap();
    assert_eq!(hits[0].0, summary_id);
}
