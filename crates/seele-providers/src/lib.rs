//! `seele-providers` — deterministic wrappers around the external model
//! services: the chat model (OpenAI-compatible, with function calling),
//! the embedding service, and the optional reranker.
//!
//! Every outbound call carries the configured timeout; a timed-out call
//! fails with `ProviderError::Timeout` and is handled by the caller's
//! degradation policy (retrieval returns empty, compaction is skipped,
//! tool errors flow back to the LLM).

pub mod embedding;
pub mod error;
pub mod openai;
pub mod provider;
pub mod rerank;

pub use embedding::{Embedder, HttpEmbedder};
pub use error::ProviderError;
pub use openai::OpenAiProvider;
pub use provider::{
    ChatRequest, ChatResponse, LlmProvider, Message, Role, ToolCall, ToolDefinition,
};
pub use rerank::{HttpReranker, RerankHit, Reranker};
