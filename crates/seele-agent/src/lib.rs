//! `seele-agent` — everything that decides what goes into the next LLM
//! call and what happens to its answer.
//!
//! The [`context::BotContext`] trait is the seam every host implements
//! (the binary's `App`, the test fixtures). On top of it sit the prompt
//! assembler, the tool registry with its per-invocation filter, the
//! bounded tool-calling loop, the summariser/profile-patcher, and the
//! user/scheduled turn pipelines.

pub mod context;
pub mod error;
pub mod pipeline;
pub mod prompt;
pub mod tools;

pub use context::BotContext;
pub use error::{AgentError, Result};
