//! `seele-memory` — the two live tiers of the memory subsystem.
//!
//! [`window::ContextWindow`] owns the active session: it appends turns,
//! decides when the tail has grown past the compaction trigger, and
//! handles `/new` (finalise + rotate) and `/reset` (hard delete).
//!
//! [`retriever::Retriever`] is the recall tier: embedding search over past
//! summaries, then over the turns behind each recalled summary, with
//! optional rerank pruning. It never surfaces the active session.

pub mod error;
pub mod retriever;
pub mod window;

pub use error::{MemoryError, Result};
pub use retriever::{RetrievalResult, RetrievedSummary, RetrievedTurn, Retriever, RetrieverParams};
pub use window::{ContextWindow, WindowParams};
