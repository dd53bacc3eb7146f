//! Turn pipelines: user turns, scheduled turns, summarisation, and the
//! transport-level slash commands.

pub mod process;
pub mod slash;
pub mod summarize;

pub use process::{
    process_scheduled_turn, process_user_turn, reconcile_missing_vectors, TurnOutcome,
};
pub use slash::handle_command;
pub use summarize::summarize_slice;
