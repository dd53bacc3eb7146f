//! Transport slash commands, intercepted before the LLM pipeline.
//!
//! `/new` finalises the active session (summarise the remaining tail,
//! patch the profile, archive) and starts a fresh one; `/reset` discards
//! the active session outright. `/status` and `/help` are conveniences.

use std::sync::Arc;

use tracing::{info, warn};

use seele_core::time::now_epoch;

use crate::context::BotContext;

use super::summarize::summarize_slice;

/// Handle a slash command. Returns `Some(response)` when the message was
/// a recognised command, `None` when it should go to the LLM pipeline.
pub async fn handle_command<C: BotContext + 'static>(ctx: &Arc<C>, text: &str) -> Option<String> {
    let trimmed = text.trim();

    if trimmed.eq_ignore_ascii_case("/new") {
        let _turn = ctx.turn_lock().lock().await;
        let window = ctx.window();

        // Finalise: condense everything still uncondensed, then rotate.
        match window.finalization_slice() {
            Ok(slice) if !slice.is_empty() => {
                if let Err(e) = summarize_slice(ctx, &slice).await {
                    warn!(kind = %e.kind(), error = %e, "finalisation summary failed");
                }
            }
            Ok(_) => {}
            Err(e) => warn!(kind = %e.kind(), error = %e, "finalisation slice unavailable"),
        }

        return Some(match window.rotate(now_epoch()) {
            Ok(session_id) => {
                info!(session_id, "session rotated via /new");
                "Conversation archived. I'll still remember it — we're starting a fresh \
                 session now."
                    .to_string()
            }
            Err(e) => {
                warn!(kind = %e.kind(), error = %e, "session rotation failed");
                "Something went wrong archiving the conversation. Please try again.".to_string()
            }
        });
    }

    if trimmed.eq_ignore_ascii_case("/reset") {
        let _turn = ctx.turn_lock().lock().await;
        return Some(match ctx.window().reset(now_epoch()) {
            Ok(session_id) => {
                info!(session_id, "session reset via /reset");
                "Conversation discarded. Nothing from it was kept.".to_string()
            }
            Err(e) => {
                warn!(kind = %e.kind(), error = %e, "session reset failed");
                "Something went wrong discarding the conversation. Please try again.".to_string()
            }
        });
    }

    if trimmed.eq_ignore_ascii_case("/status") {
        let window = ctx.window();
        let session_id = window.active_session_id();
        let turns = ctx.store().count_turns(session_id).unwrap_or(0);
        let tail = window.tail().map(|t| t.len()).unwrap_or(0);
        let config = ctx.config();
        return Some(format!(
            "Session #{session_id}\n\
             Turns this session: {turns} ({tail} in the live window)\n\
             Chat model: {}\nTool model: {}",
            config.chat_model,
            config.tool_model(),
        ));
    }

    if trimmed.eq_ignore_ascii_case("/help") {
        return Some(
            "Commands:\n\
             /new — archive this conversation and start fresh (it stays in memory)\n\
             /reset — discard this conversation entirely\n\
             /status — session and model info\n\
             /help — this message"
                .to_string(),
        );
    }

    None
}
