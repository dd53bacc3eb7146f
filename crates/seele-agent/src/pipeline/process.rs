//! The turn pipelines — the orchestrator's state machine.
//!
//! A user turn: append → (compact) → retrieve → assemble → tool loop →
//! persist the final assistant text. A scheduled turn is the same except
//! the synthetic prompt is never stored; only the assistant's reply
//! becomes a turn. Both take the context's turn lock for their whole
//! duration, so user and scheduler turns never interleave.

use std::sync::Arc;

use tracing::{info, warn};

use seele_core::time::now_epoch;
use seele_store::{Role, Turn};

use crate::context::BotContext;
use crate::error::Result;
use crate::prompt::AssembleInput;
use crate::tools::{build::build_tools, to_definitions, tool_loop, Invocation};

use super::summarize::summarize_slice;

/// Result of a completed turn.
pub struct TurnOutcome {
    pub content: String,
    pub model: String,
    pub tokens_in: u32,
    pub tokens_out: u32,
}

/// Process one user message end to end. A storage failure propagates —
/// the transport reports it instead of silently dropping the input.
pub async fn process_user_turn<C: BotContext + 'static>(
    ctx: &Arc<C>,
    text: &str,
) -> Result<TurnOutcome> {
    let _turn = ctx.turn_lock().lock().await;

    let window = ctx.window();
    let last_assistant = last_assistant_text(&window.tail()?);

    let (user_turn_id, compact) = window.append(Role::User, text, now_epoch())?;
    embed_turn(ctx, user_turn_id, text).await;
    if compact {
        run_compaction(ctx).await;
    }

    let active = window.active_session_id();
    let retrieval = ctx
        .retriever()
        .retrieve(text, last_assistant.as_deref(), active)
        .await;

    // The current message is already persisted; keep it out of the history
    // tail so it appears only as the current request.
    let mut tail = window.tail()?;
    if tail.last().map(|t| t.turn_id) == Some(user_turn_id) {
        tail.pop();
    }

    run_to_reply(ctx, &tail, &retrieval, text, Invocation::UserTurn).await
}

/// Process a scheduler firing. The synthetic prompt is handed to the model
/// but never stored; the assistant's reply is persisted normally so the
/// conversation stays coherent.
pub async fn process_scheduled_turn<C: BotContext + 'static>(
    ctx: &Arc<C>,
    prompt: &str,
) -> Result<TurnOutcome> {
    let _turn = ctx.turn_lock().lock().await;

    let window = ctx.window();
    let tail = window.tail()?;
    let last_assistant = last_assistant_text(&tail);

    let active = window.active_session_id();
    let retrieval = ctx
        .retriever()
        .retrieve(prompt, last_assistant.as_deref(), active)
        .await;

    run_to_reply(ctx, &tail, &retrieval, prompt, Invocation::Scheduled).await
}

/// Shared back half: assemble, run the tool loop, persist the reply.
async fn run_to_reply<C: BotContext + 'static>(
    ctx: &Arc<C>,
    tail: &[Turn],
    retrieval: &seele_memory::RetrievalResult,
    current: &str,
    invocation: Invocation,
) -> Result<TurnOutcome> {
    let window = ctx.window();
    let summaries = window.recent_summaries()?;
    let profile = ctx.profile().snapshot();

    let tools = build_tools(Arc::clone(ctx), invocation);
    let request = ctx.assembler().assemble(AssembleInput {
        profile: &profile,
        recent_summaries: &summaries,
        retrieval,
        tail,
        current,
        tools: to_definitions(&tools),
    });

    let (response, called_tools) = tool_loop::run_tool_loop(
        ctx.chat(),
        request,
        &tools,
        ctx.config().max_tool_iterations,
    )
    .await?;

    info!(
        model = %response.model,
        tokens_in = response.tokens_in,
        tokens_out = response.tokens_out,
        tools = called_tools.len(),
        "turn complete"
    );

    if !response.content.is_empty() {
        let (assistant_id, compact) =
            window.append(Role::Assistant, &response.content, now_epoch())?;
        embed_turn(ctx, assistant_id, &response.content).await;
        if compact {
            run_compaction(ctx).await;
        }
    }

    Ok(TurnOutcome {
        content: response.content,
        model: response.model,
        tokens_in: response.tokens_in,
        tokens_out: response.tokens_out,
    })
}

fn last_assistant_text(tail: &[Turn]) -> Option<String> {
    tail.iter()
        .rev()
        .find(|t| t.role == Role::Assistant)
        .map(|t| t.text.clone())
}

/// Attach the turn's embedding, best-effort. A failed embed leaves the
/// turn vectorless; the startup reconcile pass (or a later one) fills it
/// in, and retrieval skips the row meanwhile.
async fn embed_turn<C: BotContext + 'static>(ctx: &Arc<C>, turn_id: i64, text: &str) {
    match ctx.embedder().embed(&[text.to_string()]).await {
        Ok(mut vecs) => {
            if let Err(e) = ctx.store().attach_turn_vector(turn_id, &vecs.remove(0)) {
                warn!(kind = %e.kind(), error = %e, turn_id, "turn vector attach failed");
            }
        }
        Err(e) => {
            warn!(kind = %e.kind(), error = %e, turn_id, "turn embedding failed, stored without vector");
        }
    }
}

/// Condense the window's compaction slice. A summariser failure keeps the
/// tail as is; the next trigger crossing retries.
async fn run_compaction<C: BotContext + 'static>(ctx: &Arc<C>) {
    let slice = match ctx.window().compaction_slice() {
        Ok(slice) if !slice.is_empty() => slice,
        Ok(_) => return,
        Err(e) => {
            warn!(kind = %e.kind(), error = %e, "compaction slice unavailable");
            return;
        }
    };
    if let Err(e) = summarize_slice(ctx, &slice).await {
        warn!(kind = %e.kind(), error = %e, "compaction failed, keeping tail");
    }
}

/// Re-embed turns that were stored without vectors (embedder outage).
/// Called once on startup; quietly does nothing when there is no backlog.
pub async fn reconcile_missing_vectors<C: BotContext + 'static>(ctx: &Arc<C>, limit: usize) {
    let missing = match ctx.store().turns_missing_vectors(limit) {
        Ok(turns) => turns,
        Err(e) => {
            warn!(kind = %e.kind(), error = %e, "vector reconcile scan failed");
            return;
        }
    };
    if missing.is_empty() {
        return;
    }
    info!(count = missing.len(), "re-embedding turns without vectors");
    for turn in missing {
        embed_turn(ctx, turn.turn_id, &turn.text).await;
    }
}
