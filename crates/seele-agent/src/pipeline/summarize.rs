//! Summarisation + profile patching — one LLM call on the tool model.
//!
//! The model receives the slice being condensed, the previous summary and
//! the current profile document, and must answer with a strict JSON
//! object: a prose summary plus a JSON-Patch against the profile. A patch
//! that fails validation is dropped (WARN) while the summary is kept —
//! memory keeps working even when the model fumbles the patch.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};

use seele_profile::PatchOp;
use seele_providers::{ChatRequest, Message, Role as MsgRole};
use seele_store::Turn;

use crate::context::BotContext;
use crate::error::{AgentError, Result};

const SUMMARISER_SYSTEM: &str = "You maintain the long-term memory of a companion chatbot. \
You receive a slice of conversation turns, the previous summary (if any), and the current \
profile document (a JSON object describing the bot persona and the user). Respond with ONE \
JSON object and nothing else:\n\
{\"summary\": \"<prose summary of the slice, at most 150 words, written so it can stand \
alone later>\", \"profile_patch\": [<JSON-Patch operations (add/replace/remove with RFC 6901 \
paths) updating the profile with durable new facts>]}\n\
Only patch durable facts (names, preferences, agreements, memorable events). Use an empty \
array when nothing changed. Never invent fields that are not in the document.";

#[derive(Debug, Deserialize)]
struct SummariserReply {
    summary: String,
    #[serde(default)]
    profile_patch: Vec<PatchOp>,
}

/// Condense `slice` into a summary, patch the profile, embed the summary.
/// Returns the new summary id, or `None` for an empty slice.
pub async fn summarize_slice<C: BotContext + 'static>(
    ctx: &Arc<C>,
    slice: &[Turn],
) -> Result<Option<i64>> {
    let (Some(first), Some(last)) = (slice.first(), slice.last()) else {
        return Ok(None);
    };
    let session_id = first.session_id;

    let previous = ctx
        .store()
        .recent_summaries(session_id, 1)?
        .pop()
        .map(|s| s.text);
    let profile = ctx.profile().snapshot();

    let transcript: String = slice
        .iter()
        .map(|t| format!("{}: {}", t.role.to_string().to_uppercase(), t.text))
        .collect::<Vec<_>>()
        .join("\n\n");

    let content = format!(
        "Previous summary:\n{}\n\nCurrent profile document:\n{}\n\nTurns to condense:\n{}",
        previous.as_deref().unwrap_or("(none)"),
        serde_json::to_string_pretty(&profile).unwrap_or_else(|_| profile.to_string()),
        transcript,
    );

    let request = ChatRequest {
        model: ctx.config().tool_model().to_string(),
        system: SUMMARISER_SYSTEM.to_string(),
        messages: vec![Message {
            role: MsgRole::User,
            content,
        }],
        max_tokens: 1024,
        tools: Vec::new(),
        raw_messages: None,
    };

    let response = ctx.chat().send(&request).await?;
    let reply = parse_reply(&response.content)?;

    let summary_id = ctx
        .store()
        .insert_summary(session_id, &reply.summary, first.ts, last.ts, last.turn_id)?;
    info!(summary_id, session_id, turns = slice.len(), "slice summarised");

    // Embedding is best-effort; retrieval skips vectorless rows.
    match ctx.embedder().embed(&[reply.summary.clone()]).await {
        Ok(mut vecs) => {
            if let Err(e) = ctx.store().attach_summary_vector(summary_id, &vecs.remove(0)) {
                warn!(kind = %e.kind(), error = %e, summary_id, "summary vector attach failed");
            }
        }
        Err(e) => {
            warn!(kind = %e.kind(), error = %e, summary_id, "summary embedding failed");
        }
    }

    if !reply.profile_patch.is_empty() {
        if let Err(e) = ctx.profile().apply_patch(&reply.profile_patch) {
            warn!(error = %e, "profile patch rejected, keeping summary");
        }
    }

    Ok(Some(summary_id))
}

/// Pull the strict JSON object out of the model reply (tolerating code
/// fences and preamble around it).
fn parse_reply(raw: &str) -> Result<SummariserReply> {
    let trimmed = raw.trim();
    let json_str = match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if end >= start => &trimmed[start..=end],
        _ => trimmed,
    };
    let reply: SummariserReply = serde_json::from_str(json_str)
        .map_err(|e| AgentError::MalformedReply(format!("summariser reply: {e}")))?;
    if reply.summary.trim().is_empty() {
        return Err(AgentError::MalformedReply("empty summary".into()));
    }
    Ok(reply)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fenced_reply() {
        let raw = "```json\n{\"summary\": \"we talked\", \"profile_patch\": []}\n```";
        let reply = parse_reply(raw).unwrap();
        assert_eq!(reply.summary, "we talked");
        assert!(reply.profile_patch.is_empty());
    }

    #[test]
    fn parses_patch_ops() {
        let raw = r#"{"summary": "s", "profile_patch":
            [{"op": "replace", "path": "/user/name", "value": "Anna"}]}"#;
        let reply = parse_reply(raw).unwrap();
        assert_eq!(reply.profile_patch.len(), 1);
        assert_eq!(reply.profile_patch[0].path, "/user/name");
    }

    #[test]
    fn missing_patch_defaults_to_empty() {
        let reply = parse_reply(r#"{"summary": "only prose"}"#).unwrap();
        assert!(reply.profile_patch.is_empty());
    }

    #[test]
    fn garbage_is_a_malformed_reply() {
        assert!(parse_reply("no json here").is_err());
        assert!(parse_reply(r#"{"summary": ""}"#).is_err());
    }
}
