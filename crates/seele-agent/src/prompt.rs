//! Prompt assembly — the deterministic function from current state to the
//! ordered transcript sent to the chat model.
//!
//! The system block embeds the profile document verbatim in a delimited
//! region so the model always sees the latest version, followed by the
//! recent summaries of the active session and the retrieved memories with
//! their local timestamps. The history tail follows in chronological
//! order, then the current request.

use chrono_tz::Tz;

use seele_core::time::human_time;
use seele_memory::RetrievalResult;
use seele_providers::{ChatRequest, Message, Role as MsgRole, ToolDefinition};
use seele_store::{Role, Summary, Turn};

pub const PROFILE_BEGIN: &str = "=== LONG-TERM PROFILE ===";
pub const PROFILE_END: &str = "=== END LONG-TERM PROFILE ===";

/// Everything a single assembly needs, gathered by the pipeline.
pub struct AssembleInput<'a> {
    pub profile: &'a serde_json::Value,
    pub recent_summaries: &'a [Summary],
    pub retrieval: &'a RetrievalResult,
    /// Prior turns of the active session, chronological, excluding the
    /// current request.
    pub tail: &'a [Turn],
    /// The new user message, or the scheduler-synthesised prompt.
    pub current: &'a str,
    pub tools: Vec<ToolDefinition>,
}

/// Builds chat requests. Reads nothing from disk — the profile snapshot is
/// handed in by the caller.
pub struct PromptAssembler {
    persona: String,
    tz: Tz,
    model: String,
    max_tokens: u32,
}

impl PromptAssembler {
    pub fn new(persona: Option<String>, tz: Tz, model: String, max_tokens: u32) -> Self {
        Self {
            persona: persona.unwrap_or_else(default_persona),
            tz,
            model,
            max_tokens,
        }
    }

    pub fn assemble(&self, input: AssembleInput<'_>) -> ChatRequest {
        let mut messages: Vec<Message> = input
            .tail
            .iter()
            .map(|turn| Message {
                role: match turn.role {
                    Role::User => MsgRole::User,
                    Role::Assistant => MsgRole::Assistant,
                },
                content: turn.text.clone(),
            })
            .collect();
        messages.push(Message {
            role: MsgRole::User,
            content: input.current.to_string(),
        });

        ChatRequest {
            model: self.model.clone(),
            system: self.system_block(input.profile, input.recent_summaries, input.retrieval),
            messages,
            max_tokens: self.max_tokens,
            tools: input.tools,
            raw_messages: None,
        }
    }

    fn system_block(
        &self,
        profile: &serde_json::Value,
        summaries: &[Summary],
        retrieval: &RetrievalResult,
    ) -> String {
        let mut out = String::with_capacity(4096);
        out.push_str(&self.persona);

        out.push_str("\n\n");
        out.push_str(PROFILE_BEGIN);
        out.push('\n');
        out.push_str(
            &serde_json::to_string_pretty(profile).unwrap_or_else(|_| profile.to_string()),
        );
        out.push('\n');
        out.push_str(PROFILE_END);

        out.push_str("\n\n## Recent summaries of this conversation\n");
        if summaries.is_empty() {
            out.push_str("(none yet)\n");
        }
        for summary in summaries {
            out.push_str(&format!(
                "- [{} – {}] {}\n",
                human_time(summary.first_ts, self.tz),
                human_time(summary.last_ts, self.tz),
                summary.text
            ));
        }

        out.push_str("\n## Retrieved memories from earlier conversations\n");
        if retrieval.summaries.is_empty() && retrieval.turns.is_empty() {
            out.push_str("(nothing relevant recalled)\n");
        }
        for summary in &retrieval.summaries {
            out.push_str(&format!("- [{}] {}\n", summary.human_time, summary.text));
        }
        for turn in &retrieval.turns {
            out.push_str(&format!(
                "- [{}] {}: {}\n",
                turn.human_time, turn.role, turn.text
            ));
        }

        out
    }
}

fn default_persona() -> String {
    "You are a personal companion with a durable memory. The profile \
     document below is your curated long-term knowledge about yourself and \
     your user; treat it as ground truth and stay in character. Recent \
     summaries condense earlier parts of the current conversation, and \
     retrieved memories come from past conversations with their local \
     timestamps. Weave remembered details in naturally, use tools when \
     they help, and answer in the user's language."
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assembler() -> PromptAssembler {
        PromptAssembler::new(None, chrono_tz::Tz::UTC, "test-model".into(), 1024)
    }

    fn turn(id: i64, role: Role, text: &str) -> Turn {
        Turn {
            turn_id: id,
            session_id: 1,
            ts: 1000 + id,
            role,
            text: text.into(),
        }
    }

    #[test]
    fn system_block_embeds_profile_between_delimiters() {
        let profile = serde_json::json!({"user": {"name": "Anna"}});
        let req = assembler().assemble(AssembleInput {
            profile: &profile,
            recent_summaries: &[],
            retrieval: &RetrievalResult::default(),
            tail: &[],
            current: "hello",
            tools: Vec::new(),
        });

        let begin = req.system.find(PROFILE_BEGIN).expect("begin marker");
        let end = req.system.find(PROFILE_END).expect("end marker");
        assert!(begin < end);
        let region = &req.system[begin..end];
        assert!(region.contains("\"Anna\""));
    }

    #[test]
    fn transcript_is_tail_then_current_request() {
        let profile = serde_json::json!({});
        let tail = vec![
            turn(1, Role::User, "first"),
            turn(2, Role::Assistant, "second"),
        ];
        let req = assembler().assemble(AssembleInput {
            profile: &profile,
            recent_summaries: &[],
            retrieval: &RetrievalResult::default(),
            tail: &tail,
            current: "third",
            tools: Vec::new(),
        });

        assert_eq!(req.messages.len(), 3);
        assert_eq!(req.messages[0].content, "first");
        assert_eq!(req.messages[1].role, MsgRole::Assistant);
        assert_eq!(req.messages[2].content, "third");
    }

    #[test]
    fn summaries_and_memories_render_with_local_times() {
        let profile = serde_json::json!({});
        let summaries = vec![Summary {
            summary_id: 1,
            session_id: 1,
            text: "we planned a trip".into(),
            first_ts: 0,
            last_ts: 60,
            last_turn_id: 2,
        }];
        let retrieval = RetrievalResult {
            summaries: vec![],
            turns: vec![seele_memory::RetrievedTurn {
                turn_id: 9,
                role: Role::User,
                text: "pack the tent".into(),
                human_time: "1970-01-01 00:05".into(),
            }],
        };
        let req = assembler().assemble(AssembleInput {
            profile: &profile,
            recent_summaries: &summaries,
            retrieval: &retrieval,
            tail: &[],
            current: "x",
            tools: Vec::new(),
        });

        assert!(req.system.contains("we planned a trip"));
        assert!(req.system.contains("1970-01-01 00:00"));
        assert!(req.system.contains("[1970-01-01 00:05] user: pack the tent"));
    }

    #[test]
    fn assembly_is_deterministic() {
        let profile = serde_json::json!({"user": {"name": "Anna"}});
        let build = || {
            assembler().assemble(AssembleInput {
                profile: &profile,
                recent_summaries: &[],
                retrieval: &RetrievalResult::default(),
                tail: &[],
                current: "hello",
                tools: Vec::new(),
            })
        };
        assert_eq!(build().system, build().system);
    }
}
