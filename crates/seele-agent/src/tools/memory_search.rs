//! `search_memories` tool — boolean full-text search over past turns and
//! summaries, excluding the active session.

use std::sync::Arc;

use async_trait::async_trait;
use chrono_tz::Tz;
use serde_json::{json, Value};

use seele_core::time::{human_time, local_day_start, now_epoch, parse_local_date};
use seele_store::{FtsFilter, Role, VectorKind};

use crate::context::BotContext;

use super::{Tool, ToolResult};

const DEFAULT_LIMIT: usize = 10;
const MAX_LIMIT: usize = 50;
const DAY_SECS: i64 = 86_400;

pub struct SearchMemoriesTool<C: BotContext + 'static> {
    ctx: Arc<C>,
}

impl<C: BotContext + 'static> SearchMemoriesTool<C> {
    pub fn new(ctx: Arc<C>) -> Self {
        Self { ctx }
    }

    /// Resolve `time_period` / `start_date` / `end_date` into an epoch
    /// range. Explicit dates win over the named period.
    fn time_range(&self, input: &Value, tz: Tz) -> Result<(Option<i64>, Option<i64>), String> {
        let start_date = input.get("start_date").and_then(Value::as_str);
        let end_date = input.get("end_date").and_then(Value::as_str);
        if start_date.is_some() || end_date.is_some() {
            let since = match start_date {
                Some(s) => Some(
                    parse_local_date(s, tz).ok_or_else(|| format!("bad start_date: {s}"))?,
                ),
                None => None,
            };
            // end_date is inclusive: filter until the end of that day.
            let until = match end_date {
                Some(s) => Some(
                    parse_local_date(s, tz).ok_or_else(|| format!("bad end_date: {s}"))?
                        + DAY_SECS,
                ),
                None => None,
            };
            return Ok((since, until));
        }

        let Some(period) = input.get("time_period").and_then(Value::as_str) else {
            return Ok((None, None));
        };
        let now = now_epoch();
        let today = local_day_start(now, tz).unwrap_or(now - now % DAY_SECS);
        match period {
            "today" => Ok((Some(today), None)),
            "yesterday" => Ok((Some(today - DAY_SECS), Some(today))),
            "this_week" => Ok((Some(today - 6 * DAY_SECS), None)),
            "this_month" => Ok((Some(today - 29 * DAY_SECS), None)),
            other => Err(format!(
                "unknown time_period '{other}': use today, yesterday, this_week or this_month"
            )),
        }
    }
}

#[async_trait]
impl<C: BotContext + 'static> Tool for SearchMemoriesTool<C> {
    fn name(&self) -> &str {
        "search_memories"
    }

    fn description(&self) -> &str {
        "Search your long-term memory of past conversations by keyword. \
         Supports boolean queries: AND, OR, NOT, exact phrases in double \
         quotes, prefix matching with *. Returns matching past turns and \
         conversation summaries with their timestamps. The current \
         conversation is never searched."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Boolean full-text query, e.g. '(piano OR concert) NOT recital'."
                },
                "role": {
                    "type": "string",
                    "enum": ["user", "assistant"],
                    "description": "Only match turns spoken by this role."
                },
                "time_period": {
                    "type": "string",
                    "enum": ["today", "yesterday", "this_week", "this_month"],
                    "description": "Named time window, evaluated in the configured time zone."
                },
                "start_date": {
                    "type": "string",
                    "description": "Inclusive lower bound, YYYY-MM-DD local date. Overrides time_period."
                },
                "end_date": {
                    "type": "string",
                    "description": "Inclusive upper bound, YYYY-MM-DD local date. Overrides time_period."
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum results per category (default 10, max 50)."
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, input: Value) -> ToolResult {
        let query = match input.get("query").and_then(Value::as_str) {
            Some(q) if !q.trim().is_empty() => q.to_string(),
            _ => return ToolResult::error("'query' is required"),
        };
        let role = match input.get("role").and_then(Value::as_str) {
            None => None,
            Some(r) => match r.parse::<Role>() {
                Ok(role) => Some(role),
                Err(e) => return ToolResult::error(e),
            },
        };
        let tz = self.ctx.config().tz();
        let (since, until) = match self.time_range(&input, tz) {
            Ok(range) => range,
            Err(e) => return ToolResult::error(e),
        };
        let limit = input
            .get("limit")
            .and_then(Value::as_u64)
            .map(|n| n as usize)
            .unwrap_or(DEFAULT_LIMIT)
            .clamp(1, MAX_LIMIT);

        let active = self.ctx.window().active_session_id();
        let filter = FtsFilter {
            exclude_session: Some(active),
            role,
            since,
            until,
        };

        let store = self.ctx.store();
        let turn_hits = match store.fts_search(VectorKind::Turn, &query, filter, limit) {
            Ok(hits) => hits,
            Err(e) => return ToolResult::error(format!("{}: {e}", e.kind())),
        };
        let summary_hits = match store.fts_search(VectorKind::Summary, &query, filter, limit) {
            Ok(hits) => hits,
            Err(e) => return ToolResult::error(format!("{}: {e}", e.kind())),
        };

        if turn_hits.is_empty() && summary_hits.is_empty() {
            return ToolResult::success(format!("No memories match: {query}"));
        }

        let mut out = String::new();
        if !turn_hits.is_empty() {
            out.push_str("Matching past turns:\n");
            for (id, _) in &turn_hits {
                if let Ok(turn) = store.turn(*id) {
                    out.push_str(&format!(
                        "- [{}] {}: {}\n",
                        human_time(turn.ts, tz),
                        turn.role,
                        turn.text
                    ));
                }
            }
        }
        if !summary_hits.is_empty() {
            out.push_str("Matching conversation summaries:\n");
            for (id, _) in &summary_hits {
                if let Ok(summary) = store.summary(*id) {
                    out.push_str(&format!(
                        "- [{} – {}] {}\n",
                        human_time(summary.first_ts, tz),
                        human_time(summary.last_ts, tz),
                        summary.text
                    ));
                }
            }
        }
        ToolResult::success(out)
    }
}
