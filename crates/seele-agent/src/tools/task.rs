//! `scheduled_task` tool — lets the LLM manage the proactive timers.
//!
//! Hidden from scheduled turns by the registry filter so a firing can
//! never schedule further tasks.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use seele_core::time::{human_time, now_epoch};
use seele_scheduler::ops;
use seele_store::ScheduledTask;

use crate::context::BotContext;

use super::{Tool, ToolResult};

pub struct ScheduledTaskTool<C: BotContext + 'static> {
    ctx: Arc<C>,
}

impl<C: BotContext + 'static> ScheduledTaskTool<C> {
    pub fn new(ctx: Arc<C>) -> Self {
        Self { ctx }
    }

    fn render(&self, task: &ScheduledTask) -> String {
        let tz = self.ctx.config().tz();
        format!(
            "- ID: {} | Name: {} | Type: {} | Next: {} | Status: {}",
            task.task_id,
            task.name,
            task.trigger.trigger_type(),
            human_time(task.next_run_at, tz),
            task.status,
        )
    }

    fn create(&self, input: &Value) -> ToolResult {
        let name = match input.get("name").and_then(Value::as_str) {
            Some(n) if !n.trim().is_empty() => n,
            _ => return ToolResult::error("'name' is required for create"),
        };
        let message = match input.get("message").and_then(Value::as_str) {
            Some(m) if !m.is_empty() => m,
            _ => return ToolResult::error("'message' is required for create"),
        };
        let store = self.ctx.store();
        let now = now_epoch();
        let tz = self.ctx.config().tz();

        let created = match input.get("trigger_type").and_then(Value::as_str) {
            Some("once") => {
                let when = match input.get("when").and_then(Value::as_str) {
                    Some(w) => w,
                    None => {
                        return ToolResult::error(
                            "'when' is required for once tasks (epoch seconds, ISO-8601, \
                             'in N minutes', 'tomorrow', 'next week')",
                        )
                    }
                };
                ops::create_once(store, name, when, message, now, tz)
            }
            Some("interval") => {
                let every = match input.get("every").and_then(Value::as_str) {
                    Some(e) => e,
                    None => {
                        return ToolResult::error(
                            "'every' is required for interval tasks (30s, 5m, 1h, 1d, 1w, \
                             or seconds)",
                        )
                    }
                };
                ops::create_interval(store, name, every, message, now)
            }
            _ => return ToolResult::error("'trigger_type' must be 'once' or 'interval'"),
        };

        match created {
            Ok(task) => ToolResult::success(format!("Task scheduled.\n{}", self.render(&task))),
            Err(e) => ToolResult::error(format!("{}: {e}", e.kind())),
        }
    }

    fn list(&self) -> ToolResult {
        match self.ctx.store().list_tasks() {
            Ok(tasks) if tasks.is_empty() => ToolResult::success("No scheduled tasks."),
            Ok(tasks) => {
                let mut out = format!("Scheduled tasks ({}):\n", tasks.len());
                for task in &tasks {
                    out.push_str(&self.render(task));
                    out.push('\n');
                }
                ToolResult::success(out)
            }
            Err(e) => ToolResult::error(format!("{}: {e}", e.kind())),
        }
    }

    fn get(&self, input: &Value) -> ToolResult {
        let Some(id) = input.get("task_id").and_then(Value::as_str) else {
            return ToolResult::error("'task_id' is required for get");
        };
        match self.ctx.store().task(id) {
            Ok(task) => ToolResult::success(format!(
                "{}\nMessage: {}\nLast run: {}",
                self.render(&task),
                task.message,
                task.last_run_at
                    .map(|ts| human_time(ts, self.ctx.config().tz()))
                    .unwrap_or_else(|| "never".into()),
            )),
            Err(e) => ToolResult::error(format!("{}: {e}", e.kind())),
        }
    }

    fn transition(&self, input: &Value, action: &str) -> ToolResult {
        let Some(id) = input.get("task_id").and_then(Value::as_str) else {
            return ToolResult::error(format!("'task_id' is required for {action}"));
        };
        let store = self.ctx.store();
        let result = match action {
            "pause" => ops::pause(store, id),
            "resume" => ops::resume(store, id),
            "cancel" => ops::cancel(store, id),
            _ => unreachable!("transition called with unknown action"),
        };
        match result {
            Ok(()) => ToolResult::success(format!("Task '{id}' {action}d.")),
            Err(e) => ToolResult::error(format!("{}: {e}", e.kind())),
        }
    }
}

#[async_trait]
impl<C: BotContext + 'static> Tool for ScheduledTaskTool<C> {
    fn name(&self) -> &str {
        "scheduled_task"
    }

    fn description(&self) -> &str {
        "Manage proactive timers. Use when the user wants to be reminded, \
         checked in on, or messaged at a future time. A fired task hands \
         you its briefing so you can act on it. Actions: create (once or \
         interval), list, get, pause, resume, cancel."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "action": {
                    "type": "string",
                    "enum": ["create", "list", "get", "pause", "resume", "cancel"],
                    "description": "Operation to perform."
                },
                "name": {
                    "type": "string",
                    "description": "Short task label. Required for create."
                },
                "message": {
                    "type": "string",
                    "description": "Briefing handed back to you when the task fires. Required for create."
                },
                "trigger_type": {
                    "type": "string",
                    "enum": ["once", "interval"],
                    "description": "Fire once or repeatedly. Required for create."
                },
                "when": {
                    "type": "string",
                    "description": "For once: epoch seconds, ISO-8601 datetime, 'in N seconds|minutes|hours|days', 'tomorrow', or 'next week'."
                },
                "every": {
                    "type": "string",
                    "description": "For interval: 30s, 5m, 1h, 1d, 1w, or a positive integer of seconds."
                },
                "task_id": {
                    "type": "string",
                    "description": "Task ID from create/list. Required for get, pause, resume, cancel."
                }
            },
            "required": ["action"]
        })
    }

    async fn execute(&self, input: Value) -> ToolResult {
        let action = match input.get("action").and_then(Value::as_str) {
            Some(a) => a,
            None => return ToolResult::error("missing required field 'action'"),
        };
        match action {
            "create" => self.create(&input),
            "list" => self.list(),
            "get" => self.get(&input),
            "pause" | "resume" | "cancel" => self.transition(&input, action),
            other => ToolResult::error(format!(
                "unknown action '{other}': must be create, list, get, pause, resume or cancel"
            )),
        }
    }
}
