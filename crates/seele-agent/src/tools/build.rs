//! Registry assembly. Tools are rebuilt per turn; the invocation filter is
//! the recursion guard: a scheduled firing never sees the task tool, and
//! summarisation never sees memory search.

use std::sync::Arc;

use crate::context::BotContext;

use super::mcp::McpTool;
use super::memory_search::SearchMemoriesTool;
use super::task::ScheduledTaskTool;
use super::{Invocation, Tool};

pub fn build_tools<C: BotContext + 'static>(
    ctx: Arc<C>,
    invocation: Invocation,
) -> Vec<Box<dyn Tool>> {
    let mut tools: Vec<Box<dyn Tool>> = Vec::new();

    if invocation != Invocation::Summarize {
        tools.push(Box::new(SearchMemoriesTool::new(Arc::clone(&ctx))));
    }
    if invocation != Invocation::Scheduled {
        tools.push(Box::new(ScheduledTaskTool::new(Arc::clone(&ctx))));
    }
    for client in ctx.mcp_clients() {
        tools.extend(McpTool::all_from(client));
    }

    tools
}
