//! Message handler registered in the teloxide Dispatcher.

use std::sync::Arc;

use teloxide::prelude::*;
use tracing::warn;

use seele_agent::pipeline::{handle_command, process_user_turn};
use seele_agent::BotContext;

use crate::adapter::TelegramSettings;
use crate::send;
use crate::typing::TypingHandle;

/// Runs for every incoming `Message`:
/// 1. Bot-message filter
/// 2. Authorised-correspondent check (deny-by-default)
/// 3. Slash command interception (`/new`, `/reset`, `/status`, `/help`)
/// 4. LLM pipeline invocation with a typing indicator
pub async fn handle_message<C: BotContext + 'static>(
    bot: Bot,
    msg: Message,
    ctx: Arc<C>,
    settings: TelegramSettings,
) -> ResponseResult<()> {
    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };
    if from.is_bot {
        return Ok(());
    }

    if !is_authorized(from.id.0, settings.authorized_user) {
        warn!(sender = from.id.0, "telegram: message from unauthorised sender dropped");
        return Ok(());
    }

    let text = msg.text().unwrap_or("").trim().to_string();
    if text.is_empty() {
        return Ok(());
    }

    if text.starts_with('/') {
        if let Some(response) = handle_command(&ctx, &text).await {
            if let Err(e) = send::send_response(&bot, msg.chat.id, &response).await {
                warn!(error = %e, "telegram: command reply failed");
            }
            return Ok(());
        }
    }

    // Run the pipeline in its own task so long turns don't stall polling;
    // the context's turn lock still serialises actual processing.
    let bot2 = bot.clone();
    let chat_id = msg.chat.id;
    tokio::spawn(async move {
        let typing = TypingHandle::start(bot2.clone(), chat_id);
        let result = process_user_turn(&ctx, &text).await;
        typing.stop();

        match result {
            Ok(outcome) if !outcome.content.is_empty() => {
                if let Err(e) = send::send_response(&bot2, chat_id, &outcome.content).await {
                    warn!(error = %e, "telegram: reply delivery failed");
                }
            }
            Ok(_) => {}
            Err(e) => {
                // The user's input was not silently dropped: the failure is
                // logged with its kind and surfaced as an apology so the
                // user can retry.
                warn!(kind = %e.kind(), error = %e, "telegram: turn failed");
                if let Err(e) = send::send_response(
                    &bot2,
                    chat_id,
                    "Sorry, something went wrong on my side. Please say that again in a moment.",
                )
                .await
                {
                    warn!(error = %e, "telegram: apology delivery failed");
                }
            }
        }
    });

    Ok(())
}

/// Deny-by-default: only the configured correspondent is served.
pub fn is_authorized(sender_id: u64, authorized_user: i64) -> bool {
    authorized_user >= 0 && sender_id == authorized_user as u64
}
