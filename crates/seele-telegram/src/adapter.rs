//! Wraps a teloxide `Bot` + `Dispatcher` and drives the long-polling loop
//! until the process exits.

use std::sync::Arc;

use teloxide::prelude::*;
use tracing::{info, warn};

use seele_agent::BotContext;

use crate::handler::handle_message;
use crate::send;

/// Adapter settings carried through the dispatcher dependency map.
#[derive(Debug, Clone)]
pub struct TelegramSettings {
    /// The single authorised correspondent. Everyone else is ignored.
    pub authorized_user: i64,
}

/// Telegram channel adapter. Long polling — no public URL required.
pub struct TelegramAdapter<C: BotContext + 'static> {
    ctx: Arc<C>,
    bot_token: String,
    settings: TelegramSettings,
}

impl<C: BotContext + 'static> TelegramAdapter<C> {
    pub fn new(ctx: Arc<C>, bot_token: String, authorized_user: i64) -> Self {
        Self {
            ctx,
            bot_token,
            settings: TelegramSettings { authorized_user },
        }
    }

    /// Connect and drive the dispatcher for the lifetime of the process.
    ///
    /// If `proactive_rx` is `Some`, a delivery task forwards scheduler-
    /// produced assistant messages to the authorised chat.
    pub async fn run(self, proactive_rx: Option<tokio::sync::mpsc::Receiver<String>>) {
        let bot = Bot::new(&self.bot_token);

        if let Some(rx) = proactive_rx {
            let bot2 = bot.clone();
            let chat = ChatId(self.settings.authorized_user);
            tokio::spawn(run_proactive_delivery(bot2, chat, rx));
        }

        info!("telegram: starting long-polling dispatcher");

        let ctx = Arc::clone(&self.ctx);
        let settings = self.settings.clone();

        let handler = Update::filter_message().endpoint(handle_message::<C>);

        Dispatcher::builder(bot, handler)
            .dependencies(dptree::deps![ctx, settings])
            .default_handler(|_upd| async {})
            .build()
            .dispatch()
            .await;
    }
}

/// Background task delivering proactive (scheduler-fired) messages.
async fn run_proactive_delivery(
    bot: Bot,
    chat: ChatId,
    mut rx: tokio::sync::mpsc::Receiver<String>,
) {
    info!("telegram: proactive delivery task started");
    while let Some(message) = rx.recv().await {
        if message.is_empty() {
            continue;
        }
        if let Err(e) = send::send_response(&bot, chat, &message).await {
            warn!(error = %e, "telegram: proactive delivery failed");
        }
    }
    warn!("telegram: proactive delivery task ended (channel closed)");
}
