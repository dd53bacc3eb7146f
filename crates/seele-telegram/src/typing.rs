//! Typing indicator — Telegram shows "typing…" for ~5 s per action, so the
//! handle re-sends it until stopped.

use std::time::Duration;

use teloxide::prelude::*;
use teloxide::types::ChatAction;

pub struct TypingHandle {
    task: tokio::task::JoinHandle<()>,
}

impl TypingHandle {
    pub fn start(bot: Bot, chat_id: ChatId) -> Self {
        let task = tokio::spawn(async move {
            loop {
                let _ = bot.send_chat_action(chat_id, ChatAction::Typing).await;
                tokio::time::sleep(Duration::from_secs(4)).await;
            }
        });
        Self { task }
    }

    pub fn stop(self) {
        self.task.abort();
    }
}

impl Drop for TypingHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
