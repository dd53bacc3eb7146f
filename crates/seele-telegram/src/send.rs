//! Outbound message delivery with Telegram's length limit handled.

use teloxide::prelude::*;

use crate::error::TelegramError;

/// Telegram rejects messages over 4096 UTF-16 code units; stay safely under.
const CHUNK_LIMIT: usize = 4000;

/// Send `text` to `chat_id`, splitting into chunks when necessary. Stops at
/// the first transport failure; later chunks are not attempted.
pub async fn send_response(bot: &Bot, chat_id: ChatId, text: &str) -> Result<(), TelegramError> {
    for chunk in chunk_text(text, CHUNK_LIMIT) {
        bot.send_message(chat_id, chunk)
            .await
            .map_err(TelegramError::Teloxide)?;
    }
    Ok(())
}

/// Split on char boundaries, preferring newlines near the limit.
pub(crate) fn chunk_text(text: &str, limit: usize) -> Vec<String> {
    if text.len() <= limit {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut rest = text;
    while rest.len() > limit {
        let mut cut = limit;
        while !rest.is_char_boundary(cut) {
            cut -= 1;
        }
        // Prefer breaking at the last newline in the window.
        if let Some(nl) = rest[..cut].rfind('\n') {
            if nl > limit / 2 {
                cut = nl;
            }
        }
        chunks.push(rest[..cut].to_string());
        rest = rest[cut..].trim_start_matches('\n');
    }
    if !rest.is_empty() {
        chunks.push(rest.to_string());
    }
    chunks
}
