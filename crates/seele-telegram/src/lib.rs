//! Telegram transport adapter.
//!
//! Long polling via teloxide, one authorised correspondent
//! (`TELEGRAM_USER_ID`), deny-by-default for everyone else. Handles the
//! slash commands, runs the LLM pipeline for everything else, and delivers
//! scheduler-produced proactive messages to the same chat.

pub mod adapter;
pub mod error;
pub mod handler;
pub mod send;
pub mod typing;

pub use adapter::{TelegramAdapter, TelegramSettings};
pub use error::TelegramError;
