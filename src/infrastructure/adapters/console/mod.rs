//! Console adapter for development/testing

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

use crate::application::errors::BotError;
use crate::domain::entities::{Message, User};
use crate::domain::traits::{Bot, BotInfo, MessageHandle};

/// Chat id every console message belongs to
pub const CONSOLE_CHAT: &str = "console";

/// Console bot adapter for local development.
///
/// Every input line is a direct message; replies, edits and reactions are
/// printed to stdout.
pub struct ConsoleAdapter<R = BufReader<Stdin>> {
    info: BotInfo,
    user: User,
    lines: Mutex<Lines<R>>,
    next_id: AtomicU64,
}

impl ConsoleAdapter {
    pub fn new() -> Self {
        Self::from_reader(BufReader::new(tokio::io::stdin()))
    }
}

impl Default for ConsoleAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: AsyncBufRead + Unpin + Send> ConsoleAdapter<R> {
    pub fn from_reader(reader: R) -> Self {
        let user = std::env::var("USER")
            .map(|name| User::new("local").with_username(name))
            .unwrap_or_else(|_| User::new("local"));
        Self {
            info: BotInfo {
                id: CONSOLE_CHAT.to_string(),
                name: "hinko".to_string(),
                username: "hinko".to_string(),
            },
            user,
            lines: Mutex::new(reader.lines()),
            next_id: AtomicU64::new(1),
        }
    }

    fn next_message_id(&self) -> String {
        self.next_id.fetch_add(1, Ordering::SeqCst).to_string()
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> Bot for ConsoleAdapter<R> {
    async fn receive(&self) -> Result<Vec<Message>, BotError> {
        let line = self
            .lines
            .lock()
            .await
            .next_line()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?
            .ok_or_else(|| BotError::Closed("console input ended".to_string()))?;

        if line.trim().is_empty() {
            return Ok(Vec::new());
        }
        let message = Message::new(CONSOLE_CHAT, line)
            .with_id(self.next_message_id())
            .with_sender(self.user.clone())
            .with_platform("console")
            .direct();
        Ok(vec![message])
    }

    async fn send_message(&self, chat_id: &str, text: &str) -> Result<MessageHandle, BotError> {
        let handle = MessageHandle::new(chat_id, self.next_message_id());
        println!("[BOT #{}] {}", handle.message_id, text);
        Ok(handle)
    }

    async fn edit_message(&self, handle: &MessageHandle, text: &str) -> Result<(), BotError> {
        println!("[BOT #{} edited] {}", handle.message_id, text);
        Ok(())
    }

    async fn add_reaction(&self, _chat_id: &str, message_id: &str, emoji: &str) -> Result<(), BotError> {
        println!("[BOT reacts to #{}] {}", message_id, emoji);
        Ok(())
    }

    fn mention(&self, user: &User) -> String {
        user.display_name()
    }

    fn bot_info(&self) -> BotInfo {
        self.info.clone()
    }
}
