use async_trait::async_trait;
use crate::domain::entities::{Message, User};
use crate::application::errors::BotError;

/// Bot trait - abstraction for messaging platform adapters
#[async_trait]
pub trait Bot: Send + Sync {
    /// Wait for the next batch of inbound messages
    async fn receive(&self) -> Result<Vec<Message>, BotError>;

    /// Send a message to a chat, returning a handle for later edits
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<MessageHandle, BotError>;

    /// Replace the text of a message this bot sent earlier
    async fn edit_message(&self, handle: &MessageHandle, text: &str) -> Result<(), BotError>;

    /// Attach an emoji reaction to a message
    async fn add_reaction(&self, chat_id: &str, message_id: &str, emoji: &str) -> Result<(), BotError>;

    /// Platform-specific way of tagging a user in a shared channel
    fn mention(&self, user: &User) -> String;

    /// Get bot info
    fn bot_info(&self) -> BotInfo;
}

/// Identifies a posted message so it can be edited in place
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageHandle {
    pub chat_id: String,
    pub message_id: String,
}

impl MessageHandle {
    pub fn new(chat_id: impl Into<String>, message_id: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            message_id: message_id.into(),
        }
    }
}

/// Bot information
#[derive(Debug, Clone)]
pub struct BotInfo {
    pub id: String,
    pub name: String,
    pub username: String,
}
