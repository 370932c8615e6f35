use async_trait::async_trait;
use crate::application::errors::BotError;
use super::MessageHandle;

/// Where animation frames go: one post, then in-place edits
#[async_trait]
pub trait FrameSink: Send + Sync {
    async fn post(&self, text: &str) -> Result<MessageHandle, BotError>;
    async fn edit(&self, handle: &MessageHandle, text: &str) -> Result<(), BotError>;
}
