use std::sync::Arc;
use std::time::Duration;

use crate::application::errors::BotError;
use crate::application::messaging::{CommandDispatcher, MessageParser, Response};
use crate::domain::entities::{Message, ReactionSet};
use crate::domain::traits::Bot;

/// Pause after a failed receive before polling again
const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Pulls messages from the bot, runs commands and delivers the outcome
pub struct MessageService {
    bot: Arc<dyn Bot>,
    parser: MessageParser,
    dispatcher: CommandDispatcher,
    reactions: ReactionSet,
}

impl MessageService {
    pub fn new(bot: Arc<dyn Bot>, dispatcher: CommandDispatcher) -> Self {
        let parser = MessageParser::new(format!("@{}", bot.bot_info().username));
        Self {
            bot,
            parser,
            dispatcher,
            reactions: ReactionSet::default(),
        }
    }

    pub fn with_reactions(mut self, reactions: ReactionSet) -> Self {
        self.reactions = reactions;
        self
    }

    /// Poll until the transport reports a fatal error
    pub async fn run(&self) -> Result<(), BotError> {
        tracing::info!("Starting message loop...");
        loop {
            match self.bot.receive().await {
                Ok(messages) => {
                    if !messages.is_empty() {
                        tracing::debug!("Received {} messages", messages.len());
                    }
                    for message in messages {
                        if let Err(e) = self.process(&message).await {
                            if e.is_fatal() {
                                return Err(e);
                            }
                            tracing::error!("[{}] failed to answer: {}", message.chat_id, e);
                        }
                    }
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    tracing::error!("Failed to get updates: {}", e);
                    tokio::time::sleep(RETRY_DELAY).await;
                }
            }
        }
    }

    /// Handle one message; `Ok(None)` when it was not meant for the bot
    pub async fn process(&self, message: &Message) -> Result<Option<Response>, BotError> {
        let own_id = self.bot.bot_info().id;
        if message.sender.as_ref().is_some_and(|u| u.is_bot && u.id == own_id) {
            return Ok(None);
        }
        let Some(command) = self.parser.parse(message) else {
            return Ok(None);
        };
        tracing::info!("[{}] command {:?}", message.chat_id, command.parts);

        let response = self.dispatcher.dispatch(message, &command.parts).await;
        self.deliver(message, &response).await?;
        Ok(Some(response))
    }

    async fn deliver(&self, message: &Message, response: &Response) -> Result<(), BotError> {
        if let Some(text) = &response.text {
            let text = match (&message.sender, message.is_direct) {
                (Some(user), false) => format!("{} {}", self.bot.mention(user), text),
                _ => text.clone(),
            };
            self.bot.send_message(&message.chat_id, &text).await?;
        }
        if let Some(reaction) = response.reaction {
            let emoji = self.reactions.emoji(reaction);
            if let Err(e) = self.bot.add_reaction(&message.chat_id, &message.id, emoji).await {
                // a missing marker is not worth failing the command over
                tracing::warn!("[{}] could not react {}: {}", message.chat_id, emoji, e);
            }
        }
        Ok(())
    }
}
