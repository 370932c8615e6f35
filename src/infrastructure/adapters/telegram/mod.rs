//! Telegram adapter

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use crate::application::errors::BotError;
use crate::domain::entities::{Message, User};
use crate::domain::traits::{Bot, BotInfo, MessageHandle};

/// Telegram API base URL
const API_BASE: &str = "https://api.telegram.org";

/// Seconds a getUpdates call may wait for new messages
const POLL_TIMEOUT: u64 = 30;

/// Characters MarkdownV2 reserves outside of code
const MARKDOWN_V2_SPECIAL: &[char] = &[
    '_', '[', ']', '(', ')', '~', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!', '\\',
];

/// Telegram update type
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<TgMessage>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TgMessage {
    pub message_id: i64,
    pub from: Option<TgUser>,
    pub chat: Chat,
    pub text: Option<String>,
    pub date: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TgUser {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub username: Option<String>,
    pub first_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type", default)]
    pub kind: String,
}

/// Envelope around every Bot API answer
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    message_id: i64,
}

/// Telegram bot adapter
pub struct TelegramAdapter {
    token: String,
    client: Client,
    info: BotInfo,
    offset: AtomicI64,
}

impl TelegramAdapter {
    /// Authenticate with `getMe`; a rejected token is [`BotError::Auth`]
    pub async fn connect(token: impl Into<String>) -> Result<Self, BotError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(POLL_TIMEOUT + 10))
            .build()
            .map_err(|e| BotError::Network(e.to_string()))?;
        let mut adapter = Self {
            token: token.into(),
            client,
            info: BotInfo {
                id: "unknown".to_string(),
                name: "hinko".to_string(),
                username: "hinko".to_string(),
            },
            offset: AtomicI64::new(0),
        };
        adapter.fetch_bot_info().await?;
        Ok(adapter)
    }

    /// Get the API URL for a method
    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", API_BASE, self.token, method)
    }

    async fn call<Req, Res>(&self, method: &str, request: &Req) -> Result<Res, BotError>
    where
        Req: Serialize + ?Sized + Sync,
        Res: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.api_url(method))
            .json(request)
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(BotError::Auth(format!("Telegram rejected the token ({})", method)));
        }

        let data: ApiResponse<Res> = response
            .json()
            .await
            .map_err(|e| BotError::Parse(e.to_string()))?;

        match data.result {
            Some(result) if data.ok => Ok(result),
            _ => Err(BotError::Network(format!(
                "Telegram API error {} on {}: {}",
                status,
                method,
                data.description.unwrap_or_default()
            ))),
        }
    }

    /// Fetch bot info from Telegram API
    pub async fn fetch_bot_info(&mut self) -> Result<(), BotError> {
        #[derive(Deserialize)]
        struct Me {
            id: i64,
            first_name: String,
            username: Option<String>,
        }

        let me: Me = self.call("getMe", &serde_json::json!({})).await?;
        self.info = BotInfo {
            id: me.id.to_string(),
            username: me.username.unwrap_or_else(|| me.first_name.clone()),
            name: me.first_name,
        };
        Ok(())
    }

    /// Get updates from Telegram using getUpdates API
    pub async fn get_updates(&self, offset: i64, timeout: u64) -> Result<Vec<Update>, BotError> {
        #[derive(Serialize)]
        struct GetUpdatesRequest {
            offset: i64,
            timeout: u64,
            allowed_updates: Vec<&'static str>,
        }

        let request = GetUpdatesRequest {
            offset,
            timeout,
            allowed_updates: vec!["message"],
        };
        self.call("getUpdates", &request).await
    }

    /// Get the next update offset
    pub fn next_offset(updates: &[Update]) -> Option<i64> {
        updates.iter().map(|u| u.update_id + 1).max()
    }

    /// Turn an update into a [`Message`]; updates without text are dropped
    pub fn convert_update(update: Update, bot_username: &str) -> Option<Message> {
        let msg = update.message?;
        let text = msg.text?;

        let mention = format!("@{}", bot_username);
        let trimmed = text.trim_start();
        let mentions_bot = trimmed
            .get(..mention.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(&mention))
            && trimmed[mention.len()..]
                .chars()
                .next()
                .map_or(true, |c| c.is_whitespace() || c == ':' || c == ',');

        let sender = msg.from.map(|u| {
            let mut user = User::new(u.id.to_string());
            user.username = u.username;
            user.first_name = u.first_name;
            user.is_bot = u.is_bot;
            user
        });

        let mut message = Message::new(msg.chat.id.to_string(), text)
            .with_id(msg.message_id.to_string())
            .with_sender_opt(sender)
            .with_platform("telegram");
        if let Some(at) = msg.date.and_then(|d| chrono::DateTime::from_timestamp(d, 0)) {
            message.timestamp = at;
        }
        message.is_direct = msg.chat.kind == "private";
        message.mentions_bot = mentions_bot;
        Some(message)
    }

    /// Escape for MarkdownV2, keeping `*bold*` and backtick code as markup
    pub fn escape_markdown(text: &str) -> String {
        let mut out = String::with_capacity(text.len() + 16);
        let mut in_code = false;
        let mut chars = text.chars().peekable();

        while let Some(c) = chars.next() {
            if c == '`' {
                out.push(c);
                // ``` opens and closes blocks the same way a single tick does
                while chars.peek() == Some(&'`') {
                    out.push('`');
                    chars.next();
                }
                in_code = !in_code;
                continue;
            }
            if in_code {
                if c == '\\' {
                    out.push('\\');
                }
                out.push(c);
            } else {
                if MARKDOWN_V2_SPECIAL.contains(&c) {
                    out.push('\\');
                }
                out.push(c);
            }
        }
        out
    }

    /// Send a message via Telegram API - try MarkdownV2, fallback to plain
    async fn send_text(&self, chat_id: &str, text: &str) -> Result<i64, BotError> {
        #[derive(Serialize)]
        struct SendMessageRequest<'a> {
            chat_id: &'a str,
            text: &'a str,
            #[serde(skip_serializing_if = "Option::is_none")]
            parse_mode: Option<&'a str>,
        }

        let escaped = Self::escape_markdown(text);
        let formatted = SendMessageRequest {
            chat_id,
            text: &escaped,
            parse_mode: Some("MarkdownV2"),
        };
        match self.call::<_, SentMessage>("sendMessage", &formatted).await {
            Ok(sent) => Ok(sent.message_id),
            Err(e @ BotError::Auth(_)) => Err(e),
            Err(e) => {
                tracing::warn!("Markdown failed, using plain text: {}", e);
                let plain = SendMessageRequest {
                    chat_id,
                    text,
                    parse_mode: None,
                };
                self.call::<_, SentMessage>("sendMessage", &plain)
                    .await
                    .map(|sent| sent.message_id)
            }
        }
    }

    fn parse_message_id(id: &str) -> Result<i64, BotError> {
        id.parse()
            .map_err(|_| BotError::Parse(format!("not a Telegram message id: {}", id)))
    }
}

#[async_trait]
impl Bot for TelegramAdapter {
    async fn receive(&self) -> Result<Vec<Message>, BotError> {
        let offset = self.offset.load(Ordering::SeqCst);
        let updates = self.get_updates(offset, POLL_TIMEOUT).await?;
        if let Some(next) = Self::next_offset(&updates) {
            self.offset.store(next, Ordering::SeqCst);
        }
        Ok(updates
            .into_iter()
            .filter_map(|u| Self::convert_update(u, &self.info.username))
            .collect())
    }

    async fn send_message(&self, chat_id: &str, text: &str) -> Result<MessageHandle, BotError> {
        tracing::debug!("Sending to {}: {}", chat_id, text.chars().take(100).collect::<String>());
        let id = self.send_text(chat_id, text).await?;
        Ok(MessageHandle::new(chat_id, id.to_string()))
    }

    async fn edit_message(&self, handle: &MessageHandle, text: &str) -> Result<(), BotError> {
        #[derive(Serialize)]
        struct EditRequest<'a> {
            chat_id: &'a str,
            message_id: i64,
            text: &'a str,
            #[serde(skip_serializing_if = "Option::is_none")]
            parse_mode: Option<&'a str>,
        }

        let message_id = Self::parse_message_id(&handle.message_id)?;
        let escaped = Self::escape_markdown(text);
        let formatted = EditRequest {
            chat_id: &handle.chat_id,
            message_id,
            text: &escaped,
            parse_mode: Some("MarkdownV2"),
        };
        // editMessageText answers with the edited message, which is not needed
        match self.call::<_, serde_json::Value>("editMessageText", &formatted).await {
            Ok(_) => Ok(()),
            Err(e @ BotError::Auth(_)) => Err(e),
            Err(_) => {
                let plain = EditRequest {
                    chat_id: &handle.chat_id,
                    message_id,
                    text,
                    parse_mode: None,
                };
                self.call::<_, serde_json::Value>("editMessageText", &plain)
                    .await
                    .map(|_| ())
            }
        }
    }

    async fn add_reaction(&self, chat_id: &str, message_id: &str, emoji: &str) -> Result<(), BotError> {
        let request = serde_json::json!({
            "chat_id": chat_id,
            "message_id": Self::parse_message_id(message_id)?,
            "reaction": [{ "type": "emoji", "emoji": emoji }],
        });
        let _: bool = self.call("setMessageReaction", &request).await?;
        Ok(())
    }

    fn mention(&self, user: &User) -> String {
        match &user.username {
            Some(username) => format!("@{}", username),
            None => user.display_name(),
        }
    }

    fn bot_info(&self) -> BotInfo {
        self.info.clone()
    }
}
