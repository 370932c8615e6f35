//! End-to-end chat scenarios against an in-memory database
//! Run with: cargo test --test bot_scenarios

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;
use tokio::sync::Barrier;

use hinko::application::errors::{BotError, RenderError, StorageError};
use hinko::application::messaging::{AnimationSettings, CommandDispatcher};
use hinko::application::services::{GroupRegistry, MessageService, ScoreLedger};
use hinko::domain::entities::{Message, ReactionSet, User};
use hinko::domain::traits::{Bot, BotInfo, ImageRenderer, MessageHandle, Store};
use hinko::infrastructure::database::SqliteStore;
use hinko::infrastructure::storage::MemoryStore;

static INIT: Once = Once::new();

fn ensure_init() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

/// Records everything the bot would have shown in the chat
#[derive(Default)]
struct ChatLog {
    sent: Mutex<Vec<String>>,
    edits: Mutex<Vec<String>>,
    reactions: Mutex<Vec<String>>,
}

#[async_trait]
impl Bot for ChatLog {
    async fn receive(&self) -> Result<Vec<Message>, BotError> {
        Err(BotError::Closed("no transport in tests".to_string()))
    }

    async fn send_message(&self, chat_id: &str, text: &str) -> Result<MessageHandle, BotError> {
        let mut sent = self.sent.lock().unwrap();
        sent.push(text.to_string());
        Ok(MessageHandle::new(chat_id, sent.len().to_string()))
    }

    async fn edit_message(&self, _handle: &MessageHandle, text: &str) -> Result<(), BotError> {
        self.edits.lock().unwrap().push(text.to_string());
        Ok(())
    }

    async fn add_reaction(&self, _chat_id: &str, _message_id: &str, emoji: &str) -> Result<(), BotError> {
        self.reactions.lock().unwrap().push(emoji.to_string());
        Ok(())
    }

    fn mention(&self, user: &User) -> String {
        format!("@{}", user.display_name())
    }

    fn bot_info(&self) -> BotInfo {
        BotInfo {
            id: "1000".to_string(),
            name: "Hinko".to_string(),
            username: "hinko_bot".to_string(),
        }
    }
}

struct Unreachable;

#[async_trait]
impl ImageRenderer for Unreachable {
    async fn render(&self, _url: &str) -> Result<String, RenderError> {
        Err(RenderError::Status(404))
    }
}

fn service_with(store: Arc<dyn Store>, chat: Arc<ChatLog>, animation: AnimationSettings) -> MessageService {
    let dispatcher = CommandDispatcher::new(store, chat.clone(), Arc::new(Unreachable))
        .unwrap()
        .with_animation(animation);
    MessageService::new(chat, dispatcher)
}

fn sqlite_service(chat: Arc<ChatLog>) -> MessageService {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    service_with(store, chat, AnimationSettings::default())
}

fn dm(text: &str) -> Message {
    Message::new("42", text)
        .direct()
        .with_sender(User::new("7").with_username("alice"))
}

fn channel(text: &str) -> Message {
    Message::new("-100", text).with_sender(User::new("7").with_username("alice"))
}

#[tokio::test]
async fn test_put_then_get_greeting() {
    ensure_init();
    let chat = Arc::new(ChatLog::default());
    let svc = sqlite_service(chat.clone());

    svc.process(&dm("put greeting hello world")).await.unwrap();
    svc.process(&dm("get greeting")).await.unwrap();

    assert_eq!(*chat.sent.lock().unwrap(), vec!["hello world"]);
    assert_eq!(*chat.reactions.lock().unwrap(), vec![ReactionSet::default().success]);
}

#[tokio::test]
async fn test_random_teams_from_stored_group() {
    ensure_init();
    let chat = Arc::new(ChatLog::default());
    let svc = sqlite_service(chat.clone());

    svc.process(&channel("@hinko_bot group devs create ana bor cene dusa eva")).await.unwrap();
    svc.process(&channel("@hinko_bot randomteams 2 devs")).await.unwrap();

    let sent = chat.sent.lock().unwrap();
    let reply = &sent[0];
    assert!(reply.starts_with("@alice "));
    // five members in teams of two: the leftover joins the last team
    assert_eq!(reply.matches("Team ").count(), 2);
    assert_eq!(reply.matches('➕').count(), 1);
    for name in ["ana", "bor", "cene", "dusa", "eva"] {
        assert_eq!(reply.matches(name).count(), 1, "{}", reply);
    }
}

#[tokio::test]
async fn test_group_and_score_flows_react() {
    ensure_init();
    let chat = Arc::new(ChatLog::default());
    let svc = sqlite_service(chat.clone());
    let marks = ReactionSet::default();

    for line in [
        "group devs set ana bor",
        "group devs add cene",
        "group devs remove ana",
        "group devs list",
        "score add reds:blues 10:7",
        "score add blues:reds 3:3",
        "score get blues:reds",
        "score get greens:reds",
        "score fight reds:blues",
        "dance",
    ] {
        svc.process(&dm(line)).await.unwrap();
    }

    let sent = chat.sent.lock().unwrap();
    assert_eq!(sent[0], "`devs` members: bor cene");
    assert!(sent[1].starts_with("*BLUES* leads *REDS* 2:1"), "{}", sent[1]);

    let reactions = chat.reactions.lock().unwrap();
    assert_eq!(
        *reactions,
        vec![
            marks.success.clone(),
            marks.success.clone(),
            marks.success.clone(),
            marks.success.clone(),
            marks.success.clone(),
            marks.warning.clone(),
            marks.error.clone(),
            marks.not_found.clone(),
        ]
    );
}

#[tokio::test]
async fn test_failed_ascii_reacts_error() {
    ensure_init();
    let chat = Arc::new(ChatLog::default());
    let svc = sqlite_service(chat.clone());

    svc.process(&dm("ascii <https://example.invalid/cat.png>")).await.unwrap();
    assert!(chat.sent.lock().unwrap().is_empty());
    assert_eq!(*chat.reactions.lock().unwrap(), vec![ReactionSet::default().error]);
}

#[tokio::test(start_paused = true)]
async fn test_shark_plays_in_the_background() {
    ensure_init();
    let chat = Arc::new(ChatLog::default());
    let animation = AnimationSettings {
        shark_length: 5,
        shark_turns: 1,
        ..AnimationSettings::default()
    };
    let svc = service_with(Arc::new(MemoryStore::new()), chat.clone(), animation);

    let response = svc.process(&dm("shark")).await.unwrap().unwrap();
    assert!(response.text.is_none());
    assert!(response.reaction.is_none());

    tokio::time::sleep(Duration::from_secs(60)).await;

    let sent = chat.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].starts_with("🦈 "));
    assert_eq!(chat.edits.lock().unwrap().len(), 4);
}

/// Holds every armed read until a second read has happened too
struct GatedStore {
    inner: MemoryStore,
    armed: AtomicBool,
    gate: Barrier,
}

impl GatedStore {
    fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            armed: AtomicBool::new(true),
            gate: Barrier::new(2),
        }
    }
}

#[async_trait]
impl Store for GatedStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = self.inner.get(key).await?;
        if self.armed.load(Ordering::SeqCst) {
            self.gate.wait().await;
        }
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.inner.set(key, value).await
    }
}

#[tokio::test]
async fn test_concurrent_group_adds_lose_an_update() {
    ensure_init();
    let store = Arc::new(GatedStore::new());
    let groups = GroupRegistry::new(store.clone());

    let ana = vec!["ana".to_string()];
    let bor = vec!["bor".to_string()];
    let (a, b) = tokio::join!(groups.add_to_group("devs", &ana), groups.add_to_group("devs", &bor));
    a.unwrap();
    b.unwrap();
    store.armed.store(false, Ordering::SeqCst);

    // both read the empty group, the second write wins
    let members = groups.get_group("devs").await.unwrap();
    assert_eq!(members.len(), 1);
}

#[tokio::test]
async fn test_concurrent_score_adds_lose_an_update() {
    ensure_init();
    let store = Arc::new(GatedStore::new());
    let scores = ScoreLedger::new(store.clone());

    let (a, b) = tokio::join!(
        scores.add_score("REDS", "BLUES", 1, 0),
        scores.add_score("REDS", "BLUES", 0, 1)
    );
    a.unwrap();
    b.unwrap();
    store.armed.store(false, Ordering::SeqCst);

    let record = scores.get_scores("BLUES", "REDS").await.unwrap();
    assert_eq!(record.history.len(), 1);
    assert_eq!(record.team1_points + record.team2_points, 1);
}
