//! Application services - Business logic orchestration

pub mod animation_service;
pub mod group_service;
pub mod message_service;
pub mod score_service;

pub use animation_service::{AnimationDriver, ChannelSink, EditFailurePolicy};
pub use group_service::GroupRegistry;
pub use message_service::MessageService;
pub use score_service::ScoreLedger;
