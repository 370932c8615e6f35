//! Domain traits - Abstractions for infrastructure implementations

pub mod bot;
pub mod frames;
pub mod render;
pub mod store;

pub use bot::{Bot, BotInfo, MessageHandle};
pub use frames::FrameSink;
pub use render::ImageRenderer;
pub use store::Store;
