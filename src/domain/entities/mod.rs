//! Domain entities - Core business objects with no external dependencies

pub mod user;
pub mod message;
pub mod command;
pub mod reaction;
pub mod score;

pub use user::User;
pub use message::Message;
pub use command::{
    Command, CommandKind, CommandRegistry, CommandTag, GroupAction, ScoreAction,
};
pub use reaction::{Reaction, ReactionSet};
pub use score::{order_team_names, MatchEntry, ScoreRecord};
