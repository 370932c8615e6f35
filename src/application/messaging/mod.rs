//! Message handling - parsing addressed messages and dispatching commands

pub mod dispatcher;
pub mod parser;

pub use dispatcher::{AnimationSettings, CommandDispatcher, ReservedGroups, Response};
pub use parser::{MessageParser, ParsedCommand};
