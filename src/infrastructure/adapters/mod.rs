//! Platform adapters implementing [`Bot`](crate::domain::traits::Bot)

pub mod console;
pub mod telegram;

pub use console::ConsoleAdapter;
pub use telegram::TelegramAdapter;
