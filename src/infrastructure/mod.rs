//! Infrastructure layer - External concerns
//!
//! This layer contains:
//! - Config: Configuration loading
//! - Storage / Database: key-value persistence
//! - Adapters: Platform integrations (Telegram, console)
//! - Ascii: image to text rendering

pub mod adapters;
pub mod ascii;
pub mod config;
pub mod database;
pub mod storage;
