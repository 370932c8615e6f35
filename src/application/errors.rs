//! Application layer errors

use thiserror::Error;

use crate::domain::entities::Reaction;

/// General bot errors
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    #[error("Connection closed: {0}")]
    Closed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BotError {
    /// Whether the run loop has to stop after this error
    pub fn is_fatal(&self) -> bool {
        matches!(self, BotError::Auth(_) | BotError::Closed(_))
    }
}

/// Command execution errors
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Command not found: {0}")]
    NotFound(String),

    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("Missing: {0}")]
    Missing(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
}

impl CommandError {
    /// Reaction marker attached to the triggering message for this failure
    pub fn reaction(&self) -> Reaction {
        match self {
            CommandError::NotFound(_) => Reaction::NotFound,
            CommandError::InvalidArgs(_) => Reaction::BadParameters,
            CommandError::Missing(_) => Reaction::Warning,
            CommandError::ExecutionFailed(_) => Reaction::Error,
        }
    }
}

impl From<StorageError> for CommandError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(what) => CommandError::Missing(what),
            other => CommandError::ExecutionFailed(other.to_string()),
        }
    }
}

impl From<TeamError> for CommandError {
    fn from(err: TeamError) -> Self {
        CommandError::InvalidArgs(err.to_string())
    }
}

impl From<RenderError> for CommandError {
    fn from(err: RenderError) -> Self {
        CommandError::ExecutionFailed(err.to_string())
    }
}

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store is closed")]
    Closed,
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Team assembly errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TeamError {
    #[error("Team size {size} is invalid for a pool of {pool} members (at most half the pool)")]
    InvalidSize { size: usize, pool: usize },
}

/// Image rendering errors
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("Unexpected status {0}")]
    Status(u16),

    #[error("Image larger than {0} bytes")]
    TooLarge(u64),

    #[error("Decode failed: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Empty image")]
    Empty,
}
