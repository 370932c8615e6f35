use serde::{Deserialize, Serialize};

/// Marker reaction explaining why a command produced (or skipped) output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reaction {
    NotFound,
    BadParameters,
    Error,
    Success,
    Warning,
}

/// Emoji used for each reaction marker
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ReactionSet {
    pub not_found: String,
    pub bad_parameters: String,
    pub error: String,
    pub success: String,
    pub warning: String,
}

impl ReactionSet {
    pub fn emoji(&self, reaction: Reaction) -> &str {
        match reaction {
            Reaction::NotFound => &self.not_found,
            Reaction::BadParameters => &self.bad_parameters,
            Reaction::Error => &self.error,
            Reaction::Success => &self.success,
            Reaction::Warning => &self.warning,
        }
    }
}

// Telegram only accepts reactions from a fixed emoji list.
impl Default for ReactionSet {
    fn default() -> Self {
        Self {
            not_found: "🤷".to_string(),
            bad_parameters: "👎".to_string(),
            error: "👾".to_string(),
            success: "👌".to_string(),
            warning: "🤔".to_string(),
        }
    }
}
