use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use crate::application::errors::ConfigError;

/// A closed set of handler tags a registry can route to
pub trait CommandTag: Copy + Eq + Hash + Debug + Send + Sync + 'static {
    /// Every tag that must be reachable from the registry
    const ALL: &'static [Self];
}

/// Top-level commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Help,
    Put,
    Get,
    Shark,
    Animate,
    RandomPairs,
    RandomTeams,
    Group,
    Ascii,
    Score,
}

impl CommandTag for CommandKind {
    const ALL: &'static [Self] = &[
        CommandKind::Help,
        CommandKind::Put,
        CommandKind::Get,
        CommandKind::Shark,
        CommandKind::Animate,
        CommandKind::RandomPairs,
        CommandKind::RandomTeams,
        CommandKind::Group,
        CommandKind::Ascii,
        CommandKind::Score,
    ];
}

/// `group <name> <action>` subcommands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupAction {
    List,
    Set,
    Add,
    Remove,
}

impl CommandTag for GroupAction {
    const ALL: &'static [Self] = &[
        GroupAction::List,
        GroupAction::Set,
        GroupAction::Add,
        GroupAction::Remove,
    ];
}

/// `score <action> ...` subcommands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoreAction {
    Add,
    Get,
    Reset,
}

impl CommandTag for ScoreAction {
    const ALL: &'static [Self] = &[ScoreAction::Add, ScoreAction::Get, ScoreAction::Reset];
}

/// Represents a bot command bound to a handler tag
#[derive(Debug, Clone)]
pub struct Command<K> {
    pub name: String,
    pub kind: K,
    pub aliases: Vec<String>,
    pub usage: Vec<String>,
}

impl<K: CommandTag> Command<K> {
    pub fn new(name: impl Into<String>, kind: K) -> Self {
        Self {
            name: name.into(),
            kind,
            aliases: Vec::new(),
            usage: Vec::new(),
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn with_usage(mut self, usage: impl Into<String>) -> Self {
        self.usage.push(usage.into());
        self
    }

    fn names(&self) -> impl Iterator<Item = &String> {
        std::iter::once(&self.name).chain(self.aliases.iter())
    }
}

/// Command registry mapping names and aliases to handler tags
#[derive(Debug, Clone)]
pub struct CommandRegistry<K> {
    commands: Vec<Command<K>>,
    index: HashMap<String, usize>,
}

impl<K: CommandTag> Default for CommandRegistry<K> {
    fn default() -> Self {
        Self {
            commands: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<K: CommandTag> CommandRegistry<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command; a name or alias may only be claimed once
    pub fn register(&mut self, command: Command<K>) -> Result<(), ConfigError> {
        if let Some(taken) = command
            .names()
            .find(|n| self.index.contains_key(&n.to_lowercase()))
        {
            return Err(ConfigError::InvalidValue(format!(
                "command name '{}' registered twice",
                taken
            )));
        }

        let slot = self.commands.len();
        for name in command.names() {
            self.index.insert(name.to_lowercase(), slot);
        }
        self.commands.push(command);
        Ok(())
    }

    /// Build and validate a registry in one go
    pub fn build(commands: Vec<Command<K>>) -> Result<Self, ConfigError> {
        let mut registry = Self::new();
        for command in commands {
            registry.register(command)?;
        }
        registry.validate()?;
        Ok(registry)
    }

    /// Every tag has exactly one command entry
    pub fn validate(&self) -> Result<(), ConfigError> {
        for kind in K::ALL {
            let count = self.commands.iter().filter(|c| c.kind == *kind).count();
            if count != 1 {
                return Err(ConfigError::InvalidValue(format!(
                    "{:?} has {} command entries, expected exactly one",
                    kind, count
                )));
            }
        }
        Ok(())
    }

    /// Case-insensitive lookup by name or alias
    pub fn find(&self, input: &str) -> Option<&Command<K>> {
        self.index
            .get(&input.to_lowercase())
            .map(|&slot| &self.commands[slot])
    }

    pub fn resolve(&self, input: &str) -> Option<K> {
        self.find(input).map(|c| c.kind)
    }

    /// Commands in registration order
    pub fn all(&self) -> impl Iterator<Item = &Command<K>> {
        self.commands.iter()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
