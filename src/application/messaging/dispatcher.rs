//! Command dispatcher - routes tokenized commands to their handlers

use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::SeedableRng;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::application::errors::{CommandError, ConfigError, StorageError};
use crate::application::services::animation_service::{AnimationDriver, ChannelSink, EditFailurePolicy};
use crate::application::services::{GroupRegistry, ScoreLedger};
use crate::domain::entities::{
    Command, CommandKind, CommandRegistry, GroupAction, Message, Reaction, ScoreAction,
};
use crate::domain::rules::{random_teams, Animation};
use crate::domain::traits::{Bot, ImageRenderer, Store};

static TEAM_PAIR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([^:\s]+):([^:\s]+)$").expect("valid regex"));
static SCORE_PAIR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(-?\d+):(-?\d+)$").expect("valid regex"));

/// What a command produced: reply text, a reaction marker, both or neither
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    pub text: Option<String>,
    pub reaction: Option<Reaction>,
}

impl Response {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            reaction: None,
        }
    }

    pub fn reaction(reaction: Reaction) -> Self {
        Self {
            text: None,
            reaction: Some(reaction),
        }
    }

    pub fn silent() -> Self {
        Self::default()
    }
}

/// Group names holding the default team and pair names
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ReservedGroups {
    pub team_names: String,
    pub pair_names: String,
}

impl Default for ReservedGroups {
    fn default() -> Self {
        Self {
            team_names: "teamnames".to_string(),
            pair_names: "pairnames".to_string(),
        }
    }
}

/// Timing and size of the `shark` and `animate` commands
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct AnimationSettings {
    pub delay_ms: u64,
    pub frames: usize,
    pub shark_length: usize,
    pub shark_turns: usize,
    pub on_edit_failure: EditFailurePolicy,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            delay_ms: 300,
            frames: 30,
            shark_length: 30,
            shark_turns: 2,
            on_edit_failure: EditFailurePolicy::Continue,
        }
    }
}

impl AnimationSettings {
    fn driver(&self, animation: Animation) -> AnimationDriver {
        AnimationDriver::new(animation, Duration::from_millis(self.delay_ms))
            .with_edit_failure_policy(self.on_edit_failure)
    }
}

/// Routes commands to handlers backed by the store, groups and scores
pub struct CommandDispatcher {
    commands: CommandRegistry<CommandKind>,
    group_actions: CommandRegistry<GroupAction>,
    score_actions: CommandRegistry<ScoreAction>,
    store: Arc<dyn Store>,
    groups: GroupRegistry,
    scores: ScoreLedger,
    bot: Arc<dyn Bot>,
    renderer: Arc<dyn ImageRenderer>,
    reserved: ReservedGroups,
    animation: AnimationSettings,
    rng: Mutex<StdRng>,
}

impl CommandDispatcher {
    pub fn new(
        store: Arc<dyn Store>,
        bot: Arc<dyn Bot>,
        renderer: Arc<dyn ImageRenderer>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            commands: CommandRegistry::build(default_commands())?,
            group_actions: CommandRegistry::build(group_actions())?,
            score_actions: CommandRegistry::build(score_actions())?,
            groups: GroupRegistry::new(store.clone()),
            scores: ScoreLedger::new(store.clone()),
            store,
            bot,
            renderer,
            reserved: ReservedGroups::default(),
            animation: AnimationSettings::default(),
            rng: Mutex::new(StdRng::from_entropy()),
        })
    }

    pub fn with_reserved_groups(mut self, reserved: ReservedGroups) -> Self {
        self.reserved = reserved;
        self
    }

    pub fn with_animation(mut self, animation: AnimationSettings) -> Self {
        self.animation = animation;
        self
    }

    /// Replace the random source used for team assembly
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = Mutex::new(rng);
        self
    }

    pub fn commands(&self) -> &CommandRegistry<CommandKind> {
        &self.commands
    }

    /// Run the command in `parts` on behalf of `message`
    pub async fn dispatch(&self, message: &Message, parts: &[String]) -> Response {
        let verb = parts.first().map(String::as_str).unwrap_or_default();
        let Some(kind) = self.commands.resolve(verb) else {
            let err = CommandError::NotFound(verb.to_string());
            tracing::debug!("[{}] {}", message.chat_id, err);
            return Response::reaction(err.reaction());
        };

        let result = match kind {
            CommandKind::Help => Ok(Response::text(self.help())),
            CommandKind::Put => self.put(parts).await,
            CommandKind::Get => self.get(parts).await,
            CommandKind::Shark => Ok(self.animate(message, self.shark())),
            CommandKind::Animate => Ok(self.animate(message, self.pendulum())),
            CommandKind::RandomPairs => self.random_pairs(parts).await,
            CommandKind::RandomTeams => self.random_teams(parts).await,
            CommandKind::Group => self.group(parts).await,
            CommandKind::Ascii => self.ascii(parts).await,
            CommandKind::Score => self.score(parts).await,
        };

        result.unwrap_or_else(|e| {
            tracing::info!("[{}] {:?} failed: {}", message.chat_id, kind, e);
            Response::reaction(e.reaction())
        })
    }

    /// Usage listing built from the command table
    pub fn help(&self) -> String {
        let mut help = "Try the following commands:\n".to_string();
        for cmd in self.commands.all() {
            for usage in &cmd.usage {
                help.push_str(&format!("`{}`\n", usage));
            }
        }
        help.push_str(&format!(
            "\n reserved groups: _{}_, _{}_",
            self.reserved.pair_names, self.reserved.team_names
        ));
        help
    }

    async fn put(&self, parts: &[String]) -> Result<Response, CommandError> {
        if parts.len() < 3 {
            return Err(CommandError::InvalidArgs("put <key> <value...>".to_string()));
        }
        let key = &parts[1];
        if key.starts_with("[group::") || key.starts_with("[SCORE]") {
            return Err(CommandError::InvalidArgs(format!("key {} is reserved", key)));
        }
        self.store.set(key, &parts[2..].join(" ")).await?;
        Ok(Response::reaction(Reaction::Success))
    }

    async fn get(&self, parts: &[String]) -> Result<Response, CommandError> {
        let key = parts
            .get(1)
            .ok_or_else(|| CommandError::InvalidArgs("get <key>".to_string()))?;
        let value = self
            .store
            .get(key)
            .await?
            .ok_or_else(|| CommandError::Missing(format!("key {}", key)))?;
        Ok(Response::text(value))
    }

    fn shark(&self) -> Animation {
        Animation::Shark {
            length: self.animation.shark_length,
            turns: self.animation.shark_turns,
        }
    }

    fn pendulum(&self) -> Animation {
        Animation::Pendulum {
            frames: self.animation.frames,
        }
    }

    fn animate(&self, message: &Message, animation: Animation) -> Response {
        let sink = ChannelSink::new(self.bot.clone(), message.chat_id.clone());
        self.animation.driver(animation).spawn(Arc::new(sink));
        Response::silent()
    }

    /// One argument after `offset` names a group, more are the members themselves
    async fn referenced_members(&self, parts: &[String], offset: usize) -> Result<Vec<String>, CommandError> {
        if parts.len() == offset + 1 {
            Ok(self.groups.get_group(&parts[offset]).await?)
        } else {
            Ok(parts[offset..].to_vec())
        }
    }

    /// Names stored in a reserved group; a missing group means no names
    async fn reserved_names(&self, group: &str) -> Result<Vec<String>, CommandError> {
        match self.groups.get_group(group).await {
            Ok(names) => Ok(names),
            Err(StorageError::NotFound(_)) => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn random_pairs(&self, parts: &[String]) -> Result<Response, CommandError> {
        if parts.len() < 2 {
            return Err(CommandError::InvalidArgs("randompairs (<group> | members...)".to_string()));
        }
        let members = self.referenced_members(parts, 1).await?;
        let names = self.reserved_names(&self.reserved.pair_names).await?;
        let text = {
            let mut rng = self.lock_rng()?;
            random_teams(&mut *rng, 2, &members, true, &names, false)?
        };
        Ok(Response::text(text))
    }

    async fn random_teams(&self, parts: &[String]) -> Result<Response, CommandError> {
        if parts.len() < 3 {
            return Err(CommandError::InvalidArgs(
                "randomteams <size> (<group> | members...)".to_string(),
            ));
        }
        let size: usize = parts[1]
            .parse()
            .map_err(|_| CommandError::InvalidArgs(format!("team size {} is not a number", parts[1])))?;
        let members = self.referenced_members(parts, 2).await?;
        let names = self.reserved_names(&self.reserved.team_names).await?;
        let text = {
            let mut rng = self.lock_rng()?;
            random_teams(&mut *rng, size, &members, false, &names, true)?
        };
        Ok(Response::text(text))
    }

    fn lock_rng(&self) -> Result<std::sync::MutexGuard<'_, StdRng>, CommandError> {
        self.rng
            .lock()
            .map_err(|_| CommandError::ExecutionFailed("random source poisoned".to_string()))
    }

    async fn group(&self, parts: &[String]) -> Result<Response, CommandError> {
        if parts.len() < 3 {
            return Err(CommandError::InvalidArgs("group <name> <action> [members...]".to_string()));
        }
        let action = self
            .group_actions
            .resolve(&parts[2])
            .ok_or_else(|| CommandError::ExecutionFailed(format!("unknown group action {}", parts[2])))?;
        let name = &parts[1];
        let members = &parts[3..];

        match action {
            GroupAction::List => {
                let group = self.groups.get_group(name).await?;
                return Ok(Response::text(format!("`{}` members: {}", name, group.join(" "))));
            }
            GroupAction::Set => self.groups.set_group(name, members).await?,
            GroupAction::Add => self.groups.add_to_group(name, members).await?,
            GroupAction::Remove => self.groups.remove_from_group(name, members).await?,
        }
        Ok(Response::reaction(Reaction::Success))
    }

    async fn score(&self, parts: &[String]) -> Result<Response, CommandError> {
        if parts.len() < 3 {
            return Err(CommandError::InvalidArgs("score <action> <team1>:<team2> ...".to_string()));
        }
        let action = self
            .score_actions
            .resolve(&parts[1])
            .ok_or_else(|| CommandError::ExecutionFailed(format!("unknown score action {}", parts[1])))?;
        let (team1, team2) = parse_team_pair(&parts[2])?;

        match action {
            ScoreAction::Add => {
                let raw = parts
                    .get(3)
                    .ok_or_else(|| CommandError::InvalidArgs("score add needs <score1>:<score2>".to_string()))?;
                let (score1, score2) = parse_score_pair(raw)?;
                self.scores.add_score(&team1, &team2, score1, score2).await?;
                Ok(Response::reaction(Reaction::Success))
            }
            ScoreAction::Get => {
                let record = self.scores.get_scores(&team1, &team2).await?;
                Ok(Response::text(ScoreLedger::format_score_message(&record)))
            }
            ScoreAction::Reset => {
                let opening = parts.get(3).map(|raw| parse_score_pair(raw)).transpose()?;
                self.scores.reset_score(&team1, &team2).await?;
                if let Some((score1, score2)) = opening {
                    self.scores.add_score(&team1, &team2, score1, score2).await?;
                }
                Ok(Response::reaction(Reaction::Success))
            }
        }
    }

    async fn ascii(&self, parts: &[String]) -> Result<Response, CommandError> {
        let url = parts
            .get(1)
            .ok_or_else(|| CommandError::InvalidArgs("ascii <image-url>".to_string()))?;
        Ok(Response::text(self.renderer.render(url).await?))
    }
}

/// `reds:blues` -> ("REDS", "BLUES")
pub fn parse_team_pair(input: &str) -> Result<(String, String), CommandError> {
    let caps = TEAM_PAIR
        .captures(input)
        .ok_or_else(|| CommandError::InvalidArgs(format!("{} is not <team1>:<team2>", input)))?;
    Ok((caps[1].to_uppercase(), caps[2].to_uppercase()))
}

/// `21:15` -> (21, 15)
pub fn parse_score_pair(input: &str) -> Result<(i64, i64), CommandError> {
    let invalid = || CommandError::InvalidArgs(format!("{} is not <score1>:<score2>", input));
    let caps = SCORE_PAIR.captures(input).ok_or_else(invalid)?;
    let score1 = caps[1].parse().map_err(|_| invalid())?;
    let score2 = caps[2].parse().map_err(|_| invalid())?;
    Ok((score1, score2))
}

fn default_commands() -> Vec<Command<CommandKind>> {
    vec![
        Command::new("help", CommandKind::Help)
            .with_usage("help"),
        Command::new("put", CommandKind::Put)
            .with_usage("put key value"),
        Command::new("get", CommandKind::Get)
            .with_usage("get key"),
        Command::new("group", CommandKind::Group)
            .with_usage("group groupname list")
            .with_usage("group groupname create @user1 @user2 @user3 ...")
            .with_usage("group groupname add @user1 @user2 @user3 ...")
            .with_usage("group groupname remove @user1 @user2 @user3 ..."),
        Command::new("score", CommandKind::Score)
            .with_usage("score add team1:team2 score1:score2")
            .with_usage("score get team2:team1")
            .with_usage("score reset team2:team1")
            .with_usage("score reset team2:team1 score2:score1"),
        Command::new("randompairs", CommandKind::RandomPairs)
            .with_usage("randompairs @user1 @user2 @user3 ...")
            .with_usage("randompairs group"),
        Command::new("randomteams", CommandKind::RandomTeams)
            .with_usage("randomteams teamsize @user1 @user2 @user3 ...")
            .with_usage("randomteams teamsize group"),
        Command::new("ascii", CommandKind::Ascii)
            .with_usage("ascii https://imageurl"),
        Command::new("shark", CommandKind::Shark)
            .with_usage("shark"),
        Command::new("animate", CommandKind::Animate)
            .with_usage("animate"),
    ]
}

fn group_actions() -> Vec<Command<GroupAction>> {
    vec![
        Command::new("list", GroupAction::List),
        Command::new("set", GroupAction::Set).with_alias("create"),
        Command::new("add", GroupAction::Add),
        Command::new("remove", GroupAction::Remove),
    ]
}

fn score_actions() -> Vec<Command<ScoreAction>> {
    vec![
        Command::new("add", ScoreAction::Add).with_alias("set"),
        Command::new("get", ScoreAction::Get),
        Command::new("reset", ScoreAction::Reset),
    ]
}
