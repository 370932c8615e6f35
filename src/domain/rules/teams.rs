//! Random team and pair assembly

use rand::seq::SliceRandom;
use rand::Rng;

use crate::application::errors::TeamError;

/// Marks a leftover member doubled up into the previous team
pub const EXTRA_MARKER: &str = "➕";
/// Marks a final team that is short of members
pub const INCOMPLETE_MARKER: &str = "➕❓";

/// One assembled team
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    pub name: String,
    pub members: Vec<String>,
    /// A single leftover member that joined this team on top of its size
    pub extra: Option<String>,
    pub incomplete: bool,
}

impl Team {
    fn new(name: String) -> Self {
        Self {
            name,
            members: Vec::new(),
            extra: None,
            incomplete: false,
        }
    }

    /// Members including the extra one, if any
    pub fn everyone(&self) -> impl Iterator<Item = &String> {
        self.members.iter().chain(self.extra.iter())
    }
}

/// Split `members` into randomly composed teams of `team_size`.
///
/// A team size above half the pool is refused. With `allow_padding` the
/// shuffled list is topped up from its own front until it divides evenly,
/// so some members appear twice. Without it the remainder becomes a short
/// final team, except that a single leftover joins the previous team.
pub fn assemble_teams<R: Rng + ?Sized>(
    rng: &mut R,
    team_size: usize,
    members: &[String],
    allow_padding: bool,
    team_names: &[String],
    shuffle_team_names: bool,
) -> Result<Vec<Team>, TeamError> {
    if team_size == 0 || team_size > members.len() / 2 {
        return Err(TeamError::InvalidSize {
            size: team_size,
            pool: members.len(),
        });
    }

    let mut pool = members.to_vec();
    pool.shuffle(rng);

    let mut names = team_names.to_vec();
    if shuffle_team_names {
        names.shuffle(rng);
    }

    let remainder = pool.len() % team_size;
    if remainder != 0 && allow_padding {
        let padding: Vec<String> = pool[..team_size - remainder].to_vec();
        pool.extend(padding);
    }

    let lone_leftover = if remainder == 1 && !allow_padding {
        pool.pop()
    } else {
        None
    };

    let mut teams: Vec<Team> = pool
        .chunks(team_size)
        .enumerate()
        .map(|(index, chunk)| {
            let name = names
                .get(index)
                .cloned()
                .unwrap_or_else(|| format!("Team {}", index + 1));
            let mut team = Team::new(name);
            team.members = chunk.to_vec();
            team.incomplete = chunk.len() < team_size;
            team
        })
        .collect();

    if let (Some(member), Some(last)) = (lone_leftover, teams.last_mut()) {
        last.extra = Some(member);
    }

    Ok(teams)
}

/// Render teams one per line as `Name: member member`
pub fn format_teams(teams: &[Team]) -> String {
    let mut out = String::from("\n");
    for team in teams {
        out.push('\n');
        out.push_str(&team.name);
        out.push_str(": ");
        out.push_str(&team.members.join(" "));
        if let Some(extra) = &team.extra {
            out.push_str(&format!(" {} {}", EXTRA_MARKER, extra));
        }
        if team.incomplete {
            out.push(' ');
            out.push_str(INCOMPLETE_MARKER);
        }
    }
    out
}

/// Assemble and format in one step
pub fn random_teams<R: Rng + ?Sized>(
    rng: &mut R,
    team_size: usize,
    members: &[String],
    allow_padding: bool,
    team_names: &[String],
    shuffle_team_names: bool,
) -> Result<String, TeamError> {
    assemble_teams(rng, team_size, members, allow_padding, team_names, shuffle_team_names)
        .map(|teams| format_teams(&teams))
}
