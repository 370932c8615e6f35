use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// One played match, scores in canonical team order
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MatchEntry {
    pub team1: i64,
    pub team2: i64,
    pub timestamp: DateTime<Utc>,
}

/// Running tally and match history for one pair of teams.
///
/// `team1` is always the lexicographically smaller name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ScoreRecord {
    pub team1: String,
    pub team2: String,
    pub team1_points: u32,
    pub team2_points: u32,
    #[serde(default)]
    pub history: Vec<MatchEntry>,
}

impl ScoreRecord {
    /// Empty record; callers pass names already in canonical order
    pub fn new(team1: impl Into<String>, team2: impl Into<String>) -> Self {
        Self {
            team1: team1.into(),
            team2: team2.into(),
            team1_points: 0,
            team2_points: 0,
            history: Vec::new(),
        }
    }

    /// Append a match and credit points by `outcome`: `Greater` to
    /// `team1`, `Less` to `team2`, `Equal` to both
    pub fn record(&mut self, score1: i64, score2: i64, outcome: Ordering, at: DateTime<Utc>) {
        match outcome {
            Ordering::Greater => self.team1_points += 1,
            Ordering::Less => self.team2_points += 1,
            Ordering::Equal => {
                self.team1_points += 1;
                self.team2_points += 1;
            }
        }
        self.history.push(MatchEntry {
            team1: score1,
            team2: score2,
            timestamp: at,
        });
    }
}

/// Order two team names lexicographically.
///
/// Returns `(first, second, reversed)`, where `reversed` tells the caller its
/// own argument order was swapped.
pub fn order_team_names<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str, bool) {
    if b < a {
        (b, a, true)
    } else {
        (a, b, false)
    }
}
