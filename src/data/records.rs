//! Raw season records: games, picks and team metadata

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::{ParticipantId, TeamId};

/// Unique key of a scheduled game
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GameKey {
    pub week: u32,
    pub game: u32,
}

impl GameKey {
    pub fn new(week: u32, game: u32) -> Self {
        GameKey { week, game }
    }
}

impl fmt::Display for GameKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "W{}G{}", self.week, self.game)
    }
}

/// Against-the-spread outcome of a game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AtsResult {
    Cover(TeamId),
    Push,
}

impl AtsResult {
    /// Sentinel used for a push in the input tables
    pub const PUSH: &'static str = "PUSH";

    /// True if the given team covered
    pub fn covered_by(&self, team: &TeamId) -> bool {
        matches!(self, AtsResult::Cover(t) if t == team)
    }

    pub fn is_push(&self) -> bool {
        matches!(self, AtsResult::Push)
    }
}

impl fmt::Display for AtsResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AtsResult::Cover(team) => write!(f, "{}", team),
            AtsResult::Push => f.write_str(Self::PUSH),
        }
    }
}

/// Game-day weather as reported by the odds feed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Weather {
    pub temperature: Option<f32>,
    pub wind_mph: Option<f32>,
    pub detail: Option<String>,
}

/// One scheduled game with result, line and per-participant correctness
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameRecord {
    pub week: u32,
    pub game: u32,
    pub home: TeamId,
    pub away: TeamId,
    pub home_score: Option<u32>,
    pub away_score: Option<u32>,
    /// Bookmaker spread, negative favors the home team
    pub spread: Option<f64>,
    pub ats_winner: Option<AtsResult>,
    pub weather: Weather,
    /// Whether each participant's pick covered
    pub correct: BTreeMap<ParticipantId, bool>,
}

impl GameRecord {
    pub fn key(&self) -> GameKey {
        GameKey::new(self.week, self.game)
    }

    /// Check if a team played in this game
    pub fn involves(&self, team: &TeamId) -> bool {
        &self.home == team || &self.away == team
    }

    /// Check if a team was playing at home
    pub fn is_home(&self, team: &TeamId) -> Option<bool> {
        if team == &self.home {
            Some(true)
        } else if team == &self.away {
            Some(false)
        } else {
            None
        }
    }

    /// Straight-up winner, or None for a tie or a missing score
    pub fn winner(&self) -> Option<&TeamId> {
        let (home, away) = (self.home_score?, self.away_score?);
        match home.cmp(&away) {
            std::cmp::Ordering::Greater => Some(&self.home),
            std::cmp::Ordering::Less => Some(&self.away),
            std::cmp::Ordering::Equal => None,
        }
    }

    /// Both scores are known
    pub fn has_final_score(&self) -> bool {
        self.home_score.is_some() && self.away_score.is_some()
    }

    /// Bookmaker favorite: home if the spread is negative, otherwise away
    pub fn favorite(&self) -> Option<&TeamId> {
        let spread = self.spread?;
        if spread < 0.0 {
            Some(&self.home)
        } else {
            Some(&self.away)
        }
    }

    /// Whether the favorite covered; None without both a spread and an ATS result
    pub fn favorite_covered(&self) -> Option<bool> {
        let favorite = self.favorite()?;
        let ats = self.ats_winner.as_ref()?;
        Some(ats.covered_by(favorite))
    }

    /// Whether a pick of `team` covered; None without an ATS result
    pub fn pick_covered(&self, team: &TeamId) -> Option<bool> {
        self.ats_winner.as_ref().map(|ats| ats.covered_by(team))
    }
}

/// One participant's pick for one game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickRecord {
    pub week: u32,
    pub game: u32,
    pub participant: ParticipantId,
    pub team: TeamId,
}

impl PickRecord {
    pub fn key(&self) -> GameKey {
        GameKey::new(self.week, self.game)
    }
}

/// Team conference/division metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMeta {
    pub team: TeamId,
    pub conference: String,
    pub division: Option<String>,
}

impl TeamMeta {
    /// Only teams with a division are current franchises
    pub fn is_current(&self) -> bool {
        self.division
            .as_deref()
            .map(|d| !d.trim().is_empty())
            .unwrap_or(false)
    }
}
