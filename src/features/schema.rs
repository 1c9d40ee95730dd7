//! Feature schema shared by training and prediction
//!
//! Layout: `spread`, `spread_abs`, `week`, then `home_{T}` / `away_{T}` for every
//! roster team in roster order, then `cross_conference`, `indoor`, `temp`, `wind`,
//! `rain_snow`. The schema is fixed by the roster, so a model trained on it can
//! score any matchup between roster teams.

use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use super::weather::WeatherMarkers;
use crate::data::{GameRecord, TeamMeta};
use crate::{AnalysisConfig, TeamId};

const LEADING: [&str; 3] = ["spread", "spread_abs", "week"];
const TRAILING: [&str; 5] = ["cross_conference", "indoor", "temp", "wind", "rain_snow"];

/// What a feature column measures
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureKind {
    Spread,
    SpreadAbs,
    Week,
    HomeTeam(TeamId),
    AwayTeam(TeamId),
    CrossConference,
    Indoor,
    Temperature,
    Wind,
    RainSnow,
}

/// A game as seen by a model: both teams plus line and conditions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matchup {
    pub home: TeamId,
    pub away: TeamId,
    /// Negative favors the home team
    pub spread: f32,
    pub week: u32,
    pub indoor: bool,
    pub temperature: f32,
    pub wind_mph: f32,
    pub rain_snow: bool,
    pub cross_conference: bool,
}

impl Matchup {
    /// Hand-entered matchup with default conditions
    pub fn new(home: TeamId, away: TeamId, spread: f32, week: u32, analysis: &AnalysisConfig) -> Self {
        Matchup {
            home,
            away,
            spread,
            week,
            indoor: false,
            temperature: analysis.default_temperature,
            wind_mph: analysis.default_wind,
            rain_snow: false,
            cross_conference: false,
        }
    }

    /// Matchup for a recorded game, filling missing values with defaults
    pub fn from_game(
        game: &GameRecord,
        conferences: &ConferenceMap,
        markers: &WeatherMarkers,
        analysis: &AnalysisConfig,
    ) -> Self {
        let detail = game.weather.detail.as_deref();
        Matchup {
            home: game.home.clone(),
            away: game.away.clone(),
            spread: game.spread.unwrap_or(0.0) as f32,
            week: game.week,
            indoor: markers.is_indoor(detail),
            temperature: game
                .weather
                .temperature
                .unwrap_or(analysis.default_temperature),
            wind_mph: game.weather.wind_mph.unwrap_or(analysis.default_wind),
            rain_snow: markers.has_precipitation(detail),
            cross_conference: conferences.is_cross_conference(&game.home, &game.away),
        }
    }
}

/// Ordered feature columns for one roster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSchema {
    teams: Vec<TeamId>,
    names: Vec<String>,
}

impl FeatureSchema {
    pub fn new(teams: &[TeamId]) -> Self {
        let mut names: Vec<String> = LEADING.iter().map(|s| s.to_string()).collect();
        for team in teams {
            names.push(format!("home_{}", team));
            names.push(format!("away_{}", team));
        }
        names.extend(TRAILING.iter().map(|s| s.to_string()));

        FeatureSchema {
            teams: teams.to_vec(),
            names,
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn teams(&self) -> &[TeamId] {
        &self.teams
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    fn team_offset(&self, team: &TeamId) -> Option<usize> {
        self.teams
            .iter()
            .position(|t| t == team)
            .map(|i| LEADING.len() + 2 * i)
    }

    fn trailing_offset(&self) -> usize {
        LEADING.len() + 2 * self.teams.len()
    }

    /// Interpret a column index
    pub fn kind(&self, index: usize) -> Option<FeatureKind> {
        if index < LEADING.len() {
            return Some(match index {
                0 => FeatureKind::Spread,
                1 => FeatureKind::SpreadAbs,
                _ => FeatureKind::Week,
            });
        }
        let trailing = self.trailing_offset();
        if index < trailing {
            let team = self.teams[(index - LEADING.len()) / 2].clone();
            return Some(if (index - LEADING.len()) % 2 == 0 {
                FeatureKind::HomeTeam(team)
            } else {
                FeatureKind::AwayTeam(team)
            });
        }
        match index - trailing {
            0 => Some(FeatureKind::CrossConference),
            1 => Some(FeatureKind::Indoor),
            2 => Some(FeatureKind::Temperature),
            3 => Some(FeatureKind::Wind),
            4 => Some(FeatureKind::RainSnow),
            _ => None,
        }
    }

    /// Encode a matchup; teams outside the roster leave their indicators at zero
    pub fn encode(&self, matchup: &Matchup) -> Vec<f32> {
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        let mut row = vec![0.0f32; self.len()];

        row[0] = matchup.spread;
        row[1] = matchup.spread.abs();
        row[2] = matchup.week as f32;

        if let Some(offset) = self.team_offset(&matchup.home) {
            row[offset] = 1.0;
        }
        if let Some(offset) = self.team_offset(&matchup.away) {
            row[offset + 1] = 1.0;
        }

        let t = self.trailing_offset();
        row[t] = flag(matchup.cross_conference);
        row[t + 1] = flag(matchup.indoor);
        row[t + 2] = matchup.temperature;
        row[t + 3] = matchup.wind_mph;
        row[t + 4] = flag(matchup.rain_snow);
        row
    }
}

/// Conference lookup over current franchises
#[derive(Debug, Clone)]
pub struct ConferenceMap {
    conferences: HashMap<TeamId, String>,
    default_conference: String,
}

impl ConferenceMap {
    /// Build from team metadata; only current teams are used and the first entry wins
    pub fn new<'a>(teams: impl IntoIterator<Item = &'a TeamMeta>, default_conference: &str) -> Self {
        let mut conferences = HashMap::new();
        for meta in teams.into_iter().filter(|t| t.is_current()) {
            conferences
                .entry(meta.team.clone())
                .or_insert_with(|| meta.conference.clone());
        }
        ConferenceMap {
            conferences,
            default_conference: default_conference.to_string(),
        }
    }

    pub fn get(&self, team: &TeamId) -> Option<&str> {
        self.conferences.get(team).map(String::as_str)
    }

    /// Conference of a team, falling back to the default
    pub fn conference(&self, team: &TeamId) -> &str {
        self.get(team).unwrap_or(self.default_conference.as_str())
    }

    pub fn is_cross_conference(&self, home: &TeamId, away: &TeamId) -> bool {
        self.conference(home) != self.conference(away)
    }

    /// Log each team that has no conference and will use the default.
    /// Returns the unknown teams.
    pub fn warn_unknown<'a>(&self, teams: impl IntoIterator<Item = &'a TeamId>) -> Vec<TeamId> {
        let unknown: BTreeSet<&TeamId> = teams
            .into_iter()
            .filter(|t| !self.conferences.contains_key(*t))
            .collect();
        for team in &unknown {
            warn!(
                "No conference for team {}, assuming {}",
                team, self.default_conference
            );
        }
        unknown.into_iter().cloned().collect()
    }
}
