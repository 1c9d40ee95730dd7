//! Pick'em season analytics
//!
//! Team performance and participant behavior statistics for a closed season of
//! against-the-spread picks, plus per-participant models that estimate which side
//! of a matchup a participant would choose.

pub mod data;
pub mod features;
pub mod model;
pub mod predict;
pub mod stats;
pub mod training;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Team identifier as it appears in the input tables (e.g. "NE")
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(pub String);

impl TeamId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TeamId {
    fn from(s: &str) -> Self {
        TeamId(s.to_string())
    }
}

/// Participant (league manager) identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub String);

impl ParticipantId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(s: &str) -> Self {
        ParticipantId(s.to_string())
    }
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum PickemError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Table {table} is missing required column '{column}'")]
    MissingColumn { table: String, column: String },

    #[error("Malformed row {row} in {table}: {message}")]
    Malformed {
        table: String,
        row: usize,
        message: String,
    },

    #[error("Duplicate game key: week {week}, game {game}")]
    DuplicateGame { week: u32, game: u32 },

    #[error("Invalid ATS winner '{value}' for week {week}, game {game}")]
    InvalidAtsWinner { week: u32, game: u32, value: String },

    #[error("Invalid pick by {participant} in week {week}, game {game}: {team} is not playing")]
    InvalidPick {
        participant: ParticipantId,
        week: u32,
        game: u32,
        team: TeamId,
    },

    #[error("Insufficient data for {participant}: has {picks} picks, need {required}")]
    InsufficientData {
        participant: ParticipantId,
        picks: usize,
        required: usize,
    },

    #[error("Unknown participant: {0}")]
    UnknownParticipant(ParticipantId),

    #[error("Model not trained - run `pickem train` first")]
    NoModel,

    #[error("Training failed: {0}")]
    Training(String),
}

pub type Result<T> = std::result::Result<T, PickemError>;

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub roster: RosterConfig,
    pub training: TrainingConfig,
    pub analysis: AnalysisConfig,
    pub data: DataConfig,
}

/// Fixed league roster for a single season
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterConfig {
    pub teams: Vec<TeamId>,
    pub participants: Vec<ParticipantId>,
    /// Participants that are not real competitors (e.g. a bookmaker proxy)
    #[serde(default)]
    pub non_competitive: Vec<ParticipantId>,
    /// Participants whose season data is incomplete
    #[serde(default)]
    pub incomplete_season: Vec<ParticipantId>,
    /// Legacy team id -> current team id
    #[serde(default)]
    pub team_aliases: BTreeMap<String, String>,
    /// Conference assumed for teams without metadata
    pub default_conference: String,
}

impl RosterConfig {
    /// Participants left out of leaderboard-style rankings
    pub fn ranking_exclusions(&self) -> Vec<ParticipantId> {
        self.non_competitive
            .iter()
            .chain(self.incomplete_season.iter())
            .cloned()
            .collect()
    }

    /// Resolve a raw team id through the alias table
    pub fn canonical_team(&self, raw: &str) -> TeamId {
        let raw = raw.trim();
        match self.team_aliases.get(raw) {
            Some(current) => TeamId(current.clone()),
            None => TeamId(raw.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Participants with fewer picks get no model
    pub min_picks: usize,
    /// Inverse L2 regularization strength (C)
    pub inverse_regularization: f64,
    pub learning_rate: f64,
    pub epochs: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub streak_window: usize,
    pub rolling_window: usize,
    pub top_n: usize,
    pub high_consensus_threshold: f64,
    /// Minimum |contribution| for a feature to be surfaced in an explanation
    pub contribution_threshold: f32,
    /// Minimum |PAA| before a team factor is annotated with it
    pub affinity_note_threshold: f64,
    pub max_factors: usize,
    pub default_temperature: f32,
    pub default_wind: f32,
    pub season_weeks: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub games_path: String,
    pub picks_path: String,
    pub teams_path: String,
    pub model_path: String,
    pub report_path: String,
}

const NFL_TEAMS: [&str; 32] = [
    "ARI", "ATL", "BAL", "BUF", "CAR", "CHI", "CIN", "CLE", "DAL", "DEN", "DET", "GB", "HOU",
    "IND", "JAX", "KC", "LAC", "LAR", "LV", "MIA", "MIN", "NE", "NO", "NYG", "NYJ", "PHI", "PIT",
    "SEA", "SF", "TB", "TEN", "WAS",
];

const LEAGUE_PARTICIPANTS: [&str; 13] = [
    "ADon",
    "Exciting Whites",
    "Kevin",
    "MC$",
    "Maye Magic",
    "P-Otys",
    "Ripw1124",
    "Vegas",
    "Willheser",
    "Yianni",
    "b_hop",
    "derelicious",
    "mrmcwinnerson",
];

impl Default for RosterConfig {
    fn default() -> Self {
        let mut team_aliases = BTreeMap::new();
        team_aliases.insert("LVR".to_string(), "LV".to_string());

        RosterConfig {
            teams: NFL_TEAMS.iter().map(|t| TeamId::from(*t)).collect(),
            participants: LEAGUE_PARTICIPANTS
                .iter()
                .map(|p| ParticipantId::from(*p))
                .collect(),
            non_competitive: vec![ParticipantId::from("Vegas")],
            incomplete_season: vec![ParticipantId::from("Ripw1124")],
            team_aliases,
            default_conference: "NFC".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            roster: RosterConfig::default(),
            training: TrainingConfig {
                min_picks: 20,
                inverse_regularization: 0.5,
                learning_rate: 0.5,
                epochs: 500,
            },
            analysis: AnalysisConfig {
                streak_window: 3,
                rolling_window: 3,
                top_n: 5,
                high_consensus_threshold: 0.85,
                contribution_threshold: 0.01,
                affinity_note_threshold: 1.0,
                max_factors: 4,
                default_temperature: 65.0,
                default_wind: 5.0,
                season_weeks: 18,
            },
            data: DataConfig {
                games_path: "data/scores_and_picks.csv".to_string(),
                picks_path: "data/picks.csv".to_string(),
                teams_path: "data/teams.csv".to_string(),
                model_path: "model/participant_models.json".to_string(),
                report_path: "model/season_report.json".to_string(),
            },
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PickemError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        toml::from_str(&content)
            .map_err(|e| PickemError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| PickemError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_roundtrips_through_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();

        assert_eq!(parsed.roster.teams.len(), 32);
        assert_eq!(parsed.roster.participants.len(), 13);
        assert_eq!(parsed.training.min_picks, 20);
        assert_eq!(parsed.roster.team_aliases.get("LVR").unwrap(), "LV");
    }

    #[test]
    fn test_canonical_team_applies_alias() {
        let roster = RosterConfig::default();
        assert_eq!(roster.canonical_team("LVR"), TeamId::from("LV"));
        assert_eq!(roster.canonical_team(" NE "), TeamId::from("NE"));
    }

    #[test]
    fn test_ranking_exclusions() {
        let roster = RosterConfig::default();
        let excluded = roster.ranking_exclusions();
        assert!(excluded.contains(&ParticipantId::from("Vegas")));
        assert!(excluded.contains(&ParticipantId::from("Ripw1124")));
        assert!(!excluded.contains(&ParticipantId::from("Kevin")));
    }
}
