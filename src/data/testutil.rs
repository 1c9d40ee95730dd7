//! Synthetic season builders for unit tests

use std::collections::BTreeMap;

use super::{AtsResult, GameRecord, PickRecord, RecordStore, TeamMeta, Weather};
use crate::{ParticipantId, TeamId};

pub fn game(week: u32, game: u32, home: &str, away: &str, spread: Option<f64>, ats: Option<&str>) -> GameRecord {
    GameRecord {
        week,
        game,
        home: TeamId::from(home),
        away: TeamId::from(away),
        home_score: Some(20),
        away_score: Some(17),
        spread,
        ats_winner: ats.map(|a| {
            if a == AtsResult::PUSH {
                AtsResult::Push
            } else {
                AtsResult::Cover(TeamId::from(a))
            }
        }),
        weather: Weather::default(),
        correct: BTreeMap::new(),
    }
}

pub fn pick(week: u32, game: u32, participant: &str, team: &str) -> PickRecord {
    PickRecord {
        week,
        game,
        participant: ParticipantId::from(participant),
        team: TeamId::from(team),
    }
}

pub fn team(id: &str, conference: &str) -> TeamMeta {
    TeamMeta {
        team: TeamId::from(id),
        conference: conference.to_string(),
        division: Some(format!("{} Division", conference)),
    }
}

pub fn store(games: Vec<GameRecord>, picks: Vec<PickRecord>) -> RecordStore {
    RecordStore::from_parts(games, picks, Vec::new()).unwrap()
}
