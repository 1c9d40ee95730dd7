//! In-memory record store loaded from the season's flat CSV exports

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs::File;
use std::io::Read;

use csv::{ReaderBuilder, StringRecord, Trim};

use super::records::{AtsResult, GameKey, GameRecord, PickRecord, TeamMeta, Weather};
use crate::{DataConfig, ParticipantId, PickemError, Result, RosterConfig, TeamId};

const GAMES_TABLE: &str = "games";
const PICKS_TABLE: &str = "picks";
const TEAMS_TABLE: &str = "teams";

/// Read-only tables of games, picks and team metadata
#[derive(Debug, Clone)]
pub struct RecordStore {
    games: Vec<GameRecord>,
    game_index: HashMap<GameKey, usize>,
    picks: Vec<PickRecord>,
    teams: Vec<TeamMeta>,
    orphan_picks: usize,
}

impl RecordStore {
    /// Load all three tables from the paths in the data config
    pub fn open(data: &DataConfig, roster: &RosterConfig) -> Result<Self> {
        let games = File::open(&data.games_path).map_err(|e| {
            PickemError::Config(format!("Cannot open games table {}: {}", data.games_path, e))
        })?;
        let picks = File::open(&data.picks_path).map_err(|e| {
            PickemError::Config(format!("Cannot open picks table {}: {}", data.picks_path, e))
        })?;
        let teams = File::open(&data.teams_path).map_err(|e| {
            PickemError::Config(format!("Cannot open teams table {}: {}", data.teams_path, e))
        })?;
        Self::from_readers(games, picks, teams, roster)
    }

    /// Load from any CSV sources
    pub fn from_readers<G: Read, P: Read, T: Read>(
        games: G,
        picks: P,
        teams: T,
        roster: &RosterConfig,
    ) -> Result<Self> {
        let games = read_games(games, roster)?;
        let picks = read_picks(picks, roster)?;
        let teams = read_teams(teams, roster)?;
        log::info!(
            "Loaded {} games, {} picks, {} team entries",
            games.len(),
            picks.len(),
            teams.len()
        );
        Self::from_parts(games, picks, teams)
    }

    /// Build a store from already-parsed records, enforcing the table invariants
    pub fn from_parts(
        mut games: Vec<GameRecord>,
        picks: Vec<PickRecord>,
        teams: Vec<TeamMeta>,
    ) -> Result<Self> {
        games.sort_by_key(|g| g.key());

        let mut game_index = HashMap::with_capacity(games.len());
        for (i, game) in games.iter().enumerate() {
            if let Some(AtsResult::Cover(team)) = &game.ats_winner {
                if !game.involves(team) {
                    return Err(PickemError::InvalidAtsWinner {
                        week: game.week,
                        game: game.game,
                        value: team.to_string(),
                    });
                }
            }
            if game_index.insert(game.key(), i).is_some() {
                return Err(PickemError::DuplicateGame {
                    week: game.week,
                    game: game.game,
                });
            }
        }

        let mut orphan_picks = 0;
        for pick in &picks {
            match game_index.get(&pick.key()) {
                Some(&i) => {
                    if !games[i].involves(&pick.team) {
                        return Err(PickemError::InvalidPick {
                            participant: pick.participant.clone(),
                            week: pick.week,
                            game: pick.game,
                            team: pick.team.clone(),
                        });
                    }
                }
                None => orphan_picks += 1,
            }
        }
        if orphan_picks > 0 {
            log::warn!(
                "{} picks reference games missing from the games table; joins will drop them",
                orphan_picks
            );
        }

        Ok(RecordStore {
            games,
            game_index,
            picks,
            teams,
            orphan_picks,
        })
    }

    // ==================== Game Operations ====================

    /// All games ordered by (week, game)
    pub fn games(&self) -> &[GameRecord] {
        &self.games
    }

    pub fn game(&self, key: GameKey) -> Option<&GameRecord> {
        self.game_index.get(&key).map(|&i| &self.games[i])
    }

    /// Distinct weeks in ascending order
    pub fn weeks(&self) -> Vec<u32> {
        let weeks: BTreeSet<u32> = self.games.iter().map(|g| g.week).collect();
        weeks.into_iter().collect()
    }

    /// Every team that appears as home or away, sorted
    pub fn teams_played(&self) -> Vec<TeamId> {
        let teams: BTreeSet<&TeamId> = self
            .games
            .iter()
            .flat_map(|g| [&g.home, &g.away])
            .collect();
        teams.into_iter().cloned().collect()
    }

    // ==================== Pick Operations ====================

    pub fn picks(&self) -> &[PickRecord] {
        &self.picks
    }

    /// Picks joined to their game; orphan picks are skipped
    pub fn joined_picks(&self) -> impl Iterator<Item = (&PickRecord, &GameRecord)> {
        self.picks
            .iter()
            .filter_map(move |p| self.game(p.key()).map(|g| (p, g)))
    }

    // ==================== Team Operations ====================

    pub fn teams(&self) -> &[TeamMeta] {
        &self.teams
    }

    /// Teams with a division (current franchises)
    pub fn current_teams(&self) -> impl Iterator<Item = &TeamMeta> {
        self.teams.iter().filter(|t| t.is_current())
    }

    // ==================== Statistics ====================

    pub fn stats(&self) -> StoreStats {
        let weeks = self.weeks();
        let participants: BTreeSet<&ParticipantId> =
            self.picks.iter().map(|p| &p.participant).collect();

        StoreStats {
            game_count: self.games.len(),
            pick_count: self.picks.len(),
            participant_count: participants.len(),
            team_count: self.teams.len(),
            current_team_count: self.current_teams().count(),
            orphan_picks: self.orphan_picks,
            first_week: weeks.first().copied(),
            last_week: weeks.last().copied(),
        }
    }
}

/// Record store statistics
#[derive(Debug, Clone)]
pub struct StoreStats {
    pub game_count: usize,
    pub pick_count: usize,
    pub participant_count: usize,
    pub team_count: usize,
    pub current_team_count: usize,
    pub orphan_picks: usize,
    pub first_week: Option<u32>,
    pub last_week: Option<u32>,
}

// ==================== CSV Parsing ====================

/// Header name -> column position
struct Columns {
    table: &'static str,
    index: HashMap<String, usize>,
}

impl Columns {
    fn new(table: &'static str, headers: &StringRecord) -> Self {
        let index = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().to_string(), i))
            .collect();
        Columns { table, index }
    }

    fn require(&self, column: &str) -> Result<usize> {
        self.index
            .get(column)
            .copied()
            .ok_or_else(|| PickemError::MissingColumn {
                table: self.table.to_string(),
                column: column.to_string(),
            })
    }

    fn optional(&self, column: &str) -> Option<usize> {
        self.index.get(column).copied()
    }
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(false)
        .from_reader(reader)
}

fn field<'a>(record: &'a StringRecord, col: Option<usize>) -> &'a str {
    col.and_then(|c| record.get(c)).unwrap_or("")
}

fn is_missing(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "" | "na" | "nan" | "null" | "none"
    )
}

fn malformed(table: &str, row: usize, message: String) -> PickemError {
    PickemError::Malformed {
        table: table.to_string(),
        row,
        message,
    }
}

fn parse_opt_f64(value: &str, table: &str, row: usize, column: &str) -> Result<Option<f64>> {
    if is_missing(value) {
        return Ok(None);
    }
    value
        .trim()
        .parse::<f64>()
        .map(Some)
        .map_err(|_| malformed(table, row, format!("{} is not numeric: '{}'", column, value)))
}

/// Integer column; accepts float renderings such as "3.0"
fn parse_opt_u32(value: &str, table: &str, row: usize, column: &str) -> Result<Option<u32>> {
    match parse_opt_f64(value, table, row, column)? {
        None => Ok(None),
        Some(v) if v >= 0.0 && v.fract() == 0.0 && v <= u32::MAX as f64 => Ok(Some(v as u32)),
        Some(_) => Err(malformed(
            table,
            row,
            format!("{} is not a non-negative integer: '{}'", column, value),
        )),
    }
}

fn parse_u32(value: &str, table: &str, row: usize, column: &str) -> Result<u32> {
    parse_opt_u32(value, table, row, column)?
        .ok_or_else(|| malformed(table, row, format!("{} is missing", column)))
}

fn parse_flag(value: &str, table: &str, row: usize, column: &str) -> Result<bool> {
    if is_missing(value) {
        return Ok(false);
    }
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "1.0" | "true" | "yes" => Ok(true),
        "0" | "0.0" | "false" | "no" => Ok(false),
        _ => Err(malformed(
            table,
            row,
            format!("{} is not a boolean flag: '{}'", column, value),
        )),
    }
}

fn read_games<R: Read>(reader: R, roster: &RosterConfig) -> Result<Vec<GameRecord>> {
    let mut rdr = csv_reader(reader);
    let cols = Columns::new(GAMES_TABLE, rdr.headers()?);

    let week_col = cols.require("week")?;
    let game_col = cols.require("game")?;
    let home_col = cols.require("team_home")?;
    let away_col = cols.require("team_away")?;
    let spread_col = cols.require("platform_spread")?;
    let ats_col = cols.require("ats_winner")?;
    let home_score_col = cols.optional("score_home");
    let away_score_col = cols.optional("score_away");
    let temp_col = cols.optional("weather_temperature");
    let wind_col = cols.optional("weather_wind_mph");
    let detail_col = cols.optional("weather_detail");

    let participant_cols: Vec<(ParticipantId, usize)> = roster
        .participants
        .iter()
        .filter_map(|p| cols.optional(p.as_str()).map(|c| (p.clone(), c)))
        .collect();
    for p in &roster.participants {
        if cols.optional(p.as_str()).is_none() {
            log::warn!("Games table has no correctness column for {}", p);
        }
    }

    let mut games = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let row = i + 1;
        let t = GAMES_TABLE;

        let week = parse_u32(field(&record, Some(week_col)), t, row, "week")?;
        let game = parse_u32(field(&record, Some(game_col)), t, row, "game")?;
        let home_raw = field(&record, Some(home_col));
        let away_raw = field(&record, Some(away_col));
        if is_missing(home_raw) || is_missing(away_raw) {
            return Err(malformed(t, row, "home or away team is missing".to_string()));
        }
        let home = roster.canonical_team(home_raw);
        let away = roster.canonical_team(away_raw);

        let ats_raw = field(&record, Some(ats_col));
        let ats_winner = if is_missing(ats_raw) {
            None
        } else if ats_raw.trim().eq_ignore_ascii_case(AtsResult::PUSH) {
            Some(AtsResult::Push)
        } else {
            let team = roster.canonical_team(ats_raw);
            if team != home && team != away {
                return Err(PickemError::InvalidAtsWinner {
                    week,
                    game,
                    value: ats_raw.to_string(),
                });
            }
            Some(AtsResult::Cover(team))
        };

        let detail = field(&record, detail_col);
        let weather = Weather {
            temperature: parse_opt_f64(field(&record, temp_col), t, row, "weather_temperature")?
                .map(|v| v as f32),
            wind_mph: parse_opt_f64(field(&record, wind_col), t, row, "weather_wind_mph")?
                .map(|v| v as f32),
            detail: if is_missing(detail) {
                None
            } else {
                Some(detail.to_string())
            },
        };

        let mut correct = BTreeMap::new();
        for (participant, col) in &participant_cols {
            let flag = parse_flag(field(&record, Some(*col)), t, row, participant.as_str())?;
            correct.insert(participant.clone(), flag);
        }

        games.push(GameRecord {
            week,
            game,
            home,
            away,
            home_score: parse_opt_u32(field(&record, home_score_col), t, row, "score_home")?,
            away_score: parse_opt_u32(field(&record, away_score_col), t, row, "score_away")?,
            spread: parse_opt_f64(field(&record, Some(spread_col)), t, row, "platform_spread")?,
            ats_winner,
            weather,
            correct,
        });
    }

    Ok(games)
}

fn read_picks<R: Read>(reader: R, roster: &RosterConfig) -> Result<Vec<PickRecord>> {
    let mut rdr = csv_reader(reader);
    let cols = Columns::new(PICKS_TABLE, rdr.headers()?);

    let week_col = cols.require("week")?;
    let game_col = cols.require("game")?;
    let player_col = cols.require("player")?;
    let pick_col = cols.require("pick")?;

    let mut picks = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let row = i + 1;
        let t = PICKS_TABLE;

        let player = field(&record, Some(player_col));
        let pick = field(&record, Some(pick_col));
        if is_missing(player) || is_missing(pick) {
            return Err(malformed(t, row, "player or pick is missing".to_string()));
        }

        picks.push(PickRecord {
            week: parse_u32(field(&record, Some(week_col)), t, row, "week")?,
            game: parse_u32(field(&record, Some(game_col)), t, row, "game")?,
            participant: ParticipantId(player.to_string()),
            team: roster.canonical_team(pick),
        });
    }

    Ok(picks)
}

fn read_teams<R: Read>(reader: R, roster: &RosterConfig) -> Result<Vec<TeamMeta>> {
    let mut rdr = csv_reader(reader);
    let cols = Columns::new(TEAMS_TABLE, rdr.headers()?);

    let id_col = cols.require("team_id")?;
    let conf_col = cols.require("team_conference")?;
    let div_col = cols.require("team_division")?;

    let mut seen = BTreeSet::new();
    let mut teams = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let row = i + 1;

        let id = field(&record, Some(id_col));
        if is_missing(id) {
            return Err(malformed(TEAMS_TABLE, row, "team_id is missing".to_string()));
        }
        let team = roster.canonical_team(id);
        // First entry wins for duplicate ids
        if !seen.insert(team.clone()) {
            continue;
        }

        let division = field(&record, Some(div_col));
        teams.push(TeamMeta {
            team,
            conference: field(&record, Some(conf_col)).to_string(),
            division: if is_missing(division) {
                None
            } else {
                Some(division.to_string())
            },
        });
    }

    Ok(teams)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GAMES: &str = "\
week,game,team_home,team_away,score_home,score_away,platform_spread,ats_winner,weather_temperature,weather_wind_mph,weather_detail,Kevin,Yianni
1,1,NE,BUF,24,21,-3.5,BUF,40,12,Rain,0,1
1,2,LVR,KC,10,31,6.5,KC,,,Indoor,1,1.0
2,1,KC,NE,20,17,-3.0,PUSH,70.0,3,,True,false
";

    const PICKS: &str = "\
week,game,player,pick
1,1,Kevin,NE
1,1,Yianni,BUF
1,2,Kevin,KC
9,9,Kevin,NE
";

    const TEAMS: &str = "\
team_id,team_conference,team_division
NE,AFC,AFC East
BUF,AFC,AFC East
KC,AFC,AFC West
LVR,AFC,AFC West
OAK,AFC,
";

    fn load() -> RecordStore {
        let roster = RosterConfig {
            participants: vec![ParticipantId::from("Kevin"), ParticipantId::from("Yianni")],
            ..RosterConfig::default()
        };
        RecordStore::from_readers(GAMES.as_bytes(), PICKS.as_bytes(), TEAMS.as_bytes(), &roster)
            .unwrap()
    }

    #[test]
    fn test_load_tables() {
        let store = load();
        let stats = store.stats();
        assert_eq!(stats.game_count, 3);
        assert_eq!(stats.pick_count, 4);
        assert_eq!(stats.orphan_picks, 1);
        assert_eq!(stats.current_team_count, 4);
        assert_eq!(stats.first_week, Some(1));
        assert_eq!(stats.last_week, Some(2));
    }

    #[test]
    fn test_aliases_and_missing_values() {
        let store = load();
        let game = store.game(GameKey::new(1, 2)).unwrap();
        assert_eq!(game.home, TeamId::from("LV"));
        assert_eq!(game.weather.temperature, None);
        assert_eq!(game.weather.detail.as_deref(), Some("Indoor"));
        assert_eq!(game.correct.get(&ParticipantId::from("Yianni")), Some(&true));

        let push = store.game(GameKey::new(2, 1)).unwrap();
        assert_eq!(push.ats_winner, Some(AtsResult::Push));
        assert_eq!(push.weather.detail, None);
        assert_eq!(push.correct.get(&ParticipantId::from("Kevin")), Some(&true));
    }

    #[test]
    fn test_joined_picks_drop_orphans() {
        let store = load();
        assert_eq!(store.joined_picks().count(), 3);
        // Kevin's week 9 pick has no game
        assert!(store.joined_picks().all(|(p, _)| p.week != 9));
    }

    #[test]
    fn test_missing_column_is_fatal() {
        let games = "week,game,team_home,team_away\n1,1,NE,BUF\n";
        let err = RecordStore::from_readers(
            games.as_bytes(),
            PICKS.as_bytes(),
            TEAMS.as_bytes(),
            &RosterConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, PickemError::MissingColumn { .. }));
    }

    #[test]
    fn test_duplicate_game_is_fatal() {
        let games = "\
week,game,team_home,team_away,platform_spread,ats_winner
1,1,NE,BUF,-3,NE
1,1,KC,LV,-3,KC
";
        let err = RecordStore::from_readers(
            games.as_bytes(),
            "week,game,player,pick\n".as_bytes(),
            TEAMS.as_bytes(),
            &RosterConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, PickemError::DuplicateGame { week: 1, game: 1 }));
    }

    #[test]
    fn test_invalid_ats_winner_is_fatal() {
        let games = "\
week,game,team_home,team_away,platform_spread,ats_winner
1,1,NE,BUF,-3,KC
";
        let err = RecordStore::from_readers(
            games.as_bytes(),
            "week,game,player,pick\n".as_bytes(),
            TEAMS.as_bytes(),
            &RosterConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, PickemError::InvalidAtsWinner { .. }));
    }

    #[test]
    fn test_pick_for_team_not_playing_is_fatal() {
        let picks = "week,game,player,pick\n1,1,Kevin,KC\n";
        let err = RecordStore::from_readers(
            GAMES.as_bytes(),
            picks.as_bytes(),
            TEAMS.as_bytes(),
            &RosterConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, PickemError::InvalidPick { .. }));
    }

    #[test]
    fn test_malformed_number_is_fatal() {
        let games = "\
week,game,team_home,team_away,platform_spread,ats_winner
one,1,NE,BUF,-3,NE
";
        let err = RecordStore::from_readers(
            games.as_bytes(),
            "week,game,player,pick\n".as_bytes(),
            TEAMS.as_bytes(),
            &RosterConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, PickemError::Malformed { row: 1, .. }));
    }
}
