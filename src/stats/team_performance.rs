//! Team performance against the spread and straight up

use serde::Serialize;
use std::collections::BTreeMap;

use crate::data::GameRecord;
use crate::TeamId;

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Season record for a team
#[derive(Debug, Clone, Default)]
pub struct TeamRecord {
    /// Total appearances (home + away)
    pub games: usize,
    /// Games the team covered
    pub ats_wins: usize,
    /// Games that pushed
    pub ats_pushes: usize,
    pub home_games: usize,
    pub home_covers: usize,
    pub away_games: usize,
    pub away_covers: usize,
    /// Games with a final score
    pub ml_games: usize,
    pub ml_wins: usize,
    pub ml_losses: usize,
    pub ml_ties: usize,
}

impl TeamRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update the record with one game the team played in
    pub fn update(&mut self, game: &GameRecord, team: &TeamId) {
        let is_home = match game.is_home(team) {
            Some(h) => h,
            None => return,
        };

        let covered = game
            .ats_winner
            .as_ref()
            .map(|ats| ats.covered_by(team))
            .unwrap_or(false);
        let pushed = game
            .ats_winner
            .as_ref()
            .map(|ats| ats.is_push())
            .unwrap_or(false);

        self.games += 1;
        if covered {
            self.ats_wins += 1;
        }
        if pushed {
            self.ats_pushes += 1;
        }

        if is_home {
            self.home_games += 1;
            if covered {
                self.home_covers += 1;
            }
        } else {
            self.away_games += 1;
            if covered {
                self.away_covers += 1;
            }
        }

        if game.has_final_score() {
            self.ml_games += 1;
            match game.winner() {
                Some(winner) if winner == team => self.ml_wins += 1,
                Some(_) => self.ml_losses += 1,
                None => self.ml_ties += 1,
            }
        }
    }

    /// Games that neither covered nor pushed
    pub fn ats_losses(&self) -> usize {
        self.games - self.ats_wins - self.ats_pushes
    }

    /// Cover rate over all games played (0-1)
    pub fn ats_pct(&self) -> f64 {
        ratio(self.ats_wins, self.games)
    }

    /// Straight-up win rate (0-1)
    pub fn ml_pct(&self) -> f64 {
        ratio(self.ml_wins, self.ml_games)
    }

    pub fn home_cover_pct(&self) -> f64 {
        ratio(self.home_covers, self.home_games)
    }

    pub fn away_cover_pct(&self) -> f64 {
        ratio(self.away_covers, self.away_games)
    }
}

/// Builds records for every team that appears in the games table
pub struct TeamRecordComputer {
    records: BTreeMap<TeamId, TeamRecord>,
}

impl TeamRecordComputer {
    pub fn new() -> Self {
        TeamRecordComputer {
            records: BTreeMap::new(),
        }
    }

    /// Process games and build records
    pub fn process_games(&mut self, games: &[GameRecord]) {
        for game in games {
            self.records
                .entry(game.home.clone())
                .or_default()
                .update(game, &game.home);
            self.records
                .entry(game.away.clone())
                .or_default()
                .update(game, &game.away);
        }
    }

    pub fn from_games(games: &[GameRecord]) -> Self {
        let mut computer = Self::new();
        computer.process_games(games);
        computer
    }

    pub fn get(&self, team: &TeamId) -> Option<&TeamRecord> {
        self.records.get(team)
    }

    pub fn all(&self) -> &BTreeMap<TeamId, TeamRecord> {
        &self.records
    }

    /// ATS table, best cover rate first
    pub fn ats_table(&self) -> Vec<AtsRow> {
        let mut rows: Vec<AtsRow> = self
            .records
            .iter()
            .map(|(team, r)| AtsRow {
                team: team.clone(),
                ats_wins: r.ats_wins,
                ats_losses: r.ats_losses(),
                ats_pushes: r.ats_pushes,
                ats_games: r.games,
                ats_pct: r.ats_pct(),
            })
            .collect();
        // Stable sort keeps ties in team order
        rows.sort_by(|a, b| b.ats_pct.total_cmp(&a.ats_pct));
        rows
    }

    /// Straight-up table, best win rate first
    pub fn moneyline_table(&self) -> Vec<MoneylineRow> {
        let mut rows: Vec<MoneylineRow> = self
            .records
            .iter()
            .map(|(team, r)| MoneylineRow {
                team: team.clone(),
                ml_wins: r.ml_wins,
                ml_losses: r.ml_losses,
                ml_ties: r.ml_ties,
                ml_games: r.ml_games,
                ml_pct: r.ml_pct(),
            })
            .collect();
        rows.sort_by(|a, b| b.ml_pct.total_cmp(&a.ml_pct));
        rows
    }

    /// Home and away cover rates in team order
    pub fn home_away_table(&self) -> Vec<HomeAwaySplit> {
        self.records
            .iter()
            .map(|(team, r)| HomeAwaySplit {
                team: team.clone(),
                home_cover_pct: r.home_cover_pct(),
                away_cover_pct: r.away_cover_pct(),
                home_games: r.home_games,
                away_games: r.away_games,
            })
            .collect()
    }
}

impl Default for TeamRecordComputer {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AtsRow {
    pub team: TeamId,
    pub ats_wins: usize,
    pub ats_losses: usize,
    pub ats_pushes: usize,
    pub ats_games: usize,
    pub ats_pct: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MoneylineRow {
    pub team: TeamId,
    pub ml_wins: usize,
    pub ml_losses: usize,
    pub ml_ties: usize,
    pub ml_games: usize,
    pub ml_pct: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HomeAwaySplit {
    pub team: TeamId,
    pub home_cover_pct: f64,
    pub away_cover_pct: f64,
    pub home_games: usize,
    pub away_games: usize,
}

/// Absolute spread ranges used to group favorites
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum SpreadBucket {
    HalfToOne,
    OneAndHalfToThree,
    ThreeAndHalfToFive,
    FiveAndHalfToSeven,
    SevenAndHalfToTen,
    OverTen,
}

impl SpreadBucket {
    pub const ALL: [SpreadBucket; 6] = [
        SpreadBucket::HalfToOne,
        SpreadBucket::OneAndHalfToThree,
        SpreadBucket::ThreeAndHalfToFive,
        SpreadBucket::FiveAndHalfToSeven,
        SpreadBucket::SevenAndHalfToTen,
        SpreadBucket::OverTen,
    ];

    /// Bucket for an absolute spread; a pick'em line (0) has no bucket.
    /// Upper bounds are inclusive.
    pub fn for_spread(spread: f64) -> Option<Self> {
        let abs = spread.abs();
        if abs <= 0.0 || abs.is_nan() {
            None
        } else if abs <= 1.0 {
            Some(SpreadBucket::HalfToOne)
        } else if abs <= 3.0 {
            Some(SpreadBucket::OneAndHalfToThree)
        } else if abs <= 5.0 {
            Some(SpreadBucket::ThreeAndHalfToFive)
        } else if abs <= 7.0 {
            Some(SpreadBucket::FiveAndHalfToSeven)
        } else if abs <= 10.0 {
            Some(SpreadBucket::SevenAndHalfToTen)
        } else {
            Some(SpreadBucket::OverTen)
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SpreadBucket::HalfToOne => "0.5-1",
            SpreadBucket::OneAndHalfToThree => "1.5-3",
            SpreadBucket::ThreeAndHalfToFive => "3.5-5",
            SpreadBucket::FiveAndHalfToSeven => "5.5-7",
            SpreadBucket::SevenAndHalfToTen => "7.5-10",
            SpreadBucket::OverTen => "10+",
        }
    }
}

/// Favorite cover tally for one group of games
#[derive(Debug, Clone, Default, Serialize)]
pub struct FavoriteCoverTally {
    pub covered: usize,
    pub games: usize,
}

impl FavoriteCoverTally {
    fn record(&mut self, covered: bool) {
        self.games += 1;
        if covered {
            self.covered += 1;
        }
    }

    pub fn rate(&self) -> f64 {
        ratio(self.covered, self.games)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SpreadBucketRow {
    pub bucket: SpreadBucket,
    pub label: &'static str,
    pub fav_cover_rate: f64,
    pub fav_covered: usize,
    pub games: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeeklySurpriseRow {
    pub week: u32,
    pub fav_cover_rate: f64,
    pub fav_covered: usize,
    pub games: usize,
}

/// Favorite cover rate by spread size; games without a line or ATS result are skipped,
/// empty buckets are omitted
pub fn spread_bucket_table(games: &[GameRecord]) -> Vec<SpreadBucketRow> {
    let mut tallies: BTreeMap<SpreadBucket, FavoriteCoverTally> = BTreeMap::new();

    for game in games {
        let (spread, covered) = match (game.spread, game.favorite_covered()) {
            (Some(s), Some(c)) => (s, c),
            _ => continue,
        };
        if let Some(bucket) = SpreadBucket::for_spread(spread) {
            tallies.entry(bucket).or_default().record(covered);
        }
    }

    tallies
        .into_iter()
        .map(|(bucket, tally)| SpreadBucketRow {
            bucket,
            label: bucket.label(),
            fav_cover_rate: tally.rate(),
            fav_covered: tally.covered,
            games: tally.games,
        })
        .collect()
}

/// Favorite cover rate per week, lower means more upsets
pub fn weekly_surprise_table(games: &[GameRecord]) -> Vec<WeeklySurpriseRow> {
    let mut tallies: BTreeMap<u32, FavoriteCoverTally> = BTreeMap::new();

    for game in games {
        if let Some(covered) = game.favorite_covered() {
            tallies.entry(game.week).or_default().record(covered);
        }
    }

    tallies
        .into_iter()
        .map(|(week, tally)| WeeklySurpriseRow {
            week,
            fav_cover_rate: tally.rate(),
            fav_covered: tally.covered,
            games: tally.games,
        })
        .collect()
}
