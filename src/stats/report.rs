//! Full season report: every derived table in one serializable bundle

use chrono::{DateTime, Utc};
use log::info;
use serde::Serialize;
use std::path::Path;

use super::affinity::{AffinityCell, AffinityMatrix};
use super::behavior::{favorite_rates, pick_popularity, FavoriteRateRow, PickPopularityRow};
use super::consensus::{
    consensus_table, contrarian_table, herd_rates, high_consensus_accuracy, ContrarianRow,
    GameConsensus, HerdRateRow, HighConsensusSummary,
};
use super::series::{
    leaderboard, score_series, streak_table, LeaderboardRow, ScorePoint, StreakRow, WeeklyTotals,
};
use super::team_performance::{
    spread_bucket_table, weekly_surprise_table, AtsRow, HomeAwaySplit, MoneylineRow,
    SpreadBucketRow, TeamRecordComputer, WeeklySurpriseRow,
};
use crate::data::RecordStore;
use crate::{Config, ParticipantId, Result};

#[derive(Debug, Clone, Serialize)]
pub struct SeasonReport {
    pub generated_at: DateTime<Utc>,

    // Teams
    pub ats: Vec<AtsRow>,
    pub moneyline: Vec<MoneylineRow>,
    pub home_away: Vec<HomeAwaySplit>,
    pub spread_buckets: Vec<SpreadBucketRow>,
    pub weekly_surprise: Vec<WeeklySurpriseRow>,

    // Participants
    pub pick_popularity: Vec<PickPopularityRow>,
    pub favorite_rates: Vec<FavoriteRateRow>,
    pub affinity: AffinityMatrix,
    pub biggest_fans: Vec<AffinityCell>,
    pub biggest_haters: Vec<AffinityCell>,
    pub consensus: Vec<GameConsensus>,
    pub herd_rates: Vec<HerdRateRow>,
    pub contrarians: Vec<ContrarianRow>,
    pub high_consensus: Option<HighConsensusSummary>,
    pub weekly_totals: WeeklyTotals,
    pub score_series: Vec<(ParticipantId, Vec<ScorePoint>)>,
    pub streaks: Vec<StreakRow>,
    pub leaderboard: Vec<LeaderboardRow>,
}

impl SeasonReport {
    pub fn compute(store: &RecordStore, config: &Config) -> Self {
        let analysis = &config.analysis;
        let excluded = config.roster.ranking_exclusions();

        let teams = TeamRecordComputer::from_games(store.games());
        let affinity = AffinityMatrix::from_store(store);
        let consensus = consensus_table(store);
        let weekly_totals = WeeklyTotals::from_store(store, &config.roster.participants);

        let report = SeasonReport {
            generated_at: Utc::now(),
            ats: teams.ats_table(),
            moneyline: teams.moneyline_table(),
            home_away: teams.home_away_table(),
            spread_buckets: spread_bucket_table(store.games()),
            weekly_surprise: weekly_surprise_table(store.games()),
            pick_popularity: pick_popularity(store),
            favorite_rates: favorite_rates(store),
            biggest_fans: affinity.top(analysis.top_n, &excluded),
            biggest_haters: affinity.bottom(analysis.top_n, &excluded),
            affinity,
            high_consensus: high_consensus_accuracy(
                &consensus,
                analysis.high_consensus_threshold,
            ),
            consensus,
            herd_rates: herd_rates(store),
            contrarians: contrarian_table(store),
            score_series: score_series(&weekly_totals, analysis.rolling_window),
            streaks: streak_table(&weekly_totals, analysis.streak_window),
            leaderboard: leaderboard(&weekly_totals),
            weekly_totals,
        };

        info!(
            "Season report: {} teams, {} games with picks, {} participants on the leaderboard",
            report.ats.len(),
            report.consensus.len(),
            report.leaderboard.len()
        );
        report
    }

    /// Write the report as pretty JSON, creating parent directories
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        info!("Season report written to {}", path.display());
        Ok(())
    }
}
