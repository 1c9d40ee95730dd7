//! Derived season statistics
//!
//! Pure functions of a [`RecordStore`](crate::data::RecordStore). Team tables live in
//! `team_performance`; the rest describe how participants pick.

pub mod affinity;
pub mod behavior;
pub mod consensus;
pub mod report;
pub mod series;
pub mod team_performance;

pub use affinity::{AffinityCell, AffinityMatrix};
pub use behavior::{favorite_rates, pick_popularity, FavoriteRateRow, PickPopularityRow};
pub use consensus::{
    consensus_table, contrarian_table, herd_rates, high_consensus_accuracy, majority_by_game,
    ContrarianRow, GameConsensus, HerdRateRow, HighConsensusSummary,
};
pub use report::SeasonReport;
pub use series::{
    find_streaks, leaderboard, rolling_mean, score_series, streak_table, LeaderboardRow,
    ScorePoint, StreakRow, StreakWindow, WeeklyTotals,
};
pub use team_performance::{
    spread_bucket_table, weekly_surprise_table, AtsRow, HomeAwaySplit, MoneylineRow,
    SpreadBucket, SpreadBucketRow, TeamRecord, TeamRecordComputer, WeeklySurpriseRow,
};
