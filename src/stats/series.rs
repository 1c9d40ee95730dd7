//! Week-by-week score series: cumulative totals, rolling form and streaks

use serde::Serialize;

use crate::data::RecordStore;
use crate::ParticipantId;

/// Correct picks per participant per week, weeks ascending
#[derive(Debug, Clone, Serialize)]
pub struct WeeklyTotals {
    pub weeks: Vec<u32>,
    /// Roster order; participants without a correctness column are absent
    pub totals: Vec<(ParticipantId, Vec<u32>)>,
}

impl WeeklyTotals {
    /// Sum each participant's correctness flags by week
    pub fn from_store(store: &RecordStore, participants: &[ParticipantId]) -> Self {
        let weeks = store.weeks();

        let totals = participants
            .iter()
            .filter(|p| store.games().iter().any(|g| g.correct.contains_key(*p)))
            .map(|p| {
                let per_week = weeks
                    .iter()
                    .map(|&week| {
                        store
                            .games()
                            .iter()
                            .filter(|g| g.week == week)
                            .filter(|g| g.correct.get(p).copied().unwrap_or(false))
                            .count() as u32
                    })
                    .collect();
                (p.clone(), per_week)
            })
            .collect();

        WeeklyTotals { weeks, totals }
    }

    pub fn get(&self, participant: &ParticipantId) -> Option<&[u32]> {
        self.totals
            .iter()
            .find(|(p, _)| p == participant)
            .map(|(_, v)| v.as_slice())
    }
}

/// One week of a participant's score series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScorePoint {
    pub week: u32,
    pub correct: u32,
    pub cumulative: u32,
    /// Trailing mean over up to `window` weeks
    pub rolling_avg: f64,
}

/// Trailing moving average; the first weeks average over what is available
pub fn rolling_mean(values: &[u32], window: usize) -> Vec<f64> {
    let window = window.max(1);
    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            let slice = &values[start..=i];
            slice.iter().map(|&v| v as f64).sum::<f64>() / slice.len() as f64
        })
        .collect()
}

/// Cumulative and rolling series for every participant
pub fn score_series(
    totals: &WeeklyTotals,
    window: usize,
) -> Vec<(ParticipantId, Vec<ScorePoint>)> {
    totals
        .totals
        .iter()
        .map(|(participant, values)| {
            let rolling = rolling_mean(values, window);
            let mut cumulative = 0;
            let points = totals
                .weeks
                .iter()
                .zip(values.iter())
                .zip(rolling)
                .map(|((&week, &correct), rolling_avg)| {
                    cumulative += correct;
                    ScorePoint {
                        week,
                        correct,
                        cumulative,
                        rolling_avg,
                    }
                })
                .collect();
            (participant.clone(), points)
        })
        .collect()
}

/// Contiguous run of weeks and the correct picks in it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StreakWindow {
    pub start_week: u32,
    pub end_week: u32,
    pub total_correct: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct StreakRow {
    pub participant: ParticipantId,
    pub best: StreakWindow,
    pub worst: StreakWindow,
}

/// Best and worst `window`-week runs, earliest window winning ties.
/// None if the series is shorter than the window.
pub fn find_streaks(
    weeks: &[u32],
    values: &[u32],
    window: usize,
) -> Option<(StreakWindow, StreakWindow)> {
    if window == 0 || values.len() < window || weeks.len() != values.len() {
        return None;
    }

    let make = |start: usize| StreakWindow {
        start_week: weeks[start],
        end_week: weeks[start + window - 1],
        total_correct: values[start..start + window].iter().sum(),
    };

    let mut best = make(0);
    let mut worst = best;
    for start in 1..=values.len() - window {
        let candidate = make(start);
        if candidate.total_correct > best.total_correct {
            best = candidate;
        }
        if candidate.total_correct < worst.total_correct {
            worst = candidate;
        }
    }

    Some((best, worst))
}

/// Hot and cold streaks for every participant with enough weeks
pub fn streak_table(totals: &WeeklyTotals, window: usize) -> Vec<StreakRow> {
    totals
        .totals
        .iter()
        .filter_map(|(participant, values)| {
            let (best, worst) = find_streaks(&totals.weeks, values, window)?;
            Some(StreakRow {
                participant: participant.clone(),
                best,
                worst,
            })
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardRow {
    /// Competition ranking: equal totals share a rank
    pub rank: usize,
    pub participant: ParticipantId,
    pub total_correct: u32,
}

/// Final cumulative standings, highest first
pub fn leaderboard(totals: &WeeklyTotals) -> Vec<LeaderboardRow> {
    let mut standings: Vec<(&ParticipantId, u32)> = totals
        .totals
        .iter()
        .map(|(p, values)| (p, values.iter().sum()))
        .collect();
    standings.sort_by(|a, b| b.1.cmp(&a.1));

    let mut rows: Vec<LeaderboardRow> = Vec::with_capacity(standings.len());
    for (i, (participant, total_correct)) in standings.into_iter().enumerate() {
        let rank = match rows.last() {
            Some(prev) if prev.total_correct == total_correct => prev.rank,
            _ => i + 1,
        };
        rows.push(LeaderboardRow {
            rank,
            participant: participant.clone(),
            total_correct,
        });
    }
    rows
}
