//! Majority picks, herd-following and contrarian behavior
//!
//! The majority pick of a game is the team with the most picks. Equal counts are
//! broken toward the lexicographically smallest team id.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::data::{GameKey, RecordStore};
use crate::{ParticipantId, TeamId};

/// Pick distribution and majority for a single game
#[derive(Debug, Clone, Serialize)]
pub struct GameConsensus {
    pub week: u32,
    pub game: u32,
    pub pick_counts: BTreeMap<TeamId, usize>,
    pub majority_pick: TeamId,
    pub majority_count: usize,
    pub total_pickers: usize,
    /// majority_count / total_pickers
    pub consensus_pct: f64,
    /// None when the game or its ATS result is unknown
    pub majority_correct: Option<bool>,
}

impl GameConsensus {
    /// Majority from per-team counts; None if nobody picked
    fn from_counts(key: GameKey, pick_counts: BTreeMap<TeamId, usize>) -> Option<Self> {
        let mut majority: Option<(&TeamId, usize)> = None;
        // Ascending team order + strict comparison keeps the smallest id on ties
        for (team, &count) in &pick_counts {
            match majority {
                Some((_, best)) if count <= best => {}
                _ => majority = Some((team, count)),
            }
        }
        let (majority_pick, majority_count) = majority.map(|(t, c)| (t.clone(), c))?;
        let total_pickers: usize = pick_counts.values().sum();

        Some(GameConsensus {
            week: key.week,
            game: key.game,
            consensus_pct: majority_count as f64 / total_pickers as f64,
            pick_counts,
            majority_pick,
            majority_count,
            total_pickers,
            majority_correct: None,
        })
    }

    pub fn key(&self) -> GameKey {
        GameKey::new(self.week, self.game)
    }
}

/// Majority pick for every game that received picks, including games missing
/// from the games table
pub fn majority_by_game(store: &RecordStore) -> BTreeMap<GameKey, GameConsensus> {
    let mut tallies: BTreeMap<GameKey, BTreeMap<TeamId, usize>> = BTreeMap::new();
    for pick in store.picks() {
        *tallies
            .entry(pick.key())
            .or_default()
            .entry(pick.team.clone())
            .or_default() += 1;
    }

    tallies
        .into_iter()
        .filter_map(|(key, counts)| {
            let mut consensus = GameConsensus::from_counts(key, counts)?;
            consensus.majority_correct = store
                .game(key)
                .and_then(|g| g.pick_covered(&consensus.majority_pick));
            Some((key, consensus))
        })
        .collect()
}

/// Consensus for games present in the games table, in (week, game) order
pub fn consensus_table(store: &RecordStore) -> Vec<GameConsensus> {
    majority_by_game(store)
        .into_values()
        .filter(|c| store.game(c.key()).is_some())
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct HerdRateRow {
    pub participant: ParticipantId,
    pub herd_rate: f64,
    pub with_herd: usize,
    pub total: usize,
}

/// Fraction of each participant's picks that matched the majority, highest first
pub fn herd_rates(store: &RecordStore) -> Vec<HerdRateRow> {
    let majority = majority_by_game(store);
    let mut tallies: BTreeMap<&ParticipantId, (usize, usize)> = BTreeMap::new();

    for pick in store.picks() {
        let consensus = match majority.get(&pick.key()) {
            Some(c) => c,
            None => continue,
        };
        let entry = tallies.entry(&pick.participant).or_insert((0, 0));
        if pick.team == consensus.majority_pick {
            entry.0 += 1;
        }
        entry.1 += 1;
    }

    let mut rows: Vec<HerdRateRow> = tallies
        .into_iter()
        .map(|(participant, (with_herd, total))| HerdRateRow {
            participant: participant.clone(),
            herd_rate: if total == 0 {
                0.0
            } else {
                with_herd as f64 / total as f64
            },
            with_herd,
            total,
        })
        .collect();
    rows.sort_by(|a, b| b.herd_rate.total_cmp(&a.herd_rate));
    rows
}

#[derive(Debug, Clone, Serialize)]
pub struct ContrarianRow {
    pub participant: ParticipantId,
    pub contrarian_rate: f64,
    pub contrarian_count: usize,
    pub total: usize,
    pub contrarian_wins: usize,
    /// Cover rate of picks against the majority; None without any
    pub contrarian_win_rate: Option<f64>,
}

/// How often each participant went against the majority and how that worked out,
/// most contrarian first. Only picks on games in the games table count.
pub fn contrarian_table(store: &RecordStore) -> Vec<ContrarianRow> {
    let majority = majority_by_game(store);

    #[derive(Default)]
    struct Tally {
        contrarian: usize,
        total: usize,
        contrarian_wins: usize,
    }

    let mut tallies: BTreeMap<&ParticipantId, Tally> = BTreeMap::new();
    for (pick, game) in store.joined_picks() {
        let consensus = match majority.get(&pick.key()) {
            Some(c) => c,
            None => continue,
        };
        let tally = tallies.entry(&pick.participant).or_default();
        tally.total += 1;
        if pick.team != consensus.majority_pick {
            tally.contrarian += 1;
            if game.pick_covered(&pick.team).unwrap_or(false) {
                tally.contrarian_wins += 1;
            }
        }
    }

    let mut rows: Vec<ContrarianRow> = tallies
        .into_iter()
        .map(|(participant, t)| ContrarianRow {
            participant: participant.clone(),
            contrarian_rate: if t.total == 0 {
                0.0
            } else {
                t.contrarian as f64 / t.total as f64
            },
            contrarian_count: t.contrarian,
            total: t.total,
            contrarian_wins: t.contrarian_wins,
            contrarian_win_rate: if t.contrarian == 0 {
                None
            } else {
                Some(t.contrarian_wins as f64 / t.contrarian as f64)
            },
        })
        .collect();
    rows.sort_by(|a, b| b.contrarian_rate.total_cmp(&a.contrarian_rate));
    rows
}

/// How reliable near-unanimous picks were
#[derive(Debug, Clone, Serialize)]
pub struct HighConsensusSummary {
    pub threshold: f64,
    pub games: usize,
    pub majority_correct: usize,
    pub accuracy: f64,
}

/// Majority accuracy over games whose consensus exceeds `threshold`.
/// Games without an ATS result are left out; None if no game qualifies.
pub fn high_consensus_accuracy(
    consensus: &[GameConsensus],
    threshold: f64,
) -> Option<HighConsensusSummary> {
    let decided: Vec<bool> = consensus
        .iter()
        .filter(|c| c.consensus_pct > threshold)
        .filter_map(|c| c.majority_correct)
        .collect();
    if decided.is_empty() {
        return None;
    }

    let majority_correct = decided.iter().filter(|&&c| c).count();
    Some(HighConsensusSummary {
        threshold,
        games: decided.len(),
        majority_correct,
        accuracy: majority_correct as f64 / decided.len() as f64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::testutil::{game, pick, store};

    fn fixture() -> RecordStore {
        store(
            vec![
                game(1, 1, "NE", "BUF", Some(-3.0), Some("BUF")),
                game(1, 2, "KC", "LV", Some(-7.0), Some("KC")),
            ],
            vec![
                // Game 1: NE 2, BUF 1
                pick(1, 1, "A", "NE"),
                pick(1, 1, "B", "NE"),
                pick(1, 1, "C", "BUF"),
                // Game 2: tie KC 1, LV 1 -> KC by team id
                pick(1, 2, "A", "LV"),
                pick(1, 2, "B", "KC"),
                // Orphan game, unanimous
                pick(3, 3, "A", "SF"),
                pick(3, 3, "C", "SF"),
            ],
        )
    }

    #[test]
    fn test_counts_sum_to_pickers_and_majority_is_max() {
        let majority = majority_by_game(&fixture());
        assert_eq!(majority.len(), 3);
        for consensus in majority.values() {
            let sum: usize = consensus.pick_counts.values().sum();
            assert_eq!(sum, consensus.total_pickers);
            let max = consensus.pick_counts.values().copied().max().unwrap();
            assert_eq!(consensus.majority_count, max);
        }
    }

    #[test]
    fn test_tie_breaks_to_smallest_team_id() {
        let majority = majority_by_game(&fixture());
        let game2 = &majority[&GameKey::new(1, 2)];
        assert_eq!(game2.majority_pick, TeamId::from("KC"));
        assert_eq!(game2.consensus_pct, 0.5);
        assert_eq!(game2.majority_correct, Some(true));
    }

    #[test]
    fn test_consensus_table_is_inner_join() {
        let table = consensus_table(&fixture());
        assert_eq!(table.len(), 2);
        let game1 = &table[0];
        assert_eq!(game1.majority_pick, TeamId::from("NE"));
        assert_eq!(game1.majority_count, 2);
        assert_eq!(game1.total_pickers, 3);
        assert_eq!(game1.majority_correct, Some(false));
    }

    #[test]
    fn test_herd_rates() {
        let rows = herd_rates(&fixture());
        let find = |p: &str| {
            rows.iter()
                .find(|r| r.participant == ParticipantId::from(p))
                .unwrap()
                .clone()
        };
        // A: NE (herd), LV (not), SF (herd)
        let a = find("A");
        assert_eq!(a.total, 3);
        assert_eq!(a.with_herd, 2);
        assert_eq!(find("B").herd_rate, 1.0);
        assert_eq!(find("C").herd_rate, 0.5);
        assert_eq!(rows[0].participant, ParticipantId::from("B"));
    }

    #[test]
    fn test_contrarian_win_rate_only_over_contrarian_picks() {
        let rows = contrarian_table(&fixture());
        let find = |p: &str| {
            rows.iter()
                .find(|r| r.participant == ParticipantId::from(p))
                .unwrap()
                .clone()
        };

        let c = find("C");
        // Orphan pick not joined
        assert_eq!(c.total, 1);
        assert_eq!(c.contrarian_count, 1);
        assert_eq!(c.contrarian_win_rate, Some(1.0));

        let a = find("A");
        assert_eq!(a.total, 2);
        assert_eq!(a.contrarian_count, 1);
        assert_eq!(a.contrarian_win_rate, Some(0.0));

        let b = find("B");
        assert_eq!(b.contrarian_count, 0);
        assert_eq!(b.contrarian_win_rate, None);
    }

    #[test]
    fn test_high_consensus_accuracy() {
        let table = consensus_table(&fixture());
        assert!(high_consensus_accuracy(&table, 0.85).is_none());

        let summary = high_consensus_accuracy(&table, 0.4).unwrap();
        assert_eq!(summary.games, 2);
        assert_eq!(summary.majority_correct, 1);
        assert_eq!(summary.accuracy, 0.5);
    }
}
