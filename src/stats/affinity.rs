//! Picks-Above-Average (PAA) affinity matrix
//!
//! Each cell is a participant's pick count for a team minus the mean pick count
//! for that team across all participants.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::data::RecordStore;
use crate::{ParticipantId, TeamId};

/// Signed participant × team matrix
#[derive(Debug, Clone, Serialize)]
pub struct AffinityMatrix {
    pub participants: Vec<ParticipantId>,
    pub teams: Vec<TeamId>,
    /// values[participant][team]
    pub values: Vec<Vec<f64>>,
}

/// One ranked matrix cell
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AffinityCell {
    pub participant: ParticipantId,
    pub team: TeamId,
    pub paa: f64,
}

impl AffinityMatrix {
    /// Build from every pick in the store
    pub fn from_store(store: &RecordStore) -> Self {
        let mut counts: BTreeMap<(&ParticipantId, &TeamId), usize> = BTreeMap::new();
        let mut participants = BTreeSet::new();
        let mut teams = BTreeSet::new();

        for pick in store.picks() {
            *counts.entry((&pick.participant, &pick.team)).or_default() += 1;
            participants.insert(&pick.participant);
            teams.insert(&pick.team);
        }

        let participants: Vec<ParticipantId> = participants.into_iter().cloned().collect();
        let teams: Vec<TeamId> = teams.into_iter().cloned().collect();

        let mut values: Vec<Vec<f64>> = participants
            .iter()
            .map(|p| {
                teams
                    .iter()
                    .map(|t| counts.get(&(p, t)).copied().unwrap_or(0) as f64)
                    .collect()
            })
            .collect();

        // Mean is over participants, not games
        let n = participants.len() as f64;
        for j in 0..teams.len() {
            let mean = if n > 0.0 {
                values.iter().map(|row| row[j]).sum::<f64>() / n
            } else {
                0.0
            };
            for row in values.iter_mut() {
                row[j] -= mean;
            }
        }

        AffinityMatrix {
            participants,
            teams,
            values,
        }
    }

    /// PAA for one participant/team pair, None if either never appears in the picks
    pub fn get(&self, participant: &ParticipantId, team: &TeamId) -> Option<f64> {
        let i = self.participants.iter().position(|p| p == participant)?;
        let j = self.teams.iter().position(|t| t == team)?;
        Some(self.values[i][j])
    }

    fn cells(&self, excluded: &[ParticipantId]) -> Vec<AffinityCell> {
        let mut cells = Vec::new();
        for (i, participant) in self.participants.iter().enumerate() {
            if excluded.contains(participant) {
                continue;
            }
            for (j, team) in self.teams.iter().enumerate() {
                cells.push(AffinityCell {
                    participant: participant.clone(),
                    team: team.clone(),
                    paa: self.values[i][j],
                });
            }
        }
        cells
    }

    /// Most positive cells ("biggest fans"), skipping excluded participants
    pub fn top(&self, n: usize, excluded: &[ParticipantId]) -> Vec<AffinityCell> {
        let mut cells = self.cells(excluded);
        cells.sort_by(|a, b| b.paa.total_cmp(&a.paa));
        cells.truncate(n);
        cells
    }

    /// Most negative cells ("biggest haters"), skipping excluded participants
    pub fn bottom(&self, n: usize, excluded: &[ParticipantId]) -> Vec<AffinityCell> {
        let mut cells = self.cells(excluded);
        cells.sort_by(|a, b| a.paa.total_cmp(&b.paa));
        cells.truncate(n);
        cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::testutil::{game, pick, store};

    fn fixture() -> RecordStore {
        let games = (1..=3)
            .map(|w| game(w, 1, "NE", "BUF", Some(-3.0), Some("NE")))
            .collect();
        let picks = vec![
            // NE: Kevin 3, Yianni 1, Vegas 2 -> mean 2
            pick(1, 1, "Kevin", "NE"),
            pick(2, 1, "Kevin", "NE"),
            pick(3, 1, "Kevin", "NE"),
            pick(1, 1, "Yianni", "NE"),
            pick(2, 1, "Yianni", "BUF"),
            pick(3, 1, "Yianni", "BUF"),
            pick(1, 1, "Vegas", "NE"),
            pick(2, 1, "Vegas", "NE"),
            pick(3, 1, "Vegas", "BUF"),
        ];
        store(games, picks)
    }

    #[test]
    fn test_average_picker_has_zero_affinity() {
        let matrix = AffinityMatrix::from_store(&fixture());
        let vegas_ne = matrix
            .get(&ParticipantId::from("Vegas"), &TeamId::from("NE"))
            .unwrap();
        assert_eq!(vegas_ne, 0.0);

        let kevin_ne = matrix
            .get(&ParticipantId::from("Kevin"), &TeamId::from("NE"))
            .unwrap();
        assert_eq!(kevin_ne, 1.0);
        let kevin_buf = matrix
            .get(&ParticipantId::from("Kevin"), &TeamId::from("BUF"))
            .unwrap();
        assert_eq!(kevin_buf, -1.0);
    }

    #[test]
    fn test_columns_sum_to_zero() {
        let matrix = AffinityMatrix::from_store(&fixture());
        for j in 0..matrix.teams.len() {
            let sum: f64 = matrix.values.iter().map(|row| row[j]).sum();
            assert!(sum.abs() < 1e-9);
        }
    }

    #[test]
    fn test_rankings_skip_excluded() {
        let matrix = AffinityMatrix::from_store(&fixture());
        let excluded = vec![ParticipantId::from("Kevin")];

        let top = matrix.top(1, &excluded);
        assert_eq!(top[0].participant, ParticipantId::from("Yianni"));
        assert_eq!(top[0].team, TeamId::from("BUF"));
        assert_eq!(top[0].paa, 1.0);

        let bottom = matrix.bottom(1, &[]);
        assert_eq!(bottom[0].paa, -1.0);
        assert_eq!(bottom[0].participant, ParticipantId::from("Kevin"));
    }

    #[test]
    fn test_unknown_pair() {
        let matrix = AffinityMatrix::from_store(&fixture());
        assert!(matrix
            .get(&ParticipantId::from("Nobody"), &TeamId::from("NE"))
            .is_none());
    }
}
