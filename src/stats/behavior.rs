//! Participant pick tendencies: team popularity and favorite/underdog lean

use serde::Serialize;
use std::collections::BTreeMap;

use crate::data::RecordStore;
use crate::{ParticipantId, TeamId};

#[derive(Debug, Clone, Serialize)]
pub struct PickPopularityRow {
    pub team: TeamId,
    pub total_picks: usize,
}

/// Times each team was picked across all participants and weeks, most picked first
pub fn pick_popularity(store: &RecordStore) -> Vec<PickPopularityRow> {
    let mut counts: BTreeMap<&TeamId, usize> = BTreeMap::new();
    for pick in store.picks() {
        *counts.entry(&pick.team).or_default() += 1;
    }

    let mut rows: Vec<PickPopularityRow> = counts
        .into_iter()
        .map(|(team, total_picks)| PickPopularityRow {
            team: team.clone(),
            total_picks,
        })
        .collect();
    rows.sort_by(|a, b| b.total_picks.cmp(&a.total_picks));
    rows
}

#[derive(Debug, Clone, Serialize)]
pub struct FavoriteRateRow {
    pub participant: ParticipantId,
    /// Fraction of joined picks that took the bookmaker favorite
    pub fav_rate: f64,
    pub favorites: usize,
    pub total: usize,
}

impl FavoriteRateRow {
    pub fn underdog_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            1.0 - self.fav_rate
        }
    }
}

/// How often each participant backs the favorite, highest first.
///
/// Picks are inner-joined to their game and orphan picks do not count. A game
/// without a line is treated as spread 0, so the away team is the favorite.
pub fn favorite_rates(store: &RecordStore) -> Vec<FavoriteRateRow> {
    let mut tallies: BTreeMap<&ParticipantId, (usize, usize)> = BTreeMap::new();

    for (pick, game) in store.joined_picks() {
        let favorite = if game.spread.unwrap_or(0.0) < 0.0 {
            &game.home
        } else {
            &game.away
        };
        let entry = tallies.entry(&pick.participant).or_insert((0, 0));
        if &pick.team == favorite {
            entry.0 += 1;
        }
        entry.1 += 1;
    }

    let mut rows: Vec<FavoriteRateRow> = tallies
        .into_iter()
        .map(|(participant, (favorites, total))| FavoriteRateRow {
            participant: participant.clone(),
            fav_rate: if total == 0 {
                0.0
            } else {
                favorites as f64 / total as f64
            },
            favorites,
            total,
        })
        .collect();
    rows.sort_by(|a, b| b.fav_rate.total_cmp(&a.fav_rate));
    rows
}
