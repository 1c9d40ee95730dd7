//! Per-participant model training

use log::{info, warn};
use std::collections::BTreeMap;

use super::metrics::Metrics;
use crate::data::RecordStore;
use crate::features::{ConferenceMap, FeatureSchema, Matchup, WeatherMarkers};
use crate::model::{ExampleSet, LogisticRegression, ModelBundle};
use crate::{Config, ParticipantId, Result};

/// Outcome of fitting one participant
#[derive(Debug, Clone)]
pub struct TrainingSummary {
    pub participant: ParticipantId,
    pub examples: usize,
    /// Share of picks that took the home team
    pub home_rate: f32,
    /// In-sample fit quality
    pub metrics: Metrics,
    pub final_loss: Option<f64>,
}

/// Bundle plus per-participant summaries from one training run
#[derive(Debug, Clone)]
pub struct TrainingRun {
    pub bundle: ModelBundle,
    pub summaries: Vec<TrainingSummary>,
}

/// Builds example sets from the record store and fits one model per participant
pub struct ParticipantTrainer<'a> {
    config: &'a Config,
    schema: FeatureSchema,
    conferences: ConferenceMap,
    markers: WeatherMarkers,
}

impl<'a> ParticipantTrainer<'a> {
    pub fn new(store: &RecordStore, config: &'a Config) -> Result<Self> {
        let conferences = ConferenceMap::new(store.teams(), &config.roster.default_conference);
        conferences.warn_unknown(store.teams_played().iter());

        Ok(ParticipantTrainer {
            config,
            schema: FeatureSchema::new(&config.roster.teams),
            conferences,
            markers: WeatherMarkers::new()?,
        })
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// One labelled row per pick joined to its game, grouped by participant
    pub fn example_sets(&self, store: &RecordStore) -> BTreeMap<ParticipantId, ExampleSet> {
        let mut sets: BTreeMap<ParticipantId, ExampleSet> = BTreeMap::new();
        for (pick, game) in store.joined_picks() {
            let matchup =
                Matchup::from_game(game, &self.conferences, &self.markers, &self.config.analysis);
            sets.entry(pick.participant.clone())
                .or_default()
                .push(self.schema.encode(&matchup), pick.team == game.home);
        }
        sets
    }

    /// Fit every roster participant with enough picks
    pub fn train(&self, store: &RecordStore) -> Result<TrainingRun> {
        let training = &self.config.training;
        let classifier = LogisticRegression::new(training);
        let mut sets = self.example_sets(store);

        let mut bundle = ModelBundle::new(
            self.schema.clone(),
            training.inverse_regularization,
            training.min_picks,
        );
        let mut summaries = Vec::new();

        for participant in &self.config.roster.participants {
            let examples = sets.remove(participant).unwrap_or_default();
            if examples.len() < training.min_picks {
                warn!(
                    "Skipping {}: {} picks, need {}",
                    participant,
                    examples.len(),
                    training.min_picks
                );
                bundle.excluded.insert(participant.clone(), examples.len());
                continue;
            }

            let (model, history) = classifier.fit_with_history(&examples)?;
            let metrics = Metrics::evaluate(&model, &examples);
            info!("{}: {}", participant, metrics);

            summaries.push(TrainingSummary {
                participant: participant.clone(),
                examples: examples.len(),
                home_rate: examples.home_rate(),
                metrics,
                final_loss: history.final_loss(),
            });
            bundle.models.insert(participant.clone(), model);
        }

        for (participant, examples) in &sets {
            warn!(
                "Ignoring {} picks from {}, who is not on the roster",
                examples.len(),
                participant
            );
        }

        info!(
            "Trained {} participant models ({} skipped)",
            bundle.models.len(),
            bundle.excluded.len()
        );
        Ok(TrainingRun { bundle, summaries })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::data::testutil::{game, pick, store};
    use crate::data::{GameRecord, PickRecord};
    use crate::model::FittedClassifier;

    const TEAMS: [&str; 8] = ["NE", "BUF", "KC", "LV", "SF", "SEA", "DAL", "PHI"];

    /// 24 games; "Homer" always picks home, "Sparse" makes 19 picks,
    /// "Flipper" alternates sides
    pub(crate) fn season() -> RecordStore {
        let mut games: Vec<GameRecord> = Vec::new();
        let mut picks: Vec<PickRecord> = Vec::new();

        for i in 0..24u32 {
            let week = i / 4 + 1;
            let slot = i % 4 + 1;
            let home = TEAMS[(i as usize) % TEAMS.len()];
            let away = TEAMS[(i as usize + 3) % TEAMS.len()];
            let spread = (i as f64 % 7.0) - 3.0;
            games.push(game(week, slot, home, away, Some(spread), Some(home)));

            picks.push(pick(week, slot, "Homer", home));
            picks.push(pick(week, slot, "Flipper", if i % 2 == 0 { home } else { away }));
            if i < 19 {
                picks.push(pick(week, slot, "Sparse", away));
            }
        }
        // Orphan pick for a game that does not exist
        picks.push(pick(30, 1, "Homer", "NE"));

        store(games, picks)
    }

    pub(crate) fn config() -> Config {
        let mut config = Config::default();
        config.roster.participants = vec![
            ParticipantId::from("Homer"),
            ParticipantId::from("Flipper"),
            ParticipantId::from("Sparse"),
            ParticipantId::from("Absent"),
        ];
        config.training.epochs = 200;
        config
    }

    #[test]
    fn test_example_sets_label_home_picks() {
        let store = season();
        let config = config();
        let trainer = ParticipantTrainer::new(&store, &config).unwrap();
        let sets = trainer.example_sets(&store);

        let homer = &sets[&ParticipantId::from("Homer")];
        // Orphan pick dropped
        assert_eq!(homer.len(), 24);
        assert!(homer.labels.iter().all(|&l| l == 1.0));
        assert_eq!(homer.dim(), trainer.schema().len());

        let sparse = &sets[&ParticipantId::from("Sparse")];
        assert_eq!(sparse.len(), 19);
        assert_eq!(sparse.home_rate(), 0.0);
    }

    #[test]
    fn test_min_picks_threshold() {
        let store = season();
        let config = config();
        let run = ParticipantTrainer::new(&store, &config)
            .unwrap()
            .train(&store)
            .unwrap();

        assert!(run.bundle.has_model(&ParticipantId::from("Homer")));
        assert!(run.bundle.has_model(&ParticipantId::from("Flipper")));
        assert!(!run.bundle.has_model(&ParticipantId::from("Sparse")));
        assert_eq!(run.bundle.excluded[&ParticipantId::from("Sparse")], 19);
        assert_eq!(run.bundle.excluded[&ParticipantId::from("Absent")], 0);
        assert_eq!(run.summaries.len(), 2);
    }

    #[test]
    fn test_always_home_picker_predicts_home() {
        let store = season();
        let config = config();
        let trainer = ParticipantTrainer::new(&store, &config).unwrap();
        let run = trainer.train(&store).unwrap();
        let model = run.bundle.get(&ParticipantId::from("Homer")).unwrap();

        for (home, away, spread) in [("NE", "BUF", -3.0), ("ARI", "TB", 7.5), ("SEA", "KC", 0.0)] {
            let matchup = Matchup::new(
                home.into(),
                away.into(),
                spread,
                9,
                &config.analysis,
            );
            let p = model.predict_proba(&trainer.schema().encode(&matchup));
            assert!(p > 0.5, "{} vs {}: {}", home, away, p);
        }
    }

    #[test]
    fn test_two_team_single_week_home_picker() {
        let mut games = Vec::new();
        let mut picks = Vec::new();
        for slot in 1..=20u32 {
            let (home, away) = if slot % 2 == 0 { ("NE", "BUF") } else { ("BUF", "NE") };
            games.push(game(1, slot, home, away, Some(-3.0), Some(home)));
            picks.push(pick(1, slot, "Homer", home));
        }
        let store = store(games, picks);
        let config = config();
        let trainer = ParticipantTrainer::new(&store, &config).unwrap();
        let run = trainer.train(&store).unwrap();
        let model = run.bundle.get(&ParticipantId::from("Homer")).unwrap();

        // Unseen teams, both spread extremes, late week and rough weather
        for (home, away, spread) in [
            ("NE", "BUF", 10.0),
            ("BUF", "NE", -10.0),
            ("ARI", "TB", 10.0),
            ("XYZ", "NE", 0.0),
        ] {
            let mut matchup = Matchup::new(home.into(), away.into(), spread, 18, &config.analysis);
            matchup.wind_mph = 25.0;
            matchup.rain_snow = true;
            matchup.cross_conference = true;
            let p = model.predict_proba(&trainer.schema().encode(&matchup));
            assert!(p > 0.5, "{} vs {}: {}", home, away, p);
        }
    }
}
