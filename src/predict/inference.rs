//! Scoring hypothetical matchups with trained participant models

use serde::Serialize;
use std::fmt;

use crate::features::{FeatureKind, Matchup};
use crate::model::{FittedClassifier, LogisticModel, ModelBundle};
use crate::stats::AffinityMatrix;
use crate::{AnalysisConfig, ParticipantId, PickemError, Result, TeamId};

/// Which side of the matchup a factor pushes toward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Side {
    Home,
    Away,
}

/// One explained feature
#[derive(Debug, Clone, Serialize)]
pub struct Factor {
    pub label: String,
    /// coefficient × value; positive favors the home team
    pub contribution: f32,
    pub side: Side,
    /// The team this factor pushes toward
    pub toward: TeamId,
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} ({:+.2})", self.label, self.toward, self.contribution)
    }
}

/// A participant's predicted choice for one matchup
#[derive(Debug, Clone, Serialize)]
pub struct PickPrediction {
    pub participant: ParticipantId,
    pub home: TeamId,
    pub away: TeamId,
    pub prob_home: f32,
}

impl PickPrediction {
    pub fn prob_away(&self) -> f32 {
        1.0 - self.prob_home
    }

    /// Home when P(home) >= 0.5
    pub fn predicted_pick(&self) -> &TeamId {
        if self.prob_home >= 0.5 {
            &self.home
        } else {
            &self.away
        }
    }

    pub fn confidence(&self) -> f32 {
        self.prob_home.max(self.prob_away())
    }
}

impl fmt::Display for PickPrediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} ({:.0}% confidence) | {} at home {:.1}%, {} on the road {:.1}%",
            self.participant,
            self.predicted_pick(),
            self.confidence() * 100.0,
            self.home,
            self.prob_home * 100.0,
            self.away,
            self.prob_away() * 100.0
        )
    }
}

/// Read-only prediction service over a loaded model bundle
pub struct Predictor {
    bundle: ModelBundle,
    affinity: Option<AffinityMatrix>,
    contribution_threshold: f32,
    affinity_note_threshold: f64,
    max_factors: usize,
}

impl Predictor {
    pub fn new(bundle: ModelBundle, analysis: &AnalysisConfig) -> Self {
        Predictor {
            bundle,
            affinity: None,
            contribution_threshold: analysis.contribution_threshold,
            affinity_note_threshold: analysis.affinity_note_threshold,
            max_factors: analysis.max_factors,
        }
    }

    /// Annotate team factors with Picks-Above-Average values
    pub fn with_affinity(mut self, affinity: AffinityMatrix) -> Self {
        self.affinity = Some(affinity);
        self
    }

    pub fn bundle(&self) -> &ModelBundle {
        &self.bundle
    }

    pub fn has_model(&self, participant: &ParticipantId) -> bool {
        self.bundle.has_model(participant)
    }

    fn model(&self, participant: &ParticipantId) -> Result<&LogisticModel> {
        if let Some(model) = self.bundle.get(participant) {
            return Ok(model);
        }
        match self.bundle.excluded.get(participant) {
            Some(&picks) => Err(PickemError::InsufficientData {
                participant: participant.clone(),
                picks,
                required: self.bundle.min_picks,
            }),
            None => Err(PickemError::UnknownParticipant(participant.clone())),
        }
    }

    /// P(participant picks the home team)
    pub fn predict(&self, participant: &ParticipantId, matchup: &Matchup) -> Result<PickPrediction> {
        let model = self.model(participant)?;
        let row = self.bundle.schema.encode(matchup);

        Ok(PickPrediction {
            participant: participant.clone(),
            home: matchup.home.clone(),
            away: matchup.away.clone(),
            prob_home: model.predict_proba(&row),
        })
    }

    /// Predictions for every participant with a model
    pub fn predict_all(&self, matchup: &Matchup) -> Vec<PickPrediction> {
        self.bundle
            .participants()
            .filter_map(|p| self.predict(p, matchup).ok())
            .collect()
    }

    /// Largest contributing factors, strongest first
    pub fn explain(&self, participant: &ParticipantId, matchup: &Matchup) -> Result<Vec<Factor>> {
        let model = self.model(participant)?;
        let schema = &self.bundle.schema;
        let contributions = model.contributions(&schema.encode(matchup));

        let mut ranked: Vec<(FeatureKind, f32)> = contributions
            .into_iter()
            .enumerate()
            .filter(|(_, c)| c.abs() > self.contribution_threshold)
            .filter_map(|(i, c)| schema.kind(i).map(|kind| (kind, c)))
            .filter(|(kind, _)| *kind != FeatureKind::Temperature)
            .collect();
        ranked.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));
        ranked.truncate(self.max_factors);

        Ok(ranked
            .into_iter()
            .map(|(kind, contribution)| {
                let side = if contribution > 0.0 { Side::Home } else { Side::Away };
                Factor {
                    label: self.label(participant, &kind, matchup),
                    contribution,
                    side,
                    toward: match side {
                        Side::Home => matchup.home.clone(),
                        Side::Away => matchup.away.clone(),
                    },
                }
            })
            .collect())
    }

    fn affinity_note(&self, participant: &ParticipantId, team: &TeamId) -> String {
        match self.affinity.as_ref().and_then(|a| a.get(participant, team)) {
            Some(paa) if paa.abs() >= self.affinity_note_threshold => {
                format!(" (PAA: {:+.1})", paa)
            }
            _ => String::new(),
        }
    }

    fn label(&self, participant: &ParticipantId, kind: &FeatureKind, matchup: &Matchup) -> String {
        match kind {
            FeatureKind::HomeTeam(team) => {
                format!("{} at home{}", team, self.affinity_note(participant, team))
            }
            FeatureKind::AwayTeam(team) => {
                format!("{} on the road{}", team, self.affinity_note(participant, team))
            }
            FeatureKind::Spread => format!("Spread ({:+.1})", matchup.spread),
            FeatureKind::SpreadAbs => format!("Spread size ({:.1} pts)", matchup.spread.abs()),
            FeatureKind::Week => format!("Week {}", matchup.week),
            FeatureKind::Wind => format!("Wind ({:.0} mph)", matchup.wind_mph),
            FeatureKind::Temperature => format!("Temperature ({:.0}F)", matchup.temperature),
            FeatureKind::Indoor if matchup.indoor => "Indoor game".to_string(),
            FeatureKind::Indoor => "Outdoor game".to_string(),
            FeatureKind::RainSnow if matchup.rain_snow => "Rain/snow".to_string(),
            FeatureKind::RainSnow => "Clear weather".to_string(),
            FeatureKind::CrossConference if matchup.cross_conference => {
                "Cross-conference".to_string()
            }
            FeatureKind::CrossConference => "Same conference".to_string(),
        }
    }
}

/// Multi-line summary of a prediction and its factors
pub fn format_prediction(prediction: &PickPrediction, factors: &[Factor]) -> String {
    let mut out = format!("{}\n", prediction);
    if factors.is_empty() {
        out.push_str("  No strong factors\n");
    }
    for factor in factors {
        out.push_str(&format!("  {}\n", factor));
    }
    out
}
