//! Pick models
//!
//! A classifier is fitted on one participant's labelled picks and answers two
//! questions about a matchup row: how likely the participant is to take the home
//! team, and how much each feature pushed toward that answer.

pub mod bundle;
pub mod logistic;

pub use bundle::ModelBundle;
pub use logistic::{LogisticModel, LogisticRegression};

use crate::Result;

/// Labelled feature rows: label 1.0 when the home team was picked
#[derive(Debug, Clone, Default)]
pub struct ExampleSet {
    pub features: Vec<Vec<f32>>,
    pub labels: Vec<f32>,
}

impl ExampleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: Vec<f32>, picked_home: bool) {
        self.features.push(row);
        self.labels.push(if picked_home { 1.0 } else { 0.0 });
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Width of the feature rows, 0 when empty
    pub fn dim(&self) -> usize {
        self.features.first().map_or(0, Vec::len)
    }

    pub fn home_rate(&self) -> f32 {
        if self.is_empty() {
            0.0
        } else {
            self.labels.iter().sum::<f32>() / self.len() as f32
        }
    }
}

/// Something that can be fitted to an example set
pub trait PickClassifier {
    type Fitted: FittedClassifier;

    fn fit(&self, examples: &ExampleSet) -> Result<Self::Fitted>;
}

/// A fitted model over a fixed feature layout
pub trait FittedClassifier {
    /// P(home team picked)
    fn predict_proba(&self, features: &[f32]) -> f32;

    /// Signed per-feature push toward the home team, aligned with `features`
    fn contributions(&self, features: &[f32]) -> Vec<f32>;
}
