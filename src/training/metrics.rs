//! Training metrics and evaluation

use std::fmt;

use crate::model::{ExampleSet, FittedClassifier};

/// Metrics accumulated during training/evaluation
#[derive(Debug, Clone, Default)]
pub struct Metrics {
    /// Sum of per-example log-loss
    pub log_loss_sum: f64,
    /// Predictions on the same side as the actual pick
    pub correct: usize,
    pub total_predictions: usize,
    /// Actual picks of the home team
    pub home_picks: usize,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one prediction against the actual label
    pub fn update(&mut self, prob_home: f32, picked_home: bool) {
        let eps = 1e-7f64;
        let p = (prob_home as f64).clamp(eps, 1.0 - eps);
        self.log_loss_sum -= if picked_home { p.ln() } else { (1.0 - p).ln() };

        if (prob_home >= 0.5) == picked_home {
            self.correct += 1;
        }
        if picked_home {
            self.home_picks += 1;
        }
        self.total_predictions += 1;
    }

    /// Score a fitted model over an example set
    pub fn evaluate<M: FittedClassifier>(model: &M, examples: &ExampleSet) -> Self {
        let mut metrics = Metrics::new();
        for (row, &label) in examples.features.iter().zip(examples.labels.iter()) {
            metrics.update(model.predict_proba(row), label >= 0.5);
        }
        metrics
    }

    /// Mean binary cross-entropy
    pub fn log_loss(&self) -> f64 {
        if self.total_predictions == 0 {
            0.0
        } else {
            self.log_loss_sum / self.total_predictions as f64
        }
    }

    pub fn accuracy(&self) -> f64 {
        if self.total_predictions == 0 {
            0.0
        } else {
            self.correct as f64 / self.total_predictions as f64
        }
    }

    /// Accuracy of always answering with the participant's more common side
    pub fn baseline_accuracy(&self) -> f64 {
        if self.total_predictions == 0 {
            return 0.0;
        }
        let majority = self.home_picks.max(self.total_predictions - self.home_picks);
        majority as f64 / self.total_predictions as f64
    }
}

impl fmt::Display for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Log-loss: {:.4} | Acc: {:.2}% (baseline {:.2}%) | n={}",
            self.log_loss(),
            self.accuracy() * 100.0,
            self.baseline_accuracy() * 100.0,
            self.total_predictions
        )
    }
}

/// Per-epoch loss curve for one fit
#[derive(Debug, Clone, Default)]
pub struct TrainingHistory {
    pub losses: Vec<f64>,
}

impl TrainingHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_epoch(&mut self, loss: f64) {
        self.losses.push(loss);
    }

    pub fn final_loss(&self) -> Option<f64> {
        self.losses.last().copied()
    }
}
