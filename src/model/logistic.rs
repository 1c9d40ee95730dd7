//! L2-regularized logistic regression
//!
//! Fitted with full-batch gradient descent on a single `Linear` layer. Inputs are
//! z-scored for training and the learned weights are mapped back to raw-feature
//! space, so a fitted [`LogisticModel`] scores raw rows without a backend.

use burn::backend::{Autodiff, NdArray};
use burn::nn::{Initializer, Linear, LinearConfig};
use burn::optim::{GradientsParams, Optimizer, SgdConfig};
use burn::tensor::activation::sigmoid;
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::{ElementConversion, Tensor, TensorData};
use log::debug;
use serde::{Deserialize, Serialize};

use super::{ExampleSet, FittedClassifier, PickClassifier};
use crate::training::metrics::TrainingHistory;
use crate::training::normalization::FeatureNormalization;
use crate::{PickemError, Result, TrainingConfig};

/// Backend used for fitting
pub type TrainBackend = Autodiff<NdArray<f32>>;

/// Raw-space coefficients of a fitted model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    pub coefficients: Vec<f32>,
    pub intercept: f32,
}

impl LogisticModel {
    pub fn dim(&self) -> usize {
        self.coefficients.len()
    }

    /// w·x + b; missing trailing features count as 0
    pub fn logit(&self, features: &[f32]) -> f32 {
        self.coefficients
            .iter()
            .zip(features.iter())
            .map(|(w, x)| w * x)
            .sum::<f32>()
            + self.intercept
    }
}

fn logistic(z: f32) -> f32 {
    1.0 / (1.0 + (-z).exp())
}

impl FittedClassifier for LogisticModel {
    fn predict_proba(&self, features: &[f32]) -> f32 {
        logistic(self.logit(features))
    }

    fn contributions(&self, features: &[f32]) -> Vec<f32> {
        self.coefficients
            .iter()
            .zip(features.iter())
            .map(|(w, x)| w * x)
            .collect()
    }
}

/// Hyperparameters for fitting a [`LogisticModel`]
#[derive(Debug, Clone)]
pub struct LogisticRegression {
    /// C: smaller values regularize harder
    pub inverse_regularization: f64,
    pub learning_rate: f64,
    pub epochs: usize,
}

impl LogisticRegression {
    pub fn new(config: &TrainingConfig) -> Self {
        LogisticRegression {
            inverse_regularization: config.inverse_regularization,
            learning_rate: config.learning_rate,
            epochs: config.epochs,
        }
    }

    /// Fit and return the loss curve alongside the model
    pub fn fit_with_history(&self, examples: &ExampleSet) -> Result<(LogisticModel, TrainingHistory)> {
        if examples.is_empty() {
            return Err(PickemError::Training("no examples to fit".to_string()));
        }
        if self.inverse_regularization <= 0.0 {
            return Err(PickemError::Training(format!(
                "inverse regularization must be positive, got {}",
                self.inverse_regularization
            )));
        }

        let n = examples.len();
        let dim = examples.dim();
        if examples.features.iter().any(|row| row.len() != dim) {
            return Err(PickemError::Training(
                "feature rows have inconsistent widths".to_string(),
            ));
        }

        let norm = FeatureNormalization::from_rows(&examples.features, dim);
        // mean BCE + ||w_raw||² / (2·C·n), with w_raw = w / std
        let penalty = 1.0 / (2.0 * self.inverse_regularization * n as f64);

        let device = Default::default();
        let flat: Vec<f32> = examples.features.iter().flatten().copied().collect();
        let x = Tensor::<TrainBackend, 2>::from_data(TensorData::new(flat, [n, dim]), &device);
        let y = Tensor::<TrainBackend, 2>::from_data(
            TensorData::new(examples.labels.clone(), [n, 1]),
            &device,
        );
        let x = norm.normalize(x);

        let trainer = LogisticTrainer::<TrainBackend>::new(
            device,
            &norm.std,
            self.learning_rate,
            penalty as f32,
        );
        let (linear, history) = trainer.train(x, y, self.epochs);

        let weights = linear
            .weight
            .val()
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| PickemError::Training(format!("reading weights: {:?}", e)))?;
        let bias = match &linear.bias {
            Some(b) => b
                .val()
                .into_data()
                .to_vec::<f32>()
                .map_err(|e| PickemError::Training(format!("reading bias: {:?}", e)))?
                .first()
                .copied()
                .unwrap_or(0.0),
            None => 0.0,
        };

        let (coefficients, intercept) = norm.denormalize_weights(&weights, bias);
        Ok((
            LogisticModel {
                coefficients,
                intercept,
            },
            history,
        ))
    }
}

impl PickClassifier for LogisticRegression {
    type Fitted = LogisticModel;

    fn fit(&self, examples: &ExampleSet) -> Result<LogisticModel> {
        self.fit_with_history(examples).map(|(model, _)| model)
    }
}

/// Gradient descent over one `Linear` layer.
///
/// The L2 term is applied as a proximal shrink after each step. In normalized
/// space its strength per weight is `penalty / std²`, which equals
/// `penalty · w_raw²` on the raw-space coefficient.
struct LogisticTrainer<B: AutodiffBackend> {
    model: Linear<B>,
    learning_rate: f64,
    /// penalty / std², shaped like the weight [dim, 1]
    decay: Tensor<B, 2>,
    /// 1 / (1 + 2·lr·decay)
    shrink: Tensor<B, 2>,
}

impl<B: AutodiffBackend> LogisticTrainer<B> {
    fn new(device: B::Device, std: &[f32], learning_rate: f64, penalty: f32) -> Self {
        let dim = std.len();
        // Zero start keeps fits reproducible
        let model = LinearConfig::new(dim, 1)
            .with_initializer(Initializer::Zeros)
            .init(&device);

        let decay: Vec<f32> = std.iter().map(|s| penalty / (s * s)).collect();
        let decay = Tensor::<B, 2>::from_data(TensorData::new(decay, [dim, 1]), &device);
        let shrink = decay
            .clone()
            .mul_scalar(2.0 * learning_rate as f32)
            .add_scalar(1.0)
            .recip();

        LogisticTrainer {
            model,
            learning_rate,
            decay,
            shrink,
        }
    }

    fn train(
        mut self,
        x: Tensor<B, 2>,
        y: Tensor<B, 2>,
        epochs: usize,
    ) -> (Linear<B>, TrainingHistory) {
        let mut optimizer = SgdConfig::new().init::<B, Linear<B>>();
        let mut history = TrainingHistory::new();

        for epoch in 0..epochs {
            let probs = sigmoid(self.model.forward(x.clone()));
            let loss = binary_cross_entropy(probs, y.clone());
            let loss_val: f32 = loss.clone().into_scalar().elem::<f32>() + self.weight_decay();
            history.record_epoch(loss_val as f64);

            let grads = loss.backward();
            let grads_params = GradientsParams::from_grads(grads, &self.model);
            self.model = optimizer.step(self.learning_rate, self.model, grads_params);
            self.shrink_weights();

            if epoch % 100 == 0 || epoch + 1 == epochs {
                debug!("Epoch {}/{}: loss={:.4}", epoch + 1, epochs, loss_val);
            }
        }

        (self.model, history)
    }

    /// Σ decay·w², the L2 term of the objective; the bias is unpenalized
    fn weight_decay(&self) -> f32 {
        (self.model.weight.val().detach().powf_scalar(2.0) * self.decay.clone())
            .sum()
            .into_scalar()
            .elem::<f32>()
    }

    /// Exact minimizer of decay·w² + ||w - w_step||² / (2·lr)
    fn shrink_weights(&mut self) {
        let shrink = self.shrink.clone();
        self.model.weight = self
            .model
            .weight
            .clone()
            .map(|w| (w.detach() * shrink).detach().require_grad());
    }
}

fn binary_cross_entropy<B: AutodiffBackend>(probs: Tensor<B, 2>, targets: Tensor<B, 2>) -> Tensor<B, 1> {
    let eps = 1e-7;
    let probs_clamped = probs.clamp(eps, 1.0 - eps);
    let loss = targets.clone().neg() * probs_clamped.clone().log()
        - (targets.neg() + 1.0) * (probs_clamped.neg() + 1.0).log();
    loss.mean()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick() -> LogisticRegression {
        LogisticRegression {
            inverse_regularization: 0.5,
            learning_rate: 0.5,
            epochs: 300,
        }
    }

    #[test]
    fn test_probabilities_are_complementary() {
        let model = LogisticModel {
            coefficients: vec![0.4, -1.1],
            intercept: 0.2,
        };
        let p = model.predict_proba(&[1.0, 2.0]);
        assert!(p > 0.0 && p < 1.0);
        let q = logistic(-model.logit(&[1.0, 2.0]));
        assert!((p + q - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_contributions_sum_to_logit() {
        let model = LogisticModel {
            coefficients: vec![0.5, -2.0, 0.0],
            intercept: -0.3,
        };
        let x = [2.0, 1.0, 9.0];
        let contributions = model.contributions(&x);
        assert_eq!(contributions, vec![1.0, -2.0, 0.0]);
        let total: f32 = contributions.iter().sum::<f32>() + model.intercept;
        assert!((total - model.logit(&x)).abs() < 1e-6);
    }

    #[test]
    fn test_learns_positive_weight_for_home_signal() {
        let mut examples = ExampleSet::new();
        for i in 0..40 {
            let signal = if i % 2 == 0 { 1.0 } else { -1.0 };
            let noise = (i % 5) as f32;
            examples.push(vec![signal, noise], signal > 0.0);
        }

        let (model, history) = quick().fit_with_history(&examples).unwrap();
        assert!(model.coefficients[0] > 0.0);
        assert!(model.predict_proba(&[1.0, 2.0]) > 0.5);
        assert!(model.predict_proba(&[-1.0, 2.0]) < 0.5);
        assert!(history.final_loss().unwrap() < history.losses[0]);
    }

    #[test]
    fn test_one_sided_picks_lean_home() {
        let mut examples = ExampleSet::new();
        for i in 0..25 {
            examples.push(vec![i as f32 % 7.0, 1.0], true);
        }
        let model = quick().fit(&examples).unwrap();
        assert!(model.predict_proba(&[3.0, 1.0]) > 0.5);
        assert!(model.predict_proba(&[0.0, 0.0]) > 0.5);
    }

    #[test]
    fn test_fit_is_deterministic() {
        let mut examples = ExampleSet::new();
        for i in 0..30 {
            examples.push(vec![(i % 3) as f32, (i % 4) as f32], i % 3 == 0);
        }
        let a = quick().fit(&examples).unwrap();
        let b = quick().fit(&examples).unwrap();
        assert!((a.intercept - b.intercept).abs() < 1e-6);
        for (x, y) in a.coefficients.iter().zip(b.coefficients.iter()) {
            assert!((x - y).abs() < 1e-6);
        }
    }

    /// Newton's method on mean BCE + ||w||² / (2·C·n) over raw features, in f64
    fn raw_space_optimum(examples: &ExampleSet, c: f64) -> (Vec<f64>, f64) {
        let n = examples.len();
        let d = examples.dim();
        // Parameters: d weights then the intercept
        let mut theta = vec![0.0f64; d + 1];

        for _ in 0..50 {
            let mut grad = vec![0.0f64; d + 1];
            let mut hess = vec![vec![0.0f64; d + 1]; d + 1];
            for (row, &label) in examples.features.iter().zip(examples.labels.iter()) {
                let mut z = theta[d];
                for j in 0..d {
                    z += theta[j] * row[j] as f64;
                }
                let p = 1.0 / (1.0 + (-z).exp());
                let mut xi: Vec<f64> = row.iter().map(|&v| v as f64).collect();
                xi.push(1.0);
                for a in 0..=d {
                    grad[a] += (p - label as f64) * xi[a] / n as f64;
                    for b in 0..=d {
                        hess[a][b] += p * (1.0 - p) * xi[a] * xi[b] / n as f64;
                    }
                }
            }
            for j in 0..d {
                grad[j] += theta[j] / (c * n as f64);
                hess[j][j] += 1.0 / (c * n as f64);
            }

            // Solve hess · step = grad by Gaussian elimination
            let m = d + 1;
            let mut aug: Vec<Vec<f64>> = (0..m)
                .map(|i| {
                    let mut r = hess[i].clone();
                    r.push(grad[i]);
                    r
                })
                .collect();
            for col in 0..m {
                let pivot = (col..m)
                    .max_by(|&a, &b| aug[a][col].abs().total_cmp(&aug[b][col].abs()))
                    .unwrap();
                aug.swap(col, pivot);
                for r in 0..m {
                    if r != col {
                        let factor = aug[r][col] / aug[col][col];
                        for k in col..=m {
                            let delta = factor * aug[col][k];
                            aug[r][k] -= delta;
                        }
                    }
                }
            }
            for i in 0..m {
                theta[i] -= aug[i][m] / aug[i][i];
            }
        }

        let intercept = theta[d];
        theta.truncate(d);
        (theta, intercept)
    }

    #[test]
    fn test_penalty_matches_raw_space_regularization() {
        // A team indicator seen in two rows, both home picks, plus the week
        let mut examples = ExampleSet::new();
        for i in 0..40 {
            let rare = if i == 3 || i == 17 { 1.0 } else { 0.0 };
            let week = (i % 18 + 1) as f32;
            let picked_home = rare == 1.0 || i % 3 != 0;
            examples.push(vec![rare, week], picked_home);
        }

        let classifier = LogisticRegression {
            inverse_regularization: 0.5,
            learning_rate: 0.5,
            epochs: 3000,
        };
        let model = classifier.fit(&examples).unwrap();
        let (expected, expected_intercept) = raw_space_optimum(&examples, 0.5);

        for (got, want) in model.coefficients.iter().zip(expected.iter()) {
            assert!(
                (*got as f64 - want).abs() < 0.02,
                "coefficients {:?}, expected {:?}",
                model.coefficients,
                expected
            );
        }
        assert!((model.intercept as f64 - expected_intercept).abs() < 0.05);
        // Shrunk well below the unregularized lean of a 2-for-2 indicator
        assert!(model.coefficients[0] < 1.0);
    }

    #[test]
    fn test_empty_set_is_an_error() {
        assert!(quick().fit(&ExampleSet::new()).is_err());
    }
}
