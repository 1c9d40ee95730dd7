//! Prediction and inference
//!
//! Load trained participant models and score hypothetical matchups.

pub mod inference;
pub mod scenario;

pub use inference::{format_prediction, Factor, PickPrediction, Predictor, Side};
pub use scenario::{describe_matchup, read_answer, PlayAnswer, ScenarioGenerator, Scorecard};
