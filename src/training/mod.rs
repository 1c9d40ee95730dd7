//! Model training
//!
//! Feature normalization, fit metrics and the per-participant training loop.

pub mod metrics;
pub mod normalization;
pub mod trainer;

pub use metrics::{Metrics, TrainingHistory};
pub use normalization::FeatureNormalization;
pub use trainer::{ParticipantTrainer, TrainingRun, TrainingSummary};
