//! Persisted set of per-participant models

use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use super::LogisticModel;
use crate::features::FeatureSchema;
use crate::{ParticipantId, PickemError, Result};

/// Every participant model trained in one run, plus the schema they share
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelBundle {
    pub schema: FeatureSchema,
    pub models: BTreeMap<ParticipantId, LogisticModel>,
    pub trained_at: DateTime<Utc>,
    pub inverse_regularization: f64,
    pub min_picks: usize,
    /// Participants below `min_picks`, with how many picks they had
    #[serde(default)]
    pub excluded: BTreeMap<ParticipantId, usize>,
}

impl ModelBundle {
    pub fn new(schema: FeatureSchema, inverse_regularization: f64, min_picks: usize) -> Self {
        ModelBundle {
            schema,
            models: BTreeMap::new(),
            trained_at: Utc::now(),
            inverse_regularization,
            min_picks,
            excluded: BTreeMap::new(),
        }
    }

    pub fn get(&self, participant: &ParticipantId) -> Option<&LogisticModel> {
        self.models.get(participant)
    }

    pub fn has_model(&self, participant: &ParticipantId) -> bool {
        self.models.contains_key(participant)
    }

    pub fn participants(&self) -> impl Iterator<Item = &ParticipantId> {
        self.models.keys()
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        info!("Saved {} participant models to {}", self.models.len(), path.display());
        Ok(())
    }

    /// Load a bundle; a missing file means nothing has been trained yet
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PickemError::NoModel);
        }
        let content = std::fs::read_to_string(path)?;
        let bundle: ModelBundle = serde_json::from_str(&content)?;
        bundle.validate()?;
        Ok(bundle)
    }

    fn validate(&self) -> Result<()> {
        for (participant, model) in &self.models {
            if model.dim() != self.schema.len() {
                return Err(PickemError::Config(format!(
                    "Model for {} has {} coefficients, schema has {} features",
                    participant,
                    model.dim(),
                    self.schema.len()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TeamId;

    fn bundle() -> ModelBundle {
        let schema = FeatureSchema::new(&[TeamId::from("NE"), TeamId::from("BUF")]);
        let mut bundle = ModelBundle::new(schema, 0.5, 20);
        bundle.models.insert(
            ParticipantId::from("Kevin"),
            LogisticModel {
                coefficients: vec![0.1; 12],
                intercept: -0.2,
            },
        );
        bundle.excluded.insert(ParticipantId::from("Ripw1124"), 7);
        bundle
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("pickem_bundle_{}.json", std::process::id()));
        let original = bundle();
        original.save(&path).unwrap();

        let loaded = ModelBundle::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert!(loaded.has_model(&ParticipantId::from("Kevin")));
        assert_eq!(loaded.excluded.get(&ParticipantId::from("Ripw1124")), Some(&7));
        assert_eq!(loaded.schema, original.schema);
        assert_eq!(loaded.trained_at, original.trained_at);
    }

    #[test]
    fn test_missing_file_means_no_model() {
        let err = ModelBundle::load("/nonexistent/pickem/models.json").unwrap_err();
        assert!(matches!(err, PickemError::NoModel));
    }

    #[test]
    fn test_mismatched_width_is_rejected() {
        let mut b = bundle();
        b.models.insert(
            ParticipantId::from("Yianni"),
            LogisticModel {
                coefficients: vec![0.0; 3],
                intercept: 0.0,
            },
        );
        assert!(b.validate().is_err());
    }
}
