//! Adapters layer: Concrete implementations of ports.
//!
//! These modules contain the concrete estimator families and storage:
//! - `boosted`: gradient-boosted tree estimator
//! - `logistic`: logistic-regression estimator
//! - `fs_store`: filesystem artifact store

pub mod boosted;
pub mod fs_store;
pub mod logistic;

// Re-export store error for lib.rs
pub use fs_store::{FsArtifactStore, StoreError};

use serde::{Deserialize, Serialize};

use crate::domain::ModelType;
use crate::ports::{AttributionSource, Prediction, Predictor};

use boosted::GradientBoostedModel;
use logistic::LogisticModel;

/// A fitted model in one of the supported estimator families.
///
/// The variant is fixed when the model is built and carried in the
/// artifact metadata; it doubles as the serialization schema of the
/// persisted model blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TrainedModel {
    BoostedTrees(GradientBoostedModel),
    Logistic(LogisticModel),
}

impl TrainedModel {
    /// Encode to the opaque artifact blob.
    ///
    /// # Errors
    /// Returns error if encoding fails.
    pub fn to_blob(&self) -> Result<Vec<u8>, StoreError> {
        bincode::serialize(self).map_err(|e| StoreError::Encode(e.to_string()))
    }

    /// Decode from a persisted artifact blob.
    ///
    /// # Errors
    /// Returns error if the blob is not a valid model encoding.
    pub fn from_blob(blob: &[u8]) -> Result<Self, StoreError> {
        bincode::deserialize(blob).map_err(|e| StoreError::Decode(e.to_string()))
    }
}

impl Predictor for TrainedModel {
    fn predict(&self, vector: &[f64]) -> Prediction {
        match self {
            Self::BoostedTrees(model) => model.predict(vector),
            Self::Logistic(model) => model.predict(vector),
        }
    }

    fn attribution(&self) -> AttributionSource {
        match self {
            Self::BoostedTrees(model) => model.attribution(),
            Self::Logistic(model) => model.attribution(),
        }
    }

    fn model_type(&self) -> ModelType {
        match self {
            Self::BoostedTrees(model) => model.model_type(),
            Self::Logistic(model) => model.model_type(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_round_trip() {
        let x = vec![
            vec![0.0; crate::domain::FEATURE_COUNT],
            vec![1.0; crate::domain::FEATURE_COUNT],
            vec![0.1; crate::domain::FEATURE_COUNT],
            vec![0.9; crate::domain::FEATURE_COUNT],
        ];
        let y = vec![0, 1, 0, 1];

        let model = TrainedModel::Logistic(LogisticModel::fit(&x, &y));
        let blob = model.to_blob().expect("Should encode");
        let restored = TrainedModel::from_blob(&blob).expect("Should decode");

        let probe = vec![0.8; crate::domain::FEATURE_COUNT];
        assert!(
            (model.predict(&probe).into_probability()
                - restored.predict(&probe).into_probability())
            .abs()
                < 1e-12
        );
        assert_eq!(restored.model_type(), ModelType::LogisticRegression);
    }

    #[test]
    fn test_garbage_blob_rejected() {
        assert!(TrainedModel::from_blob(&[0xde, 0xad, 0xbe, 0xef]).is_err());
    }
}
