//! Metadata companion record for persisted model artifacts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::features::{FEATURE_COUNT, FEATURE_NAMES};

/// Label binarization mode recorded in metadata.
pub const LABEL_MODE: &str = "binary_threshold_0.5";

/// Estimator family tag carried in metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    BoostedTrees,
    LogisticRegression,
}

impl std::fmt::Display for ModelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BoostedTrees => write!(f, "boosted_trees"),
            Self::LogisticRegression => write!(f, "logistic_regression"),
        }
    }
}

/// Evaluation metrics captured at training time.
///
/// A metric that could not be computed (degenerate evaluation split,
/// numerical failure) is `None`, never an error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetrics {
    pub auc: Option<f64>,
    pub logloss: Option<f64>,
}

/// Metadata persisted next to the model blob.
///
/// The pair is written together and must round-trip exactly: the
/// recorded `feature_means` are the attribution reference for every
/// score produced by this artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub model_version: String,
    pub trained_at: DateTime<Utc>,
    /// Ordered names, must match the feature vector layout.
    pub feature_names: Vec<String>,
    /// Per-feature training-split mean, same length as `feature_names`.
    pub feature_means: Vec<f64>,
    pub training_metrics: TrainingMetrics,
    pub n_samples: usize,
    pub model_type: ModelType,
    pub label_mode: String,
}

impl ModelMetadata {
    /// Check the arity invariants against the scoring contract.
    ///
    /// # Errors
    /// Returns a message when the names or means do not line up with
    /// the fixed feature vector layout.
    pub fn validate(&self) -> Result<(), String> {
        if self.feature_names.len() != FEATURE_COUNT {
            return Err(format!(
                "metadata carries {} feature names, expected {FEATURE_COUNT}",
                self.feature_names.len()
            ));
        }
        if self.feature_means.len() != self.feature_names.len() {
            return Err(format!(
                "feature_means length {} does not match feature_names length {}",
                self.feature_means.len(),
                self.feature_names.len()
            ));
        }
        if self.feature_names != FEATURE_NAMES {
            return Err("feature_names do not match the scoring contract order".to_string());
        }
        Ok(())
    }
}
