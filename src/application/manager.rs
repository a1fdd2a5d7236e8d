//! Model lifecycle manager: the single owner of the active model.
//!
//! The manager dispatches scoring to the rule engine while no trained
//! artifact is loaded and to the fitted model afterwards. The active
//! (model, metadata) pair lives behind one lock and is replaced as a
//! unit, only after the retrained artifact is durably persisted.

use parking_lot::RwLock;
use serde::Serialize;

use crate::adapters::TrainedModel;
use crate::application::training::{run_training, EstimatorFamily, LabeledRow};
use crate::domain::{
    attribute, band_for_risk, clip, next_model_version, round_to, score_rule, Direction, Driver,
    FeatureVector, ModelMetadata, ScoreResult, TrainingMetrics, FEATURE_NAMES, LABEL_MODE,
    RULE_MODEL_VERSION,
};
use crate::ports::{ArtifactStore, Predictor};
use crate::{adapters::StoreError, Result, RiskError};

/// The in-memory pair swapped atomically on retrain.
struct ActiveModel {
    model: TrainedModel,
    metadata: ModelMetadata,
}

/// Summary returned by a successful training run.
#[derive(Debug, Clone, Serialize)]
pub struct TrainReport {
    pub model_version: String,
    pub metrics: TrainingMetrics,
    pub n_samples: usize,
}

/// Owns the active predictor and dispatches score/train operations.
pub struct ModelManager<S: ArtifactStore> {
    store: S,
    family: EstimatorFamily,
    active: RwLock<Option<ActiveModel>>,
}

impl<S> ModelManager<S>
where
    S: ArtifactStore,
    S::Error: Into<StoreError>,
{
    /// Create a manager and attempt to load a persisted artifact.
    ///
    /// Load failures (half-present pair, corrupt blob or metadata) are
    /// reported and leave the manager unloaded; they never abort
    /// startup.
    pub fn new(store: S, family: EstimatorFamily) -> Self {
        let active = match store.load() {
            Ok(Some((blob, metadata))) => match TrainedModel::from_blob(&blob) {
                Ok(model) => {
                    tracing::info!(
                        version = %metadata.model_version,
                        model_type = %metadata.model_type,
                        "loaded model artifact"
                    );
                    Some(ActiveModel { model, metadata })
                }
                Err(error) => {
                    tracing::warn!(%error, "model blob failed to decode; starting unloaded");
                    None
                }
            },
            Ok(None) => None,
            Err(error) => {
                let error: StoreError = error.into();
                tracing::warn!(%error, "artifact load failed; starting unloaded");
                None
            }
        };

        Self {
            store,
            family,
            active: RwLock::new(active),
        }
    }

    /// Whether a trained artifact is currently active.
    #[must_use]
    pub fn model_loaded(&self) -> bool {
        self.active.read().is_some()
    }

    /// Version of the active strategy.
    #[must_use]
    pub fn model_version(&self) -> String {
        self.active
            .read()
            .as_ref()
            .map_or_else(
                || RULE_MODEL_VERSION.to_string(),
                |active| active.metadata.model_version.clone(),
            )
    }

    /// Score one feature vector with the active strategy.
    #[must_use]
    pub fn score_one(&self, features: &FeatureVector) -> ScoreResult {
        let guard = self.active.read();
        let Some(active) = guard.as_ref() else {
            return score_rule(features);
        };

        let vector = features.as_vector();
        let risk = clip(
            active.model.predict(&vector).into_probability(),
            0.0,
            1.0,
        );

        let source = active.model.attribution();
        let mut drivers = match source.weights() {
            Some(weights) => attribute(&vector, &active.metadata.feature_means, weights),
            None => Vec::new(),
        };
        if drivers.is_empty() {
            drivers.push(Driver {
                name: "Model baseline".to_string(),
                value: 0.0,
                direction: Direction::Down,
                contribution: 0.0,
            });
        }

        ScoreResult {
            risk: round_to(risk, 6),
            band: band_for_risk(risk),
            drivers,
            model_version: active.metadata.model_version.clone(),
        }
    }

    /// Train a new model, persist it, then make it active.
    ///
    /// The in-memory swap happens only after the artifact pair is
    /// durably committed; any failure leaves the previous model
    /// active.
    ///
    /// # Errors
    /// Returns `RiskError::Validation` on degenerate labels and
    /// `RiskError::Store` when persistence fails.
    pub fn train_and_save(&self, rows: &[LabeledRow]) -> Result<TrainReport> {
        let outcome = run_training(rows, self.family)?;

        let previous = self
            .store
            .stored_version()
            .map_err(|e| RiskError::Store(e.into()))?;
        let model_version = next_model_version(previous.as_deref());

        let metadata = ModelMetadata {
            model_version: model_version.clone(),
            trained_at: chrono::Utc::now(),
            feature_names: FEATURE_NAMES.iter().map(ToString::to_string).collect(),
            feature_means: outcome.feature_means.clone(),
            training_metrics: outcome.metrics,
            n_samples: outcome.n_samples,
            model_type: outcome.model_type,
            label_mode: LABEL_MODE.to_string(),
        };

        let blob = outcome.model.to_blob()?;
        self.store
            .save(&blob, &metadata)
            .map_err(|e| RiskError::Store(e.into()))?;

        *self.active.write() = Some(ActiveModel {
            model: outcome.model,
            metadata,
        });

        tracing::info!(
            version = %model_version,
            n_samples = outcome.n_samples,
            auc = ?outcome.metrics.auc,
            logloss = ?outcome.metrics.logloss,
            "trained and activated model"
        );

        Ok(TrainReport {
            model_version,
            metrics: outcome.metrics,
            n_samples: outcome.n_samples,
        })
    }
}
