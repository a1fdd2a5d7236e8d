//! Domain layer: Core business types and logic.
//!
//! This module contains pure Rust types with no I/O. All types are
//! serializable; scoring logic here is deterministic and stateless.

mod artifact;
mod attribution;
mod features;
mod rules;
mod score;
mod version;

pub use artifact::{ModelMetadata, ModelType, TrainingMetrics, LABEL_MODE};
pub use attribution::attribute;
pub use features::{FeatureInput, FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
pub use rules::score_rule;
pub use score::{
    band_for_risk, clip, rank_drivers, round_to, Direction, Driver, RiskBand, ScoreResult,
    MAX_DRIVERS,
};
pub use version::{next_model_version, RULE_MODEL_VERSION, TRAINED_VERSION_PREFIX};
