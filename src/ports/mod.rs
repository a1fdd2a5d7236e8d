//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the application and external systems (the pluggable
//! estimator, durable artifact storage).

mod predictor;
mod store;

pub use predictor::{AttributionSource, Prediction, Predictor};
pub use store::ArtifactStore;
