//! # Vitalrisk
//!
//! Cardiometabolic risk scoring service.
//!
//! This crate provides:
//! - A deterministic rule-based risk scorer requiring no trained model
//! - A trainable, versioned, file-persisted statistical model with
//!   transparent fallback to the rule engine
//! - Driver attribution explaining every score as a ranked list of
//!   contributing features
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core business types and pure logic (features, bands,
//!   drivers, rule engine, attribution)
//! - `ports`: Trait definitions for external operations
//! - `adapters`: Concrete implementations (estimators, filesystem
//!   artifact store)
//! - `application`: Use cases orchestrating domain and ports
//! - `http`: HTTP API for scoring and training

pub mod adapters;
pub mod application;
pub mod domain;
pub mod http;
pub mod ports;

pub use domain::{FeatureVector, RiskBand, ScoreResult};

/// Result type for Vitalrisk operations.
pub type Result<T> = std::result::Result<T, RiskError>;

/// Main error type for Vitalrisk.
#[derive(Debug, thiserror::Error)]
pub enum RiskError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Artifact store operation failed: {0}")]
    Store(#[from] adapters::StoreError),
}
