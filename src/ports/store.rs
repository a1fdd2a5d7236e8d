//! Artifact store port: Trait for durable model persistence.
//!
//! A trained model is persisted as two companion records: an opaque
//! binary blob and a metadata document. The pair is the unit of
//! commitment; implementations must never report one half as loaded.

use crate::domain::ModelMetadata;

/// Trait for durable storage of the artifact pair.
pub trait ArtifactStore: Send + Sync {
    /// Error type for store operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the persisted artifact pair.
    ///
    /// # Returns
    /// `None` when no artifact has been persisted. A half-present pair
    /// (one record without its companion) is an error, not `None`.
    ///
    /// # Errors
    /// Returns error if reading or decoding fails, or if the pair is
    /// incomplete or inconsistent.
    fn load(&self) -> Result<Option<(Vec<u8>, ModelMetadata)>, Self::Error>;

    /// Persist the blob and its metadata as a pair.
    ///
    /// The pair counts as committed only when both records are written;
    /// a failure must leave any previously committed pair readable.
    ///
    /// # Errors
    /// Returns error if encoding or writing fails.
    fn save(&self, blob: &[u8], metadata: &ModelMetadata) -> Result<(), Self::Error>;

    /// Version of the most recently persisted artifact.
    ///
    /// # Returns
    /// `None` when nothing is persisted or the stored metadata cannot
    /// be read as a version (the version sequence then restarts).
    ///
    /// # Errors
    /// Returns error if the underlying storage cannot be accessed.
    fn stored_version(&self) -> Result<Option<String>, Self::Error>;
}
