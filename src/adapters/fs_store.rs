//! Filesystem artifact store.
//!
//! Persists the fitted model and its metadata as a two-file pair under
//! one directory: `model.bin` (opaque blob) and `metadata.json`. Both
//! files are written to temporaries first and renamed into place, and a
//! pair with exactly one file present is reported as incomplete on
//! load instead of being silently accepted.

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::ModelMetadata;
use crate::ports::ArtifactStore;

/// Environment variable overriding the artifact directory.
pub const ARTIFACT_DIR_ENV: &str = "RISK_ARTIFACT_DIR";

const DEFAULT_ARTIFACT_DIR: &str = "artifacts";
const MODEL_FILE: &str = "model.bin";
const METADATA_FILE: &str = "metadata.json";

/// Error type for artifact store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Model blob encoding failed: {0}")]
    Encode(String),

    #[error("Model blob decoding failed: {0}")]
    Decode(String),

    #[error("Metadata serialization failed: {0}")]
    Metadata(#[from] serde_json::Error),

    #[error("Incomplete artifact pair: {present} exists without {missing}")]
    Incomplete {
        present: &'static str,
        missing: &'static str,
    },

    #[error("Corrupt artifact metadata: {0}")]
    Corrupt(String),
}

/// Filesystem-backed artifact store.
pub struct FsArtifactStore {
    dir: PathBuf,
}

impl FsArtifactStore {
    /// Create a store rooted at the given directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Create a store from `RISK_ARTIFACT_DIR`, defaulting to
    /// `./artifacts`.
    #[must_use]
    pub fn from_env() -> Self {
        let dir = std::env::var(ARTIFACT_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_ARTIFACT_DIR));
        Self::new(dir)
    }

    /// Directory holding the artifact pair.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn model_path(&self) -> PathBuf {
        self.dir.join(MODEL_FILE)
    }

    fn metadata_path(&self) -> PathBuf {
        self.dir.join(METADATA_FILE)
    }
}

impl ArtifactStore for FsArtifactStore {
    type Error = StoreError;

    fn load(&self) -> Result<Option<(Vec<u8>, ModelMetadata)>, StoreError> {
        let model_present = self.model_path().exists();
        let metadata_present = self.metadata_path().exists();

        match (model_present, metadata_present) {
            (false, false) => return Ok(None),
            (true, false) => {
                return Err(StoreError::Incomplete {
                    present: MODEL_FILE,
                    missing: METADATA_FILE,
                })
            }
            (false, true) => {
                return Err(StoreError::Incomplete {
                    present: METADATA_FILE,
                    missing: MODEL_FILE,
                })
            }
            (true, true) => {}
        }

        let blob = fs::read(self.model_path())?;
        let raw = fs::read(self.metadata_path())?;
        let metadata: ModelMetadata = serde_json::from_slice(&raw)?;
        metadata.validate().map_err(StoreError::Corrupt)?;

        Ok(Some((blob, metadata)))
    }

    fn save(&self, blob: &[u8], metadata: &ModelMetadata) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;

        let model_tmp = self.dir.join(format!("{MODEL_FILE}.tmp"));
        let metadata_tmp = self.dir.join(format!("{METADATA_FILE}.tmp"));

        fs::write(&model_tmp, blob)?;
        fs::write(&metadata_tmp, serde_json::to_vec_pretty(metadata)?)?;

        // Both temporaries are complete before either rename; the
        // window where the pair can diverge is two renames wide and is
        // caught by the incomplete-pair check on the next load.
        fs::rename(&model_tmp, self.model_path())?;
        fs::rename(&metadata_tmp, self.metadata_path())?;
        Ok(())
    }

    fn stored_version(&self) -> Result<Option<String>, StoreError> {
        if !self.metadata_path().exists() {
            return Ok(None);
        }
        let raw = fs::read(self.metadata_path())?;
        // Unreadable prior metadata restarts the version sequence
        // rather than failing the retrain.
        Ok(serde_json::from_slice::<ModelMetadata>(&raw)
            .map(|metadata| metadata.model_version)
            .ok())
    }
}
