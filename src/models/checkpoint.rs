//! JSON checkpoints of trained parameters.
//!
//! A checkpoint stores everything needed to rebuild the forecaster and its
//! parameters: `{ version, architecture, lag, damping, params }`. Data,
//! contamination settings, and training options are not persisted.
use crate::{
    models::{
        architecture::ArchitectureSpec,
        errors::{ModelError, ModelResult},
    },
    optimization::lbfgs::Theta,
};
use log::info;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Format version written by [`Checkpoint::save`].
pub const CHECKPOINT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub version: u32,
    pub architecture: ArchitectureSpec,
    pub lag: usize,
    pub damping: f64,
    pub params: Vec<f64>,
}

impl Checkpoint {
    pub fn new(architecture: ArchitectureSpec, damping: f64, params: &Theta) -> Self {
        Checkpoint {
            version: CHECKPOINT_VERSION,
            architecture,
            lag: architecture.lag(),
            damping,
            params: params.to_vec(),
        }
    }

    pub fn theta(&self) -> Theta {
        Theta::from(self.params.clone())
    }

    /// # Errors
    /// [`ModelError::Io`] when serialization or the write fails.
    pub fn save(&self, path: impl AsRef<Path>) -> ModelResult<()> {
        let path = path.as_ref();
        let text = serde_json::to_string_pretty(self).map_err(|e| io_error(path, e))?;
        fs::write(path, text).map_err(|e| io_error(path, e))?;
        info!("saved {} checkpoint ({} params) to {}", self.architecture, self.params.len(), path.display());
        Ok(())
    }

    /// # Errors
    /// - [`ModelError::NotFound`] when `path` does not exist.
    /// - [`ModelError::Io`] / [`ModelError::CheckpointFormat`] for read or
    ///   decode failures.
    /// - [`ModelError::UnsupportedVersion`] for an unknown format version.
    /// - [`ModelError::LagMismatch`] when `lag` disagrees with the architecture.
    pub fn load(path: impl AsRef<Path>) -> ModelResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ModelError::NotFound { path: path.display().to_string() });
        }
        let text = fs::read_to_string(path).map_err(|e| io_error(path, e))?;
        let checkpoint: Checkpoint = serde_json::from_str(&text).map_err(|e| ModelError::CheckpointFormat {
            path: path.display().to_string(),
            text: e.to_string(),
        })?;
        if checkpoint.version != CHECKPOINT_VERSION {
            return Err(ModelError::UnsupportedVersion { found: checkpoint.version, supported: CHECKPOINT_VERSION });
        }
        if checkpoint.lag != checkpoint.architecture.lag() {
            return Err(ModelError::LagMismatch { expected: checkpoint.architecture.lag(), found: checkpoint.lag });
        }
        Ok(checkpoint)
    }
}

fn io_error(path: &Path, err: impl std::fmt::Display) -> ModelError {
    ModelError::Io { path: path.display().to_string(), text: err.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ErrorKind;
    use ndarray::array;

    #[test]
    fn save_then_load_is_lossless() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ckpt.json");
        let theta = array![0.1, -1.0 / 3.0, 2.5e-17];
        let ckpt = Checkpoint::new(ArchitectureSpec::Ar { lag: 2 }, 0.01, &theta);

        ckpt.save(&path).unwrap();
        let back = Checkpoint::load(&path).unwrap();

        assert_eq!(back, ckpt);
        assert_eq!(back.theta(), theta);
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = Checkpoint::load(dir.path().join("nope.json")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    // Purpose
    // -------
    // Corrupt files and unknown versions are rejected with distinct errors.
    fn corrupt_and_unknown_version_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let garbage = dir.path().join("garbage.json");
        fs::write(&garbage, "{ not json").unwrap();
        assert!(matches!(Checkpoint::load(&garbage), Err(ModelError::CheckpointFormat { .. })));

        let future = dir.path().join("future.json");
        let mut ckpt = Checkpoint::new(ArchitectureSpec::Ar { lag: 1 }, 0.0, &array![1.0, 0.0]);
        ckpt.version = 99;
        fs::write(&future, serde_json::to_string(&ckpt).unwrap()).unwrap();
        let err = Checkpoint::load(&future).unwrap_err();
        assert_eq!(err, ModelError::UnsupportedVersion { found: 99, supported: CHECKPOINT_VERSION });
        assert_eq!(err.kind(), ErrorKind::Config);
    }
}
