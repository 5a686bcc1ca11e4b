use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::classifier::{ClassifierError, Pipeline};

/// Environment variable overriding the default model location.
pub const MODEL_PATH_ENV: &str = "EMAIL_CLASSIFIER_MODEL";
pub const DEFAULT_MODEL_FILE: &str = "email_classifier.json";

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Model file {0:?} not found. Run the `train` command first to create it.")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Hash mismatch: expected {expected}, got {actual} for {path:?}")]
    HashMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },
    #[error("Model file is corrupt: {0}")]
    Corrupt(#[from] ClassifierError),
}

/// Reads and writes a fitted [`Pipeline`] as a single JSON file, with a
/// `<file>.sha256` sidecar holding its digest.
#[derive(Debug, Clone)]
pub struct ModelStore {
    path: PathBuf,
}

impl ModelStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Returns the default model path
    pub fn default_path() -> PathBuf {
        // 1. Check environment variable
        if let Ok(path) = env::var(MODEL_PATH_ENV) {
            if !path.trim().is_empty() {
                return PathBuf::from(path);
            }
        }

        // 2. Fixed file name in the working directory
        PathBuf::from(DEFAULT_MODEL_FILE)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn checksum_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".sha256");
        PathBuf::from(name)
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Serializes `pipeline` and replaces the model file and its checksum
    /// sidecar.
    ///
    /// Both files are staged as `.tmp` siblings first. The old sidecar is
    /// removed before the model is renamed into place, so a failure part way
    /// leaves at worst a model without a sidecar, never a model beside a
    /// stale checksum. Staged files are deleted when any step fails.
    pub fn save(&self, pipeline: &Pipeline) -> Result<(), ModelError> {
        let bytes = serde_json::to_vec(pipeline)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                log::debug!("Creating parent directory: {:?}", parent);
                fs::create_dir_all(parent)?;
            }
        }

        let hash = Self::digest(&bytes);
        let model_tmp = tmp_path(&self.path);
        let checksum_tmp = tmp_path(&self.checksum_path());

        log::info!("Writing {} bytes to {:?}", bytes.len(), self.path);
        if let Err(e) = self.replace_files(&bytes, &hash, &model_tmp, &checksum_tmp) {
            for tmp in [&model_tmp, &checksum_tmp] {
                match fs::remove_file(tmp) {
                    Ok(()) => log::debug!("Removed staged file {:?}", tmp),
                    Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                    Err(err) => log::warn!("Failed to remove staged file {:?}: {}", tmp, err),
                }
            }
            return Err(e);
        }

        log::info!("Model saved to {:?} (sha256 {})", self.path, hash);
        Ok(())
    }

    fn replace_files(&self, bytes: &[u8], hash: &str, model_tmp: &Path, checksum_tmp: &Path) -> Result<(), ModelError> {
        fs::write(model_tmp, bytes)?;
        fs::write(checksum_tmp, format!("{}\n", hash))?;

        let checksum = self.checksum_path();
        match fs::remove_file(&checksum) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        fs::rename(model_tmp, &self.path)?;
        fs::rename(checksum_tmp, &checksum)?;
        Ok(())
    }

    /// Loads and validates the pipeline.
    ///
    /// The checksum is verified when a sidecar exists; a model copied without
    /// its sidecar still loads.
    pub fn load(&self) -> Result<Pipeline, ModelError> {
        if !self.exists() {
            return Err(ModelError::NotFound(self.path.clone()));
        }
        let bytes = fs::read(&self.path)?;
        log::debug!("Read {} bytes from {:?}", bytes.len(), self.path);

        if let Some(expected) = self.read_checksum()? {
            let actual = Self::digest(&bytes);
            if actual != expected {
                log::error!("Model hash mismatch: expected {}, got {}", expected, actual);
                return Err(ModelError::HashMismatch {
                    path: self.path.clone(),
                    expected,
                    actual,
                });
            }
        } else {
            log::warn!("No checksum found at {:?}, skipping verification", self.checksum_path());
        }

        let pipeline: Pipeline = serde_json::from_slice(&bytes)?;
        pipeline.validate()?;
        log::info!("Model loaded from {:?}", self.path);
        Ok(pipeline)
    }

    /// Returns `Ok(true)` when the model file exists and matches its sidecar.
    pub fn verify(&self) -> Result<bool, ModelError> {
        if !self.exists() {
            return Ok(false);
        }
        let Some(expected) = self.read_checksum()? else {
            return Ok(false);
        };
        let actual = Self::digest(&fs::read(&self.path)?);
        log::debug!("Calculated hash: {}", actual);
        log::debug!("Expected hash:   {}", expected);
        Ok(actual == expected)
    }

    pub fn remove(&self) -> Result<(), ModelError> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        let checksum = self.checksum_path();
        if checksum.exists() {
            fs::remove_file(checksum)?;
        }
        Ok(())
    }

    fn read_checksum(&self) -> Result<Option<String>, ModelError> {
        match fs::read_to_string(self.checksum_path()) {
            Ok(contents) => Ok(Some(contents.trim().to_lowercase())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn digest(bytes: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        format!("{:x}", hasher.finalize())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Dataset;

    fn fitted() -> Pipeline {
        Pipeline::builder().fit(&Dataset::sample()).unwrap()
    }

    #[test]
    fn test_save_then_load() -> Result<(), ModelError> {
        let dir = tempfile::tempdir()?;
        let store = ModelStore::new(dir.path().join("nested").join("model.json"));
        let pipeline = fitted();

        store.save(&pipeline)?;
        assert!(store.exists());
        assert!(store.checksum_path().exists());
        assert!(store.verify()?);

        let loaded = store.load()?;
        assert_eq!(loaded.classes(), pipeline.classes());
        let text = "Winner! Claim your free prize";
        let (before, after) = (pipeline.predict(text).unwrap(), loaded.predict(text).unwrap());
        assert_eq!(before.label, after.label);
        for (class, score) in &before.scores {
            assert!((score - after.scores[class]).abs() < 1e-9);
        }
        Ok(())
    }

    fn file_names(dir: &Path) -> io::Result<Vec<String>> {
        let mut names = fs::read_dir(dir)?
            .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
            .collect::<io::Result<Vec<_>>>()?;
        names.sort();
        Ok(names)
    }

    #[test]
    fn test_save_replaces_model_and_checksum_together() -> Result<(), ModelError> {
        let dir = tempfile::tempdir()?;
        let store = ModelStore::new(dir.path().join("model.json"));
        store.save(&fitted())?;

        let retrained = Pipeline::builder()
            .fit(&Dataset::new(vec![
                crate::Example::new("lottery winner cash", "spam"),
                crate::Example::new("lunch at noon", "ham"),
                crate::Example::new("quarterly report draft", "work"),
            ]))
            .unwrap();
        store.save(&retrained)?;

        assert!(store.verify()?);
        assert_eq!(store.load()?.classes(), ["ham", "spam", "work"]);
        assert_eq!(file_names(dir.path())?, ["model.json", "model.json.sha256"]);
        Ok(())
    }

    #[test]
    fn test_failed_save_removes_staged_files() -> Result<(), ModelError> {
        let dir = tempfile::tempdir()?;
        // A directory at the model path makes the final rename fail.
        let store = ModelStore::new(dir.path().join("model.json"));
        fs::create_dir(store.path())?;
        fs::write(store.path().join("keep"), "x")?;

        assert!(matches!(store.save(&fitted()), Err(ModelError::IoError(_))));
        assert_eq!(file_names(dir.path())?, ["model.json"]);
        assert!(!store.checksum_path().exists());
        Ok(())
    }

    #[test]
    fn test_missing_model() {
        let store = ModelStore::new("/tmp/email-classifier-test/does-not-exist.json");
        assert!(matches!(store.load(), Err(ModelError::NotFound(_))));
        assert!(!store.verify().unwrap());
    }

    #[test]
    fn test_tampered_model_is_rejected() -> Result<(), ModelError> {
        let dir = tempfile::tempdir()?;
        let store = ModelStore::new(dir.path().join("model.json"));
        store.save(&fitted())?;

        let mut contents = fs::read_to_string(store.path())?;
        contents.push(' ');
        fs::write(store.path(), contents)?;

        assert!(!store.verify()?);
        assert!(matches!(store.load(), Err(ModelError::HashMismatch { .. })));
        Ok(())
    }

    #[test]
    fn test_load_without_checksum() -> Result<(), ModelError> {
        let dir = tempfile::tempdir()?;
        let store = ModelStore::new(dir.path().join("model.json"));
        store.save(&fitted())?;
        fs::remove_file(store.checksum_path())?;

        assert!(!store.verify()?);
        assert!(store.load().is_ok());
        Ok(())
    }

    #[test]
    fn test_garbage_file() -> Result<(), ModelError> {
        let dir = tempfile::tempdir()?;
        let store = ModelStore::new(dir.path().join("model.json"));
        fs::write(store.path(), "corrupted data")?;
        assert!(matches!(store.load(), Err(ModelError::Serialization(_))));
        Ok(())
    }

    #[test]
    fn test_remove() -> Result<(), ModelError> {
        let dir = tempfile::tempdir()?;
        let store = ModelStore::new(dir.path().join("model.json"));
        store.save(&fitted())?;
        store.remove()?;
        assert!(!store.exists());
        assert!(!store.checksum_path().exists());
        Ok(())
    }

    #[test]
    fn test_default_path() {
        env::set_var(MODEL_PATH_ENV, "/tmp/test-email-classifier/model.json");
        assert_eq!(
            ModelStore::default_path(),
            PathBuf::from("/tmp/test-email-classifier/model.json")
        );
        env::remove_var(MODEL_PATH_ENV);

        assert_eq!(ModelStore::default_path(), PathBuf::from(DEFAULT_MODEL_FILE));
    }
}
