use crate::error::ClassifierError;
use crate::tokenizer::Language;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DATA_DIR_ENV: &str = "CLASSIFIER_DATA_DIR";
pub const LANGUAGE_ENV: &str = "CLASSIFIER_LANGUAGE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Directory of the sled database holding the four stores.
    pub data_dir: PathBuf,
    pub language: Language,
    /// Number of neighbors consulted by a kNN vote.
    pub k: usize,
    /// Neighbors at or below this similarity are ignored.
    pub min_similarity: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self { data_dir: PathBuf::from("work_dir"), language: Language::English, k: 5, min_similarity: 0.1 }
    }
}

impl ClassifierConfig {
    /// Read a JSON config file; missing keys take their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `CLASSIFIER_DATA_DIR` and `CLASSIFIER_LANGUAGE` when set.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Ok(lang) = std::env::var(LANGUAGE_ENV) {
            self.language = lang.parse().map_err(ClassifierError::Config)?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> std::result::Result<(), ClassifierError> {
        if self.k == 0 {
            return Err(ClassifierError::Config("k must be at least 1".into()));
        }
        if !(-1.0..=1.0).contains(&self.min_similarity) {
            return Err(ClassifierError::Config(format!(
                "min_similarity must be within [-1, 1], got {}",
                self.min_similarity
            )));
        }
        Ok(())
    }
}
