use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "Sahayak";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Language the vocabulary and the classifier are defined in.
pub const WORKING_LANGUAGE: &str = "English";

/// Path of an optional JSON config file read by `start()`.
pub const CONFIG_PATH_ENV: &str = "SAHAYAK_CONFIG";
const DATA_DIR_ENV: &str = "SAHAYAK_DATA_DIR";
const TRANSLATE_URL_ENV: &str = "SAHAYAK_TRANSLATE_URL";
const TRANSLATE_KEY_ENV: &str = "SAHAYAK_TRANSLATE_KEY";
const TRANSLATE_TIMEOUT_ENV: &str = "SAHAYAK_TRANSLATE_TIMEOUT_SECS";

/// Default tracing filter when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "sahayak_lib=info,warn"
}

/// Get the application data directory.
/// `SAHAYAK_DATA_DIR` wins, then the platform data dir, then the working directory.
pub fn app_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }
    dirs::data_dir()
        .map(|d| d.join(APP_NAME))
        .unwrap_or_else(|| PathBuf::from("."))
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// Locations of the persisted classifier artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub encoder: PathBuf,
    pub features: PathBuf,
}

impl ArtifactPaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            model: dir.join("model.json"),
            encoder: dir.join("encoder.json"),
            features: dir.join("features.json"),
        }
    }
}

/// External translation service settings. No endpoint means translation is disabled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            timeout_secs: 5,
        }
    }
}

/// Engine configuration. Every field has a default so partial JSON files load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub data_dir: PathBuf,
    /// Reference data (descriptions, precautions, schedule, aliases).
    pub master_data_dir: PathBuf,
    pub artifacts: ArtifactPaths,
    /// Candidate datasets for emergency retraining, tried in order.
    pub dataset_paths: Vec<PathBuf>,
    /// Minimum similarity for a fuzzy topic match.
    pub fuzzy_threshold: f64,
    /// Candidates at or below this percentage are discarded.
    pub confidence_floor_pct: f64,
    pub max_candidates: usize,
    pub random_seed: u64,
    pub working_language: String,
    pub translator: TranslatorConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::with_data_dir(PathBuf::from("."))
    }
}

impl EngineConfig {
    /// Standard layout under a data directory:
    /// `<dir>/MasterData`, `<dir>/model.json`, `<dir>/Data/Training_TN.csv`.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            master_data_dir: data_dir.join("MasterData"),
            artifacts: ArtifactPaths::in_dir(&data_dir),
            dataset_paths: vec![
                data_dir.join("Data").join("Training_TN.csv"),
                data_dir.join("Data").join("Training.csv"),
            ],
            fuzzy_threshold: 0.75,
            confidence_floor_pct: 5.0,
            max_candidates: 3,
            random_seed: 42,
            working_language: WORKING_LANGUAGE.to_string(),
            translator: TranslatorConfig::default(),
            data_dir,
        }
    }

    /// Defaults under `app_data_dir()`, with translator overrides from the environment.
    pub fn from_env() -> Self {
        let mut config = Self::with_data_dir(app_data_dir());

        if let Ok(url) = std::env::var(TRANSLATE_URL_ENV) {
            if !url.trim().is_empty() {
                config.translator.endpoint = Some(url);
            }
        }
        if let Ok(key) = std::env::var(TRANSLATE_KEY_ENV) {
            if !key.trim().is_empty() {
                config.translator.api_key = Some(key);
            }
        }
        if let Ok(raw) = std::env::var(TRANSLATE_TIMEOUT_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.translator.timeout_secs = secs,
                _ => tracing::warn!(value = %raw, "Ignoring invalid {TRANSLATE_TIMEOUT_ENV}"),
            }
        }

        config
    }

    /// Load a JSON config file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.fuzzy_threshold > 0.0 && self.fuzzy_threshold <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "fuzzy_threshold must be in (0, 1], got {}",
                self.fuzzy_threshold
            )));
        }
        if !(0.0..100.0).contains(&self.confidence_floor_pct) {
            return Err(ConfigError::Invalid(format!(
                "confidence_floor_pct must be in [0, 100), got {}",
                self.confidence_floor_pct
            )));
        }
        if self.max_candidates == 0 {
            return Err(ConfigError::Invalid("max_candidates must be at least 1".into()));
        }
        if self.working_language.trim().is_empty() {
            return Err(ConfigError::Invalid("working_language is empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_under_data_dir() {
        let config = EngineConfig::with_data_dir(PathBuf::from("/srv/sahayak"));
        assert_eq!(config.master_data_dir, PathBuf::from("/srv/sahayak/MasterData"));
        assert_eq!(config.artifacts.model, PathBuf::from("/srv/sahayak/model.json"));
        assert_eq!(
            config.dataset_paths[0],
            PathBuf::from("/srv/sahayak/Data/Training_TN.csv")
        );
        assert!(config.translator.endpoint.is_none());
    }

    #[test]
    fn defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_candidates, 3);
        assert!((config.confidence_floor_pct - 5.0).abs() < f64::EPSILON);
        assert!((config.fuzzy_threshold - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn validate_rejects_out_of_range_threshold() {
        let mut config = EngineConfig::default();
        config.fuzzy_threshold = 1.5;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.fuzzy_threshold = 0.8;
        config.max_candidates = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn load_partial_json_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");
        std::fs::write(
            &path,
            r#"{"fuzzy_threshold": 0.8, "translator": {"endpoint": "http://localhost:5000"}}"#,
        )
        .unwrap();

        let config = EngineConfig::load(&path).unwrap();
        assert!((config.fuzzy_threshold - 0.8).abs() < f64::EPSILON);
        assert_eq!(
            config.translator.endpoint.as_deref(),
            Some("http://localhost:5000")
        );
        assert_eq!(config.translator.timeout_secs, 5);
        assert_eq!(config.max_candidates, 3);
    }

    #[test]
    fn load_missing_file_is_read_error() {
        let err = EngineConfig::load(Path::new("/nonexistent/engine.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn app_name_is_sahayak() {
        assert_eq!(APP_NAME, "Sahayak");
    }
}
