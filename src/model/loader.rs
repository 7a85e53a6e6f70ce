//! Self-healing classifier startup.
//!
//! Persisted artifacts are tried first. If any of them is missing, corrupt,
//! from another format version or inconsistent with the others, a fallback
//! tree is fitted on the raw labeled dataset. If that also fails the state is
//! degraded for the rest of the process lifetime.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use super::classifier::ProbabilisticModel;
use super::dataset::LabeledDataset;
use super::encoder::LabelEncoder;
use super::tree::{DecisionTree, TreeParams};
use super::ModelError;
use crate::config::ArtifactPaths;
use crate::knowledge::FeatureVocabulary;

/// Bumped whenever the serialized model layout changes.
pub const MODEL_FORMAT_VERSION: u32 = 1;

/// Where a healthy model came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelSource {
    Persisted,
    Retrained,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ClassifierStatus {
    Healthy { source: ModelSource },
    /// Terminal until restart.
    Degraded { error: String },
}

/// Process-wide classifier: model, label mapping and the feature order it was
/// trained against. Immutable after construction.
pub struct ClassifierState {
    model: Option<Box<dyn ProbabilisticModel>>,
    encoder: LabelEncoder,
    feature_order: FeatureVocabulary,
    status: ClassifierStatus,
    loaded_at: DateTime<Utc>,
}

impl std::fmt::Debug for ClassifierState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassifierState")
            .field("status", &self.status)
            .field("classes", &self.encoder.len())
            .field("features", &self.feature_order.len())
            .field("loaded_at", &self.loaded_at)
            .finish()
    }
}

impl ClassifierState {
    pub fn healthy(
        model: Box<dyn ProbabilisticModel>,
        encoder: LabelEncoder,
        feature_order: FeatureVocabulary,
        source: ModelSource,
    ) -> Self {
        Self {
            model: Some(model),
            encoder,
            feature_order,
            status: ClassifierStatus::Healthy { source },
            loaded_at: Utc::now(),
        }
    }

    pub fn degraded(error: String) -> Self {
        Self {
            model: None,
            encoder: LabelEncoder::default(),
            feature_order: FeatureVocabulary::default(),
            status: ClassifierStatus::Degraded { error },
            loaded_at: Utc::now(),
        }
    }

    pub fn model(&self) -> Option<&dyn ProbabilisticModel> {
        self.model.as_deref()
    }

    pub fn encoder(&self) -> &LabelEncoder {
        &self.encoder
    }

    pub fn feature_order(&self) -> &FeatureVocabulary {
        &self.feature_order
    }

    pub fn status(&self) -> &ClassifierStatus {
        &self.status
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self.status, ClassifierStatus::Healthy { .. })
    }

    pub fn last_error(&self) -> Option<&str> {
        match &self.status {
            ClassifierStatus::Degraded { error } => Some(error),
            ClassifierStatus::Healthy { .. } => None,
        }
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }
}

#[derive(Serialize, Deserialize)]
struct ModelFile {
    format_version: u32,
    model: DecisionTree,
}

/// The three persisted artifacts, loaded and cross-checked together.
#[derive(Debug, Clone)]
pub struct ModelArtifacts {
    pub model: DecisionTree,
    pub encoder: LabelEncoder,
    pub features: FeatureVocabulary,
}

impl ModelArtifacts {
    pub fn load(paths: &ArtifactPaths) -> Result<Self, ModelError> {
        let file: ModelFile = read_json(&paths.model)?;
        if file.format_version != MODEL_FORMAT_VERSION {
            return Err(ModelError::VersionMismatch {
                found: file.format_version,
                expected: MODEL_FORMAT_VERSION,
            });
        }
        let encoder: LabelEncoder = read_json(&paths.encoder)?;
        let features: Vec<String> = read_json(&paths.features)?;

        let artifacts = Self {
            model: file.model,
            encoder,
            features: FeatureVocabulary::new(features),
        };
        artifacts.check_consistency()?;
        Ok(artifacts)
    }

    fn check_consistency(&self) -> Result<(), ModelError> {
        self.model.validate()?;
        if self.features.len() != self.model.n_features() {
            return Err(ModelError::ShapeMismatch(format!(
                "feature list has {} entries, model expects {}",
                self.features.len(),
                self.model.n_features()
            )));
        }
        if self.encoder.len() != self.model.n_classes() {
            return Err(ModelError::ShapeMismatch(format!(
                "encoder has {} classes, model has {}",
                self.encoder.len(),
                self.model.n_classes()
            )));
        }
        Ok(())
    }

    /// Write all three artifacts, each via temp file + rename.
    pub fn save(&self, paths: &ArtifactPaths) -> Result<(), ModelError> {
        write_json_atomic(
            &paths.model,
            &ModelFile {
                format_version: MODEL_FORMAT_VERSION,
                model: self.model.clone(),
            },
        )?;
        write_json_atomic(&paths.encoder, &self.encoder)?;
        write_json_atomic(&paths.features, &self.features)?;
        Ok(())
    }

    /// Fit a fresh tree on the whole dataset. Feature order is the dataset's column order.
    pub fn fit(dataset: &LabeledDataset, params: TreeParams) -> Result<Self, ModelError> {
        let encoder = LabelEncoder::fit(&dataset.labels);
        let y: Vec<usize> = dataset
            .labels
            .iter()
            .map(|l| {
                encoder
                    .transform(l)
                    .ok_or_else(|| ModelError::Training(format!("label {l:?} not encoded")))
            })
            .collect::<Result<_, _>>()?;

        let model = DecisionTree::fit(&dataset.rows, &y, encoder.len(), params)?;
        let artifacts = Self {
            model,
            encoder,
            features: FeatureVocabulary::new(&dataset.feature_names),
        };
        artifacts.check_consistency()?;
        Ok(artifacts)
    }

    pub fn into_state(self, source: ModelSource) -> ClassifierState {
        ClassifierState::healthy(Box::new(self.model), self.encoder, self.features, source)
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ModelError> {
    let file = File::open(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ModelError::MissingArtifact(path.to_path_buf())
        } else {
            ModelError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| ModelError::CorruptArtifact {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), ModelError> {
    let io_err = |source: std::io::Error| ModelError::Io {
        path: path.to_path_buf(),
        source,
    };
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent).map_err(io_err)?;

    let temp = NamedTempFile::new_in(parent).map_err(io_err)?;
    {
        let mut writer = BufWriter::new(temp.as_file());
        serde_json::to_writer(&mut writer, value).map_err(|e| ModelError::CorruptArtifact {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        writer.flush().map_err(io_err)?;
    }
    temp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}

/// Loads the classifier once at startup, retraining from raw data if needed.
#[derive(Debug, Clone)]
pub struct SelfHealingModelLoader {
    artifacts: ArtifactPaths,
    dataset_paths: Vec<PathBuf>,
    params: TreeParams,
}

impl SelfHealingModelLoader {
    pub fn new(artifacts: ArtifactPaths, dataset_paths: Vec<PathBuf>, seed: u64) -> Self {
        Self {
            artifacts,
            dataset_paths,
            params: TreeParams {
                seed,
                ..TreeParams::default()
            },
        }
    }

    pub fn from_config(config: &crate::config::EngineConfig) -> Self {
        Self::new(
            config.artifacts.clone(),
            config.dataset_paths.clone(),
            config.random_seed,
        )
    }

    /// Never fails: the worst case is a degraded state carrying both errors.
    pub fn load(&self) -> ClassifierState {
        let load_error = match ModelArtifacts::load(&self.artifacts) {
            Ok(artifacts) => {
                tracing::info!(
                    classes = artifacts.encoder.len(),
                    features = artifacts.features.len(),
                    "Classifier artifacts loaded"
                );
                return artifacts.into_state(ModelSource::Persisted);
            }
            Err(e) => e,
        };

        tracing::warn!(error = %load_error, "Classifier artifacts unusable, retraining fallback model");

        match self.retrain() {
            Ok((artifacts, dataset_path)) => {
                tracing::info!(
                    dataset = %dataset_path.display(),
                    classes = artifacts.encoder.len(),
                    features = artifacts.features.len(),
                    leaves = artifacts.model.leaf_count(),
                    "Fallback classifier retrained"
                );
                artifacts.into_state(ModelSource::Retrained)
            }
            Err(retrain_error) => {
                let error = format!(
                    "artifact load failed ({load_error}); retraining failed ({retrain_error})"
                );
                tracing::error!(error = %error, "Classifier degraded, diagnosis disabled until restart");
                ClassifierState::degraded(error)
            }
        }
    }

    /// First dataset candidate that exists and parses wins.
    fn retrain(&self) -> Result<(ModelArtifacts, PathBuf), ModelError> {
        let mut last_error = None;
        for path in &self.dataset_paths {
            if !path.exists() {
                tracing::debug!(path = %path.display(), "Dataset candidate absent");
                continue;
            }
            let attempt = LabeledDataset::from_csv(path)
                .and_then(|dataset| ModelArtifacts::fit(&dataset, self.params));
            match attempt {
                Ok(artifacts) => return Ok((artifacts, path.clone())),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Dataset candidate failed");
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| ModelError::NoDataset(self.dataset_paths.clone())))
    }
}
