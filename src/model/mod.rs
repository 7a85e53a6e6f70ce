pub mod classifier;
pub mod dataset;
pub mod encoder;
pub mod loader;
pub mod tree;

pub use classifier::*;
pub use dataset::LabeledDataset;
pub use encoder::LabelEncoder;
pub use loader::*;
pub use tree::{DecisionTree, TreeParams};

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Model artifact not found: {0}")]
    MissingArtifact(PathBuf),

    #[error("Cannot access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Corrupt artifact {path}: {message}")]
    CorruptArtifact { path: PathBuf, message: String },

    #[error("Model format version {found} is not supported (expected {expected})")]
    VersionMismatch { found: u32, expected: u32 },

    #[error("Artifacts disagree: {0}")]
    ShapeMismatch(String),

    #[error("Feature vector has {got} entries, model expects {expected}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Unusable dataset {path}: {message}")]
    Dataset { path: PathBuf, message: String },

    #[error("No training dataset found (tried {0:?})")]
    NoDataset(Vec<PathBuf>),

    #[error("Training failed: {0}")]
    Training(String),
}
