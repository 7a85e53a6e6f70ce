pub mod types;
pub mod loader;

pub use types::*;
pub use loader::load_knowledge;

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum KnowledgeError {
    #[error("Reference file not found: {0}")]
    MissingFile(PathBuf),

    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed CSV in {path}: {message}")]
    Csv { path: PathBuf, message: String },

    #[error("Malformed JSON in {path}: {message}")]
    Json { path: PathBuf, message: String },
}
