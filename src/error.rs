use std::path::PathBuf;
use thiserror::Error;

use crate::core::metric::SimilarityMetric;

pub type Result<T> = std::result::Result<T, DedupError>;

#[derive(Debug, Error)]
pub enum DedupError {
    #[error("Failed to decode {path:?}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Degenerate histogram: {0}")]
    DegenerateHistogram(String),

    #[error("IO error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid operator input: {0:?}")]
    InvalidOperatorInput(String),

    #[error("Classifier expects {expected} scores, got {actual}")]
    MetricMismatch {
        expected: SimilarityMetric,
        actual: SimilarityMetric,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Operator prompt failed: {0}")]
    Prompt(String),

    #[error("Cannot read directory {path:?}: {source}")]
    DirectoryUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DedupError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
