//! Near-duplicate image detection by intensity histogram, with an
//! operator-driven delete/archive/skip workflow for each duplicate pair.

pub mod config;
pub mod core;
pub mod error;
pub mod io;
pub mod logging;

pub use config::ScanConfig;
pub use crate::core::{
    CorpusScanner, DuplicateClassifier, PairOutcome, ResolutionController, ScanReport, ScanStatus,
    SimilarityMetric,
};
pub use error::{DedupError, Result};
