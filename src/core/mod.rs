pub mod classifier;
pub mod histogram;
pub mod metric;
pub mod resolution;
pub mod scanner;

pub use classifier::DuplicateClassifier;
pub use histogram::{HISTOGRAM_SIZE, Histogram, NormalizedHistogram};
pub use metric::{SimilarityMetric, SimilarityResult};
pub use resolution::{
    DuplicateHandler, DuplicatePair, FileArchiver, FileDeleter, OperatorIo, PairOutcome,
    ReportOnly, ResolutionController, ResolutionDecision, SkipReason,
};
pub use scanner::{Corpus, CorpusEntry, CorpusScanner, ScanReport, ScanStatus};
