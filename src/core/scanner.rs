use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::ScanConfig;
use crate::core::histogram::{NormalizedHistogram, normalized_histogram};
use crate::core::metric::{SimilarityMetric, SimilarityResult};
use crate::core::resolution::{DuplicateHandler, DuplicatePair, PairOutcome};
use crate::error::{DedupError, Result};
use crate::io::decode::{GrayImageSource, ImageCrateSource};

/// One successfully decoded image. The pixels are gone; only the histogram
/// is kept for comparison.
#[derive(Debug, Clone)]
pub struct CorpusEntry {
    pub name: String,
    pub path: PathBuf,
    pub histogram: NormalizedHistogram,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Histograms keyed by file name, in discovery order.
#[derive(Debug, Default)]
pub struct Corpus {
    entries: Vec<CorpusEntry>,
    index: HashMap<String, usize>,
    failures: Vec<FileFailure>,
    discovered: usize,
}

impl Corpus {
    /// Written once per file; a repeated name keeps the first entry.
    fn insert(&mut self, entry: CorpusEntry) {
        if self.index.contains_key(&entry.name) {
            warn!("Duplicate file name {}; keeping the first", entry.name);
            return;
        }
        self.index.insert(entry.name.clone(), self.entries.len());
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[CorpusEntry] {
        &self.entries
    }

    pub fn failures(&self) -> &[FileFailure] {
        &self.failures
    }

    pub fn discovered(&self) -> usize {
        self.discovered
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&NormalizedHistogram> {
        self.index
            .get(name)
            .map(|&idx| &self.entries[idx].histogram)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    NoImages,
    InsufficientImages,
    Completed,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolvedPair {
    #[serde(flatten)]
    pub result: SimilarityResult,
    pub outcome: PairOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub directory: PathBuf,
    pub metric: SimilarityMetric,
    pub threshold: f64,
    pub status: ScanStatus,
    pub files_discovered: usize,
    pub images_decoded: usize,
    pub failures: Vec<FileFailure>,
    pub comparisons: usize,
    pub degenerate_pairs: usize,
    pub pairs_skipped_removed: usize,
    pub duplicates: Vec<ResolvedPair>,
}

impl ScanReport {
    fn empty(directory: &Path, config: &ScanConfig, status: ScanStatus, corpus: Corpus) -> Self {
        Self {
            directory: directory.to_path_buf(),
            metric: config.metric,
            threshold: config.threshold(),
            status,
            files_discovered: corpus.discovered,
            images_decoded: corpus.entries.len(),
            failures: corpus.failures,
            comparisons: 0,
            degenerate_pairs: 0,
            pairs_skipped_removed: 0,
            duplicates: Vec::new(),
        }
    }
}

/// Drives extraction, pairwise scoring, classification and resolution over
/// one directory. Single-threaded: each pair, including any operator prompt,
/// finishes before the next is scored.
pub struct CorpusScanner<S = ImageCrateSource> {
    config: ScanConfig,
    source: S,
    show_progress: bool,
}

impl CorpusScanner<ImageCrateSource> {
    pub fn new(config: ScanConfig) -> Self {
        Self::with_source(config, ImageCrateSource)
    }
}

impl<S: GrayImageSource> CorpusScanner<S> {
    pub fn with_source(config: ScanConfig, source: S) -> Self {
        Self {
            config,
            source,
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn scan<H: DuplicateHandler>(&self, dir: &Path, handler: &mut H) -> Result<ScanReport> {
        self.config.validate()?;

        let corpus = self.build_corpus(dir)?;
        if corpus.discovered == 0 {
            info!("No images found in {}", dir.display());
            return Ok(ScanReport::empty(dir, &self.config, ScanStatus::NoImages, corpus));
        }
        if corpus.len() < 2 {
            info!(
                "Only {} decodable image(s) in {}; nothing to compare",
                corpus.len(),
                dir.display()
            );
            return Ok(ScanReport::empty(
                dir,
                &self.config,
                ScanStatus::InsufficientImages,
                corpus,
            ));
        }

        let mut report = ScanReport::empty(dir, &self.config, ScanStatus::Completed, Corpus::default());
        report.files_discovered = corpus.discovered;
        report.images_decoded = corpus.len();

        timed("comparing pairs", || self.compare(&corpus, handler, &mut report));

        report.failures = corpus.failures;
        info!(
            "Scan complete: {} images, {} comparisons, {} duplicate pair(s)",
            report.images_decoded,
            report.comparisons,
            report.duplicates.len()
        );
        Ok(report)
    }

    /// Candidate files directly inside `dir`, sorted by name.
    pub fn discover(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        fs::read_dir(dir).map_err(|source| DedupError::DirectoryUnreadable {
            path: dir.to_path_buf(),
            source,
        })?;

        let spinner = self.spinner("Scanning for images…");
        let mut images = Vec::new();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("Skipping unreadable entry in {}: {}", dir.display(), err);
                    continue;
                }
            };

            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if let Some(ext) = path.extension().and_then(|s| s.to_str()) {
                if self.config.accepts_extension(ext) {
                    images.push(path.to_path_buf());
                }
            }
            spinner.tick();
        }
        spinner.finish_and_clear();
        Ok(images)
    }

    /// Decode and histogram every candidate. Per-file failures are recorded
    /// and the file left out.
    pub fn build_corpus(&self, dir: &Path) -> Result<Corpus> {
        let files = self.discover(dir)?;
        let mut corpus = Corpus {
            discovered: files.len(),
            ..Corpus::default()
        };

        let bar = self.bar(files.len() as u64);
        timed("extracting histograms", || {
            for path in files {
                bar.inc(1);
                let histogram = self
                    .source
                    .load_gray(&path)
                    .and_then(|img| normalized_histogram(&img));

                match histogram {
                    Ok(histogram) => corpus.insert(CorpusEntry {
                        name: file_name(&path),
                        path,
                        histogram,
                    }),
                    Err(err) => {
                        warn!("Excluding {}: {}", path.display(), err);
                        corpus.failures.push(FileFailure {
                            path,
                            error: err.to_string(),
                        });
                    }
                }
            }
        });
        bar.finish_and_clear();

        Ok(corpus)
    }

    fn compare<H: DuplicateHandler>(&self, corpus: &Corpus, handler: &mut H, report: &mut ScanReport) {
        let metric = self.config.metric;
        let classifier = self.config.classifier();
        let entries = corpus.entries();
        let mut removed: HashSet<PathBuf> = HashSet::new();

        for (i, first) in entries.iter().enumerate() {
            for second in &entries[i + 1..] {
                if removed.contains(&first.path) || removed.contains(&second.path) {
                    report.pairs_skipped_removed += 1;
                    continue;
                }

                let score = match metric.score(&first.histogram, &second.histogram) {
                    Ok(score) => score,
                    Err(err) => {
                        warn!("Skipping pair {} / {}: {}", first.name, second.name, err);
                        report.degenerate_pairs += 1;
                        continue;
                    }
                };
                report.comparisons += 1;

                let result = SimilarityResult {
                    first: first.name.clone(),
                    second: second.name.clone(),
                    score,
                    metric,
                };
                debug!("{} vs {}: {} = {:.6}", first.name, second.name, metric, score);

                match classifier.is_duplicate(&result) {
                    Ok(true) => {}
                    Ok(false) => continue,
                    Err(err) => {
                        warn!("Cannot classify {} / {}: {}", first.name, second.name, err);
                        continue;
                    }
                }

                let outcome = handler.handle(&DuplicatePair {
                    result: &result,
                    first: &first.path,
                    second: &second.path,
                });
                if let Some(path) = outcome.removed_path() {
                    removed.insert(path.to_path_buf());
                }
                report.duplicates.push(ResolvedPair { result, outcome });
            }
        }
    }

    fn spinner(&self, message: &'static str) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg}") {
            spinner.set_style(style);
        }
        spinner.set_message(message);
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner
    }

    fn bar(&self, len: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(len);
        if let Ok(style) = ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} histograms") {
            bar.set_style(style);
        }
        bar
    }
}

/// Run `f()` and log how long it took.
fn timed<T, F: FnOnce() -> T>(label: &str, f: F) -> T {
    let start = Instant::now();
    let result = f();
    info!("⏱ {} took {:.2?}", label, start.elapsed());
    result
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
