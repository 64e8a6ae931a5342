// Per-pair resolution workflow: prompt, optional confirmation, then one
// delete/archive/skip transition. File mutation and operator I/O are
// collaborators so the controller runs headless in tests.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::core::metric::SimilarityResult;
use crate::error::{DedupError, Result};

pub const CHOICE_DELETE_FIRST: &str = "1";
pub const CHOICE_DELETE_SECOND: &str = "2";
pub const CHOICE_ARCHIVE_FIRST: &str = "3";
pub const CHOICE_ARCHIVE_SECOND: &str = "4";
pub const CHOICE_SKIP: &str = "5";

const PAIR_CHOICES: [&str; 5] = [
    CHOICE_DELETE_FIRST,
    CHOICE_DELETE_SECOND,
    CHOICE_ARCHIVE_FIRST,
    CHOICE_ARCHIVE_SECOND,
    CHOICE_SKIP,
];
const CONFIRM_CHOICES: [&str; 2] = ["y", "n"];

/// Blocking operator conversation.
pub trait OperatorIo {
    /// Show `prompt` and return the raw response. `accepted` lists the
    /// responses the caller understands; validation is the caller's job.
    fn ask(&mut self, prompt: &str, accepted: &[&str]) -> Result<String>;

    fn notify(&mut self, message: &str);

    /// Show the file about to be mutated, if the operator can render it.
    fn preview(&mut self, _path: &Path) {}
}

pub trait FileDeleter {
    fn delete(&self, path: &Path) -> std::io::Result<()>;
}

/// Compress `path` into an archive and return the archive location.
/// Must not remove the original.
pub trait FileArchiver {
    fn archive(&self, path: &Path) -> std::io::Result<PathBuf>;
}

/// A classified duplicate pair handed to a `DuplicateHandler`.
#[derive(Debug, Clone, Copy)]
pub struct DuplicatePair<'a> {
    pub result: &'a SimilarityResult,
    pub first: &'a Path,
    pub second: &'a Path,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "path", rename_all = "snake_case")]
pub enum ResolutionDecision {
    Delete(PathBuf),
    Archive(PathBuf),
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    Operator,
    InvalidInput(String),
    PromptUnavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PairOutcome {
    /// Detected only, nobody was asked.
    Reported,
    Skipped { reason: SkipReason },
    Canceled { path: PathBuf },
    Deleted { path: PathBuf },
    DeleteFailed { path: PathBuf, error: String },
    Archived { path: PathBuf, archive: PathBuf },
    ArchiveFailed { path: PathBuf, error: String },
    /// Archive written but the original could not be removed.
    ArchivedNotDeleted {
        path: PathBuf,
        archive: PathBuf,
        error: String,
    },
}

impl PairOutcome {
    /// The file this outcome took off disk, if any.
    pub fn removed_path(&self) -> Option<&Path> {
        match self {
            Self::Deleted { path } | Self::Archived { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Receives every pair the classifier flags, in scan order.
pub trait DuplicateHandler {
    fn handle(&mut self, pair: &DuplicatePair<'_>) -> PairOutcome;
}

/// Records duplicates without asking anything.
#[derive(Debug, Default)]
pub struct ReportOnly;

impl DuplicateHandler for ReportOnly {
    fn handle(&mut self, _pair: &DuplicatePair<'_>) -> PairOutcome {
        PairOutcome::Reported
    }
}

pub struct ResolutionController<O, D, A> {
    operator: O,
    deleter: D,
    archiver: A,
    confirm: bool,
}

impl<O, D, A> ResolutionController<O, D, A>
where
    O: OperatorIo,
    D: FileDeleter,
    A: FileArchiver,
{
    pub fn new(operator: O, deleter: D, archiver: A) -> Self {
        Self {
            operator,
            deleter,
            archiver,
            confirm: false,
        }
    }

    /// Require a second y/n prompt before any mutation.
    pub fn with_confirmation(mut self, confirm: bool) -> Self {
        self.confirm = confirm;
        self
    }

    pub fn operator(&self) -> &O {
        &self.operator
    }

    pub fn into_operator(self) -> O {
        self.operator
    }

    /// Runs the pair from Prompt to Done.
    pub fn resolve(&mut self, pair: &DuplicatePair<'_>) -> PairOutcome {
        let decision = match self.decide(pair) {
            Ok(decision) => decision,
            Err(DedupError::InvalidOperatorInput(input)) => {
                self.operator
                    .notify("Invalid choice. No image will be changed.");
                return PairOutcome::Skipped {
                    reason: SkipReason::InvalidInput(input),
                };
            }
            Err(err) => {
                warn!("Skipping pair {} / {}: {}", pair.result.first, pair.result.second, err);
                return PairOutcome::Skipped {
                    reason: SkipReason::PromptUnavailable(err.to_string()),
                };
            }
        };

        if self.confirm {
            if let Some(outcome) = self.confirm_decision(&decision) {
                return outcome;
            }
        }

        self.apply(decision)
    }

    /// Prompt state: ask which file to act on.
    pub fn decide(&mut self, pair: &DuplicatePair<'_>) -> Result<ResolutionDecision> {
        let first = display_name(pair.first);
        let second = display_name(pair.second);

        self.operator.notify(&format!(
            "Images {} and {} are similar ({} = {:.4}). What would you like to do?\n  \
             {}. Delete {}\n  {}. Delete {}\n  {}. Archive {}\n  {}. Archive {}\n  {}. Skip",
            first,
            second,
            pair.result.metric,
            pair.result.score,
            CHOICE_DELETE_FIRST,
            first,
            CHOICE_DELETE_SECOND,
            second,
            CHOICE_ARCHIVE_FIRST,
            first,
            CHOICE_ARCHIVE_SECOND,
            second,
            CHOICE_SKIP,
        ));

        let response = self
            .operator
            .ask("Enter your choice (1-5)", &PAIR_CHOICES)?;

        match response.trim() {
            CHOICE_DELETE_FIRST => Ok(ResolutionDecision::Delete(pair.first.to_path_buf())),
            CHOICE_DELETE_SECOND => Ok(ResolutionDecision::Delete(pair.second.to_path_buf())),
            CHOICE_ARCHIVE_FIRST => Ok(ResolutionDecision::Archive(pair.first.to_path_buf())),
            CHOICE_ARCHIVE_SECOND => Ok(ResolutionDecision::Archive(pair.second.to_path_buf())),
            CHOICE_SKIP => Ok(ResolutionDecision::Skip),
            other => Err(DedupError::InvalidOperatorInput(other.to_string())),
        }
    }

    /// Returns an outcome when the operator backs out.
    fn confirm_decision(&mut self, decision: &ResolutionDecision) -> Option<PairOutcome> {
        let (verb, path) = match decision {
            ResolutionDecision::Delete(path) => ("delete", path),
            ResolutionDecision::Archive(path) => ("archive", path),
            ResolutionDecision::Skip => return None,
        };

        self.operator.preview(path);
        let question = format!(
            "Are you sure you want to {} {}? (y/n)",
            verb,
            display_name(path)
        );
        let confirmed = match self.operator.ask(&question, &CONFIRM_CHOICES) {
            Ok(answer) => answer.trim().eq_ignore_ascii_case("y"),
            Err(err) => {
                warn!("Confirmation prompt failed: {}", err);
                false
            }
        };

        if confirmed {
            None
        } else {
            self.operator
                .notify(&format!("Image {} canceled.", verb_noun(verb)));
            Some(PairOutcome::Canceled { path: path.clone() })
        }
    }

    /// Delete/Archive/Skip state, then Done.
    pub fn apply(&mut self, decision: ResolutionDecision) -> PairOutcome {
        match decision {
            ResolutionDecision::Skip => {
                self.operator.notify("Skipping this pair.");
                PairOutcome::Skipped {
                    reason: SkipReason::Operator,
                }
            }
            ResolutionDecision::Delete(path) => self.delete(path),
            ResolutionDecision::Archive(path) => self.archive(path),
        }
    }

    fn delete(&mut self, path: PathBuf) -> PairOutcome {
        match self.deleter.delete(&path) {
            Ok(()) => {
                info!("Deleted {}", path.display());
                self.operator
                    .notify(&format!("Image {} deleted successfully.", display_name(&path)));
                PairOutcome::Deleted { path }
            }
            Err(err) => {
                warn!("Failed to delete {}: {}", path.display(), err);
                self.operator.notify(&format!(
                    "Failed to delete image {}: {}",
                    display_name(&path),
                    err
                ));
                PairOutcome::DeleteFailed {
                    path,
                    error: err.to_string(),
                }
            }
        }
    }

    fn archive(&mut self, path: PathBuf) -> PairOutcome {
        let archive = match self.archiver.archive(&path) {
            Ok(archive) => archive,
            Err(err) => {
                // The original stays put when archiving fails.
                warn!("Failed to archive {}: {}", path.display(), err);
                self.operator.notify(&format!(
                    "Failed to archive image {}: {}",
                    display_name(&path),
                    err
                ));
                return PairOutcome::ArchiveFailed {
                    path,
                    error: err.to_string(),
                };
            }
        };

        self.operator.notify(&format!(
            "Image {} archived to {}.",
            display_name(&path),
            archive.display()
        ));

        match self.deleter.delete(&path) {
            Ok(()) => {
                info!("Archived {} -> {}", path.display(), archive.display());
                self.operator
                    .notify(&format!("Image {} deleted successfully.", display_name(&path)));
                PairOutcome::Archived { path, archive }
            }
            Err(err) => {
                warn!("Archived {} but could not remove it: {}", path.display(), err);
                self.operator.notify(&format!(
                    "Failed to delete image {}: {}",
                    display_name(&path),
                    err
                ));
                PairOutcome::ArchivedNotDeleted {
                    path,
                    archive,
                    error: err.to_string(),
                }
            }
        }
    }
}

impl<O, D, A> DuplicateHandler for ResolutionController<O, D, A>
where
    O: OperatorIo,
    D: FileDeleter,
    A: FileArchiver,
{
    fn handle(&mut self, pair: &DuplicatePair<'_>) -> PairOutcome {
        self.resolve(pair)
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn verb_noun(verb: &str) -> &'static str {
    match verb {
        "archive" => "archiving",
        _ => "deletion",
    }
}
