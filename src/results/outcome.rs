//! Per-file reports
//!
//! Workers produce one [`FileReport`] per discovered file; the aggregator and reporters only ever read them.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::frontend::classifier::Classification;
use crate::frontend::diagnostics::SkipKind;

use super::verdict::Verdict;

/// One executed (or attempted) driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverRun {
    pub id: String,
    pub program_name: String,
    /// `None` if the driver never ran, timed out, or died from a signal.
    pub exit_code: Option<i32>,
    pub timed_out: bool,
    /// Wall-clock run time; `None` if the driver never ran.
    pub duration: Option<Duration>,
    /// Captured output (or the compiler diagnostic when the build failed).
    pub output: String,
}

/// The verdict for one test, with a link to the driver that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestReport {
    pub name: String,
    pub classification: Classification,
    pub verdict: Verdict,
    /// Index into the file's `drivers`.
    pub driver: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Analysis succeeded; `tests` may be empty for files without candidates.
    Tested {
        unit: String,
        drivers: Vec<DriverRun>,
        tests: Vec<TestReport>,
    },
    /// The file was rejected before any driver existed.
    Skipped { kind: SkipKind, message: String },
}

/// Everything that happened to one test file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub path: PathBuf,
    pub outcome: FileOutcome,
}

impl FileReport {
    pub fn skipped(path: &Path, kind: SkipKind, message: impl Into<String>) -> Self {
        Self {
            path: path.to_path_buf(),
            outcome: FileOutcome::Skipped {
                kind,
                message: message.into(),
            },
        }
    }

    pub fn tests(&self) -> &[TestReport] {
        match &self.outcome {
            FileOutcome::Tested { tests, .. } => tests,
            FileOutcome::Skipped { .. } => &[],
        }
    }

    pub fn drivers(&self) -> &[DriverRun] {
        match &self.outcome {
            FileOutcome::Tested { drivers, .. } => drivers,
            FileOutcome::Skipped { .. } => &[],
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.outcome, FileOutcome::Skipped { .. })
    }

    /// File name for display, falling back to the full path.
    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}
