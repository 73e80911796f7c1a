//! Aggregator and RunSummary
//!
//! The aggregator is the only writer of a [`RunSummary`]. It is fed serially (one consumer draining the worker
//! channel), so it needs no locking of its own.

use std::collections::BTreeMap;

use crate::frontend::classifier::Classification;

use super::outcome::FileReport;
use super::verdict::VerdictKind;

/// Pass/fail counts for one group of tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bucket {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
}

impl Bucket {
    fn add(&mut self, success: bool) {
        self.total += 1;
        if success {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
    }
}

impl std::ops::Add for Bucket {
    type Output = Bucket;

    fn add(self, other: Bucket) -> Bucket {
        Bucket {
            total: self.total + other.total,
            passed: self.passed + other.passed,
            failed: self.failed + other.failed,
        }
    }
}

/// Run-wide aggregate of verdicts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub normal: Bucket,
    pub error_stop: Bucket,
    /// Count of each verdict kind across both buckets.
    pub verdicts: BTreeMap<VerdictKind, usize>,
    /// Files that reached the aggregator (tested or skipped).
    pub files: usize,
    /// Files rejected before any driver ran (malformed source, name conflicts, I/O).
    pub skipped_files: usize,
}

impl RunSummary {
    /// Grand total over both buckets.
    pub fn total(&self) -> Bucket {
        self.normal + self.error_stop
    }

    pub fn count(&self, kind: VerdictKind) -> usize {
        self.verdicts.get(&kind).copied().unwrap_or(0)
    }

    /// True iff nothing failed, crashed, missed its error stop, or was skipped.
    pub fn success(&self) -> bool {
        self.total().failed == 0 && self.skipped_files == 0
    }
}

/// Folds file reports into a [`RunSummary`].
#[derive(Debug, Default)]
pub struct Aggregator {
    summary: RunSummary,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, report: &FileReport) {
        self.summary.files += 1;
        if report.is_skipped() {
            self.summary.skipped_files += 1;
            return;
        }

        for test in report.tests() {
            let success = test.verdict.is_success();
            match test.classification {
                Classification::Normal => self.summary.normal.add(success),
                Classification::ErrorStop => self.summary.error_stop.add(success),
            }
            *self.summary.verdicts.entry(test.verdict.kind()).or_insert(0) += 1;
        }
    }

    /// Read-only view of the running totals.
    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    pub fn finish(self) -> RunSummary {
        self.summary
    }
}
