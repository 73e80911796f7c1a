//! Results: from captured process output to a run-wide summary
//!
//! - `verdict`: the per-test outcome model
//! - `reconcile`: the OutputReconciler (text protocol + exit status → verdicts)
//! - `outcome`: per-file reports handed from workers to the aggregator
//! - `summary`: the Aggregator and the RunSummary it owns

pub mod outcome;
pub mod reconcile;
pub mod summary;
pub mod verdict;

pub use outcome::{FileOutcome, FileReport, TestReport};
pub use summary::{Aggregator, Bucket, RunSummary};
pub use verdict::{Verdict, VerdictKind};
