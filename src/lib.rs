#![forbid(unsafe_code)]
//! fortest: a test runner for Fortran
//!
//! Fortran has no reflection, so the runner finds tests statically and synthesizes the code that calls them:
//! discovery → analysis → classification → driver synthesis → build → isolated execution → output reconciliation →
//! aggregation → reporting.
//!
//! - `frontend` finds test files and recognizes just enough structure (units, `use` statements, subroutine names).
//! - `backend` writes driver programs, resolves build artifacts, compiles, and supervises execution.
//! - `results` turns captured output and exit status into verdicts and folds them into a run summary.
//! - `cli` wires the pipeline together behind a clap CLI and renders reports.
//!
//! ## Panic Policy
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` and `backend` modules
//!   enforce `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.
//!
//! - **Per-test failures are data**: a crashing or failing Fortran test becomes a `Verdict`, never an `Err` that
//!   reaches the top level.

pub mod backend;
pub mod cli;
pub mod frontend;
pub mod results;
pub mod version;

pub use frontend::analyzer::{SourceAnalysis, analyze_source};
pub use frontend::classifier::{Classification, ClassifiedTest};
pub use frontend::diagnostics::AnalysisError;

pub use backend::driver::{Driver, DriverKind, synthesize_drivers};

pub use results::reconcile::reconcile;
pub use results::summary::{Aggregator, RunSummary};
pub use results::verdict::Verdict;

pub use cli::config::RunConfig;
