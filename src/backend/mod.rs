//! fortest backend
//!
//! Turns classified test files into verdict inputs:
//!
//! 1. [`driver`] synthesizes the driver programs for a file
//! 2. [`artifacts`] resolves include dirs, link inputs, and module sources from the host build
//! 3. [`project`] writes each driver into its own build directory and compiles it
//! 4. [`executor`] runs the executable under a timeout and captures its output
//!
//! ## Module Organization
//!
//! - `fortran_emitter.rs` - Low-level Fortran source builder
//! - `driver.rs` - Driver synthesis
//! - `artifacts.rs` - Build-system detection and search-path resolution
//! - `project.rs` - Build layout and compiler invocation
//! - `executor.rs` - Child-process supervision

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod artifacts;
pub mod driver;
pub mod executor;
pub mod fortran_emitter;
pub mod project;

pub use artifacts::{ArtifactResolver, BuildSystem, SearchPaths};
pub use driver::{Driver, DriverKind, synthesize_drivers};
pub use executor::{ExecutionRecord, ProcessError, ProcessSpec, run_process};
pub use project::{BuildError, BuildLayout, BuildOrchestrator, BuildResult};
