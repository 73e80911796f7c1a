//! CLI module for fortest
//!
//! ## Usage
//!
//! - `fortest [PATTERN]` - Discover, build, and run tests (default pattern `test_*.f90`)
//! - `fortest --analyze FILE` - Print a file's analysis and test classification (debug)
//! - `fortest --emit-drivers FILE` - Print the driver programs synthesized for a file (debug)
//!
//! ## Modules
//!
//! - `commands` - Debug command implementations
//! - `config` - Run configuration
//! - `report` - Console and JSON reporters
//! - `test_interfaces` - I/O boundary traits and their default implementations
//! - `test_runner` - The per-file pipeline and worker pool
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;
pub mod config;
pub mod report;
pub mod test_interfaces;
pub mod test_runner;

use std::fmt;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::Parser;
use fortest_core::lang::conventions;

use crate::version::FORTEST_VERSION;
use config::{DEFAULT_BUILD_DIR, DEFAULT_COMPILER, OutputFormat, RunConfig};

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    /// Create a new CLI error with a message and exit code.
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }

    /// Create an error with a custom exit code.
    pub fn with_code(message: impl Into<String>, code: i32) -> Self {
        Self::new(message, ExitCode(code))
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Test runner for Fortran: synthesizes driver programs, runs them in isolation, and reports verdicts
#[derive(Parser, Debug)]
#[command(name = "fortest")]
#[command(version = FORTEST_VERSION)]
#[command(about = "Test runner for Fortran", long_about = None)]
pub struct Cli {
    /// Test file, directory, or file-name pattern
    #[arg(value_name = "PATTERN", default_value = conventions::DEFAULT_PATTERN)]
    pub pattern: String,

    /// Fortran compiler command
    #[arg(long, value_name = "CMD", default_value = DEFAULT_COMPILER)]
    pub compiler: String,

    /// Extra compiler flag (repeatable), e.g. `--flag=-O2`
    #[arg(long = "flag", value_name = "FLAG", allow_hyphen_values = true)]
    pub flags: Vec<String>,

    /// Include directory, `.mod` file, or object/library to link (repeatable)
    #[arg(long = "artifacts", value_name = "PATH")]
    pub artifacts: Vec<PathBuf>,

    /// Assertion module source to compile with every driver
    #[arg(long, value_name = "FILE")]
    pub assertions: Option<PathBuf>,

    /// Directory for generated drivers and executables
    #[arg(long = "build-dir", value_name = "DIR", default_value = DEFAULT_BUILD_DIR)]
    pub build_dir: PathBuf,

    /// Timeout in seconds for each compiler and driver process
    #[arg(long, value_name = "SECS", default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: u64,

    /// Maximum concurrent processes (default: available parallelism)
    #[arg(short = 'j', long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Don't search `build/` directories for compiled modules
    #[arg(long)]
    pub no_auto_artifacts: bool,

    /// Only the subroutine name marks error-stop tests, never the file name
    #[arg(long)]
    pub no_legacy_error_stop_files: bool,

    /// Judge `program` test files by their [PASS]/[FAIL] output instead of expecting `error stop`
    #[arg(long)]
    pub program_protocol: bool,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Console)]
    pub format: OutputFormat,

    /// Keep build directories after the run
    #[arg(long)]
    pub keep: bool,

    /// Verbose output (echo driver output, debug logging)
    #[arg(short, long)]
    pub verbose: bool,

    // Debug/development flags
    /// Print analysis and classification of one file (debug)
    #[arg(long = "analyze", value_name = "FILE")]
    pub analyze_file: Option<PathBuf>,

    /// Print the synthesized driver sources for one file (debug)
    #[arg(long = "emit-drivers", value_name = "FILE", conflicts_with = "analyze_file")]
    pub emit_drivers_file: Option<PathBuf>,
}

impl Cli {
    pub fn run_config(&self) -> RunConfig {
        let mut config = RunConfig::new()
            .with_compiler(self.compiler.clone())
            .with_flags(self.flags.clone())
            .with_build_dir(self.build_dir.clone())
            .with_artifacts(self.artifacts.clone())
            .with_assertions(self.assertions.clone())
            .with_timeout(Duration::from_secs(self.timeout))
            .with_auto_artifacts(!self.no_auto_artifacts)
            .with_legacy_error_stop_files(!self.no_legacy_error_stop_files)
            .with_program_protocol(self.program_protocol)
            .with_keep(self.keep)
            .with_verbose(self.verbose)
            .with_format(self.format);
        if let Some(jobs) = self.jobs {
            config = config.with_jobs(jobs);
        }
        config
    }
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return result.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    let config = cli.run_config();
    let options = config.classify_options();

    // Handle debug flags first
    if let Some(file) = &cli.analyze_file {
        return commands::analyze_file(file, options);
    }
    if let Some(file) = &cli.emit_drivers_file {
        return commands::emit_drivers(file, options);
    }

    test_runner::run_tests(&cli.pattern, config)
}

// ============================================================================
// Tests
// ============================================================================
