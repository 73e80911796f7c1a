//! Run configuration
//!
//! Everything a test run needs beyond the target pattern, populated from the command line.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::backend::{ArtifactResolver, BuildLayout, BuildOrchestrator};
use crate::frontend::classifier::ClassifyOptions;

/// Per-process timeout, for the compiler and for every driver run.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub const DEFAULT_COMPILER: &str = "gfortran";

pub const DEFAULT_BUILD_DIR: &str = "target/fortest";

/// Report format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Console,
    Json,
}

/// Run configuration
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Fortran compiler command
    pub compiler: String,
    /// Extra flags passed to every compiler invocation, after `-o`
    pub flags: Vec<String>,
    /// Root of the per-file build directories
    pub build_dir: PathBuf,
    /// Explicit include dirs, `.mod` files, and link inputs
    pub artifacts: Vec<PathBuf>,
    /// Assertion module source to compile instead of searching for one
    pub assertions: Option<PathBuf>,
    pub timeout: Duration,
    /// Maximum concurrent compile/run processes
    pub jobs: usize,
    /// Search `build/` trees for compiled modules
    pub auto_artifacts: bool,
    /// Treat every test in a file whose name contains `error_stop` as an error-stop test
    pub legacy_error_stop_files: bool,
    /// Judge `program` test files by their `[PASS]`/`[FAIL]` output instead of expecting an abnormal exit
    pub program_protocol: bool,
    /// Keep build directories after the run
    pub keep: bool,
    pub verbose: bool,
    pub format: OutputFormat,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            compiler: DEFAULT_COMPILER.to_string(),
            flags: Vec::new(),
            build_dir: PathBuf::from(DEFAULT_BUILD_DIR),
            artifacts: Vec::new(),
            assertions: None,
            timeout: DEFAULT_TIMEOUT,
            jobs: default_jobs(),
            auto_artifacts: true,
            legacy_error_stop_files: true,
            program_protocol: false,
            keep: false,
            verbose: false,
            format: OutputFormat::Console,
        }
    }
}

/// One job per available core.
pub fn default_jobs() -> usize {
    std::thread::available_parallelism().map(NonZeroUsize::get).unwrap_or(1)
}

impl RunConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_compiler(mut self, compiler: impl Into<String>) -> Self {
        self.compiler = compiler.into();
        self
    }

    pub fn with_flags(mut self, flags: Vec<String>) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_build_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.build_dir = dir.into();
        self
    }

    pub fn with_artifacts(mut self, artifacts: Vec<PathBuf>) -> Self {
        self.artifacts = artifacts;
        self
    }

    pub fn with_assertions(mut self, source: Option<PathBuf>) -> Self {
        self.assertions = source;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Zero is treated as one.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn with_auto_artifacts(mut self, enabled: bool) -> Self {
        self.auto_artifacts = enabled;
        self
    }

    pub fn with_legacy_error_stop_files(mut self, enabled: bool) -> Self {
        self.legacy_error_stop_files = enabled;
        self
    }

    pub fn with_program_protocol(mut self, enabled: bool) -> Self {
        self.program_protocol = enabled;
        self
    }

    pub fn with_keep(mut self, keep: bool) -> Self {
        self.keep = keep;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Resolve relative build, artifact, and assertion paths against `cwd`.
    ///
    /// The compiler runs inside each driver's build directory, so every path it is handed must be absolute.
    pub fn anchored_at(mut self, cwd: &Path) -> Self {
        let anchor = |p: PathBuf| if p.is_absolute() { p } else { cwd.join(p) };
        self.build_dir = anchor(self.build_dir);
        self.artifacts = self.artifacts.into_iter().map(anchor).collect();
        self.assertions = self.assertions.map(anchor);
        self
    }

    pub fn classify_options(&self) -> ClassifyOptions {
        ClassifyOptions {
            legacy_file_rule: self.legacy_error_stop_files,
            program_protocol: self.program_protocol,
        }
    }

    pub fn artifact_resolver(&self) -> ArtifactResolver {
        ArtifactResolver::new(self.artifacts.clone(), self.auto_artifacts, self.assertions.clone())
    }

    pub fn build_orchestrator(&self) -> BuildOrchestrator {
        BuildOrchestrator::new(
            self.compiler.clone(),
            self.flags.clone(),
            self.timeout,
            BuildLayout::new(self.build_dir.clone()),
        )
    }
}
