//! Test runner I/O boundary interfaces
//!
//! Trait-based abstractions for the operations that touch the outside world:
//! - Test discovery (filesystem scan + source analysis)
//! - Driver building (artifact resolution + compiler invocation)
//! - Driver execution (child process + output capture)
//!
//! The pipeline in `test_runner` is generic over these, so it can be exercised with scripted fakes and no Fortran
//! toolchain. The default implementations are what the `fortest` binary uses.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;

use crate::backend::artifacts::{ArtifactResolver, SearchPaths};
use crate::backend::driver::Driver;
use crate::backend::executor::{ExecutionRecord, ProcessError, ProcessSpec, run_process};
use crate::backend::project::{BuildError, BuildOrchestrator, BuildResult};
use crate::frontend::analyzer::{self, SourceAnalysis};
use crate::frontend::diagnostics::AnalysisError;
use crate::frontend::discovery::{self, DiscoveryError};

/// Errors that occur at the I/O boundary
#[derive(Debug, Error)]
pub enum TestError {
    #[error("failed to discover tests: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("driver execution failed: {0}")]
    Execution(#[from] ProcessError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================================
// Test Discovery Interface
// ============================================================================

/// Find test files and analyze them.
pub trait TestDiscovery: Send + Sync + 'static {
    /// Resolve the CLI target into test files, in run order.
    fn discover_test_files(&self, target: &str, cwd: &Path) -> Result<Vec<PathBuf>, TestError>;

    /// Analyze one test file.
    fn analyze(&self, path: &Path) -> Result<SourceAnalysis, AnalysisError>;
}

// ============================================================================
// Driver Builder Interface
// ============================================================================

/// One driver to compile.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub test_file: PathBuf,
    pub analysis: Arc<SourceAnalysis>,
    pub driver: Driver,
}

/// Compile drivers into executables.
///
/// A compiler rejecting the code is `Ok(BuildResult::CompileFailed)`; `Err` means the build could not be attempted.
pub trait DriverBuilder: Send + Sync + 'static {
    fn build(&self, request: BuildRequest) -> impl Future<Output = Result<BuildResult, TestError>> + Send;

    /// Remove whatever was built for `test_file`. Called once per file after all its drivers ran.
    fn clean(&self, _test_file: &Path) -> Result<(), TestError> {
        Ok(())
    }
}

// ============================================================================
// Driver Executor Interface
// ============================================================================

/// One compiled driver to run.
#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    pub executable: PathBuf,
    pub driver: Driver,
}

/// Run compiled drivers and capture what happened.
pub trait DriverExecutor: Send + Sync + 'static {
    fn execute(&self, request: ExecutionRequest) -> impl Future<Output = Result<ExecutionRecord, TestError>> + Send;
}

// ============================================================================
// Default Implementations
// ============================================================================

/// Filesystem discovery and on-disk source analysis.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultTestDiscovery;

impl TestDiscovery for DefaultTestDiscovery {
    fn discover_test_files(&self, target: &str, cwd: &Path) -> Result<Vec<PathBuf>, TestError> {
        Ok(discovery::discover_test_files(target, cwd)?)
    }

    fn analyze(&self, path: &Path) -> Result<SourceAnalysis, AnalysisError> {
        analyzer::analyze_file(path).map(|(_, analysis)| analysis)
    }
}

/// Resolves search paths once per file and compiles with the configured compiler.
#[derive(Debug)]
pub struct DefaultDriverBuilder {
    resolver: Arc<ArtifactResolver>,
    orchestrator: BuildOrchestrator,
    search_paths: Mutex<HashMap<PathBuf, Arc<SearchPaths>>>,
}

impl DefaultDriverBuilder {
    pub fn new(resolver: ArtifactResolver, orchestrator: BuildOrchestrator) -> Self {
        Self {
            resolver: Arc::new(resolver),
            orchestrator,
            search_paths: Mutex::new(HashMap::new()),
        }
    }

    fn cached_search_paths(&self, test_file: &Path) -> Option<Arc<SearchPaths>> {
        self.search_paths.lock().unwrap_or_else(|e| e.into_inner()).get(test_file).cloned()
    }

    /// Search paths for `test_file`, resolved on the blocking pool the first time a driver asks.
    ///
    /// The lock is never held across the filesystem walk. Two drivers of one file may both resolve; the first
    /// result stored wins.
    async fn search_paths(&self, test_file: &Path, analysis: &Arc<SourceAnalysis>) -> Result<Arc<SearchPaths>, TestError> {
        if let Some(found) = self.cached_search_paths(test_file) {
            return Ok(found);
        }

        let resolver = Arc::clone(&self.resolver);
        let analysis = Arc::clone(analysis);
        let path = test_file.to_path_buf();
        let resolved = tokio::task::spawn_blocking(move || resolver.resolve(&path, &analysis))
            .await
            .map_err(std::io::Error::other)?;

        let mut cache = self.search_paths.lock().unwrap_or_else(|e| e.into_inner());
        Ok(Arc::clone(
            cache.entry(test_file.to_path_buf()).or_insert_with(|| Arc::new(resolved)),
        ))
    }
}

impl DriverBuilder for DefaultDriverBuilder {
    fn build(&self, request: BuildRequest) -> impl Future<Output = Result<BuildResult, TestError>> + Send {
        async move {
            let search = self.search_paths(&request.test_file, &request.analysis).await?;
            Ok(self.orchestrator.build(&request.test_file, &request.driver, &search).await?)
        }
    }

    fn clean(&self, test_file: &Path) -> Result<(), TestError> {
        self.search_paths.lock().unwrap_or_else(|e| e.into_inner()).remove(test_file);
        Ok(self.orchestrator.clean(test_file)?)
    }
}

/// Runs the executable from its build directory under a timeout.
#[derive(Debug, Clone)]
pub struct DefaultDriverExecutor {
    timeout: Duration,
}

impl DefaultDriverExecutor {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl DriverExecutor for DefaultDriverExecutor {
    fn execute(&self, request: ExecutionRequest) -> impl Future<Output = Result<ExecutionRecord, TestError>> + Send {
        let timeout = self.timeout;
        async move {
            // The child starts in its build directory, so a relative path would resolve against the wrong place.
            let executable = std::path::absolute(&request.executable)?;
            let mut spec = ProcessSpec::new(&executable, timeout);
            if let Some(dir) = executable.parent() {
                spec = spec.current_dir(dir);
            }
            Ok(run_process(&spec).await?)
        }
    }
}
