//! Test runner: the per-file pipeline and its worker pool
//!
//! Each discovered file runs through analyze → classify → synthesize → build → execute → reconcile on its own
//! task. A file's drivers are independent builds and run concurrently too. Every compiler or driver process holds
//! a permit from one shared semaphore, so at most `jobs` processes run at a time.
//!
//! ## Ordering
//!
//! Workers finish in any order. Finished [`FileReport`]s go through a channel to a single consumer that buffers
//! them until every predecessor in discovery order has arrived, then hands them to the [`Aggregator`] (the only
//! writer of the [`RunSummary`]) and the [`TestReporter`]. Within a file, tests are reported in declaration order.
//!
//! ## I/O Boundaries
//!
//! Discovery, building, and execution go through the traits in `test_interfaces`, so the pipeline runs unchanged
//! against scripted fakes.

use std::collections::{BTreeMap, HashMap};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;

use crate::backend::driver::{Driver, synthesize_drivers};
use crate::backend::project::BuildResult;
use crate::frontend::classifier::classify_file;
use crate::frontend::diagnostics::SkipKind;
use crate::results::outcome::{DriverRun, FileOutcome, FileReport, TestReport};
use crate::results::reconcile::reconcile;
use crate::results::summary::{Aggregator, RunSummary};
use crate::results::verdict::Verdict;

use super::config::{OutputFormat, RunConfig};
use super::report::{ConsoleReporter, JsonReporter, TestReporter};
use super::test_interfaces::{
    BuildRequest, DefaultDriverBuilder, DefaultDriverExecutor, DefaultTestDiscovery, DriverBuilder, DriverExecutor,
    ExecutionRequest, TestDiscovery,
};
use super::{CliError, CliResult, ExitCode};

/// Pipeline over pluggable discovery, builder, and executor.
pub struct TestRunner<D, B, E> {
    inner: Arc<Shared<D, B, E>>,
}

struct Shared<D, B, E> {
    discovery: D,
    builder: B,
    executor: E,
    config: RunConfig,
    permits: Arc<Semaphore>,
}

/// What one driver produced.
struct DriverOutcome {
    run: DriverRun,
    verdicts: Vec<Verdict>,
}

impl TestRunner<DefaultTestDiscovery, DefaultDriverBuilder, DefaultDriverExecutor> {
    /// The real pipeline: filesystem discovery, the configured compiler, child processes.
    pub fn from_config(config: RunConfig) -> Self {
        let builder = DefaultDriverBuilder::new(config.artifact_resolver(), config.build_orchestrator());
        let executor = DefaultDriverExecutor::new(config.timeout);
        Self::new(config, DefaultTestDiscovery, builder, executor)
    }
}

impl<D: TestDiscovery, B: DriverBuilder, E: DriverExecutor> TestRunner<D, B, E> {
    pub fn new(config: RunConfig, discovery: D, builder: B, executor: E) -> Self {
        let permits = Arc::new(Semaphore::new(config.jobs.max(1)));
        Self {
            inner: Arc::new(Shared {
                discovery,
                builder,
                executor,
                config,
                permits,
            }),
        }
    }

    pub fn discover(&self, target: &str, cwd: &Path) -> CliResult<Vec<PathBuf>> {
        self.inner
            .discovery
            .discover_test_files(target, cwd)
            .map_err(|e| CliError::failure(format!("Error: {e}")))
    }

    /// Run `files` and return the summary. Reports reach `reporter` in `files` order.
    #[tracing::instrument(skip_all, fields(files = files.len(), jobs = self.inner.config.jobs))]
    pub async fn run_files(&self, files: Vec<PathBuf>, reporter: &mut dyn TestReporter) -> RunSummary {
        let started = Instant::now();
        reporter.on_run_start(&files);

        let (tx, mut rx) = mpsc::channel::<(usize, FileReport)>(files.len().max(1));
        let mut workers = JoinSet::new();
        for (index, path) in files.iter().cloned().enumerate() {
            let inner = Arc::clone(&self.inner);
            let tx = tx.clone();
            workers.spawn(async move {
                let report = Shared::process_file(inner, path).await;
                // The receiver outlives every worker.
                let _ = tx.send((index, report)).await;
            });
        }
        drop(tx);

        let mut aggregator = Aggregator::new();
        let mut pending: BTreeMap<usize, FileReport> = BTreeMap::new();
        let mut next = 0;
        while let Some((index, report)) = rx.recv().await {
            pending.insert(index, report);
            while let Some(report) = pending.remove(&next) {
                aggregator.record(&report);
                reporter.on_file_complete(&report);
                next += 1;
            }
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "file worker failed");
            }
        }

        // A worker that died never sent its report; account for the file anyway.
        for (index, path) in files.iter().enumerate().skip(next) {
            let report = pending
                .remove(&index)
                .unwrap_or_else(|| FileReport::skipped(path, SkipKind::Io, "internal error: file worker did not finish"));
            aggregator.record(&report);
            reporter.on_file_complete(&report);
        }

        let summary = aggregator.finish();
        reporter.on_run_complete(&summary, started.elapsed());
        summary
    }
}

impl<D: TestDiscovery, B: DriverBuilder, E: DriverExecutor> Shared<D, B, E> {
    #[tracing::instrument(skip_all, fields(file = %path.display()))]
    async fn process_file(self: Arc<Self>, path: PathBuf) -> FileReport {
        let analysis = match self.discovery.analyze(&path) {
            Ok(analysis) => analysis,
            Err(e) => {
                tracing::warn!(kind = %e.skip_kind(), error = %e, "skipping file");
                return FileReport::skipped(&path, e.skip_kind(), e.to_string());
            }
        };

        let classified = classify_file(&path, analysis, self.config.classify_options());
        let drivers = synthesize_drivers(&classified);
        let unit = classified.analysis.unit.name.clone();
        if drivers.is_empty() {
            tracing::warn!(unit = %unit, "no test subroutines found");
            return FileReport {
                path,
                outcome: FileOutcome::Tested {
                    unit,
                    drivers: Vec::new(),
                    tests: Vec::new(),
                },
            };
        }

        let analysis = Arc::new(classified.analysis.clone());
        let mut tasks = JoinSet::new();
        for (index, driver) in drivers.iter().cloned().enumerate() {
            let shared = Arc::clone(&self);
            let request = BuildRequest {
                test_file: path.clone(),
                analysis: Arc::clone(&analysis),
                driver,
            };
            tasks.spawn(async move { (index, shared.run_driver(request).await) });
        }

        let mut outcomes: Vec<Option<DriverOutcome>> = drivers.iter().map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => outcomes[index] = Some(outcome),
                Err(e) => tracing::error!(error = %e, "driver task failed"),
            }
        }

        if !self.config.keep {
            if let Err(e) = self.builder.clean(&path) {
                tracing::warn!(error = %e, "failed to remove build directory");
            }
        }

        // Every call gets exactly one verdict, whatever happened to its driver.
        let mut runs = Vec::with_capacity(drivers.len());
        let mut verdicts: HashMap<&str, (Verdict, usize)> = HashMap::new();
        for (index, (driver, outcome)) in drivers.iter().zip(outcomes).enumerate() {
            let outcome = outcome.unwrap_or_else(|| internal_failure(driver));
            for (name, verdict) in driver.calls.iter().zip(outcome.verdicts) {
                verdicts.insert(name.as_str(), (verdict, index));
            }
            runs.push(outcome.run);
        }

        let tests = classified
            .tests
            .iter()
            .map(|test| {
                let (verdict, driver) = verdicts
                    .remove(test.name.as_str())
                    .unwrap_or_else(|| (Verdict::Failed("internal error: test was not run".to_string()), 0));
                TestReport {
                    name: test.name.clone(),
                    classification: test.classification,
                    verdict,
                    driver,
                }
            })
            .collect();

        FileReport {
            path,
            outcome: FileOutcome::Tested {
                unit,
                drivers: runs,
                tests,
            },
        }
    }

    #[tracing::instrument(skip_all, fields(driver = %request.driver.id, kind = request.driver.kind.as_str()))]
    async fn run_driver(&self, request: BuildRequest) -> DriverOutcome {
        let driver = request.driver.clone();

        // The semaphore is never closed.
        let Ok(permit) = self.permits.acquire().await else {
            return internal_failure(&driver);
        };
        let built = self.builder.build(request).await;
        drop(permit);

        let executable = match built {
            Ok(BuildResult::Compiled(executable)) => executable,
            Ok(BuildResult::CompileFailed(diagnostic)) => {
                tracing::debug!("build failed");
                return build_failure(&driver, diagnostic);
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not build driver");
                return build_failure(&driver, e.to_string());
            }
        };

        let Ok(_permit) = self.permits.acquire().await else {
            return internal_failure(&driver);
        };
        let request = ExecutionRequest {
            executable,
            driver: driver.clone(),
        };
        match self.executor.execute(request).await {
            Ok(record) => {
                let verdicts = reconcile(&driver, &record);
                tracing::debug!(exit_code = ?record.exit_code, timed_out = record.timed_out, "reconciled");
                DriverOutcome {
                    run: DriverRun {
                        id: driver.id.clone(),
                        program_name: driver.program_name.clone(),
                        exit_code: record.exit_code,
                        timed_out: record.timed_out,
                        duration: Some(record.duration),
                        output: record.output,
                    },
                    verdicts,
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not run driver");
                let message = format!("could not run driver: {e}");
                DriverOutcome {
                    run: not_run(&driver, message.clone()),
                    verdicts: vec![Verdict::Failed(message); driver.calls.len()],
                }
            }
        }
    }
}

fn not_run(driver: &Driver, output: String) -> DriverRun {
    DriverRun {
        id: driver.id.clone(),
        program_name: driver.program_name.clone(),
        exit_code: None,
        timed_out: false,
        duration: None,
        output,
    }
}

fn build_failure(driver: &Driver, diagnostic: String) -> DriverOutcome {
    DriverOutcome {
        verdicts: vec![Verdict::BuildFailed(diagnostic.clone()); driver.calls.len()],
        run: not_run(driver, diagnostic),
    }
}

fn internal_failure(driver: &Driver) -> DriverOutcome {
    let message = "internal error: driver task did not finish".to_string();
    DriverOutcome {
        verdicts: vec![Verdict::Failed(message.clone()); driver.calls.len()],
        run: not_run(driver, message),
    }
}

/// Discover, run, and report. The exit code reflects overall success.
pub fn run_tests(target: &str, config: RunConfig) -> CliResult<ExitCode> {
    let cwd = env::current_dir().map_err(|e| CliError::failure(format!("Error: cannot read working directory: {e}")))?;
    let config = config.anchored_at(&cwd);
    let format = config.format;
    let verbose = config.verbose;
    let runner = TestRunner::from_config(config);

    let files = runner.discover(target, &cwd)?;
    if files.is_empty() {
        return Err(CliError::failure(format!("No test files found matching '{target}'")));
    }
    tracing::info!(files = files.len(), "discovered test files");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::failure(format!("Error: failed to start async runtime: {e}")))?;

    let mut reporter: Box<dyn TestReporter> = match format {
        OutputFormat::Console => Box::new(ConsoleReporter::stdout(verbose)),
        OutputFormat::Json => Box::new(JsonReporter::stdout()),
    };
    let summary = runtime.block_on(runner.run_files(files, reporter.as_mut()));

    Ok(if summary.success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
