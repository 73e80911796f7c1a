//! Reporters
//!
//! The pipeline hands every finished [`FileReport`] to a [`TestReporter`], in discovery order, and the
//! [`RunSummary`] once at the end. Reporters only render; they never decide outcomes.
//!
//! - [`ConsoleReporter`]: the human-readable layout (per-file test lines, per-file blocks, run totals)
//! - [`JsonReporter`]: one JSON document written when the run completes

use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use fortest_core::protocol::{DETAIL_INDENT, FAIL_MARKER, PASS_MARKER};
use serde_json::{Value, json};

use crate::frontend::classifier::Classification;
use crate::results::outcome::{DriverRun, FileOutcome, FileReport, TestReport};
use crate::results::summary::{Bucket, RunSummary};
use crate::results::verdict::VerdictKind;

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const BLUE: &str = "\x1b[34m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

const FILE_SEPARATOR_WIDTH: usize = 60;
const TABLE_SEPARATOR_WIDTH: usize = 50;

// ============================================================================
// Test Reporter Trait
// ============================================================================

/// Trait for reporting test execution results.
///
/// Implement this trait to customize the output format.
pub trait TestReporter {
    /// Called once with every discovered file, before anything runs
    fn on_run_start(&mut self, _files: &[PathBuf]) {}

    /// Called when a file's drivers have all finished (or the file was skipped)
    fn on_file_complete(&mut self, report: &FileReport);

    /// Called when all files have completed
    fn on_run_complete(&mut self, summary: &RunSummary, duration: Duration);
}

// ============================================================================
// Console
// ============================================================================

/// Human-readable reporter.
pub struct ConsoleReporter<W: Write = io::Stdout> {
    out: W,
    verbose: bool,
    color: bool,
}

impl ConsoleReporter<io::Stdout> {
    /// Write to stdout, coloured when it is a terminal and `NO_COLOR` is unset.
    pub fn stdout(verbose: bool) -> Self {
        use std::io::IsTerminal;
        let color = io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none();
        Self::new(io::stdout(), verbose, color)
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W, verbose: bool, color: bool) -> Self {
        Self { out, verbose, color }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn paint(&self, style: &str, text: &str) -> String {
        if self.color {
            format!("{style}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    // Console output is best effort; a closed pipe must not abort the run.
    fn line(&mut self, text: impl AsRef<str>) {
        let _ = writeln!(self.out, "{}", text.as_ref());
    }

    fn test_line(&mut self, test: &TestReport) {
        let marker = if test.verdict.is_success() {
            self.paint(GREEN, PASS_MARKER)
        } else {
            self.paint(RED, FAIL_MARKER)
        };
        self.line(format!("{marker} {}", test.name));
        if let Some(message) = test.verdict.message() {
            for line in message.lines() {
                self.line(format!("{DETAIL_INDENT}{line}"));
            }
        }
    }

    fn counts(&mut self, bucket: Bucket) {
        let pass = self.paint(GREEN, &format!("{PASS_MARKER}{:>4}", bucket.passed));
        let fail = self.paint(RED, &format!("{FAIL_MARKER}{:>4}", bucket.failed));
        self.line(pass);
        self.line(fail);
    }

    fn block(&mut self, title: &str, tests: &[&TestReport]) {
        let mut bucket = Bucket::default();
        for test in tests {
            bucket.total += 1;
            if test.verdict.is_success() {
                bucket.passed += 1;
            } else {
                bucket.failed += 1;
            }
        }

        let separator = "=".repeat(TABLE_SEPARATOR_WIDTH);
        self.line("");
        self.line(&separator);
        self.line(format!("{title}: {}", bucket.total));
        self.counts(bucket);
        self.line(&separator);
        self.line("");
    }

    fn echo_output(&mut self, run: &DriverRun) {
        let output = run.output.trim_end();
        if !output.is_empty() {
            self.line(output);
        }
    }

    fn tested(&mut self, report: &FileReport, unit: &str, drivers: &[DriverRun], tests: &[TestReport]) {
        if tests.is_empty() {
            let warning = format!("Warning: No test subroutines found in {unit} ({})", report.path.display());
            self.line(self.paint(YELLOW, &warning));
            return;
        }

        for classification in [Classification::Normal, Classification::ErrorStop] {
            let group: Vec<&TestReport> = tests.iter().filter(|t| t.classification == classification).collect();
            if group.is_empty() {
                continue;
            }
            if self.verbose {
                let mut echoed = Vec::new();
                for test in &group {
                    if !echoed.contains(&test.driver) {
                        echoed.push(test.driver);
                        if let Some(run) = drivers.get(test.driver) {
                            self.echo_output(run);
                        }
                    }
                }
            }
            for test in &group {
                self.test_line(test);
            }
            let title = match classification {
                Classification::Normal => "Normal tests",
                Classification::ErrorStop => "error_stop tests",
            };
            self.block(title, &group);
        }
    }
}

impl<W: Write> TestReporter for ConsoleReporter<W> {
    fn on_run_start(&mut self, _files: &[PathBuf]) {
        let header = self.paint(BOLD, "Running Fortran tests...");
        self.line(header);
        self.line("");
    }

    fn on_file_complete(&mut self, report: &FileReport) {
        self.line("-".repeat(FILE_SEPARATOR_WIDTH));
        let title = self.paint(BLUE, &format!("Testing: {}", report.path.display()));
        self.line(title);

        match &report.outcome {
            FileOutcome::Skipped { kind, message } => {
                let skipped = self.paint(YELLOW, &format!("Skipped ({kind}):"));
                self.line(skipped);
                for line in message.lines() {
                    self.line(format!("{DETAIL_INDENT}{line}"));
                }
            }
            FileOutcome::Tested { unit, drivers, tests } => self.tested(report, unit, drivers, tests),
        }
        self.line("");
    }

    fn on_run_complete(&mut self, summary: &RunSummary, duration: Duration) {
        let table = "=".repeat(TABLE_SEPARATOR_WIDTH);
        self.line("-".repeat(FILE_SEPARATOR_WIDTH));
        self.line("All tests completed.");
        self.line(&table);
        let total = summary.total();
        self.line(format!("Total tests: {}", total.total));
        self.counts(total);
        if summary.skipped_files > 0 {
            let skipped = self.paint(YELLOW, &format!("Skipped files: {}", summary.skipped_files));
            self.line(skipped);
        }
        self.line(&table);
        if self.verbose {
            self.line(format!("Finished in {:.2}s", duration.as_secs_f64()));
        }

        self.line("");
        if summary.success() {
            let done = self.paint(&format!("{GREEN}{BOLD}"), "All tests passed! ✓");
            self.line(done);
        } else {
            let done = self.paint(&format!("{RED}{BOLD}"), "Some tests failed ✗");
            self.line(done);
        }
        let _ = self.out.flush();
    }
}

// ============================================================================
// JSON
// ============================================================================

/// Collects file reports and writes one JSON document at the end of the run.
pub struct JsonReporter<W: Write = io::Stdout> {
    out: W,
    files: Vec<Value>,
}

impl JsonReporter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> JsonReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out, files: Vec::new() }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

fn bucket_json(bucket: Bucket) -> Value {
    json!({ "total": bucket.total, "passed": bucket.passed, "failed": bucket.failed })
}

fn test_json(test: &TestReport) -> Value {
    json!({
        "name": test.name,
        "classification": test.classification.as_str(),
        "verdict": test.verdict.kind().as_str(),
        "success": test.verdict.is_success(),
        "message": test.verdict.message(),
        "driver": test.driver,
    })
}

fn driver_json(run: &DriverRun) -> Value {
    json!({
        "id": run.id,
        "program": run.program_name,
        "exit_code": run.exit_code,
        "timed_out": run.timed_out,
        "duration_ms": run.duration.map(|d| d.as_millis() as u64),
        "output": run.output,
    })
}

/// JSON form of one file report.
pub fn file_json(report: &FileReport) -> Value {
    let path = report.path.display().to_string();
    match &report.outcome {
        FileOutcome::Skipped { kind, message } => json!({
            "path": path,
            "status": "skipped",
            "skip": { "kind": kind.as_str(), "message": message },
            "tests": [],
        }),
        FileOutcome::Tested { unit, drivers, tests } => json!({
            "path": path,
            "status": "tested",
            "unit": unit,
            "tests": tests.iter().map(test_json).collect::<Vec<_>>(),
            "drivers": drivers.iter().map(driver_json).collect::<Vec<_>>(),
        }),
    }
}

/// JSON form of the run summary.
pub fn summary_json(summary: &RunSummary, duration: Duration) -> Value {
    let verdicts: serde_json::Map<String, Value> = VerdictKind::ALL
        .iter()
        .map(|kind| (kind.as_str().to_string(), json!(summary.count(*kind))))
        .collect();
    json!({
        "total": bucket_json(summary.total()),
        "normal": bucket_json(summary.normal),
        "error_stop": bucket_json(summary.error_stop),
        "verdicts": verdicts,
        "files": summary.files,
        "skipped_files": summary.skipped_files,
        "success": summary.success(),
        "duration_ms": duration.as_millis() as u64,
    })
}

impl<W: Write> TestReporter for JsonReporter<W> {
    fn on_file_complete(&mut self, report: &FileReport) {
        self.files.push(file_json(report));
    }

    fn on_run_complete(&mut self, summary: &RunSummary, duration: Duration) {
        let document = json!({
            "files": std::mem::take(&mut self.files),
            "summary": summary_json(summary, duration),
        });
        match serde_json::to_string_pretty(&document) {
            Ok(text) => {
                let _ = writeln!(self.out, "{text}");
                let _ = self.out.flush();
            }
            Err(e) => tracing::error!(error = %e, "failed to serialize JSON report"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::frontend::diagnostics::SkipKind;
    use crate::results::summary::Aggregator;
    use crate::results::verdict::Verdict;

    fn report() -> FileReport {
        let test = |name: &str, classification, verdict, driver| TestReport {
            name: name.to_string(),
            classification,
            verdict,
            driver,
        };
        FileReport {
            path: PathBuf::from("/p/test_math.f90"),
            outcome: FileOutcome::Tested {
                unit: "test_math".into(),
                drivers: vec![DriverRun {
                    id: "normal".into(),
                    program_name: "fortest_0".into(),
                    exit_code: Some(0),
                    timed_out: false,
                    duration: Some(Duration::from_millis(3)),
                    output: "[CALL] test_add".into(),
                }],
                tests: vec![
                    test("test_add", Classification::Normal, Verdict::Passed, 0),
                    test(
                        "test_sub",
                        Classification::Normal,
                        Verdict::Failed("[FAIL] assert_equal\n       expected: 1".into()),
                        0,
                    ),
                    test("test_error_stop_div", Classification::ErrorStop, Verdict::ErrorStopConfirmed, 1),
                ],
            },
        }
    }

    fn render(reports: &[FileReport], verbose: bool) -> String {
        let mut reporter = ConsoleReporter::new(Vec::new(), verbose, false);
        let mut aggregator = Aggregator::new();
        reporter.on_run_start(&[]);
        for r in reports {
            aggregator.record(r);
            reporter.on_file_complete(r);
        }
        reporter.on_run_complete(aggregator.summary(), Duration::from_millis(10));
        String::from_utf8(reporter.into_inner()).unwrap()
    }

    #[test]
    fn test_console_layout() {
        insta::assert_snapshot!(render(&[report()], false), @r"
        Running Fortran tests...

        ------------------------------------------------------------
        Testing: /p/test_math.f90
        [PASS] test_add
        [FAIL] test_sub
               [FAIL] assert_equal
                      expected: 1

        ==================================================
        Normal tests: 2
        [PASS]   1
        [FAIL]   1
        ==================================================

        [PASS] test_error_stop_div

        ==================================================
        error_stop tests: 1
        [PASS]   1
        [FAIL]   0
        ==================================================


        ------------------------------------------------------------
        All tests completed.
        ==================================================
        Total tests: 3
        [PASS]   2
        [FAIL]   1
        ==================================================

        Some tests failed ✗
        ");
    }

    #[test]
    fn test_console_skipped_file_fails_run() {
        let skipped = FileReport::skipped(
            std::path::Path::new("/p/test_bad.f90"),
            SkipKind::AggregationConflict,
            "subroutine `test_a` is declared twice (lines 3 and 7)",
        );
        let text = render(&[skipped], false);
        assert!(text.contains("Skipped (aggregation_conflict):"));
        assert!(text.contains("Skipped files: 1"));
        assert!(text.ends_with("Some tests failed ✗\n"));
    }

    #[test]
    fn test_console_verbose_echoes_output_and_colors_off() {
        let text = render(&[report()], true);
        assert!(text.contains("[CALL] test_add"));
        assert!(!text.contains('\x1b'));
    }

    #[test]
    fn test_console_colors() {
        let mut reporter = ConsoleReporter::new(Vec::new(), false, true);
        reporter.on_run_complete(&RunSummary::default(), Duration::ZERO);
        let text = String::from_utf8(reporter.into_inner()).unwrap();
        assert!(text.contains("\x1b[32m\x1b[1mAll tests passed! ✓\x1b[0m"));
    }

    #[test]
    fn test_json_document() {
        let mut reporter = JsonReporter::new(Vec::new());
        let mut aggregator = Aggregator::new();
        let r = report();
        aggregator.record(&r);
        reporter.on_file_complete(&r);
        reporter.on_run_complete(aggregator.summary(), Duration::from_millis(5));

        let value: Value = serde_json::from_slice(&reporter.into_inner()).unwrap();
        assert_eq!(value["summary"]["total"]["total"], 3);
        assert_eq!(value["summary"]["success"], false);
        assert_eq!(value["summary"]["verdicts"]["error_stop_confirmed"], 1);
        assert_eq!(value["files"][0]["tests"][1]["verdict"], "failed");
        assert_eq!(value["files"][0]["drivers"][0]["exit_code"], 0);
    }
}
