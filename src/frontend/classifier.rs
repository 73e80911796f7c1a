//! TestClassifier: naming rules that decide a test's polarity
//!
//! Classification is a pure function of names, never of behavior:
//!
//! 1. A subroutine whose name contains `error_stop` (case-insensitive) is `ErrorStop`.
//! 2. Otherwise, if the legacy file rule is enabled and the *file* name contains `error_stop`, every subroutine in
//!    the file is `ErrorStop`.
//! 3. Everything else is `Normal`.
//!
//! Standalone `program` files have no callable subroutines; the program itself is the single test, named after
//! the program. It is `ErrorStop` unless [`ClassifyOptions::program_protocol`] is set, in which case it is judged
//! by its `[PASS]`/`[FAIL]` output and classified by the naming rules above.

use std::path::{Path, PathBuf};

use fortest_core::lang::conventions;

use super::analyzer::{SourceAnalysis, UnitKind};

/// Expected polarity of a test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// Passes by reporting `[PASS]` lines and exiting cleanly.
    Normal,
    /// Passes by terminating the process abnormally.
    ErrorStop,
}

impl Classification {
    pub fn as_str(self) -> &'static str {
        match self {
            Classification::Normal => "normal",
            Classification::ErrorStop => "error_stop",
        }
    }
}

/// Which rule produced a classification (shown by `--analyze`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassificationRule {
    SubroutineName,
    LegacyFileName,
    ProgramUnit,
    Default,
}

impl ClassificationRule {
    pub fn as_str(self) -> &'static str {
        match self {
            ClassificationRule::SubroutineName => "subroutine name",
            ClassificationRule::LegacyFileName => "file name (legacy)",
            ClassificationRule::ProgramUnit => "program unit",
            ClassificationRule::Default => "default",
        }
    }
}

/// Switches that change how names map to polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifyOptions {
    /// A file name containing `error_stop` marks every test in the file.
    pub legacy_file_rule: bool,
    /// Judge `program` files by their output protocol instead of expecting an abnormal exit.
    pub program_protocol: bool,
}

impl Default for ClassifyOptions {
    fn default() -> Self {
        Self {
            legacy_file_rule: true,
            program_protocol: false,
        }
    }
}

/// A classified test entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedTest {
    pub name: String,
    pub ordinal: usize,
    pub line: usize,
    pub classification: Classification,
    pub rule: ClassificationRule,
}

/// A test file after analysis and classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedFile {
    pub path: PathBuf,
    pub analysis: SourceAnalysis,
    pub tests: Vec<ClassifiedTest>,
}

impl ClassifiedFile {
    /// A `program` file is compiled and run as-is instead of through a synthesized driver.
    pub fn is_standalone(&self) -> bool {
        self.analysis.unit.kind == UnitKind::Program
    }

    pub fn normal_tests(&self) -> impl Iterator<Item = &ClassifiedTest> {
        self.tests.iter().filter(|t| t.classification == Classification::Normal)
    }

    pub fn error_stop_tests(&self) -> impl Iterator<Item = &ClassifiedTest> {
        self.tests.iter().filter(|t| t.classification == Classification::ErrorStop)
    }
}

/// Whether the file name alone marks every test in it as error-stop (legacy convention).
pub fn is_error_stop_file(file_name: &str) -> bool {
    conventions::contains_error_stop_token(file_name)
}

/// Classify one test by name.
pub fn classify(file_name: &str, test_name: &str, legacy_file_rule: bool) -> (Classification, ClassificationRule) {
    if conventions::contains_error_stop_token(test_name) {
        (Classification::ErrorStop, ClassificationRule::SubroutineName)
    } else if legacy_file_rule && is_error_stop_file(file_name) {
        (Classification::ErrorStop, ClassificationRule::LegacyFileName)
    } else {
        (Classification::Normal, ClassificationRule::Default)
    }
}

/// Classify every candidate in an analyzed file.
pub fn classify_file(path: &Path, analysis: SourceAnalysis, options: ClassifyOptions) -> ClassifiedFile {
    let file_name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
    let legacy_file_rule = options.legacy_file_rule;

    let tests = if analysis.unit.kind == UnitKind::Program {
        let (classification, rule) = if options.program_protocol {
            classify(&file_name, &analysis.unit.name, legacy_file_rule)
        } else {
            (Classification::ErrorStop, ClassificationRule::ProgramUnit)
        };
        vec![ClassifiedTest {
            name: analysis.unit.name.clone(),
            ordinal: 0,
            line: analysis.unit.line,
            classification,
            rule,
        }]
    } else {
        analysis
            .subroutines
            .iter()
            .map(|sub| {
                let (classification, rule) = classify(&file_name, &sub.name, legacy_file_rule);
                ClassifiedTest {
                    name: sub.name.clone(),
                    ordinal: sub.ordinal,
                    line: sub.line,
                    classification,
                    rule,
                }
            })
            .collect()
    };

    ClassifiedFile {
        path: path.to_path_buf(),
        analysis,
        tests,
    }
}
