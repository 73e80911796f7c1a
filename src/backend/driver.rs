//! DriverSynthesizer: the programs that call test subroutines
//!
//! Fortran cannot enumerate a module's procedures at run time, so every test run goes through a generated
//! `program` that names its calls explicitly:
//!
//! - **normal driver** (one per file): resets the assertion counters, then for each normal test in declaration
//!   order prints a `[CALL] name` sentinel and calls it, then prints the assertion summary.
//! - **error-stop driver** (one per error-stop test): a single call and nothing else, so an abnormal exit can only
//!   come from that subroutine.
//! - **standalone** (`program` test files): no generated source; the file is compiled and run as written.
//!
//! Program names are `fortest_<hash>` of (file path, driver id), so they are stable across runs and unique
//! across files. Synthesis never checks that called subroutines exist; a bad name surfaces as a compile error.

use std::path::Path;

use fortest_core::ident;
use fortest_core::lang::assertions::{self, AssertionId};
use fortest_core::lang::conventions;
use fortest_core::protocol;

use crate::frontend::analyzer::UnitKind;
use crate::frontend::classifier::{Classification, ClassifiedFile};

use super::fortran_emitter::FortranEmitter;

/// Driver id of a file's normal driver.
pub const NORMAL_DRIVER_ID: &str = "normal";

/// Driver id of a standalone program.
pub const STANDALONE_DRIVER_ID: &str = "program";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriverKind {
    Normal,
    ErrorStop,
    /// A `program` test file, carrying its own classification.
    Standalone(Classification),
}

impl DriverKind {
    pub fn classification(self) -> Classification {
        match self {
            DriverKind::Normal => Classification::Normal,
            DriverKind::ErrorStop => Classification::ErrorStop,
            DriverKind::Standalone(c) => c,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DriverKind::Normal => "normal",
            DriverKind::ErrorStop => "error_stop",
            DriverKind::Standalone(_) => "standalone",
        }
    }
}

/// A synthesized compilation unit and the tests it runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Driver {
    /// `normal`, `es_<hash>`, or `program`; also the build subdirectory name.
    pub id: String,
    pub kind: DriverKind,
    pub program_name: String,
    /// Tests invoked, in call order.
    pub calls: Vec<String>,
    /// Modules the driver `use`s (assertion module first).
    pub uses: Vec<String>,
    /// Generated source; `None` for standalone programs.
    pub source: Option<String>,
}

impl Driver {
    /// File name the generated source is written to.
    pub fn source_file_name(&self) -> String {
        format!("{}.{}", self.program_name, conventions::SOURCE_EXTENSION)
    }

    /// Executable file name.
    pub fn executable_name(&self) -> String {
        if cfg!(windows) {
            format!("{}.exe", self.program_name)
        } else {
            self.program_name.clone()
        }
    }
}

/// Driver id for an error-stop test.
pub fn error_stop_driver_id(subroutine: &str) -> String {
    format!("es_{}", ident::short_hash(&[subroutine]))
}

/// Synthesize every driver a classified file needs: the normal driver (if it has normal tests) first, then one
/// error-stop driver per error-stop test in declaration order.
#[tracing::instrument(skip_all, fields(file = %file.path.display(), tests = file.tests.len()))]
pub fn synthesize_drivers(file: &ClassifiedFile) -> Vec<Driver> {
    let path = file.path.as_path();

    if file.analysis.unit.kind == UnitKind::Program {
        return file
            .tests
            .first()
            .map(|test| standalone_driver(path, &file.analysis.unit.name, test.classification))
            .into_iter()
            .collect();
    }

    let module = file.analysis.unit.name.as_str();
    let mut drivers = Vec::new();

    let normal: Vec<String> = file.normal_tests().map(|t| t.name.clone()).collect();
    if !normal.is_empty() {
        drivers.push(normal_driver(path, module, normal));
    }
    drivers.extend(file.error_stop_tests().map(|t| error_stop_driver(path, module, &t.name)));

    tracing::debug!(drivers = drivers.len(), "synthesized drivers");
    drivers
}

/// Build the normal driver for `module`, calling `calls` in order.
pub fn normal_driver(path: &Path, module: &str, calls: Vec<String>) -> Driver {
    let program_name = program_name_for(path, NORMAL_DRIVER_ID);
    let uses = driver_uses(module);
    let source = emit_normal(path, &program_name, &uses, &calls);
    Driver {
        id: NORMAL_DRIVER_ID.to_string(),
        kind: DriverKind::Normal,
        program_name,
        calls,
        uses,
        source: Some(source),
    }
}

/// Build the isolated driver for one error-stop test.
pub fn error_stop_driver(path: &Path, module: &str, subroutine: &str) -> Driver {
    let id = error_stop_driver_id(subroutine);
    let program_name = program_name_for(path, &id);
    let uses = driver_uses(module);
    let source = emit_error_stop(path, &program_name, &uses, subroutine);
    Driver {
        id,
        kind: DriverKind::ErrorStop,
        program_name,
        calls: vec![subroutine.to_string()],
        uses,
        source: Some(source),
    }
}

/// A standalone program compiled as written.
pub fn standalone_driver(path: &Path, program: &str, classification: Classification) -> Driver {
    Driver {
        id: STANDALONE_DRIVER_ID.to_string(),
        kind: DriverKind::Standalone(classification),
        program_name: program_name_for(path, STANDALONE_DRIVER_ID),
        calls: vec![program.to_string()],
        uses: Vec::new(),
        source: None,
    }
}

fn program_name_for(path: &Path, driver_id: &str) -> String {
    ident::program_name(&[&path.to_string_lossy(), driver_id])
}

fn driver_uses(module: &str) -> Vec<String> {
    let mut uses = vec![conventions::ASSERTION_MODULE.to_string()];
    if !module.eq_ignore_ascii_case(conventions::ASSERTION_MODULE) {
        uses.push(module.to_string());
    }
    uses
}

fn header(e: &mut FortranEmitter, path: &Path) {
    let file_name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
    e.comment(&format!("Generated by fortest from {file_name}. Do not edit."));
}

fn emit_normal(path: &Path, program_name: &str, uses: &[String], calls: &[String]) -> String {
    let reset = assertions::as_str(AssertionId::ResetCounters);
    let summary = assertions::as_str(AssertionId::PrintSummary);

    let mut e = FortranEmitter::new();
    header(&mut e, path);
    e.program(program_name, |e| {
        e.use_module("iso_fortran_env", true, &["output_unit"]);
        for module in uses {
            e.use_module(module, false, &[]);
        }
        e.line("implicit none");
        e.blank_line();
        e.call(reset);
        for name in calls {
            e.blank_line();
            e.write_text(&protocol::call_line(name));
            e.line("flush(output_unit)");
            e.call(name);
            e.line("flush(output_unit)");
        }
        e.blank_line();
        e.call(summary);
    });
    e.finish()
}

fn emit_error_stop(path: &Path, program_name: &str, uses: &[String], subroutine: &str) -> String {
    let mut e = FortranEmitter::new();
    header(&mut e, path);
    e.program(program_name, |e| {
        for module in uses {
            e.use_module(module, false, &[]);
        }
        e.line("implicit none");
        e.blank_line();
        e.call(subroutine);
    });
    e.finish()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::frontend::analyzer::analyze_source;
    use crate::frontend::classifier::{ClassifyOptions, classify_file};

    const SRC: &str = "module test_math\ncontains\nsubroutine test_add()\nend subroutine\nsubroutine test_error_stop_div()\nend subroutine\nsubroutine test_scale()\nend subroutine\nend module";

    fn drivers() -> Vec<Driver> {
        let file = classify_file(Path::new("/p/test_math.f90"), analyze_source(SRC).unwrap(), ClassifyOptions::default());
        synthesize_drivers(&file)
    }

    #[test]
    fn test_one_normal_driver_then_error_stop_drivers() {
        let drivers = drivers();
        assert_eq!(drivers.len(), 2);
        assert_eq!(drivers[0].kind, DriverKind::Normal);
        assert_eq!(drivers[0].calls, ["test_add", "test_scale"]);
        assert_eq!(drivers[1].kind, DriverKind::ErrorStop);
        assert_eq!(drivers[1].calls, ["test_error_stop_div"]);
    }

    #[test]
    fn test_error_stop_driver_has_exactly_one_call() {
        let drivers = drivers();
        let source = drivers[1].source.as_deref().unwrap();
        let calls: Vec<_> = source.lines().filter(|l| l.trim_start().starts_with("call ")).collect();
        assert_eq!(calls, ["    call test_error_stop_div()"]);
    }

    #[test]
    fn test_normal_driver_lifecycle_order() {
        let drivers = drivers();
        let source = drivers[0].source.as_deref().unwrap();
        let calls: Vec<_> = source
            .lines()
            .map(str::trim)
            .filter(|l| l.starts_with("call "))
            .collect();
        assert_eq!(
            calls,
            ["call reset_counters()", "call test_add()", "call test_scale()", "call print_summary()"]
        );
        assert!(source.contains("write(*, '(a)') '[CALL] test_add'"));
        assert!(source.contains("    use fortest_assertions\n    use test_math\n"));
    }

    #[test]
    fn test_names_are_deterministic_and_distinct() {
        let a = drivers();
        let b = drivers();
        assert_eq!(a, b);
        assert_ne!(a[0].program_name, a[1].program_name);

        let other = normal_driver(Path::new("/p/test_other.f90"), "m", vec!["test_add".into()]);
        assert_ne!(other.program_name, a[0].program_name);
        assert!(a[0].program_name.len() <= conventions::MAX_IDENTIFIER_LEN);
        assert!(a[0].program_name.starts_with(conventions::DRIVER_PROGRAM_PREFIX));
    }

    #[test]
    fn test_no_normal_tests_means_no_normal_driver() {
        let src = "module m\ncontains\nsubroutine test_error_stop_x()\nend subroutine\nend module";
        let file = classify_file(Path::new("/p/test_m.f90"), analyze_source(src).unwrap(), ClassifyOptions::default());
        let drivers = synthesize_drivers(&file);
        assert_eq!(drivers.len(), 1);
        assert_eq!(drivers[0].kind, DriverKind::ErrorStop);
    }

    #[test]
    fn test_standalone_program() {
        let file = classify_file(
            Path::new("/p/test_prog.f90"),
            analyze_source("program test_prog\nend program").unwrap(),
            ClassifyOptions::default(),
        );
        let drivers = synthesize_drivers(&file);
        assert_eq!(drivers.len(), 1);
        assert_eq!(drivers[0].kind, DriverKind::Standalone(Classification::ErrorStop));
        assert!(drivers[0].source.is_none());
        assert_eq!(drivers[0].calls, ["test_prog"]);
    }

    #[test]
    fn test_program_ending_in_error_stop_is_an_error_stop_check() {
        let src = "program test_stop_on_bad_input\n  call validate(-1)\ncontains\n  subroutine validate(n)\n    integer, intent(in) :: n\n    if (n < 0) error stop 'negative input'\n  end subroutine\nend program";
        let file = classify_file(Path::new("/p/test_input.f90"), analyze_source(src).unwrap(), ClassifyOptions::default());
        let drivers = synthesize_drivers(&file);
        assert_eq!(drivers.len(), 1);
        assert_eq!(drivers[0].kind, DriverKind::Standalone(Classification::ErrorStop));
        assert_eq!(drivers[0].calls, ["test_stop_on_bad_input"]);

        let protocol = ClassifyOptions {
            program_protocol: true,
            ..ClassifyOptions::default()
        };
        let file = classify_file(Path::new("/p/test_input.f90"), analyze_source(src).unwrap(), protocol);
        assert_eq!(synthesize_drivers(&file)[0].kind, DriverKind::Standalone(Classification::Normal));
    }
}
