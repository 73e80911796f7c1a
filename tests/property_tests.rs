//! Property-based tests for fortest
//!
//! These tests use proptest to verify invariants across many randomly
//! generated inputs, catching edge cases that hand-written tests might miss.

use std::path::Path;
use std::time::Duration;

use fortest::backend::driver::normal_driver;
use fortest::backend::executor::ExecutionRecord;
use fortest::frontend::classifier::classify;
use fortest::{Classification, Verdict, analyze_source, reconcile};
use fortest_core::protocol;
use proptest::prelude::*;

fn record(output: String, exit_code: Option<i32>, timed_out: bool) -> ExecutionRecord {
    ExecutionRecord {
        output,
        exit_code: if timed_out { None } else { exit_code },
        duration: Duration::from_millis(1),
        timed_out,
    }
}

fn subroutine_names() -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set("test_[a-z][a-z0-9_]{0,12}", 1..6).prop_map(|set| set.into_iter().collect())
}

/// A plausible output line: protocol lines, noise, and sentinels for any of the calls.
fn output_line(calls: Vec<String>) -> impl Strategy<Value = String> {
    let names = prop::sample::select(calls);
    prop_oneof![
        names.clone().prop_map(|n| protocol::call_line(&n)),
        "[a-z_]{1,10}".prop_map(|n| protocol::pass_line(&n)),
        "[a-z_]{1,10}".prop_map(|n| protocol::fail_line(&n)),
        "[a-z0-9: ]{0,20}".prop_map(|t| protocol::detail_line(&t)),
        (any::<bool>(), 0u64..50).prop_map(|(p, c)| protocol::summary_line(p, c)),
        "[ -~]{0,30}",
    ]
}

fn scenario() -> impl Strategy<Value = (Vec<String>, String)> {
    subroutine_names().prop_flat_map(|calls| {
        let lines = prop::collection::vec(output_line(calls.clone()), 0..30);
        (Just(calls), lines.prop_map(|l| l.join("\n")))
    })
}

// =============================================================================
// Reconciler Properties
// =============================================================================

proptest! {
    /// Property: every call gets exactly one verdict, whatever the output and exit status
    #[test]
    fn reconcile_never_drops_a_subroutine(
        (calls, output) in scenario(),
        exit_code in prop::option::of(-2i32..3),
        timed_out in any::<bool>(),
    ) {
        let driver = normal_driver(Path::new("/p/test_x.f90"), "test_x", calls.clone());
        let verdicts = reconcile(&driver, &record(output, exit_code, timed_out));
        prop_assert_eq!(verdicts.len(), calls.len());
    }

    /// Property: an abnormal exit never yields Passed for the last call
    #[test]
    fn abnormal_exit_never_passes_last_call((calls, output) in scenario(), code in 1i32..200) {
        let driver = normal_driver(Path::new("/p/test_x.f90"), "test_x", calls.clone());
        let verdicts = reconcile(&driver, &record(output.clone(), Some(code), false));
        let last = verdicts.last().unwrap();
        let summary_printed = output.lines().any(|l| matches!(protocol::classify_line(l), protocol::ProtocolLine::Summary { .. }));
        if !summary_printed {
            prop_assert!(!last.is_success());
        }
    }

    /// Property: a clean exit with a passing line after every sentinel passes everything
    #[test]
    fn clean_all_passing_run_passes_every_call(calls in subroutine_names()) {
        let mut lines = Vec::new();
        for call in &calls {
            lines.push(protocol::call_line(call));
            lines.push(protocol::pass_line("check"));
        }
        lines.push(protocol::summary_line(true, calls.len() as u64));
        lines.push(protocol::summary_line(false, 0));

        let driver = normal_driver(Path::new("/p/test_x.f90"), "test_x", calls.clone());
        let verdicts = reconcile(&driver, &record(lines.join("\n"), Some(0), false));
        prop_assert!(verdicts.iter().all(|v| *v == Verdict::Passed));
    }
}

// =============================================================================
// Analyzer Properties
// =============================================================================

proptest! {
    /// Property: analysis never panics, whatever the input
    #[test]
    fn analyzer_never_panics(source in "(?s).{0,400}") {
        let _ = analyze_source(&source);
    }

    /// Property: analysis never panics on inputs built from Fortran-ish lines
    #[test]
    fn analyzer_never_panics_on_statement_soup(
        lines in prop::collection::vec(
            prop_oneof![
                Just("module m".to_string()),
                Just("end module m".to_string()),
                Just("contains".to_string()),
                Just("interface".to_string()),
                Just("end interface".to_string()),
                Just("end".to_string()),
                Just("use iso_fortran_env".to_string()),
                "subroutine test_[a-z]{1,6}\\(\\)",
                "end subroutine( test_[a-z]{1,6})?",
                "pure function f[a-z]{0,4}\\(x\\)",
                "end function",
                "[a-z]+ = [0-9]+ ! comment &",
            ],
            0..40,
        )
    ) {
        let _ = analyze_source(&lines.join("\n"));
    }

    /// Property: a declared test subroutine is found regardless of keyword case
    #[test]
    fn analyzer_is_case_insensitive(name in "test_[a-z][a-z0-9_]{0,10}", upper in any::<bool>()) {
        let text = format!("module m\ncontains\nsubroutine {name}()\nend subroutine {name}\nend module m\n");
        let text = if upper { text.to_ascii_uppercase() } else { text };
        let analysis = analyze_source(&text).unwrap();
        prop_assert_eq!(analysis.subroutines.len(), 1);
        prop_assert_eq!(&analysis.subroutines[0].name, &name);
    }
}

// =============================================================================
// Classifier Properties
// =============================================================================

proptest! {
    /// Property: classification ignores case in both the subroutine and file names
    #[test]
    fn classification_is_case_insensitive(
        name in "test_[a-zA-Z_]{0,20}",
        file in "test_[a-zA-Z_]{0,20}\\.f90",
        legacy in any::<bool>(),
    ) {
        let lower = classify(&file.to_ascii_lowercase(), &name.to_ascii_lowercase(), legacy);
        let upper = classify(&file.to_ascii_uppercase(), &name.to_ascii_uppercase(), legacy);
        prop_assert_eq!(lower, upper);
    }

    /// Property: the subroutine-name rule wins regardless of the file name
    #[test]
    fn error_stop_token_in_name_always_classifies_error_stop(
        prefix in "[a-z_]{0,8}",
        suffix in "[a-z_]{0,8}",
        file in "test_[a-z_]{1,10}\\.f90",
        legacy in any::<bool>(),
    ) {
        let name = format!("test_{prefix}error_stop{suffix}");
        let (classification, _) = classify(&file, &name, legacy);
        prop_assert_eq!(classification, Classification::ErrorStop);
    }
}
