//! Protocol parity: the assertion model's output, read back by the reconciler
//!
//! Each test plays a driver run through `fortest_assertions::Session` (call sentinels, assertions, closing summary)
//! and feeds the transcript to `reconcile_sequence`. If the library's line shapes and the reconciler's parser ever
//! drift apart, these fail.

use std::time::Duration;

use fortest::Verdict;
use fortest::backend::executor::ExecutionRecord;
use fortest::results::reconcile::{NO_RESULTS, reconcile_sequence};
use fortest_assertions::{Scalar, Session, Value};
use fortest_core::lang::assertions::ValueKindId;

fn exited(session: &Session, exit_code: i32) -> ExecutionRecord {
    ExecutionRecord {
        output: session.transcript(),
        exit_code: Some(exit_code),
        duration: Duration::from_millis(1),
        timed_out: false,
    }
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_every_value_kind_passes_through_the_reconciler() {
    let calls = names(&["test_integers", "test_reals", "test_complex", "test_text_and_logicals"]);
    let mut s = Session::new();
    s.reset_counters();

    s.enter("test_integers");
    s.assert_equal("i8", &Value::int8(-3), &Value::int8(-3), None);
    s.assert_equal("i64", &Value::int64(1 << 40), &Value::int64(1 << 40), None);

    s.enter("test_reals");
    s.assert_equal("r32", &Value::real32(0.1), &Value::real32(0.1 + 1.0e-8), None);
    s.assert_equal("r64", &Value::real64(2.5), &Value::real64(2.5), Some(1.0e-9));

    s.enter("test_complex");
    s.assert_equal("c64", &Value::complex64(1.0, -1.0), &Value::complex64(1.0, -1.0), None);

    s.enter("test_text_and_logicals");
    s.assert_equal("padded", &Value::character("abc  "), &Value::character("abc"), None);
    s.assert_true("flag", true);
    s.assert_false("other", false);
    s.print_summary();

    assert_eq!(s.counters().failed(), 0);
    let verdicts = reconcile_sequence(&calls, &exited(&s, 0));
    assert_eq!(verdicts, vec![Verdict::Passed; 4]);
}

#[test]
fn test_failure_details_reach_the_verdict_verbatim() {
    let calls = names(&["test_arrays"]);
    let expected = Value::array(ValueKindId::Int32, vec![Scalar::Int32(1), Scalar::Int32(2), Scalar::Int32(3)]).unwrap();
    let actual = Value::array(ValueKindId::Int32, vec![Scalar::Int32(1), Scalar::Int32(9), Scalar::Int32(3)]).unwrap();

    let mut s = Session::new();
    s.enter("test_arrays");
    s.assert_equal("array_add", &expected, &actual, None);
    s.print_summary();

    // Everything between the [CALL] sentinel and the summary belongs to the failure.
    let failure: Vec<&str> = s.lines()[1..s.lines().len() - 2].iter().map(String::as_str).collect();
    let verdicts = reconcile_sequence(&calls, &exited(&s, 0));
    assert_eq!(verdicts, [Verdict::Failed(failure.join("\n"))]);

    let Verdict::Failed(message) = &verdicts[0] else { unreachable!() };
    assert!(message.starts_with("[FAIL] array_add\n"));
    assert!(message.contains("first mismatch at index 2"));
}

#[test]
fn test_kind_mismatch_and_size_mismatch_are_failures() {
    let calls = names(&["test_kinds", "test_sizes"]);
    let short = Value::array(ValueKindId::Real64, vec![Scalar::Real64(1.0)]).unwrap();
    let long = Value::array(ValueKindId::Real64, vec![Scalar::Real64(1.0), Scalar::Real64(2.0)]).unwrap();

    let mut s = Session::new();
    s.enter("test_kinds");
    s.assert_equal("widths", &Value::int32(1), &Value::int64(1), None);
    s.enter("test_sizes");
    s.assert_equal("lengths", &short, &long, None);
    s.print_summary();

    let verdicts = reconcile_sequence(&calls, &exited(&s, 0));
    assert!(matches!(&verdicts[0], Verdict::Failed(m) if m.starts_with("[FAIL] widths")));
    assert!(matches!(&verdicts[1], Verdict::Failed(m) if m.contains("size mismatch: expected 1, actual 2")));
}

#[test]
fn test_mixed_outcomes_are_attributed_per_subroutine() {
    let calls = names(&["test_ok", "test_bad", "test_empty", "test_ok_again"]);
    let mut s = Session::new();
    s.reset_counters();
    s.enter("test_ok");
    s.assert_true("a", true);
    s.enter("test_bad");
    s.assert_true("b", true);
    s.assert_equal("c", &Value::logical(true), &Value::logical(false), None);
    s.write_line("Note: program output between assertions");
    s.assert_true("d", true);
    s.enter("test_empty");
    s.enter("test_ok_again");
    s.assert_equal("e", &Value::real32(1.0), &Value::real32(1.0), None);
    s.print_summary();

    let verdicts = reconcile_sequence(&calls, &exited(&s, 0));
    assert_eq!(verdicts[0], Verdict::Passed);
    let Verdict::Failed(message) = &verdicts[1] else {
        panic!("expected a failure, got {:?}", verdicts[1]);
    };
    assert!(message.starts_with("[FAIL] c\n"));
    assert!(!message.contains("Note"));
    assert_eq!(verdicts[2], Verdict::Failed(NO_RESULTS.to_string()));
    assert_eq!(verdicts[3], Verdict::Passed);
}

#[test]
fn test_crash_midway_keeps_completed_results() {
    let calls = names(&["test_first", "test_second", "test_third"]);
    let mut s = Session::new();
    s.enter("test_first");
    s.assert_true("one", true);
    s.enter("test_second");
    s.assert_true("two", true);
    s.write_line("Program received signal SIGSEGV: Segmentation fault - invalid memory reference.");

    let verdicts = reconcile_sequence(&calls, &exited(&s, 139));
    assert_eq!(
        verdicts,
        [
            Verdict::Passed,
            Verdict::CrashedUnexpectedly(Some(139)),
            Verdict::CrashedUnexpectedly(Some(139)),
        ]
    );
}

#[test]
fn test_abnormal_exit_after_the_summary_keeps_text_results() {
    let calls = names(&["test_only"]);
    let mut s = Session::new();
    s.enter("test_only");
    s.assert_true("x", true);
    s.print_summary();
    s.write_line("Note: The following floating-point exceptions are signalling: IEEE_DIVIDE_BY_ZERO");

    let verdicts = reconcile_sequence(&calls, &exited(&s, 1));
    assert_eq!(verdicts, [Verdict::Passed]);
}

#[test]
fn test_colored_library_output_is_understood() {
    let calls = names(&["test_color"]);
    let mut s = Session::new();
    s.enter("test_color");
    s.write_line("\x1b[32m[PASS]\x1b[0m colored");
    s.write_line("\x1b[31m[FAIL]\x1b[0m colored_fail");
    s.write_line("       expected: 1");

    let verdicts = reconcile_sequence(&calls, &exited(&s, 0));
    assert_eq!(verdicts, [Verdict::Failed("[FAIL] colored_fail\n       expected: 1".to_string())]);
}
