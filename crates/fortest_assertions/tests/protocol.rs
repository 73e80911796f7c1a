//! Integration tests for `fortest_assertions`' protocol output.
//!
//! These lock in the line shapes the runner's reconciler parses.

use fortest_assertions::{Session, Value};
use fortest_core::protocol::{self, ProtocolLine};

#[test]
fn every_emitted_line_classifies_as_protocol() {
    let mut session = Session::new();
    session.reset_counters();
    session.enter("test_mixed");
    session.assert_equal("ints", &Value::int8(3), &Value::int8(3), None);
    session.assert_equal("text", &Value::character("a"), &Value::character("b"), None);
    session.print_summary();

    let kinds: Vec<_> = session
        .lines()
        .iter()
        .map(|l| match protocol::classify_line(l) {
            ProtocolLine::Call(_) => "call",
            ProtocolLine::Pass(_) => "pass",
            ProtocolLine::Fail(_) => "fail",
            ProtocolLine::Detail(_) => "detail",
            ProtocolLine::Summary { .. } => "summary",
            ProtocolLine::Other(_) => "other",
        })
        .collect();

    assert_eq!(kinds, ["call", "pass", "fail", "detail", "detail", "summary", "summary"]);
}

#[test]
fn counters_are_per_session() {
    let mut a = Session::new();
    let mut b = Session::new();
    a.assert_true("a", false);
    b.assert_true("b", true);
    assert_eq!((a.counters().passed(), a.counters().failed()), (0, 1));
    assert_eq!((b.counters().passed(), b.counters().failed()), (1, 0));
}
