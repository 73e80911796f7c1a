//! A driver run's assertion state: counters plus the emitted protocol lines.

use fortest_core::protocol;

use crate::compare::{Comparison, compare};
use crate::counters::{Counters, Outcome};
use crate::value::Value;

/// Owns the counters and the output transcript of one driver run.
#[derive(Debug, Default)]
pub struct Session {
    counters: Counters,
    lines: Vec<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the counters (the transcript is kept; it models stdout).
    pub fn reset_counters(&mut self) {
        self.counters.reset();
    }

    /// Record the driver's call sentinel for `subroutine`.
    pub fn enter(&mut self, subroutine: &str) {
        self.lines.push(protocol::call_line(subroutine));
    }

    /// Compare two tagged values and emit the protocol lines.
    pub fn assert_equal(&mut self, name: &str, expected: &Value, actual: &Value, tolerance: Option<f64>) -> Outcome {
        match compare(expected, actual, tolerance) {
            Comparison::Equal => self.pass(name),
            Comparison::Different(details) => self.fail(name, &details),
        }
    }

    pub fn assert_true(&mut self, name: &str, condition: bool) -> Outcome {
        if condition {
            self.pass(name)
        } else {
            self.fail(name, &["expected: .true.".to_string(), "actual:   .false.".to_string()])
        }
    }

    pub fn assert_false(&mut self, name: &str, condition: bool) -> Outcome {
        if condition {
            self.fail(name, &["expected: .false.".to_string(), "actual:   .true.".to_string()])
        } else {
            self.pass(name)
        }
    }

    /// Emit the closing count summary.
    pub fn print_summary(&mut self) {
        self.lines.push(protocol::summary_line(true, self.counters.passed()));
        self.lines.push(protocol::summary_line(false, self.counters.failed()));
    }

    /// Append a raw line of program output (anything that is not protocol).
    pub fn write_line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// The emitted output as one newline-terminated string.
    pub fn transcript(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }

    fn pass(&mut self, name: &str) -> Outcome {
        self.counters.record(Outcome::Passed);
        self.lines.push(protocol::pass_line(name));
        Outcome::Passed
    }

    fn fail(&mut self, name: &str, details: &[String]) -> Outcome {
        self.counters.record(Outcome::Failed);
        self.lines.push(protocol::fail_line(name));
        self.lines.extend(details.iter().map(|d| protocol::detail_line(d)));
        Outcome::Failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_emits_indented_details() {
        let mut s = Session::new();
        s.assert_equal("eq", &Value::int32(1), &Value::int32(2), None);
        assert_eq!(s.lines()[0], "[FAIL] eq");
        assert!(s.lines()[1].starts_with(protocol::DETAIL_INDENT));
    }

    #[test]
    fn reset_only_touches_counters() {
        let mut s = Session::new();
        s.assert_true("t", true);
        s.reset_counters();
        assert_eq!(s.counters().total(), 0);
        assert_eq!(s.lines().len(), 1);
    }

    #[test]
    fn summary_lines_follow_counts() {
        let mut s = Session::new();
        s.assert_false("f", false);
        s.assert_false("g", true);
        s.print_summary();
        let n = s.lines().len();
        assert_eq!(s.lines()[n - 2], "[PASS]   1");
        assert_eq!(s.lines()[n - 1], "[FAIL]   1");
    }
}
