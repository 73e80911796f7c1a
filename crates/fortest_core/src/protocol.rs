//! The textual pass/fail protocol shared by the assertion library and the output reconciler.
//!
//! Each assertion emits one marker line (`[PASS] name` or `[FAIL] name`); a failing comparison follows it with one
//! or more indented detail lines (expected/actual values). Synthesized normal drivers additionally emit a
//! `[CALL] name` sentinel before invoking each test subroutine so the stream can be segmented per subroutine.
//! The assertion library's closing summary (`[PASS]   9`, `[FAIL]   0`) is recognized and ignored.
//!
//! ## Examples
//! ```rust
//! use fortest_core::protocol::{self, ProtocolLine};
//!
//! assert_eq!(protocol::classify_line("[PASS] add works"), ProtocolLine::Pass("add works"));
//! assert_eq!(protocol::classify_line("[FAIL]   2"), ProtocolLine::Summary { passed: false, count: 2 });
//! assert_eq!(protocol::classify_line("       expected: 1"), ProtocolLine::Detail("expected: 1"));
//! ```

use std::borrow::Cow;

/// Marker that opens a passing assertion line.
pub const PASS_MARKER: &str = "[PASS]";

/// Marker that opens a failing assertion line.
pub const FAIL_MARKER: &str = "[FAIL]";

/// Sentinel the normal driver writes before each subroutine call.
pub const CALL_MARKER: &str = "[CALL]";

/// Indentation of assertion detail lines.
pub const DETAIL_INDENT: &str = "       ";

/// One classified line of captured output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolLine<'a> {
    /// `[CALL] name` written by the driver.
    Call(&'a str),
    /// `[PASS] name` written by an assertion.
    Pass(&'a str),
    /// `[FAIL] name` written by an assertion.
    Fail(&'a str),
    /// Indented continuation of a preceding marker line (trimmed).
    Detail(&'a str),
    /// The assertion library's count summary (`[PASS]   9`).
    Summary { passed: bool, count: u64 },
    /// Anything else (program output, runtime diagnostics, blank lines).
    Other(&'a str),
}

/// Classify one line of output. ANSI escapes must already be stripped (see [`strip_ansi`]).
pub fn classify_line(line: &str) -> ProtocolLine<'_> {
    let line = line.trim_end();
    let trimmed = line.trim_start();

    for (marker, passed) in [(PASS_MARKER, true), (FAIL_MARKER, false)] {
        if let Some(rest) = trimmed.strip_prefix(marker) {
            let rest = rest.trim();
            // Indistinguishable from an assertion named only with digits (`[FAIL] 42`); the summary reading wins.
            if !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()) {
                if let Ok(count) = rest.parse() {
                    return ProtocolLine::Summary { passed, count };
                }
            }
            return if passed {
                ProtocolLine::Pass(rest)
            } else {
                ProtocolLine::Fail(rest)
            };
        }
    }

    if let Some(rest) = trimmed.strip_prefix(CALL_MARKER) {
        return ProtocolLine::Call(rest.trim());
    }

    if !trimmed.is_empty() && trimmed.len() != line.len() {
        return ProtocolLine::Detail(trimmed);
    }

    ProtocolLine::Other(line)
}

/// Remove ANSI SGR/CSI escape sequences (`ESC [ ... final-byte`).
///
/// Borrows when the input contains no escape character.
pub fn strip_ansi(text: &str) -> Cow<'_, str> {
    if !text.contains('\x1b') {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\x1b' {
            out.push(c);
            continue;
        }
        if chars.peek() == Some(&'[') {
            chars.next();
            // Parameter/intermediate bytes run until a final byte in `@`..=`~`.
            for next in chars.by_ref() {
                if ('@'..='~').contains(&next) {
                    break;
                }
            }
        }
    }
    Cow::Owned(out)
}

/// Format a passing assertion line.
pub fn pass_line(name: &str) -> String {
    format!("{PASS_MARKER} {name}")
}

/// Format a failing assertion line.
pub fn fail_line(name: &str) -> String {
    format!("{FAIL_MARKER} {name}")
}

/// Format an indented detail line.
pub fn detail_line(text: &str) -> String {
    format!("{DETAIL_INDENT}{text}")
}

/// Format the driver's call sentinel.
pub fn call_line(subroutine: &str) -> String {
    format!("{CALL_MARKER} {subroutine}")
}

/// Format one of the assertion library's summary lines.
pub fn summary_line(passed: bool, count: u64) -> String {
    let marker = if passed { PASS_MARKER } else { FAIL_MARKER };
    format!("{marker}{count:>4}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markers_and_sentinels() {
        assert_eq!(classify_line("[CALL] test_add"), ProtocolLine::Call("test_add"));
        assert_eq!(classify_line("  [FAIL] multiply  "), ProtocolLine::Fail("multiply"));
        assert_eq!(classify_line("[PASS]"), ProtocolLine::Pass(""));
    }

    #[test]
    fn summary_lines_round_trip_through_the_classifier() {
        assert_eq!(
            classify_line(&summary_line(true, 9)),
            ProtocolLine::Summary { passed: true, count: 9 }
        );
        assert_eq!(
            classify_line(&summary_line(false, 0)),
            ProtocolLine::Summary { passed: false, count: 0 }
        );
    }

    #[test]
    fn a_test_named_with_digits_is_not_a_summary() {
        assert_eq!(classify_line("[PASS] case 12b"), ProtocolLine::Pass("case 12b"));
    }

    #[test]
    fn an_assertion_named_only_with_digits_reads_as_a_summary() {
        assert_eq!(classify_line("[FAIL] 42"), ProtocolLine::Summary { passed: false, count: 42 });
        assert_eq!(classify_line("[FAIL] 42"), classify_line(&summary_line(false, 42)));
        assert_eq!(classify_line("[FAIL] 42a"), ProtocolLine::Fail("42a"));
    }

    #[test]
    fn other_and_detail() {
        assert_eq!(classify_line("STOP 0"), ProtocolLine::Other("STOP 0"));
        assert_eq!(classify_line(""), ProtocolLine::Other(""));
        assert_eq!(classify_line("\tactual: 0.0"), ProtocolLine::Detail("actual: 0.0"));
    }

    #[test]
    fn ansi_is_stripped() {
        let coloured = "\x1b[32m[PASS]\x1b[0m add";
        assert_eq!(strip_ansi(coloured), "[PASS] add");
        assert!(matches!(strip_ansi("plain"), Cow::Borrowed("plain")));
    }
}
