//! OutputReconciler
//!
//! Combines two independent signals into verdicts: the textual protocol a driver prints and the way its process
//! ended. Per driver kind:
//!
//! | driver            | process ended                  | verdict per call                          |
//! |-------------------|--------------------------------|-------------------------------------------|
//! | normal            | cleanly, all calls reached     | textual (`[FAIL]` → Failed, none → Failed) |
//! | normal            | abnormally / early             | completed calls textual, the rest crashed |
//! | error stop        | abnormally or timed out        | `ErrorStopConfirmed`                      |
//! | error stop        | cleanly                        | `ErrorStopNotTriggered`                   |
//! | program           | same as error stop             |                                           |
//! | program, protocol | cleanly                        | textual over the whole output             |
//! | program, protocol | abnormally / timed out         | crashed                                   |
//!
//! A `program` file is an error-stop check unless it was classified with the output protocol enabled.
//!
//! A normal driver prints `[CALL] name` before each call, which segments the stream. A call counts as completed
//! once the next call's sentinel appears, or once the whole driver finished (clean exit, or the summary lines
//! printed after the last call).

use fortest_core::protocol::{self, ProtocolLine};

use crate::backend::driver::{Driver, DriverKind};
use crate::backend::executor::ExecutionRecord;
use crate::frontend::classifier::Classification;

use super::verdict::Verdict;

/// Reason given to a completed test that reported nothing.
pub const NO_RESULTS: &str = "no assertion results reported";

/// Derive one verdict per call in `driver`, in call order.
pub fn reconcile(driver: &Driver, record: &ExecutionRecord) -> Vec<Verdict> {
    match driver.kind {
        DriverKind::Normal => reconcile_sequence(&driver.calls, record),
        DriverKind::ErrorStop | DriverKind::Standalone(Classification::ErrorStop) => {
            vec![reconcile_error_stop(record); driver.calls.len()]
        }
        DriverKind::Standalone(Classification::Normal) => {
            vec![reconcile_standalone(record); driver.calls.len()]
        }
    }
}

/// Error-stop polarity: abnormal termination is success.
pub fn reconcile_error_stop(record: &ExecutionRecord) -> Verdict {
    if record.is_clean_exit() {
        Verdict::ErrorStopNotTriggered
    } else {
        Verdict::ErrorStopConfirmed
    }
}

/// A standalone program is one segment covering its whole output.
pub fn reconcile_standalone(record: &ExecutionRecord) -> Verdict {
    let mut parsed = Segments::new(1, Some(0));
    parsed.feed(&[], &record.output);
    if record.is_clean_exit() {
        parsed.segments[0].verdict()
    } else {
        Verdict::CrashedUnexpectedly(record.crash_code())
    }
}

/// Segment a normal driver's output by call sentinels and assign verdicts.
pub fn reconcile_sequence(calls: &[String], record: &ExecutionRecord) -> Vec<Verdict> {
    if calls.is_empty() {
        return Vec::new();
    }

    let mut parsed = Segments::new(calls.len(), None);
    parsed.feed(calls, &record.output);

    let all_started = parsed.segments.iter().all(|s| s.started);
    let finished = all_started && (record.is_clean_exit() || parsed.summary_after_last);
    let first_unfinished = if finished {
        calls.len()
    } else {
        parsed.segments.iter().rposition(|s| s.started).unwrap_or(0)
    };

    tracing::debug!(
        calls = calls.len(),
        first_unfinished,
        exit_code = ?record.exit_code,
        timed_out = record.timed_out,
        "reconciled normal driver"
    );

    parsed
        .segments
        .iter()
        .enumerate()
        .map(|(i, seg)| {
            if i < first_unfinished {
                seg.verdict()
            } else {
                Verdict::CrashedUnexpectedly(record.crash_code())
            }
        })
        .collect()
}

#[derive(Debug, Clone, Default)]
struct Segment {
    started: bool,
    passes: usize,
    failures: Vec<String>,
}

impl Segment {
    fn verdict(&self) -> Verdict {
        if !self.failures.is_empty() {
            Verdict::Failed(self.failures.join("\n"))
        } else if self.passes == 0 {
            Verdict::Failed(NO_RESULTS.to_string())
        } else {
            Verdict::Passed
        }
    }
}

struct Segments {
    segments: Vec<Segment>,
    current: Option<usize>,
    in_failure: bool,
    summary_after_last: bool,
}

impl Segments {
    fn new(count: usize, current: Option<usize>) -> Self {
        let mut segments = vec![Segment::default(); count];
        if let Some(c) = current {
            segments[c].started = true;
        }
        Self {
            segments,
            current,
            in_failure: false,
            summary_after_last: false,
        }
    }

    fn feed(&mut self, calls: &[String], output: &str) {
        let output = protocol::strip_ansi(output);
        for line in output.lines() {
            self.line(calls, protocol::classify_line(line));
        }
    }

    fn line(&mut self, calls: &[String], line: ProtocolLine<'_>) {
        match line {
            ProtocolLine::Call(name) => {
                self.in_failure = false;
                let from = self.current.map_or(0, |c| c + 1);
                let found = calls
                    .get(from..)
                    .and_then(|rest| rest.iter().position(|c| c.eq_ignore_ascii_case(name)));
                if let Some(offset) = found {
                    let index = from + offset;
                    self.current = Some(index);
                    self.segments[index].started = true;
                    self.summary_after_last = false;
                }
            }
            ProtocolLine::Pass(_) => {
                self.in_failure = false;
                if let Some(c) = self.current {
                    self.segments[c].passes += 1;
                }
            }
            ProtocolLine::Fail(name) => {
                if let Some(c) = self.current {
                    self.segments[c].failures.push(protocol::fail_line(name));
                    self.in_failure = true;
                }
            }
            ProtocolLine::Detail(text) => {
                if !self.in_failure {
                    return;
                }
                let Some(c) = self.current else { return };
                if let Some(last) = self.segments[c].failures.last_mut() {
                    last.push('\n');
                    last.push_str(&protocol::detail_line(text));
                }
            }
            ProtocolLine::Summary { .. } => {
                self.in_failure = false;
                if self.current == Some(self.segments.len() - 1) {
                    self.summary_after_last = true;
                }
            }
            ProtocolLine::Other(_) => self.in_failure = false,
        }
    }
}
