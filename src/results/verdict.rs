//! Verdict model
//!
//! A verdict is derived once per test and never mutated. Whether it counts as success depends only on the
//! variant: `Passed` and `ErrorStopConfirmed` are successes, everything else is a failure.

/// Final classification of one test's outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Passed,
    /// Completed, but reported `[FAIL]` lines (or no results at all).
    Failed(String),
    /// Terminated abnormally while (or before) running. `None` when no exit code exists (timeout, signal).
    CrashedUnexpectedly(Option<i32>),
    /// An error-stop test terminated abnormally, as expected.
    ErrorStopConfirmed,
    /// An error-stop test exited cleanly.
    ErrorStopNotTriggered,
    /// The driver never compiled; carries the compiler diagnostic verbatim.
    BuildFailed(String),
}

/// Fieldless mirror of [`Verdict`] for counting and serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VerdictKind {
    Passed,
    Failed,
    CrashedUnexpectedly,
    ErrorStopConfirmed,
    ErrorStopNotTriggered,
    BuildFailed,
}

impl VerdictKind {
    pub const ALL: [VerdictKind; 6] = [
        VerdictKind::Passed,
        VerdictKind::Failed,
        VerdictKind::CrashedUnexpectedly,
        VerdictKind::ErrorStopConfirmed,
        VerdictKind::ErrorStopNotTriggered,
        VerdictKind::BuildFailed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            VerdictKind::Passed => "passed",
            VerdictKind::Failed => "failed",
            VerdictKind::CrashedUnexpectedly => "crashed_unexpectedly",
            VerdictKind::ErrorStopConfirmed => "error_stop_confirmed",
            VerdictKind::ErrorStopNotTriggered => "error_stop_not_triggered",
            VerdictKind::BuildFailed => "build_failed",
        }
    }
}

impl Verdict {
    pub fn kind(&self) -> VerdictKind {
        match self {
            Verdict::Passed => VerdictKind::Passed,
            Verdict::Failed(_) => VerdictKind::Failed,
            Verdict::CrashedUnexpectedly(_) => VerdictKind::CrashedUnexpectedly,
            Verdict::ErrorStopConfirmed => VerdictKind::ErrorStopConfirmed,
            Verdict::ErrorStopNotTriggered => VerdictKind::ErrorStopNotTriggered,
            Verdict::BuildFailed(_) => VerdictKind::BuildFailed,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Verdict::Passed | Verdict::ErrorStopConfirmed)
    }

    /// Human-readable explanation shown under a failing test, if any.
    pub fn message(&self) -> Option<String> {
        match self {
            Verdict::Passed | Verdict::ErrorStopConfirmed => None,
            Verdict::Failed(reason) => Some(reason.clone()),
            Verdict::CrashedUnexpectedly(Some(code)) => Some(format!("terminated abnormally (exit code {code})")),
            Verdict::CrashedUnexpectedly(None) => {
                Some("terminated abnormally (timed out or killed by a signal)".to_string())
            }
            Verdict::ErrorStopNotTriggered => Some("expected error stop but test completed normally".to_string()),
            Verdict::BuildFailed(diagnostic) => Some(format!("compilation failed:\n{diagnostic}")),
        }
    }
}
