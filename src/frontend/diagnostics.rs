//! Analysis diagnostics
//!
//! Every way a single test file can be rejected before a driver is synthesized. These are recovered per file: the
//! file is skipped and reported, other files proceed.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// A file-level analysis failure.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum AnalysisError {
    #[error("no module or program statement found")]
    #[diagnostic(
        code(fortest::malformed_source),
        help("a test file must declare its tests inside a `module` (or be a standalone `program`)")
    )]
    MissingUnit,

    #[error("{kind} `{name}` opened on line {line} has no matching end")]
    #[diagnostic(code(fortest::malformed_source))]
    UnterminatedProcedure { kind: &'static str, name: String, line: usize },

    #[error("unexpected `{statement}` on line {line}")]
    #[diagnostic(code(fortest::malformed_source))]
    UnexpectedEnd { statement: String, line: usize },

    #[error("subroutine `{name}` is declared twice (lines {first} and {second})")]
    #[diagnostic(
        code(fortest::aggregation_conflict),
        help("subroutine names must be unique within a file; rename one of them")
    )]
    DuplicateSubroutine { name: String, first: usize, second: usize },

    #[error("failed to read {}: {message}", path.display())]
    #[diagnostic(code(fortest::io))]
    Io { path: PathBuf, message: String },
}

/// Coarse kind of a file-level skip, as reported to users and counted by the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipKind {
    MalformedSource,
    AggregationConflict,
    Io,
}

impl SkipKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SkipKind::MalformedSource => "malformed_source",
            SkipKind::AggregationConflict => "aggregation_conflict",
            SkipKind::Io => "io",
        }
    }
}

impl std::fmt::Display for SkipKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AnalysisError {
    pub fn skip_kind(&self) -> SkipKind {
        match self {
            AnalysisError::MissingUnit
            | AnalysisError::UnterminatedProcedure { .. }
            | AnalysisError::UnexpectedEnd { .. } => SkipKind::MalformedSource,
            AnalysisError::DuplicateSubroutine { .. } => SkipKind::AggregationConflict,
            AnalysisError::Io { .. } => SkipKind::Io,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_kinds() {
        assert_eq!(AnalysisError::MissingUnit.skip_kind(), SkipKind::MalformedSource);
        let dup = AnalysisError::DuplicateSubroutine {
            name: "test_a".into(),
            first: 3,
            second: 9,
        };
        assert_eq!(dup.skip_kind(), SkipKind::AggregationConflict);
        assert_eq!(dup.to_string(), "subroutine `test_a` is declared twice (lines 3 and 9)");
    }

    #[test]
    fn test_diagnostic_codes() {
        let err = AnalysisError::UnterminatedProcedure {
            kind: "subroutine",
            name: "test_x".into(),
            line: 4,
        };
        let code = err.code().map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("fortest::malformed_source"));
    }
}
