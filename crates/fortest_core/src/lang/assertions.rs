//! Assertion-library surface: primitives and the value kinds they compare.
//!
//! The runner never evaluates assertions. It only needs the library's module name and the spellings of the two
//! lifecycle calls to synthesize drivers; the value-kind registry is shared with `fortest_assertions`, which models
//! the comparison semantics with one tagged entry point instead of per-type overloads.
//!
//! ## Examples
//! ```rust
//! use fortest_core::lang::assertions::{self, AssertionId, ValueKindId};
//!
//! assert_eq!(assertions::as_str(AssertionId::ResetCounters), "reset_counters");
//! assert_eq!(assertions::value_kind_from_str("real64"), Some(ValueKindId::Real64));
//! assert!(assertions::value_kind_info(ValueKindId::Real64).tolerance);
//! ```

use super::registry::{self, LangItemInfo, Stability};

/// Stable identifier for assertion-library entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssertionId {
    AssertEqual,
    AssertTrue,
    AssertFalse,
    ResetCounters,
    PrintSummary,
}

/// Metadata entry for an assertion entry point.
pub type AssertionInfo = LangItemInfo<AssertionId>;

/// Registry of assertion-library entry points.
pub const ASSERTIONS: &[AssertionInfo] = &[
    assertion(
        AssertionId::AssertEqual,
        "assert_equal",
        &["assert_eq"],
        "Compare expected and actual values of one value kind, with tolerance for real and complex kinds.",
    ),
    assertion(AssertionId::AssertTrue, "assert_true", &[], "Pass when the condition is true."),
    assertion(AssertionId::AssertFalse, "assert_false", &[], "Pass when the condition is false."),
    assertion(
        AssertionId::ResetCounters,
        "reset_counters",
        &[],
        "Reset the pass/fail counters to zero at the start of a driver.",
    ),
    assertion(
        AssertionId::PrintSummary,
        "print_summary",
        &[],
        "Emit the pass/fail count summary lines at the end of a driver.",
    ),
];

/// Resolve an entry-point spelling (case-insensitive).
pub fn from_str(name: &str) -> Option<AssertionId> {
    registry::lookup(ASSERTIONS, name)
}

/// Return the canonical Fortran spelling of an entry point.
pub fn as_str(id: AssertionId) -> &'static str {
    info_for(id).canonical
}

/// Return the metadata entry for an entry point.
///
/// ## Panics
/// - If the registry is missing an entry for `id` (this indicates a programming error).
pub fn info_for(id: AssertionId) -> &'static AssertionInfo {
    ASSERTIONS.iter().find(|a| a.id == id).expect("assertion info missing")
}

/// Return whether an entry point manages counters rather than comparing values.
pub fn is_lifecycle(id: AssertionId) -> bool {
    matches!(id, AssertionId::ResetCounters | AssertionId::PrintSummary)
}

/// Stable identifier for the closed set of comparable value kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKindId {
    Int8,
    Int16,
    Int32,
    Int64,
    Real32,
    Real64,
    Complex32,
    Complex64,
    Logical,
    Character,
}

/// Numeric family of a value kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueFamily {
    Integer,
    Real,
    Complex,
    Logical,
    Text,
}

/// Metadata for a value kind.
#[derive(Debug, Clone, Copy)]
pub struct ValueKindInfo {
    pub id: ValueKindId,
    pub canonical: &'static str,
    /// Fortran declaration spelling (kind parameters from `iso_fortran_env`).
    pub fortran_type: &'static str,
    pub family: ValueFamily,
    /// Whether `assert_equal` accepts a tolerance for this kind.
    pub tolerance: bool,
}

/// Registry of value kinds.
pub const VALUE_KINDS: &[ValueKindInfo] = &[
    kind(ValueKindId::Int8, "int8", "integer(int8)", ValueFamily::Integer),
    kind(ValueKindId::Int16, "int16", "integer(int16)", ValueFamily::Integer),
    kind(ValueKindId::Int32, "int32", "integer(int32)", ValueFamily::Integer),
    kind(ValueKindId::Int64, "int64", "integer(int64)", ValueFamily::Integer),
    kind(ValueKindId::Real32, "real32", "real(real32)", ValueFamily::Real),
    kind(ValueKindId::Real64, "real64", "real(real64)", ValueFamily::Real),
    kind(ValueKindId::Complex32, "complex32", "complex(real32)", ValueFamily::Complex),
    kind(ValueKindId::Complex64, "complex64", "complex(real64)", ValueFamily::Complex),
    kind(ValueKindId::Logical, "logical", "logical", ValueFamily::Logical),
    kind(ValueKindId::Character, "character", "character(len=*)", ValueFamily::Text),
];

/// Resolve a value-kind spelling (case-insensitive).
pub fn value_kind_from_str(name: &str) -> Option<ValueKindId> {
    VALUE_KINDS
        .iter()
        .find(|k| k.canonical.eq_ignore_ascii_case(name))
        .map(|k| k.id)
}

/// Return the metadata entry for a value kind.
///
/// ## Panics
/// - If the registry is missing an entry for `id` (this indicates a programming error).
pub fn value_kind_info(id: ValueKindId) -> &'static ValueKindInfo {
    VALUE_KINDS.iter().find(|k| k.id == id).expect("value kind info missing")
}

const fn assertion(
    id: AssertionId,
    canonical: &'static str,
    aliases: &'static [&'static str],
    description: &'static str,
) -> AssertionInfo {
    LangItemInfo {
        id,
        canonical,
        aliases,
        description,
        since_version: Some("0.1.0"),
        stability: Stability::Stable,
    }
}

const fn kind(id: ValueKindId, canonical: &'static str, fortran_type: &'static str, family: ValueFamily) -> ValueKindInfo {
    ValueKindInfo {
        id,
        canonical,
        fortran_type,
        family,
        tolerance: matches!(family, ValueFamily::Real | ValueFamily::Complex),
    }
}
