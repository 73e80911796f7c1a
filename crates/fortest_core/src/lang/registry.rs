//! Shareable metadata for `fortest_core::lang` registries.
//!
//! Registries (keywords, assertion primitives, value kinds) share one small metadata shape so they can live in
//! `const` tables and be checked by the same guardrail tests.
//!
//! ## Notes
//! - Metadata is meant for tooling/docs/diagnostics; the analyzer still owns recognition rules.

/// Identify the fortest version a vocabulary item is available since.
///
/// ## Examples
/// ```rust
/// use fortest_core::lang::registry::SinceVersion;
///
/// let since: SinceVersion = "0.1.0";
/// assert!(!since.is_empty());
/// ```
pub type SinceVersion = &'static str;

/// Describe the lifecycle status of a vocabulary item.
///
/// ## Notes
/// - `Deprecated` items are still recognized; tooling may warn about them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stability {
    Stable,
    Deprecated,
}

/// Shared metadata shape for “registry-first” vocabulary items.
///
/// ## Notes
/// - `description` is intentionally mandatory to keep docs/tooling consistent.
/// - `canonical` is always lowercase; Fortran spellings are matched case-insensitively.
#[derive(Debug, Clone, Copy)]
pub struct LangItemInfo<Id> {
    pub id: Id,
    pub canonical: &'static str,
    pub aliases: &'static [&'static str],
    pub description: &'static str,
    pub since_version: Option<SinceVersion>,
    pub stability: Stability,
}

impl<Id: Copy> LangItemInfo<Id> {
    /// Return whether `spelling` names this item (canonical or alias, case-insensitive ASCII).
    pub fn matches(&self, spelling: &str) -> bool {
        self.canonical.eq_ignore_ascii_case(spelling) || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(spelling))
    }
}

/// Resolve `spelling` against a registry table.
///
/// Canonical spellings win over aliases when both could match.
pub fn lookup<Id: Copy>(table: &[LangItemInfo<Id>], spelling: &str) -> Option<Id> {
    if let Some(info) = table.iter().find(|i| i.canonical.eq_ignore_ascii_case(spelling)) {
        return Some(info.id);
    }
    table
        .iter()
        .find(|i| i.aliases.iter().any(|a| a.eq_ignore_ascii_case(spelling)))
        .map(|i| i.id)
}
