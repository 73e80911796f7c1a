//! Fortran structural keyword vocabulary.
//!
//! The analyzer is a line-oriented pattern matcher, not a parser. It only needs the handful of keywords that open or
//! close program units, procedures, and interface blocks, plus the procedure prefixes that may precede
//! `subroutine`/`function`.
//!
//! ## Notes
//! - Lookup via [`from_str`] is **case-insensitive ASCII** (Fortran is case-insensitive).
//! - Fused spellings such as `endsubroutine` are aliases of their spaced forms' leading keyword and are handled by
//!   [`split_fused_end`].
//!
//! ## Examples
//! ```rust
//! use fortest_core::lang::keywords::{self, KeywordCategory, KeywordId};
//!
//! assert_eq!(keywords::from_str("Pure"), Some(KeywordId::Pure));
//! assert_eq!(keywords::category(KeywordId::Pure), KeywordCategory::ProcedurePrefix);
//! assert_eq!(keywords::split_fused_end("endmodule"), Some(KeywordId::Module));
//! ```

use super::registry::{LangItemInfo, Stability};

/// Stable identifier for every recognized structural keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeywordId {
    // Program units
    Module,
    Submodule,
    Program,
    // Procedures
    Subroutine,
    Function,
    Procedure,
    // Procedure prefixes
    Pure,
    Impure,
    Elemental,
    Recursive,
    NonRecursive,
    // Structure
    End,
    Contains,
    Interface,
    Abstract,
    // Imports
    Use,
    Intrinsic,
    NonIntrinsic,
}

/// Coarse grouping used by the analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeywordCategory {
    ProgramUnit,
    Procedure,
    ProcedurePrefix,
    Structure,
    Import,
}

/// Metadata entry for a keyword.
#[derive(Debug, Clone, Copy)]
pub struct KeywordInfo {
    pub item: LangItemInfo<KeywordId>,
    pub category: KeywordCategory,
}

/// Registry of structural keywords.
pub const KEYWORDS: &[KeywordInfo] = &[
    kw(KeywordId::Module, "module", KeywordCategory::ProgramUnit, "Opens a module program unit."),
    kw(KeywordId::Submodule, "submodule", KeywordCategory::ProgramUnit, "Opens a submodule program unit."),
    kw(KeywordId::Program, "program", KeywordCategory::ProgramUnit, "Opens a main program unit."),
    kw(KeywordId::Subroutine, "subroutine", KeywordCategory::Procedure, "Declares a subroutine."),
    kw(KeywordId::Function, "function", KeywordCategory::Procedure, "Declares a function."),
    kw(KeywordId::Procedure, "procedure", KeywordCategory::Procedure, "Declares a procedure binding or pointer."),
    kw(KeywordId::Pure, "pure", KeywordCategory::ProcedurePrefix, "Procedure without side effects."),
    kw(KeywordId::Impure, "impure", KeywordCategory::ProcedurePrefix, "Explicitly impure elemental procedure."),
    kw(KeywordId::Elemental, "elemental", KeywordCategory::ProcedurePrefix, "Elemental procedure."),
    kw(KeywordId::Recursive, "recursive", KeywordCategory::ProcedurePrefix, "Recursive procedure."),
    kw(
        KeywordId::NonRecursive,
        "non_recursive",
        KeywordCategory::ProcedurePrefix,
        "Explicitly non-recursive procedure.",
    ),
    kw(KeywordId::End, "end", KeywordCategory::Structure, "Closes the innermost construct."),
    kw(KeywordId::Contains, "contains", KeywordCategory::Structure, "Starts the contained-procedure section."),
    kw(KeywordId::Interface, "interface", KeywordCategory::Structure, "Opens an interface block."),
    kw(KeywordId::Abstract, "abstract", KeywordCategory::Structure, "Marks an abstract interface block."),
    kw(KeywordId::Use, "use", KeywordCategory::Import, "Imports a module."),
    kw(KeywordId::Intrinsic, "intrinsic", KeywordCategory::Import, "Requests the intrinsic module of a name."),
    kw(
        KeywordId::NonIntrinsic,
        "non_intrinsic",
        KeywordCategory::Import,
        "Requests the user module of a name.",
    ),
];

/// Resolve a word to a [`KeywordId`] (case-insensitive ASCII).
pub fn from_str(word: &str) -> Option<KeywordId> {
    KEYWORDS.iter().find(|k| k.item.matches(word)).map(|k| k.item.id)
}

/// Return the canonical (lowercase) spelling for a keyword.
pub fn as_str(id: KeywordId) -> &'static str {
    info_for(id).item.canonical
}

/// Return the category of a keyword.
pub fn category(id: KeywordId) -> KeywordCategory {
    info_for(id).category
}

/// Return the metadata entry for a keyword.
///
/// ## Panics
/// - If the registry is missing an entry for `id` (this indicates a programming error).
pub fn info_for(id: KeywordId) -> &'static KeywordInfo {
    KEYWORDS
        .iter()
        .find(|k| k.item.id == id)
        .expect("keyword info missing")
}

/// Return whether `word` is a procedure prefix (`pure`, `elemental`, ...).
pub fn is_procedure_prefix(word: &str) -> bool {
    from_str(word).is_some_and(|id| category(id) == KeywordCategory::ProcedurePrefix)
}

/// Split a fused `end` spelling (`endsubroutine`, `ENDMODULE`) into the construct it closes.
///
/// Returns `None` for anything that is not `end` immediately followed by a keyword.
pub fn split_fused_end(word: &str) -> Option<KeywordId> {
    let lower = word.to_ascii_lowercase();
    let rest = lower.strip_prefix("end")?;
    if rest.is_empty() {
        return None;
    }
    from_str(rest)
}

const fn kw(id: KeywordId, canonical: &'static str, category: KeywordCategory, description: &'static str) -> KeywordInfo {
    KeywordInfo {
        item: LangItemInfo {
            id,
            canonical,
            aliases: &[],
            description,
            since_version: Some("0.1.0"),
            stability: Stability::Stable,
        },
        category,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(from_str("MODULE"), Some(KeywordId::Module));
        assert_eq!(from_str("Contains"), Some(KeywordId::Contains));
        assert_eq!(from_str("call"), None);
    }

    #[test]
    fn fused_end_forms() {
        assert_eq!(split_fused_end("endsubroutine"), Some(KeywordId::Subroutine));
        assert_eq!(split_fused_end("EndFunction"), Some(KeywordId::Function));
        assert_eq!(split_fused_end("end"), None);
        assert_eq!(split_fused_end("endif"), None);
    }

    #[test]
    fn prefixes() {
        assert!(is_procedure_prefix("ELEMENTAL"));
        assert!(!is_procedure_prefix("subroutine"));
    }
}
