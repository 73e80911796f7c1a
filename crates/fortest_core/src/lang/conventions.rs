//! Shared fortest conventions (well-known names and naming rules).
//!
//! Everything that decides *whether* something is a test lives here so the discovery walk, the classifier, and the
//! driver synthesizer agree on one spelling.

/// Fortran source extension recognized for test files (without the dot).
pub const SOURCE_EXTENSION: &str = "f90";

/// File-name prefixes that make a source file a test file.
pub const TEST_FILE_PREFIXES: &[&str] = &["test_", "module_test_"];

/// Default discovery pattern when none is given on the command line.
pub const DEFAULT_PATTERN: &str = "test_*.f90";

/// Prefix a subroutine name must carry to be a test candidate.
pub const TEST_SUBROUTINE_PREFIX: &str = "test_";

/// Token that marks a subroutine (or, legacy, a whole file) as an error-stop test.
pub const ERROR_STOP_TOKEN: &str = "error_stop";

/// Module name of the assertion library.
pub const ASSERTION_MODULE: &str = "fortest_assertions";

/// File name of the assertion library's source, when it is looked up in a project.
pub const ASSERTION_MODULE_SOURCE: &str = "module_fortest_assertions.f90";

/// Fortran's maximum identifier length (F2003 and later).
pub const MAX_IDENTIFIER_LEN: usize = 63;

/// Prefix for synthesized program names.
pub const DRIVER_PROGRAM_PREFIX: &str = "fortest_";

/// Intrinsic modules shipped with the compiler; never resolved against project sources.
pub const INTRINSIC_MODULES: &[&str] = &[
    "iso_fortran_env",
    "iso_c_binding",
    "ieee_arithmetic",
    "ieee_exceptions",
    "ieee_features",
];

/// Return whether a file name follows the test-file convention (`test_*.f90` or `module_test_*.f90`).
///
/// Matching is case-sensitive on the prefix, as the glob patterns are, and case-insensitive on the extension.
pub fn is_test_file_name(file_name: &str) -> bool {
    let Some((stem, ext)) = file_name.rsplit_once('.') else {
        return false;
    };
    ext.eq_ignore_ascii_case(SOURCE_EXTENSION)
        && TEST_FILE_PREFIXES
            .iter()
            .any(|prefix| stem.starts_with(prefix) && stem.len() > prefix.len())
}

/// Return whether a subroutine name is a test candidate (`test_` prefix, case-insensitive).
pub fn is_test_subroutine_name(name: &str) -> bool {
    name.len() > TEST_SUBROUTINE_PREFIX.len()
        && name.as_bytes()[..TEST_SUBROUTINE_PREFIX.len()].eq_ignore_ascii_case(TEST_SUBROUTINE_PREFIX.as_bytes())
}

/// Return whether a name contains the error-stop token (case-insensitive substring).
pub fn contains_error_stop_token(name: &str) -> bool {
    name.to_ascii_lowercase().contains(ERROR_STOP_TOKEN)
}

/// Return whether a module name refers to a compiler intrinsic module.
pub fn is_intrinsic_module(name: &str) -> bool {
    INTRINSIC_MODULES.iter().any(|m| m.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_names() {
        assert!(is_test_file_name("test_math.f90"));
        assert!(is_test_file_name("module_test_math.F90"));
        assert!(!is_test_file_name("test_.f90"));
        assert!(!is_test_file_name("math_test.f90"));
        assert!(!is_test_file_name("test_math.f"));
        assert!(!is_test_file_name("test_math"));
    }

    #[test]
    fn subroutine_names() {
        assert!(is_test_subroutine_name("test_add"));
        assert!(is_test_subroutine_name("TEST_Add"));
        assert!(!is_test_subroutine_name("test_"));
        assert!(!is_test_subroutine_name("helper"));
        assert!(!is_test_subroutine_name("tes"));
    }

    #[test]
    fn error_stop_token() {
        assert!(contains_error_stop_token("test_ERROR_STOP_divide"));
        assert!(contains_error_stop_token("test_error_stop_x.f90"));
        assert!(!contains_error_stop_token("test_errorstop"));
    }

    #[test]
    fn intrinsic_modules() {
        assert!(is_intrinsic_module("ISO_FORTRAN_ENV"));
        assert!(!is_intrinsic_module("my_module"));
    }
}
