//! Deterministic identifiers for synthesized artifacts.
//!
//! Generated program names, driver directories, and executables must be stable across runs and unique per
//! `(file path, driver)` pair so concurrent workers never collide. Names are derived from a 64-bit FNV-1a hash,
//! which is fixed by definition (unlike `std`'s randomly keyed hashers).
//!
//! ## Examples
//! ```rust
//! use fortest_core::ident;
//!
//! let a = ident::program_name(&["/src/test_math.f90", "normal"]);
//! assert_eq!(a, ident::program_name(&["/src/test_math.f90", "normal"]));
//! assert!(a.starts_with("fortest_") && a.len() <= 63);
//! ```

use crate::lang::conventions::{DRIVER_PROGRAM_PREFIX, MAX_IDENTIFIER_LEN};

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Separator mixed between parts so `["ab", "c"]` and `["a", "bc"]` hash differently.
const PART_SEPARATOR: u8 = 0x1f;

/// 64-bit FNV-1a over the given parts.
pub fn fnv1a64(parts: &[&str]) -> u64 {
    let mut hash = FNV_OFFSET;
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            hash ^= u64::from(PART_SEPARATOR);
            hash = hash.wrapping_mul(FNV_PRIME);
        }
        for byte in part.bytes() {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(FNV_PRIME);
        }
    }
    hash
}

/// Eight lowercase hex digits identifying `parts`.
pub fn short_hash(parts: &[&str]) -> String {
    let full = format!("{:016x}", fnv1a64(parts));
    full[..8].to_string()
}

/// A valid Fortran program name for a driver identified by `parts`.
///
/// Always `fortest_` + 8 hex digits: starts with a letter and stays well below the 63-character limit.
pub fn program_name(parts: &[&str]) -> String {
    let name = format!("{DRIVER_PROGRAM_PREFIX}{}", short_hash(parts));
    debug_assert!(name.len() <= MAX_IDENTIFIER_LEN);
    name
}

/// Reduce arbitrary text (a file stem) to a filesystem-friendly slug of ASCII alphanumerics and `_`.
pub fn slug(text: &str) -> String {
    let slug: String = text
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c.to_ascii_lowercase() } else { '_' })
        .collect();
    if slug.is_empty() { "unit".to_string() } else { slug }
}
