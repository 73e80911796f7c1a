//! Fortran and fortest vocabulary registries.
//!
//! This module is the “front door” for language-level vocabulary: the structural keywords the analyzer recognizes,
//! the naming conventions that make a file or subroutine a test, and the assertion-library surface that synthesized
//! drivers reference.
//!
//! ## Notes
//! - Registries are intentionally **pure**: no IO, no side effects.
//! - Fortran is case-insensitive, so every lookup here is **case-insensitive ASCII**.
//!
//! ## Examples
//! ```rust
//! use fortest_core::lang::keywords::{self, KeywordId};
//!
//! assert_eq!(keywords::from_str("SUBROUTINE"), Some(KeywordId::Subroutine));
//! assert_eq!(keywords::as_str(KeywordId::Subroutine), "subroutine");
//! ```

pub mod assertions;
pub mod conventions;
pub mod keywords;
pub mod registry;
