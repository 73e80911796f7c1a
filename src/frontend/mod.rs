//! fortest frontend
//!
//! This module contains everything that runs before a driver exists:
//! - `discovery`: finding test files by naming convention, directory, or glob pattern
//! - `scanner`: splitting Fortran source into statements and tokens
//! - `analyzer`: recognizing the program unit, `use` statements, and candidate subroutines
//! - `classifier`: labelling each candidate `Normal` or `ErrorStop`
//! - `diagnostics`: per-file analysis errors

pub mod analyzer;
pub mod classifier;
pub mod diagnostics;
pub mod discovery;
pub mod scanner;
