//! Provide shared, pure vocabulary for the fortest runner and the assertion-library model.
//!
//! This crate is intentionally small and dependency-free. It contains the pieces that both sides of the textual
//! protocol must agree on:
//! - the runner, which synthesizes drivers and reconciles their output, and
//! - the assertion model (`fortest_assertions`), which emits the `[PASS]`/`[FAIL]` lines.
//!
//! ## Notes
//!
//! - This is a “semantic core” crate: **no IO**, no global state, and no runner-specific types.
//! - Current scope: Fortran structural keywords used by the line scanner, test naming conventions, the assertion
//!   primitive registry, the output protocol, and deterministic identifier derivation.

pub mod ident;
pub mod lang;
pub mod protocol;
