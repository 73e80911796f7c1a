//! fortest version information.
//!
//! Exposed as a single constant so the CLI, driver headers and JSON reports agree on the same value.

/// The fortest version string (for example, `0.1.0-alpha.1`).
pub const FORTEST_VERSION: &str = env!("CARGO_PKG_VERSION");
