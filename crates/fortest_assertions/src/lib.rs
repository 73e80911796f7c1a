//! Reference model of the fortest assertion library.
//!
//! The Fortran library exposes one overloaded `assert_equal` per numeric width and keeps its pass/fail counts in
//! module-level state. This crate models the same behavior without either:
//! - one comparison entry point dispatched on a [`Value`] kind tag instead of static overloads, and
//! - an explicit [`Counters`] object owned by a [`Session`], reset at the start of each driver run.
//!
//! The runner does not link against this crate. It exists so the protocol the runner parses has an executable
//! reference: parity tests feed a [`Session`]'s transcript to the output reconciler.
//!
//! ## Examples
//! ```rust
//! use fortest_assertions::{Session, Value};
//!
//! let mut session = Session::new();
//! session.assert_equal("add", &Value::int32(5), &Value::int32(2 + 3), None);
//! session.assert_equal("scale", &Value::real64(1.0), &Value::real64(0.0), Some(1e-6));
//! session.print_summary();
//!
//! assert_eq!(session.counters().passed(), 1);
//! assert_eq!(session.counters().failed(), 1);
//! assert!(session.transcript().starts_with("[PASS] add\n[FAIL] scale\n"));
//! ```

pub mod compare;
pub mod counters;
pub mod session;
pub mod value;

pub use compare::{Comparison, compare};
pub use counters::{Counters, Outcome};
pub use session::Session;
pub use value::{Scalar, Value};
