//! The single comparison entry point, dispatched on the value kind tag.

use fortest_core::lang::assertions::{self, ValueKindId};

use crate::value::{Scalar, Value};

/// Tolerance applied to `real32`/`complex32` comparisons when the caller passes none.
pub const DEFAULT_TOLERANCE_32: f64 = 1.0e-6;

/// Tolerance applied to `real64`/`complex64` comparisons when the caller passes none.
pub const DEFAULT_TOLERANCE_64: f64 = 1.0e-12;

/// Result of comparing two values.
#[derive(Debug, Clone, PartialEq)]
pub enum Comparison {
    Equal,
    /// Not equal; each detail becomes one indented protocol line.
    Different(Vec<String>),
}

impl Comparison {
    pub fn is_equal(&self) -> bool {
        matches!(self, Comparison::Equal)
    }
}

/// Compare `expected` against `actual`.
///
/// - Integers and logicals compare exactly.
/// - Reals compare within `tolerance` (absolute); complex values compare the modulus of the difference.
/// - Character values ignore trailing blanks, as Fortran's intrinsic comparison does.
/// - Arrays must have the same size and compare element-wise; the first mismatch (1-based index) is reported.
/// - A kind mismatch is reported as a difference, never a panic.
pub fn compare(expected: &Value, actual: &Value, tolerance: Option<f64>) -> Comparison {
    if expected.kind() != actual.kind() {
        return kind_mismatch(expected, actual);
    }

    let tolerance = tolerance.unwrap_or_else(|| default_tolerance(expected.kind()));

    match (expected, actual) {
        (Value::Scalar(e), Value::Scalar(a)) => {
            if scalars_equal(e, a, tolerance) {
                Comparison::Equal
            } else {
                Comparison::Different(value_details(e, a, expected.kind(), tolerance))
            }
        }
        (Value::Array(_, e), Value::Array(_, a)) => {
            if e.len() != a.len() {
                return Comparison::Different(vec![format!(
                    "size mismatch: expected {}, actual {}",
                    e.len(),
                    a.len()
                )]);
            }
            match e.iter().zip(a).position(|(x, y)| !scalars_equal(x, y, tolerance)) {
                None => Comparison::Equal,
                Some(i) => {
                    let mut details = vec![format!("first mismatch at index {}", i + 1)];
                    details.extend(value_details(&e[i], &a[i], expected.kind(), tolerance));
                    Comparison::Different(details)
                }
            }
        }
        _ => kind_mismatch(expected, actual),
    }
}

fn kind_mismatch(expected: &Value, actual: &Value) -> Comparison {
    let describe = |v: &Value| {
        let name = assertions::value_kind_info(v.kind()).canonical;
        if v.is_array() { format!("{name} array") } else { name.to_string() }
    };
    Comparison::Different(vec![format!(
        "kind mismatch: expected {}, actual {}",
        describe(expected),
        describe(actual)
    )])
}

fn default_tolerance(kind: ValueKindId) -> f64 {
    match kind {
        ValueKindId::Real32 | ValueKindId::Complex32 => DEFAULT_TOLERANCE_32,
        ValueKindId::Real64 | ValueKindId::Complex64 => DEFAULT_TOLERANCE_64,
        _ => 0.0,
    }
}

fn scalars_equal(expected: &Scalar, actual: &Scalar, tolerance: f64) -> bool {
    match (expected, actual) {
        (Scalar::Int8(e), Scalar::Int8(a)) => e == a,
        (Scalar::Int16(e), Scalar::Int16(a)) => e == a,
        (Scalar::Int32(e), Scalar::Int32(a)) => e == a,
        (Scalar::Int64(e), Scalar::Int64(a)) => e == a,
        (Scalar::Real32(e), Scalar::Real32(a)) => within(f64::from(*e), f64::from(*a), tolerance),
        (Scalar::Real64(e), Scalar::Real64(a)) => within(*e, *a, tolerance),
        (Scalar::Complex32(er, ei), Scalar::Complex32(ar, ai)) => {
            modulus(f64::from(*er - *ar), f64::from(*ei - *ai)) <= tolerance
        }
        (Scalar::Complex64(er, ei), Scalar::Complex64(ar, ai)) => modulus(er - ar, ei - ai) <= tolerance,
        (Scalar::Logical(e), Scalar::Logical(a)) => e == a,
        (Scalar::Character(e), Scalar::Character(a)) => e.trim_end_matches(' ') == a.trim_end_matches(' '),
        _ => false,
    }
}

fn within(expected: f64, actual: f64, tolerance: f64) -> bool {
    // NaN never compares equal, matching Fortran's `abs(a - e) <= tol`.
    (expected - actual).abs() <= tolerance
}

fn modulus(re: f64, im: f64) -> f64 {
    re.hypot(im)
}

fn value_details(expected: &Scalar, actual: &Scalar, kind: ValueKindId, tolerance: f64) -> Vec<String> {
    let mut details = vec![format!("expected: {expected}"), format!("actual:   {actual}")];
    if assertions::value_kind_info(kind).tolerance {
        details.push(format!("tolerance: {tolerance:e}"));
    }
    details
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_compare_exactly() {
        assert!(compare(&Value::int32(5), &Value::int32(5), None).is_equal());
        assert!(!compare(&Value::int64(5), &Value::int64(6), Some(10.0)).is_equal());
    }

    #[test]
    fn reals_use_tolerance() {
        assert!(compare(&Value::real64(1.0), &Value::real64(1.0 + 1e-9), Some(1e-6)).is_equal());
        let cmp = compare(&Value::real32(1.0), &Value::real32(0.0), Some(1e-6));
        let Comparison::Different(details) = cmp else {
            panic!("expected a difference");
        };
        assert_eq!(details[0], "expected: 1.0");
        assert_eq!(details[1], "actual:   0.0");
        assert!(details[2].starts_with("tolerance:"));
    }

    #[test]
    fn nan_is_never_equal() {
        assert!(!compare(&Value::real64(f64::NAN), &Value::real64(f64::NAN), Some(1.0)).is_equal());
    }

    #[test]
    fn complex_uses_modulus() {
        assert!(compare(&Value::complex64(1.0, 1.0), &Value::complex64(1.0, 1.0 + 1e-13), None).is_equal());
        assert!(!compare(&Value::complex32(0.0, 0.0), &Value::complex32(3.0, 4.0), Some(4.9)).is_equal());
        assert!(compare(&Value::complex32(0.0, 0.0), &Value::complex32(3.0, 4.0), Some(5.0)).is_equal());
    }

    #[test]
    fn character_ignores_trailing_blanks() {
        assert!(compare(&Value::character("abc  "), &Value::character("abc"), None).is_equal());
        assert!(!compare(&Value::character(" abc"), &Value::character("abc"), None).is_equal());
    }

    #[test]
    fn arrays_report_first_mismatch() {
        let e = Value::array(ValueKindId::Int16, vec![Scalar::Int16(1), Scalar::Int16(2), Scalar::Int16(3)]).unwrap();
        let a = Value::array(ValueKindId::Int16, vec![Scalar::Int16(1), Scalar::Int16(9), Scalar::Int16(3)]).unwrap();
        let Comparison::Different(details) = compare(&e, &a, None) else {
            panic!("expected a difference");
        };
        assert_eq!(details[0], "first mismatch at index 2");

        let short = Value::array(ValueKindId::Int16, vec![Scalar::Int16(1)]).unwrap();
        assert_eq!(
            compare(&e, &short, None),
            Comparison::Different(vec!["size mismatch: expected 3, actual 1".to_string()])
        );
    }

    #[test]
    fn kind_mismatch_is_a_difference() {
        let cmp = compare(&Value::int32(1), &Value::int64(1), None);
        assert_eq!(
            cmp,
            Comparison::Different(vec!["kind mismatch: expected int32, actual int64".to_string()])
        );
    }
}
