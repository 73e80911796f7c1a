//! Tagged values compared by `assert_equal`.

use std::fmt;

use fortest_core::lang::assertions::ValueKindId;

/// One scalar of any supported value kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Real32(f32),
    Real64(f64),
    Complex32(f32, f32),
    Complex64(f64, f64),
    Logical(bool),
    Character(String),
}

impl Scalar {
    /// The kind tag of this scalar.
    pub fn kind(&self) -> ValueKindId {
        match self {
            Scalar::Int8(_) => ValueKindId::Int8,
            Scalar::Int16(_) => ValueKindId::Int16,
            Scalar::Int32(_) => ValueKindId::Int32,
            Scalar::Int64(_) => ValueKindId::Int64,
            Scalar::Real32(_) => ValueKindId::Real32,
            Scalar::Real64(_) => ValueKindId::Real64,
            Scalar::Complex32(..) => ValueKindId::Complex32,
            Scalar::Complex64(..) => ValueKindId::Complex64,
            Scalar::Logical(_) => ValueKindId::Logical,
            Scalar::Character(_) => ValueKindId::Character,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Int8(v) => write!(f, "{v}"),
            Scalar::Int16(v) => write!(f, "{v}"),
            Scalar::Int32(v) => write!(f, "{v}"),
            Scalar::Int64(v) => write!(f, "{v}"),
            Scalar::Real32(v) => write!(f, "{v:?}"),
            Scalar::Real64(v) => write!(f, "{v:?}"),
            Scalar::Complex32(re, im) => write!(f, "({re:?}, {im:?})"),
            Scalar::Complex64(re, im) => write!(f, "({re:?}, {im:?})"),
            Scalar::Logical(true) => f.write_str(".true."),
            Scalar::Logical(false) => f.write_str(".false."),
            Scalar::Character(s) => write!(f, "\"{s}\""),
        }
    }
}

/// A scalar or a rank-1 array of scalars of one kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(Scalar),
    Array(ValueKindId, Vec<Scalar>),
}

impl Value {
    pub fn int8(v: i8) -> Self {
        Value::Scalar(Scalar::Int8(v))
    }

    pub fn int16(v: i16) -> Self {
        Value::Scalar(Scalar::Int16(v))
    }

    pub fn int32(v: i32) -> Self {
        Value::Scalar(Scalar::Int32(v))
    }

    pub fn int64(v: i64) -> Self {
        Value::Scalar(Scalar::Int64(v))
    }

    pub fn real32(v: f32) -> Self {
        Value::Scalar(Scalar::Real32(v))
    }

    pub fn real64(v: f64) -> Self {
        Value::Scalar(Scalar::Real64(v))
    }

    pub fn complex32(re: f32, im: f32) -> Self {
        Value::Scalar(Scalar::Complex32(re, im))
    }

    pub fn complex64(re: f64, im: f64) -> Self {
        Value::Scalar(Scalar::Complex64(re, im))
    }

    pub fn logical(v: bool) -> Self {
        Value::Scalar(Scalar::Logical(v))
    }

    pub fn character(v: impl Into<String>) -> Self {
        Value::Scalar(Scalar::Character(v.into()))
    }

    /// Build an array value. Returns `None` if the elements do not all share `kind`.
    pub fn array(kind: ValueKindId, elements: Vec<Scalar>) -> Option<Self> {
        if elements.iter().all(|e| e.kind() == kind) {
            Some(Value::Array(kind, elements))
        } else {
            None
        }
    }

    /// The kind tag of this value (element kind for arrays).
    pub fn kind(&self) -> ValueKindId {
        match self {
            Value::Scalar(s) => s.kind(),
            Value::Array(kind, _) => *kind,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(..))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Scalar(s) => s.fmt(f),
            Value::Array(_, elements) => {
                f.write_str("[")?;
                for (i, e) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    e.fmt(f)?;
                }
                f.write_str("]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrays_must_be_homogeneous() {
        assert!(Value::array(ValueKindId::Int32, vec![Scalar::Int32(1), Scalar::Int32(2)]).is_some());
        assert!(Value::array(ValueKindId::Int32, vec![Scalar::Int32(1), Scalar::Int64(2)]).is_none());
    }

    #[test]
    fn display_uses_fortran_spellings() {
        assert_eq!(Value::logical(true).to_string(), ".true.");
        assert_eq!(Value::complex64(1.0, -2.0).to_string(), "(1.0, -2.0)");
        let arr = Value::array(ValueKindId::Int8, vec![Scalar::Int8(1), Scalar::Int8(2)]).unwrap();
        assert_eq!(arr.to_string(), "[1, 2]");
    }
}
