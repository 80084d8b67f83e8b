//! Runtime value representation for the RVM.
//!
//! Every value the VM produces is a finite `f64`. Non-finite results are
//! rejected as runtime errors before they can become a `Value`, and negative
//! zero is folded into zero on construction.

use std::fmt;

/// Integral values below this magnitude print without a fractional part.
const INTEGER_DISPLAY_LIMIT: f64 = 1e15;

/// A finite numeric value.
#[derive(Debug, Clone, Copy, Default)]
pub struct Value(f64);

// Values are always finite and never negative zero, so bitwise equality
// agrees with numeric equality and `Eq` is sound.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for Value {}

impl Value {
    pub const ZERO: Value = Value(0.0);
    pub const ONE: Value = Value(1.0);

    /// Wrap a float. Returns `None` for NaN and infinities.
    pub fn new(v: f64) -> Option<Self> {
        if v.is_finite() {
            // -0.0 + 0.0 == +0.0
            Some(Value(v + 0.0))
        } else {
            None
        }
    }

    /// Build a value from a boolean: 1 for true, 0 for false.
    pub fn from_bool(b: bool) -> Self {
        if b {
            Value::ONE
        } else {
            Value::ZERO
        }
    }

    /// The value with its sign flipped. Zero stays zero.
    pub fn negated(self) -> Self {
        Value(-self.0 + 0.0)
    }

    pub fn as_f64(self) -> f64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0.0
    }

    pub fn is_integral(self) -> bool {
        self.0.fract() == 0.0
    }

    /// The value as an instruction index, if it is a non-negative integer.
    pub fn as_index(self) -> Option<usize> {
        if self.is_integral() && self.0 >= 0.0 && self.0 < usize::MAX as f64 {
            Some(self.0 as usize)
        } else {
            None
        }
    }

    /// The value as an `i64`, if it is integral and small enough to print
    /// exactly.
    pub fn as_integer(self) -> Option<i64> {
        if self.is_integral() && self.0.abs() < INTEGER_DISPLAY_LIMIT {
            Some(self.0 as i64)
        } else {
            None
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value(f64::from(v))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_integer() {
            Some(n) => write!(f, "{n}"),
            None => write!(f, "{}", self.0),
        }
    }
}
