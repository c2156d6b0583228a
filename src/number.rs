//! Scalar values produced by the native evaluator.
//!
//! A [`Number`] keeps the narrowest tag the evaluator could prove: integer
//! arithmetic stays integral while it is exact, any float operand makes the
//! result a float, and leaving the real domain (e.g. `ln(-1)`) produces a
//! complex value. Complex results are never narrowed back to real, even when
//! the imaginary part cancels to exactly zero; callers that need a real value
//! go through [`Number::to_complex`] and check the imaginary part themselves.
//!
//! Equality and hashing are by value across tags, so `Int(2)`, `Float(2.0)`
//! and `Complex(2 + 0i)` are all equal and hash identically.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, Div, Mul, Neg, Sub};

use num_complex::Complex64;

use crate::operators::{exp, ln, pow, trigonometric};

/// A numeric value tagged with the narrowest type that represents it.
#[derive(Debug, Clone, Copy)]
pub enum Number {
    /// Exact integer
    Int(i64),
    /// Real floating point value
    Float(f64),
    /// Complex value
    Complex(Complex64),
}

impl Number {
    /// Integer zero
    pub const ZERO: Number = Number::Int(0);
    /// Integer one
    pub const ONE: Number = Number::Int(1);

    /// Returns true if every component is finite.
    pub fn is_finite(&self) -> bool {
        match self {
            Number::Int(_) => true,
            Number::Float(f) => f.is_finite(),
            Number::Complex(c) => c.is_finite(),
        }
    }

    /// Returns true if any component is infinite.
    pub fn is_infinite(&self) -> bool {
        match self {
            Number::Int(_) => false,
            Number::Float(f) => f.is_infinite(),
            Number::Complex(c) => c.is_infinite(),
        }
    }

    pub fn is_nan(&self) -> bool {
        match self {
            Number::Int(_) => false,
            Number::Float(f) => f.is_nan(),
            Number::Complex(c) => c.is_nan(),
        }
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Number::Int(i) => *i == 0,
            Number::Float(f) => *f == 0.0,
            Number::Complex(c) => c.re == 0.0 && c.im == 0.0,
        }
    }

    /// Returns true if the value carries the complex tag (regardless of its imaginary part).
    pub fn is_complex(&self) -> bool {
        matches!(self, Number::Complex(_))
    }

    /// Real value of an `Int` or `Float`; `None` for anything tagged complex.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Number::Int(i) => Some(*i as f64),
            Number::Float(f) => Some(*f),
            Number::Complex(_) => None,
        }
    }

    /// Integer value of an `Int`, or a truncated finite `Float` that fits in `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Number::Int(i) => Some(*i),
            Number::Float(f) if f.is_finite() && f.trunc().abs() < i64::MAX as f64 => {
                Some(f.trunc() as i64)
            }
            _ => None,
        }
    }

    /// Real part of the value.
    fn real(&self) -> f64 {
        match self {
            Number::Int(i) => *i as f64,
            Number::Float(f) => *f,
            Number::Complex(c) => c.re,
        }
    }

    /// Widens any value to a complex number.
    pub fn to_complex(&self) -> Complex64 {
        match self {
            Number::Int(i) => Complex64::new(*i as f64, 0.0),
            Number::Float(f) => Complex64::new(*f, 0.0),
            Number::Complex(c) => *c,
        }
    }

    pub fn abs(self) -> Number {
        match self {
            Number::Int(i) => i
                .checked_abs()
                .map_or(Number::Float((i as f64).abs()), Number::Int),
            Number::Float(f) => Number::Float(f.abs()),
            Number::Complex(c) => Number::Float(c.norm()),
        }
    }

    /// Sign of a real value as an integer (-1, 0, 1), or `z / |z|` for complex values.
    pub fn sign(self) -> Number {
        match self {
            Number::Int(i) => Number::Int(i.signum()),
            Number::Float(f) if f.is_nan() => Number::Float(f),
            Number::Float(f) if f == 0.0 => Number::Int(0),
            Number::Float(f) => Number::Int(if f > 0.0 { 1 } else { -1 }),
            Number::Complex(c) if c.norm() == 0.0 => Number::Int(0),
            Number::Complex(c) => Number::Complex(c / c.norm()),
        }
    }

    pub fn conj(self) -> Number {
        match self {
            Number::Complex(c) => Number::Complex(c.conj()),
            real => real,
        }
    }

    pub fn pow(self, exponent: Number) -> Number {
        pow::pow(self, exponent)
    }

    pub fn exp(self) -> Number {
        exp::exp(self)
    }

    pub fn ln(self) -> Number {
        ln::ln(self)
    }

    pub fn sin(self) -> Number {
        trigonometric::sin(self)
    }

    pub fn cos(self) -> Number {
        trigonometric::cos(self)
    }

    pub fn tan(self) -> Number {
        trigonometric::tan(self)
    }

    pub fn asin(self) -> Number {
        trigonometric::asin(self)
    }

    pub fn acos(self) -> Number {
        trigonometric::acos(self)
    }

    pub fn atan(self) -> Number {
        trigonometric::atan(self)
    }

    /// Applies `int_op` when both sides are integers and it does not overflow,
    /// otherwise falls back to the float or complex operation.
    fn combine(
        self,
        rhs: Number,
        int_op: fn(i64, i64) -> Option<i64>,
        float_op: fn(f64, f64) -> f64,
        complex_op: fn(Complex64, Complex64) -> Complex64,
    ) -> Number {
        match (self, rhs) {
            (Number::Int(a), Number::Int(b)) => {
                int_op(a, b).map_or(Number::Float(float_op(a as f64, b as f64)), Number::Int)
            }
            (Number::Complex(_), _) | (_, Number::Complex(_)) => {
                Number::Complex(complex_op(self.to_complex(), rhs.to_complex()))
            }
            _ => Number::Float(float_op(self.real(), rhs.real())),
        }
    }
}

impl Add for Number {
    type Output = Number;

    fn add(self, rhs: Number) -> Number {
        self.combine(rhs, i64::checked_add, |a, b| a + b, |a, b| a + b)
    }
}

impl Sub for Number {
    type Output = Number;

    fn sub(self, rhs: Number) -> Number {
        self.combine(rhs, i64::checked_sub, |a, b| a - b, |a, b| a - b)
    }
}

impl Mul for Number {
    type Output = Number;

    fn mul(self, rhs: Number) -> Number {
        self.combine(rhs, i64::checked_mul, |a, b| a * b, |a, b| a * b)
    }
}

impl Div for Number {
    type Output = Number;

    /// Division never panics: a zero divisor yields a signed infinity (or NaN for
    /// `0 / 0`), which is how division by zero surfaces once parameters are bound.
    fn div(self, rhs: Number) -> Number {
        if rhs.is_zero() {
            return match self {
                Number::Complex(c) if c.norm() != 0.0 => Number::Float(f64::INFINITY),
                Number::Complex(_) => Number::Float(f64::NAN),
                real => Number::Float(real.real() / 0.0),
            };
        }
        self.combine(
            rhs,
            |a, b| match a.checked_rem(b) {
                Some(0) => a.checked_div(b),
                _ => None,
            },
            |a, b| a / b,
            |a, b| a / b,
        )
    }
}

impl Neg for Number {
    type Output = Number;

    fn neg(self) -> Number {
        match self {
            Number::Int(i) => i
                .checked_neg()
                .map_or(Number::Float(-(i as f64)), Number::Int),
            Number::Float(f) => Number::Float(-f),
            Number::Complex(c) => Number::Complex(-c),
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Number) -> bool {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a == b,
            (Number::Complex(_), _) | (_, Number::Complex(_)) => {
                self.to_complex() == other.to_complex()
            }
            _ => self.as_f64() == other.as_f64(),
        }
    }
}

// NaN is the only value not equal to itself; expressions never carry NaN
// constants because non-finite operands are rejected at dispatch.
impl Eq for Number {}

fn hash_real<H: Hasher>(value: f64, state: &mut H) {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        (value as i64).hash(state);
    } else {
        value.to_bits().hash(state);
    }
}

impl Hash for Number {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Number::Int(i) => hash_real(*i as f64, state),
            Number::Float(f) => hash_real(*f, state),
            Number::Complex(c) => {
                hash_real(c.re, state);
                if c.im != 0.0 {
                    hash_real(c.im, state);
                }
            }
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(i) => write!(f, "{i}"),
            Number::Float(x) => write!(f, "{x:?}"),
            Number::Complex(c) if c.im < 0.0 => write!(f, "({:?}-{:?}i)", c.re, -c.im),
            Number::Complex(c) => write!(f, "({:?}+{:?}i)", c.re, c.im),
        }
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Number::Int(value)
    }
}

impl From<i32> for Number {
    fn from(value: i32) -> Self {
        Number::Int(value.into())
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number::Float(value)
    }
}

impl From<Complex64> for Number {
    fn from(value: Complex64) -> Self {
        Number::Complex(value)
    }
}
