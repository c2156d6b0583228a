//! Trigonometric functions and their inverses over [`Number`].
//!
//! All functions expect arguments in radians. `asin` and `acos` leave the real
//! domain outside `[-1, 1]` and return the principal complex value there.

use num_complex::Complex64;

use crate::number::Number;

/// Applies `real` to an `Int`/`Float` argument and `complex` to a complex one.
fn apply(x: Number, real: fn(f64) -> f64, complex: fn(Complex64) -> Complex64) -> Number {
    match x {
        Number::Complex(c) => Number::Complex(complex(c)),
        other => Number::Float(real(other.as_f64().unwrap_or(f64::NAN))),
    }
}

pub(crate) fn sin(x: Number) -> Number {
    apply(x, f64::sin, |c| c.sin())
}

pub(crate) fn cos(x: Number) -> Number {
    apply(x, f64::cos, |c| c.cos())
}

pub(crate) fn tan(x: Number) -> Number {
    apply(x, f64::tan, |c| c.tan())
}

pub(crate) fn atan(x: Number) -> Number {
    apply(x, f64::atan, |c| c.atan())
}

pub(crate) fn asin(x: Number) -> Number {
    match x.as_f64() {
        Some(v) if v.abs() > 1.0 => Number::Complex(x.to_complex().asin()),
        _ => apply(x, f64::asin, |c| c.asin()),
    }
}

pub(crate) fn acos(x: Number) -> Number {
    match x.as_f64() {
        Some(v) if v.abs() > 1.0 => Number::Complex(x.to_complex().acos()),
        _ => apply(x, f64::acos, |c| c.acos()),
    }
}
