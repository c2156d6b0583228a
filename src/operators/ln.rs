//! Natural logarithm over [`Number`].
//!
//! The logarithm of a negative real leaves the real domain and is returned as
//! the principal complex value; `ln(0)` is negative infinity.

use num_complex::Complex64;

use crate::number::Number;

/// Computes the principal natural logarithm of `x`.
pub(crate) fn ln(x: Number) -> Number {
    match x {
        Number::Complex(c) => Number::Complex(c.ln()),
        Number::Int(1) => Number::ZERO,
        real => {
            let value = real.as_f64().unwrap_or(f64::NAN);
            if value < 0.0 {
                Number::Complex(Complex64::new(value, 0.0).ln())
            } else {
                Number::Float(value.ln())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ln_real() {
        assert_eq!(ln(Number::Int(1)), Number::Int(0));
        assert!((ln(Number::Float(std::f64::consts::E)).as_f64().unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(ln(Number::Int(0)), Number::Float(f64::NEG_INFINITY));
    }

    #[test]
    fn test_ln_negative_is_complex() {
        let z = ln(Number::Int(-1));
        assert!(z.is_complex());
        let c = z.to_complex();
        assert!(c.re.abs() < 1e-12);
        assert!((c.im - std::f64::consts::PI).abs() < 1e-12);
    }
}
