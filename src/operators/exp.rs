//! Exponential function over [`Number`].
//!
//! Real inputs produce a real float; complex inputs stay complex.

use crate::number::Number;

/// Computes `e^x`.
pub(crate) fn exp(x: Number) -> Number {
    match x {
        Number::Complex(c) => Number::Complex(c.exp()),
        Number::Int(0) => Number::ONE,
        real => Number::Float(real.as_f64().unwrap_or(f64::NAN).exp()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;

    #[test]
    fn test_exp() {
        assert_eq!(exp(Number::Int(0)), Number::Int(1));
        assert!((exp(Number::Float(1.0)).as_f64().unwrap() - std::f64::consts::E).abs() < 1e-12);

        let z = exp(Number::Complex(Complex64::new(0.0, std::f64::consts::PI)));
        let c = z.to_complex();
        assert!((c.re + 1.0).abs() < 1e-12);
        assert!(c.im.abs() < 1e-12);
    }
}
