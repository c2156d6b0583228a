//! Exponentiation over [`Number`].
//!
//! Integer bases raised to non-negative integer exponents stay exact while the
//! result fits in an `i64`. A negative real base with a fractional exponent
//! has no real result and is computed on the principal complex branch.

use crate::number::Number;

/// Computes `base^exponent`.
pub(crate) fn pow(base: Number, exponent: Number) -> Number {
    match (base, exponent) {
        (Number::Int(b), Number::Int(e)) if e >= 0 => u32::try_from(e)
            .ok()
            .and_then(|e| b.checked_pow(e))
            .map_or(Number::Float((b as f64).powf(e as f64)), Number::Int),
        (Number::Complex(_), _) | (_, Number::Complex(_)) => {
            Number::Complex(base.to_complex().powc(exponent.to_complex()))
        }
        _ => {
            let b = base.as_f64().unwrap_or(f64::NAN);
            let e = exponent.as_f64().unwrap_or(f64::NAN);
            if b < 0.0 && e.fract() != 0.0 {
                Number::Complex(base.to_complex().powf(e))
            } else {
                Number::Float(b.powf(e))
            }
        }
    }
}
