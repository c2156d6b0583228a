//! Conversion of fully bound expressions into plain numbers.
//!
//! `numeric` returns the value with the narrowest tag the evaluator produced. The
//! casts to `f64`, `i64` and `Complex64` first try a direct conversion and, when the
//! expression is bound but the direct conversion fails, retry through the next wider
//! type and narrow back: a complex-tagged value whose imaginary part is exactly zero
//! still casts to `f64`, and a float casts to `i64` by truncation.

use num_complex::Complex64;

use crate::errors::ExprError;
use crate::expression::ParameterExpression;
use crate::number::Number;

impl ParameterExpression {
    /// The value of a fully bound expression.
    ///
    /// # Errors
    /// Returns `ExprError::NotNumeric` while any parameter is unbound.
    pub fn numeric(&self) -> Result<Number, ExprError> {
        if !self.is_bound() {
            return Err(ExprError::NotNumeric(format!(
                "Expression with unbound parameters '{}' is not numeric",
                self.describe_parameters()
            )));
        }
        Ok(self.native().value()?)
    }

    pub fn to_complex(&self) -> Result<Complex64, ExprError> {
        match self.native().value() {
            Ok(value) => Ok(value.to_complex()),
            Err(_) => Err(self.cast_error("a complex")),
        }
    }

    pub fn to_f64(&self) -> Result<f64, ExprError> {
        let value = self.native().value().map_err(|_| self.cast_error("a float"))?;
        if let Some(real) = value.as_f64() {
            return Ok(real);
        }
        let value = self.to_complex()?;
        if value.im == 0.0 {
            Ok(value.re)
        } else {
            Err(ExprError::NotNumeric(format!(
                "could not cast expression to float: {value} has an imaginary part"
            )))
        }
    }

    pub fn to_i64(&self) -> Result<i64, ExprError> {
        let value = self.native().value().map_err(|_| self.cast_error("an int"))?;
        if let Some(integer) = value.as_i64() {
            return Ok(integer);
        }
        let real = self.to_f64()?;
        Number::Float(real)
            .as_i64()
            .ok_or_else(|| ExprError::NotNumeric(format!("could not cast expression to int: {real}")))
    }

    /// Whether the value is real: `None` if it cannot be evaluated yet.
    pub fn is_real(&self) -> Option<bool> {
        self.native().value().ok().map(|value| !value.is_complex())
    }

    fn cast_error(&self, target: &str) -> ExprError {
        if self.is_bound() {
            ExprError::NotNumeric(format!("could not cast expression to {target}"))
        } else {
            ExprError::NotNumeric(format!(
                "ParameterExpression with unbound parameters ({}) cannot be cast to {target}.",
                self.describe_parameters()
            ))
        }
    }
}

impl TryFrom<&ParameterExpression> for f64 {
    type Error = ExprError;

    fn try_from(expr: &ParameterExpression) -> Result<Self, Self::Error> {
        expr.to_f64()
    }
}

impl TryFrom<&ParameterExpression> for i64 {
    type Error = ExprError;

    fn try_from(expr: &ParameterExpression) -> Result<Self, Self::Error> {
        expr.to_i64()
    }
}

impl TryFrom<&ParameterExpression> for Complex64 {
    type Error = ExprError;

    fn try_from(expr: &ParameterExpression) -> Result<Self, Self::Error> {
        expr.to_complex()
    }
}
