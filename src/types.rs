use std::collections::BTreeMap;
use std::fmt;

use num_complex::Complex64;

use crate::expr::Symbol;
use crate::expression::ParameterExpression;
use crate::number::Number;
use crate::parameter::Parameter;

/// Mapping from each free parameter of an expression to its evaluator symbol.
///
/// A persistent map: cloning is O(1) and unions share structure with their inputs.
pub type SymbolMap = im::OrdMap<Parameter, Symbol>;

/// Values supplied to `bind`, `subs` records and `assign`, keyed by parameter identity.
pub type Bindings = BTreeMap<Parameter, Operand>;

/// A number-or-expression operand.
///
/// This represents:
/// - The right-hand side of every binary operator
/// - A value in a set of bindings
/// - The result of a gradient, which collapses to a number when no parameter survives
/// - An exported value, with `E` the exporter's expression type
#[derive(Debug, Clone, PartialEq)]
pub enum Operand<E = ParameterExpression> {
    Constant(Number),
    Symbolic(E),
}

impl<E> Operand<E> {
    pub fn as_constant(&self) -> Option<Number> {
        match self {
            Operand::Constant(n) => Some(*n),
            Operand::Symbolic(_) => None,
        }
    }

    pub fn as_symbolic(&self) -> Option<&E> {
        match self {
            Operand::Constant(_) => None,
            Operand::Symbolic(e) => Some(e),
        }
    }

    pub fn is_symbolic(&self) -> bool {
        matches!(self, Operand::Symbolic(_))
    }
}

impl<E: fmt::Display> fmt::Display for Operand<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Constant(n) => write!(f, "{n}"),
            Operand::Symbolic(e) => write!(f, "{e}"),
        }
    }
}

impl<E> From<Number> for Operand<E> {
    fn from(value: Number) -> Self {
        Operand::Constant(value)
    }
}

impl<E> From<i32> for Operand<E> {
    fn from(value: i32) -> Self {
        Operand::Constant(value.into())
    }
}

impl<E> From<i64> for Operand<E> {
    fn from(value: i64) -> Self {
        Operand::Constant(value.into())
    }
}

impl<E> From<f64> for Operand<E> {
    fn from(value: f64) -> Self {
        Operand::Constant(value.into())
    }
}

impl<E> From<Complex64> for Operand<E> {
    fn from(value: Complex64) -> Self {
        Operand::Constant(value.into())
    }
}

impl From<ParameterExpression> for Operand {
    fn from(value: ParameterExpression) -> Self {
        Operand::Symbolic(value)
    }
}

impl From<&ParameterExpression> for Operand {
    fn from(value: &ParameterExpression) -> Self {
        Operand::Symbolic(value.clone())
    }
}

impl From<Parameter> for Operand {
    fn from(value: Parameter) -> Self {
        Operand::Symbolic(value.expr())
    }
}

impl From<&Parameter> for Operand {
    fn from(value: &Parameter) -> Self {
        Operand::Symbolic(value.expr())
    }
}
