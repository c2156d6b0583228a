//! Arithmetic and transcendental operations on parameter expressions.
//!
//! Every binary operator goes through [`ParameterExpression::apply_operation`], which
//! checks the operands, asks the native tree for the result and records one
//! instruction. The `std::ops` operators accept anything convertible into an
//! [`Operand`] on the right and return `Result`, since combining two expressions can
//! fail (name conflicts, division by zero, non-finite constants):
//!
//! ```
//! use paramexpr::Parameter;
//!
//! let x = Parameter::new("x");
//! let y = Parameter::new("y");
//! let expr = ((&x * 2).unwrap() + &y).unwrap();
//! let scaled = (3.0 * expr).unwrap();
//! assert_eq!(scaled.to_string(), "(3.0 * ((x * 2) + y))");
//! ```
//!
//! Unary functions cannot fail and return the new expression directly.

use std::collections::HashSet;
use std::ops::{Add, Div, Mul, Neg, Sub};

use tracing::{debug, trace};

use crate::errors::ExprError;
use crate::expr::{Expr, Function};
use crate::expression::ParameterExpression;
use crate::number::Number;
use crate::opcode::OpCode;
use crate::parameter::Parameter;
use crate::replay::{appended, Instruction, OperandRef};
use crate::types::{Operand, SymbolMap};

impl ParameterExpression {
    /// Applies a binary operation between this expression and `other`.
    ///
    /// With `reflected` set the result is `other op self`. Reflected sub, div and pow
    /// are passed with their own codes (`RSub`, `RDiv`, `RPow`); reflected add and
    /// mul keep theirs and record the constant as the left operand.
    pub(crate) fn apply_operation(
        &self,
        other: Operand,
        reflected: bool,
        op: OpCode,
    ) -> Result<Self, ExprError> {
        if op == OpCode::Div && is_zero(&other) {
            debug!(expression = %self, "rejected division by zero");
            return Err(ExprError::DivisionByZero(format!(
                "Division of a ParameterExpression by zero ({self} / {other})."
            )));
        }

        let (symbols, names, other_tree, other_ref) = match other {
            Operand::Symbolic(expr) => {
                self.raise_if_names_conflict(expr.parameters(), &HashSet::new())?;
                let symbols = self.symbol_map().clone().union(expr.symbol_map().clone());
                let mut names = self.names().clone();
                names.extend(
                    expr.names()
                        .iter()
                        .map(|(name, parameter)| (name.clone(), parameter.clone())),
                );
                (
                    symbols,
                    Some(names),
                    expr.native().clone(),
                    OperandRef::Nested(expr),
                )
            }
            Operand::Constant(value) if value.is_finite() => (
                self.symbol_map().clone(),
                None,
                Expr::Const(value),
                OperandRef::Literal(value),
            ),
            Operand::Constant(value) => {
                debug!(%op, %value, "rejected non-finite operand");
                return Err(ExprError::UnsupportedOperand(format!(
                    "cannot apply '{op}' to {self} and the non-finite value {value}"
                )));
            }
        };

        let own_tree = self.native().clone();
        let (lhs, rhs) = if reflected {
            (other_tree, own_tree)
        } else {
            (own_tree, other_tree)
        };
        let value = match op.unreflected() {
            OpCode::Add => Expr::add(lhs, rhs),
            OpCode::Sub => Expr::sub(lhs, rhs),
            OpCode::Mul => Expr::mul(lhs, rhs),
            OpCode::Div => Expr::div(lhs, rhs),
            OpCode::Pow => Expr::pow(lhs, rhs),
            other => {
                return Err(ExprError::UnsupportedOperand(format!(
                    "'{other}' is not a binary arithmetic operation"
                )))
            }
        };

        let receiver = OperandRef::receiver(self);
        let instruction = if reflected && !op.is_reflected() {
            Instruction::binary(op, other_ref, receiver)
        } else {
            Instruction::binary(op, receiver, other_ref)
        };
        let replay = appended(self.replay_log(), instruction);
        trace!(%op, reflected, entries = replay.len(), "recorded operation");

        Ok(match names {
            Some(names) => Self::from_parts_with_names(symbols, value, replay, names),
            None => Self::from_parts(symbols, value, replay),
        })
    }

    /// `self ^ exponent`
    pub fn pow(&self, exponent: impl Into<Operand>) -> Result<Self, ExprError> {
        self.apply_operation(exponent.into(), false, OpCode::Pow)
    }

    /// `base ^ self`
    pub fn rpow(&self, base: impl Into<Operand>) -> Result<Self, ExprError> {
        self.apply_operation(base.into(), true, OpCode::Pow.reflected())
    }

    /// `other + self`
    pub fn radd(&self, other: impl Into<Operand>) -> Result<Self, ExprError> {
        self.apply_operation(other.into(), true, OpCode::Add)
    }

    /// `other - self`
    pub fn rsub(&self, other: impl Into<Operand>) -> Result<Self, ExprError> {
        self.apply_operation(other.into(), true, OpCode::Sub.reflected())
    }

    /// `other * self`
    pub fn rmul(&self, other: impl Into<Operand>) -> Result<Self, ExprError> {
        self.apply_operation(other.into(), true, OpCode::Mul)
    }

    /// `other / self`
    pub fn rdiv(&self, other: impl Into<Operand>) -> Result<Self, ExprError> {
        self.apply_operation(other.into(), true, OpCode::Div.reflected())
    }

    /// Unary plus, recorded as a multiplication by one.
    pub fn pos(&self) -> Result<Self, ExprError> {
        self.apply_operation(Operand::Constant(Number::ONE), false, OpCode::Mul)
    }

    fn call(&self, function: Function, op: OpCode) -> Self {
        let replay = appended(
            self.replay_log(),
            Instruction::unary(op, OperandRef::receiver(self)),
        );
        trace!(%op, entries = replay.len(), "recorded function");
        Self::from_parts(
            self.symbol_map().clone(),
            Expr::func(function, self.native().clone()),
            replay,
        )
    }

    pub fn sin(&self) -> Self {
        self.call(Function::Sin, OpCode::Sin)
    }

    pub fn cos(&self) -> Self {
        self.call(Function::Cos, OpCode::Cos)
    }

    pub fn tan(&self) -> Self {
        self.call(Function::Tan, OpCode::Tan)
    }

    pub fn arcsin(&self) -> Self {
        self.call(Function::Asin, OpCode::Asin)
    }

    pub fn arccos(&self) -> Self {
        self.call(Function::Acos, OpCode::Acos)
    }

    pub fn arctan(&self) -> Self {
        self.call(Function::Atan, OpCode::Atan)
    }

    pub fn exp(&self) -> Self {
        self.call(Function::Exp, OpCode::Exp)
    }

    /// Natural logarithm.
    pub fn log(&self) -> Self {
        self.call(Function::Ln, OpCode::Log)
    }

    pub fn sign(&self) -> Self {
        self.call(Function::Sign, OpCode::Sign)
    }

    pub fn abs(&self) -> Self {
        self.call(Function::Abs, OpCode::Abs)
    }

    pub fn conjugate(&self) -> Self {
        self.call(Function::Conj, OpCode::Conj)
    }

    /// Derivative with respect to `parameter`, assuming a real-valued expression.
    ///
    /// Returns the constant `0.0` without recording anything when the parameter does
    /// not occur in the expression. Otherwise the result keeps only the parameters
    /// still present in the derivative, and collapses to a constant when none are.
    pub fn gradient(&self, parameter: &Parameter) -> Result<Operand, ExprError> {
        let Some(symbol) = self.symbol_map().get(parameter) else {
            return Ok(Operand::Constant(Number::Float(0.0)));
        };
        let derivative = self.native().derivative(symbol.name());

        let surviving = derivative.symbols();
        let symbols: SymbolMap = self
            .symbol_map()
            .iter()
            .filter(|(_, symbol)| surviving.contains(*symbol))
            .map(|(parameter, symbol)| (parameter.clone(), symbol.clone()))
            .collect();
        if symbols.is_empty() {
            return Ok(Operand::Constant(derivative.value()?));
        }

        let replay = appended(
            self.replay_log(),
            Instruction::binary(
                OpCode::Grad,
                OperandRef::receiver(self),
                OperandRef::Nested(parameter.expr()),
            ),
        );
        trace!(parameter = %parameter, "recorded gradient");
        Ok(Operand::Symbolic(Self::from_parts(
            symbols,
            *derivative,
            replay,
        )))
    }
}

fn is_zero(operand: &Operand) -> bool {
    match operand {
        Operand::Constant(value) => value.is_zero(),
        Operand::Symbolic(expr) => expr.is_bound() && *expr == Number::ZERO,
    }
}

macro_rules! binary_operator {
    ($trait:ident, $method:ident, $code:expr) => {
        impl<T: Into<Operand>> $trait<T> for ParameterExpression {
            type Output = Result<ParameterExpression, ExprError>;

            fn $method(self, rhs: T) -> Self::Output {
                self.apply_operation(rhs.into(), false, $code)
            }
        }

        impl<T: Into<Operand>> $trait<T> for &ParameterExpression {
            type Output = Result<ParameterExpression, ExprError>;

            fn $method(self, rhs: T) -> Self::Output {
                self.apply_operation(rhs.into(), false, $code)
            }
        }

        impl<T: Into<Operand>> $trait<T> for Parameter {
            type Output = Result<ParameterExpression, ExprError>;

            fn $method(self, rhs: T) -> Self::Output {
                self.expr().apply_operation(rhs.into(), false, $code)
            }
        }

        impl<T: Into<Operand>> $trait<T> for &Parameter {
            type Output = Result<ParameterExpression, ExprError>;

            fn $method(self, rhs: T) -> Self::Output {
                self.expr().apply_operation(rhs.into(), false, $code)
            }
        }
    };
}

binary_operator!(Add, add, OpCode::Add);
binary_operator!(Sub, sub, OpCode::Sub);
binary_operator!(Mul, mul, OpCode::Mul);
binary_operator!(Div, div, OpCode::Div);

// Numbers on the left: `2.0 * expr` records the reflected operation on `expr`.
macro_rules! reflected_operator {
    ($trait:ident, $method:ident, $code:expr, $($lhs:ty),+) => {
        $(
            impl $trait<ParameterExpression> for $lhs {
                type Output = Result<ParameterExpression, ExprError>;

                fn $method(self, rhs: ParameterExpression) -> Self::Output {
                    rhs.apply_operation(Operand::Constant(Number::from(self)), true, $code)
                }
            }

            impl $trait<&ParameterExpression> for $lhs {
                type Output = Result<ParameterExpression, ExprError>;

                fn $method(self, rhs: &ParameterExpression) -> Self::Output {
                    rhs.apply_operation(Operand::Constant(Number::from(self)), true, $code)
                }
            }

            impl $trait<Parameter> for $lhs {
                type Output = Result<ParameterExpression, ExprError>;

                fn $method(self, rhs: Parameter) -> Self::Output {
                    rhs.expr().apply_operation(Operand::Constant(Number::from(self)), true, $code)
                }
            }

            impl $trait<&Parameter> for $lhs {
                type Output = Result<ParameterExpression, ExprError>;

                fn $method(self, rhs: &Parameter) -> Self::Output {
                    rhs.expr().apply_operation(Operand::Constant(Number::from(self)), true, $code)
                }
            }
        )+
    };
}

reflected_operator!(Add, add, OpCode::Add, f64, i64, i32, Number);
reflected_operator!(Sub, sub, OpCode::Sub.reflected(), f64, i64, i32, Number);
reflected_operator!(Mul, mul, OpCode::Mul, f64, i64, i32, Number);
reflected_operator!(Div, div, OpCode::Div.reflected(), f64, i64, i32, Number);

impl Neg for ParameterExpression {
    type Output = Result<ParameterExpression, ExprError>;

    /// Recorded as a multiplication by minus one.
    fn neg(self) -> Self::Output {
        self.apply_operation(Operand::Constant(Number::Int(-1)), false, OpCode::Mul)
    }
}

impl Neg for &ParameterExpression {
    type Output = Result<ParameterExpression, ExprError>;

    fn neg(self) -> Self::Output {
        self.apply_operation(Operand::Constant(Number::Int(-1)), false, OpCode::Mul)
    }
}

impl Neg for &Parameter {
    type Output = Result<ParameterExpression, ExprError>;

    fn neg(self) -> Self::Output {
        -self.expr()
    }
}
