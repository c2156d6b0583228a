//! Replays a log against [`ParameterExpression`] itself.
//!
//! Exporting through [`NativeReplay`] rebuilds an expression from its history, one
//! recorded operation at a time. The result compares equal to the source, which makes
//! this backend the reference for checking that a log is complete.
//!
//! ```rust
//! use paramexpr::{export, NativeReplay, Parameter};
//!
//! let p = Parameter::new("p");
//! let expr = ((&p + 1).unwrap() * 2).unwrap().sin();
//! let rebuilt = export(&expr, &NativeReplay).unwrap();
//! assert_eq!(rebuilt, expr);
//! ```

use std::collections::BTreeMap;

use crate::errors::ExprError;
use crate::export::{BinaryMethod, SymbolicExporter};
use crate::expression::ParameterExpression;
use crate::number::Number;
use crate::opcode::OpCode;
use crate::parameter::Parameter;
use crate::types::{Bindings, Operand};

#[derive(Debug, Clone, Copy, Default)]
pub struct NativeReplay;

impl SymbolicExporter for NativeReplay {
    type Expr = ParameterExpression;

    fn symbol(&self, parameter: &Parameter) -> Result<Self::Expr, ExprError> {
        Ok(parameter.expr())
    }

    fn number(&self, value: Number) -> Result<Self::Expr, ExprError> {
        Ok(ParameterExpression::constant(value))
    }

    fn method(
        &self,
        receiver: Self::Expr,
        method: BinaryMethod,
        arg: Operand<Self::Expr>,
    ) -> Result<Self::Expr, ExprError> {
        match method {
            BinaryMethod::Add => receiver + arg,
            BinaryMethod::RAdd => receiver.radd(arg),
            BinaryMethod::Sub => receiver - arg,
            BinaryMethod::RSub => receiver.rsub(arg),
            BinaryMethod::Mul => receiver * arg,
            BinaryMethod::RMul => receiver.rmul(arg),
            BinaryMethod::Div => receiver / arg,
            BinaryMethod::RDiv => receiver.rdiv(arg),
            BinaryMethod::Pow => receiver.pow(arg),
            BinaryMethod::RPow => receiver.rpow(arg),
        }
    }

    fn function(&self, op: OpCode, arg: Self::Expr) -> Result<Self::Expr, ExprError> {
        Ok(match op {
            OpCode::Sin => arg.sin(),
            OpCode::Cos => arg.cos(),
            OpCode::Tan => arg.tan(),
            OpCode::Asin => arg.arcsin(),
            OpCode::Acos => arg.arccos(),
            OpCode::Atan => arg.arctan(),
            OpCode::Exp => arg.exp(),
            OpCode::Log => arg.log(),
            OpCode::Sign => arg.sign(),
            OpCode::Abs => arg.abs(),
            OpCode::Conj => arg.conjugate(),
            other => {
                return Err(ExprError::Replay(format!("'{other}' is not a unary function")))
            }
        })
    }

    fn diff(
        &self,
        expr: Self::Expr,
        parameter: &Parameter,
    ) -> Result<Operand<Self::Expr>, ExprError> {
        expr.gradient(parameter)
    }

    fn subs(
        &self,
        expr: Self::Expr,
        bindings: Vec<(Parameter, Operand<Self::Expr>)>,
    ) -> Result<Self::Expr, ExprError> {
        if bindings.iter().all(|(_, value)| !value.is_symbolic()) {
            let values: Bindings = bindings.into_iter().collect();
            return expr.bind(&values, true);
        }
        let map: BTreeMap<Parameter, ParameterExpression> = bindings
            .into_iter()
            .map(|(parameter, value)| {
                let value = match value {
                    Operand::Constant(n) => ParameterExpression::constant(n),
                    Operand::Symbolic(e) => e,
                };
                (parameter, value)
            })
            .collect();
        expr.subs(&map, true)
    }

    /// A value without history is already native.
    fn seed(&self, expr: &ParameterExpression) -> Result<Self::Expr, ExprError> {
        Ok(expr.clone())
    }
}
