//! Exports expressions as SymPy source code.
//!
//! The output is a Python expression over `Symbol`, `I`, `oo` and SymPy's functions,
//! ready to be evaluated in a namespace that has done `from sympy import *`.

use crate::errors::ExprError;
use crate::export::{BinaryMethod, SymbolicExporter};
use crate::number::Number;
use crate::opcode::OpCode;
use crate::parameter::Parameter;
use crate::types::Operand;

/// Renders a replay log as a SymPy expression string.
///
/// # Example
/// ```rust
/// use paramexpr::{backends::sympy::SympyExporter, export, Parameter};
///
/// let p = Parameter::new("p");
/// let expr = ((&p + 1).unwrap() * 2).unwrap();
/// assert_eq!(export(&expr, &SympyExporter).unwrap(), "((Symbol('p') + 1) * 2)");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SympyExporter;

impl SympyExporter {
    fn render(&self, operand: Operand<String>) -> String {
        match operand {
            Operand::Constant(n) => number_source(n),
            Operand::Symbolic(source) => source,
        }
    }
}

fn number_source(value: Number) -> String {
    match value {
        Number::Int(n) => n.to_string(),
        Number::Float(x) => float_source(x),
        Number::Complex(z) => format!("({} + {}*I)", float_source(z.re), float_source(z.im)),
    }
}

fn float_source(x: f64) -> String {
    if x.is_nan() {
        "nan".to_string()
    } else if x.is_infinite() {
        if x > 0.0 { "oo" } else { "-oo" }.to_string()
    } else {
        format!("{x:?}")
    }
}

fn symbol_source(parameter: &Parameter) -> String {
    format!("Symbol('{}')", parameter.name())
}

impl SymbolicExporter for SympyExporter {
    type Expr = String;

    fn symbol(&self, parameter: &Parameter) -> Result<Self::Expr, ExprError> {
        Ok(symbol_source(parameter))
    }

    fn number(&self, value: Number) -> Result<Self::Expr, ExprError> {
        Ok(number_source(value))
    }

    fn method(
        &self,
        receiver: Self::Expr,
        method: BinaryMethod,
        arg: Operand<Self::Expr>,
    ) -> Result<Self::Expr, ExprError> {
        let arg = self.render(arg);
        let (lhs, symbol, rhs) = match method {
            BinaryMethod::Add => (receiver, "+", arg),
            BinaryMethod::RAdd => (arg, "+", receiver),
            BinaryMethod::Sub => (receiver, "-", arg),
            BinaryMethod::RSub => (arg, "-", receiver),
            BinaryMethod::Mul => (receiver, "*", arg),
            BinaryMethod::RMul => (arg, "*", receiver),
            BinaryMethod::Div => (receiver, "/", arg),
            BinaryMethod::RDiv => (arg, "/", receiver),
            BinaryMethod::Pow => (receiver, "**", arg),
            BinaryMethod::RPow => (arg, "**", receiver),
        };
        Ok(format!("({lhs} {symbol} {rhs})"))
    }

    fn function(&self, op: OpCode, arg: Self::Expr) -> Result<Self::Expr, ExprError> {
        let name = match op {
            OpCode::Asin => "asin",
            OpCode::Acos => "acos",
            OpCode::Atan => "atan",
            OpCode::Abs => "Abs",
            OpCode::Sin
            | OpCode::Cos
            | OpCode::Tan
            | OpCode::Exp
            | OpCode::Log
            | OpCode::Sign
            | OpCode::Conj => op.method_name(),
            other => {
                return Err(ExprError::Replay(format!("'{other}' is not a unary function")))
            }
        };
        Ok(format!("{name}({arg})"))
    }

    fn diff(
        &self,
        expr: Self::Expr,
        parameter: &Parameter,
    ) -> Result<Operand<Self::Expr>, ExprError> {
        Ok(Operand::Symbolic(format!(
            "diff({expr}, {})",
            symbol_source(parameter)
        )))
    }

    fn subs(
        &self,
        expr: Self::Expr,
        bindings: Vec<(Parameter, Operand<Self::Expr>)>,
    ) -> Result<Self::Expr, ExprError> {
        let entries = bindings
            .into_iter()
            .map(|(parameter, value)| format!("{}: {}", symbol_source(&parameter), self.render(value)))
            .collect::<Vec<_>>()
            .join(", ");
        Ok(format!("({expr}).subs({{{entries}}}, simultaneous=True)"))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::export::export;
    use crate::expression::ParameterExpression;
    use crate::types::Bindings;
    use num_complex::Complex64;

    fn sympy(expr: &ParameterExpression) -> String {
        export(expr, &SympyExporter).unwrap()
    }

    #[test]
    fn test_chain() {
        let p = Parameter::new("p");
        let expr = ((&p + 1).unwrap() * 2).unwrap();
        assert_eq!(sympy(&expr), "((Symbol('p') + 1) * 2)");
        assert_eq!(sympy(&expr.arcsin()), "asin(((Symbol('p') + 1) * 2))");
    }

    #[test]
    fn test_reflected_operations() {
        let p = Parameter::new("p");
        assert_eq!(sympy(&(2_i64 + &p).unwrap()), "(2 + Symbol('p'))");
        assert_eq!(sympy(&(2_i64 - &p).unwrap()), "(2 - Symbol('p'))");
        assert_eq!(sympy(&(1.5 / &p).unwrap()), "(1.5 / Symbol('p'))");
        assert_eq!(sympy(&p.expr().rpow(2).unwrap()), "(2 ** Symbol('p'))");
    }

    #[test]
    fn test_function_names() {
        let p = Parameter::new("p");
        let e = p.expr();
        assert_eq!(sympy(&e.abs()), "Abs(Symbol('p'))");
        assert_eq!(sympy(&e.arctan()), "atan(Symbol('p'))");
        assert_eq!(sympy(&e.arccos()), "acos(Symbol('p'))");
        assert_eq!(sympy(&e.log()), "log(Symbol('p'))");
        assert_eq!(sympy(&e.conjugate()), "conjugate(Symbol('p'))");
    }

    #[test]
    fn test_substitutions() {
        let p = Parameter::new("p");
        let q = Parameter::new("q");
        let expr = (&p * &q).unwrap();
        let bound = expr
            .bind(&Bindings::from([(p.clone(), Operand::Constant(Number::Int(3)))]), false)
            .unwrap();
        assert_eq!(
            sympy(&bound),
            "((Symbol('p') * Symbol('q'))).subs({Symbol('p'): 3}, simultaneous=True)"
        );

        let replaced = expr
            .subs(&BTreeMap::from([(q.clone(), (&p + 1).unwrap())]), false)
            .unwrap();
        assert_eq!(
            sympy(&replaced),
            "((Symbol('p') * Symbol('q'))).subs({Symbol('q'): (Symbol('p') + 1)}, simultaneous=True)"
        );
    }

    #[test]
    fn test_gradient() {
        let p = Parameter::new("p");
        let Operand::Symbolic(derivative) = (&p * &p).unwrap().gradient(&p).unwrap() else {
            panic!("gradient of p*p should be symbolic");
        };
        assert_eq!(
            sympy(&derivative),
            "diff((Symbol('p') * Symbol('p')), Symbol('p'))"
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(number_source(Number::Int(-4)), "-4");
        assert_eq!(number_source(Number::Float(0.25)), "0.25");
        assert_eq!(number_source(Number::Float(f64::NEG_INFINITY)), "-oo");
        assert_eq!(
            number_source(Number::Complex(Complex64::new(1.0, -2.0))),
            "(1.0 + -2.0*I)"
        );
    }

    #[test]
    fn test_seed_from_parsed_formula() {
        let expr = ParameterExpression::parse("2 * x").unwrap();
        assert_eq!(sympy(&expr), "(2 * Symbol('x'))");
    }
}
