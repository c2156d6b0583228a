//! Replaying an expression's log against another symbolic backend.
//!
//! A backend implements [`SymbolicExporter`]: how to make a symbol and a number,
//! how to apply a binary method, a unary function, a derivative and a simultaneous
//! substitution. [`export`] then walks the replay log in order, keeping a running
//! output:
//!
//! - a substitution record exports every symbolic value it carries and substitutes
//!   them into the output simultaneously
//! - an instruction resolves its operands (the running output, a literal, or a
//!   nested expression exported recursively) and dispatches on its op code
//!
//! A value with an empty log has no history to replay; it is handed to
//! [`SymbolicExporter::seed`], which by default rebuilds it from its native tree.

use tracing::debug;

use crate::errors::ExprError;
use crate::expr::{Expr, Function};
use crate::expression::ParameterExpression;
use crate::number::Number;
use crate::opcode::OpCode;
use crate::parameter::Parameter;
use crate::replay::{Instruction, OperandRef, ReplayEntry};
use crate::types::Operand;

/// The binary methods an exporter must support.
///
/// The `R`-prefixed methods are reflected: `receiver.rsub(arg)` means `arg - receiver`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryMethod {
    Add,
    RAdd,
    Sub,
    RSub,
    Mul,
    RMul,
    Div,
    RDiv,
    Pow,
    RPow,
}

impl BinaryMethod {
    fn for_code(op: OpCode) -> Option<Self> {
        Some(match op {
            OpCode::Add => BinaryMethod::Add,
            OpCode::Sub => BinaryMethod::Sub,
            OpCode::Mul => BinaryMethod::Mul,
            OpCode::Div => BinaryMethod::Div,
            OpCode::Pow => BinaryMethod::Pow,
            OpCode::RSub => BinaryMethod::RSub,
            OpCode::RDiv => BinaryMethod::RDiv,
            OpCode::RPow => BinaryMethod::RPow,
            _ => return None,
        })
    }

    /// The method computing the same value with receiver and argument swapped.
    pub fn reflected(self) -> Self {
        match self {
            BinaryMethod::Add => BinaryMethod::RAdd,
            BinaryMethod::RAdd => BinaryMethod::Add,
            BinaryMethod::Sub => BinaryMethod::RSub,
            BinaryMethod::RSub => BinaryMethod::Sub,
            BinaryMethod::Mul => BinaryMethod::RMul,
            BinaryMethod::RMul => BinaryMethod::Mul,
            BinaryMethod::Div => BinaryMethod::RDiv,
            BinaryMethod::RDiv => BinaryMethod::Div,
            BinaryMethod::Pow => BinaryMethod::RPow,
            BinaryMethod::RPow => BinaryMethod::Pow,
        }
    }
}

/// A symbolic backend a replay log can be exported to.
pub trait SymbolicExporter {
    /// The backend's expression type.
    type Expr: Clone;

    fn symbol(&self, parameter: &Parameter) -> Result<Self::Expr, ExprError>;

    fn number(&self, value: Number) -> Result<Self::Expr, ExprError>;

    /// Applies `receiver <method> arg`.
    fn method(
        &self,
        receiver: Self::Expr,
        method: BinaryMethod,
        arg: Operand<Self::Expr>,
    ) -> Result<Self::Expr, ExprError>;

    /// Applies a unary function; `op` is one of the non-binary codes.
    fn function(&self, op: OpCode, arg: Self::Expr) -> Result<Self::Expr, ExprError>;

    fn diff(
        &self,
        expr: Self::Expr,
        parameter: &Parameter,
    ) -> Result<Operand<Self::Expr>, ExprError>;

    /// Substitutes all bindings into `expr` at once.
    fn subs(
        &self,
        expr: Self::Expr,
        bindings: Vec<(Parameter, Operand<Self::Expr>)>,
    ) -> Result<Self::Expr, ExprError>;

    /// Exports a value without replay history.
    fn seed(&self, expr: &ParameterExpression) -> Result<Self::Expr, ExprError> {
        export_tree(self, expr, expr.native())
    }
}

/// Replays the log of `expr` against `exporter`.
///
/// # Errors
/// Returns `ExprError::Replay` for malformed logs, and any error the exporter raises.
pub fn export<E: SymbolicExporter + ?Sized>(
    expr: &ParameterExpression,
    exporter: &E,
) -> Result<E::Expr, ExprError> {
    let log = expr.replay_log();
    if log.is_empty() {
        return exporter.seed(expr);
    }
    debug!(entries = log.len(), "replaying expression");

    let mut output: Option<E::Expr> = None;
    for entry in log {
        let next = match entry {
            ReplayEntry::Substitution(substitution) => {
                let current = output.take().ok_or_else(|| {
                    ExprError::Replay("substitution before any output".to_string())
                })?;
                let bindings = substitution
                    .bindings
                    .iter()
                    .map(|(parameter, value)| {
                        let value = match value {
                            Operand::Constant(n) => Operand::Constant(*n),
                            Operand::Symbolic(e) => Operand::Symbolic(export(e, exporter)?),
                        };
                        Ok((parameter.clone(), value))
                    })
                    .collect::<Result<Vec<_>, ExprError>>()?;
                exporter.subs(current, bindings)?
            }
            ReplayEntry::Instruction(instruction) => {
                replay_instruction(exporter, instruction, output.as_ref())?
            }
        };
        output = Some(next);
    }
    output.ok_or_else(|| ExprError::Replay("log produced no output".to_string()))
}

fn replay_instruction<E: SymbolicExporter + ?Sized>(
    exporter: &E,
    instruction: &Instruction,
    prior: Option<&E::Expr>,
) -> Result<E::Expr, ExprError> {
    let op = instruction.op;
    let lhs = resolve(exporter, &instruction.lhs, prior, op)?;
    if !op.is_binary() {
        return exporter.function(op, lift(exporter, lhs)?);
    }

    let rhs = instruction
        .rhs
        .as_ref()
        .ok_or_else(|| ExprError::Replay(format!("'{op}' is missing its right operand")))?;
    if op == OpCode::Grad {
        let parameter = match rhs {
            OperandRef::Nested(e) => single_parameter(e),
            _ => None,
        }
        .ok_or_else(|| ExprError::Replay("gradient must be taken with respect to a parameter".to_string()))?;
        let derivative = exporter.diff(lift(exporter, lhs)?, &parameter)?;
        return lift(exporter, derivative);
    }

    let method = BinaryMethod::for_code(op)
        .ok_or_else(|| ExprError::Replay(format!("'{op}' cannot appear as an instruction")))?;
    match (lhs, resolve(exporter, rhs, prior, op)?) {
        // A plain number cannot start the operation; let the symbolic side do it
        (Operand::Constant(n), Operand::Symbolic(receiver)) if op.is_commutative() => {
            exporter.method(receiver, method.reflected(), Operand::Constant(n))
        }
        (lhs, rhs) => exporter.method(lift(exporter, lhs)?, method, rhs),
    }
}

fn resolve<E: SymbolicExporter + ?Sized>(
    exporter: &E,
    operand: &OperandRef,
    prior: Option<&E::Expr>,
    op: OpCode,
) -> Result<Operand<E::Expr>, ExprError> {
    match operand {
        OperandRef::PriorResult => prior.cloned().map(Operand::Symbolic).ok_or_else(|| {
            ExprError::Replay(format!("'{op}' references a prior result before any output"))
        }),
        OperandRef::Literal(n) => Ok(Operand::Constant(*n)),
        OperandRef::Nested(e) => Ok(Operand::Symbolic(export(e, exporter)?)),
    }
}

fn lift<E: SymbolicExporter + ?Sized>(
    exporter: &E,
    operand: Operand<E::Expr>,
) -> Result<E::Expr, ExprError> {
    match operand {
        Operand::Constant(n) => exporter.number(n),
        Operand::Symbolic(e) => Ok(e),
    }
}

fn single_parameter(expr: &ParameterExpression) -> Option<Parameter> {
    match expr.native() {
        Expr::Symbol(_) if expr.num_parameters() == 1 => expr.parameters().next().cloned(),
        _ => None,
    }
}

fn function_code(function: Function) -> OpCode {
    match function {
        Function::Sin => OpCode::Sin,
        Function::Cos => OpCode::Cos,
        Function::Tan => OpCode::Tan,
        Function::Asin => OpCode::Asin,
        Function::Acos => OpCode::Acos,
        Function::Atan => OpCode::Atan,
        Function::Exp => OpCode::Exp,
        Function::Ln => OpCode::Log,
        Function::Sign => OpCode::Sign,
        Function::Abs => OpCode::Abs,
        Function::Conj => OpCode::Conj,
    }
}

/// Rebuilds a native tree through the exporter, resolving symbols against `owner`.
fn export_tree<E: SymbolicExporter + ?Sized>(
    exporter: &E,
    owner: &ParameterExpression,
    tree: &Expr,
) -> Result<E::Expr, ExprError> {
    let binary = |method: BinaryMethod, lhs: &Expr, rhs: &Expr| {
        let receiver = export_tree(exporter, owner, lhs)?;
        let arg = match rhs {
            Expr::Const(n) => Operand::Constant(*n),
            other => Operand::Symbolic(export_tree(exporter, owner, other)?),
        };
        exporter.method(receiver, method, arg)
    };
    match tree {
        Expr::Const(n) => exporter.number(*n),
        Expr::Symbol(symbol) => {
            let parameter = owner.parameter_by_name(symbol.name()).ok_or_else(|| {
                ExprError::Replay(format!("symbol '{symbol}' has no parameter"))
            })?;
            exporter.symbol(parameter)
        }
        Expr::Add(l, r) => binary(BinaryMethod::Add, l, r),
        Expr::Sub(l, r) => binary(BinaryMethod::Sub, l, r),
        Expr::Mul(l, r) => binary(BinaryMethod::Mul, l, r),
        Expr::Div(l, r) => binary(BinaryMethod::Div, l, r),
        Expr::Pow(l, r) => binary(BinaryMethod::Pow, l, r),
        Expr::Neg(e) => {
            let receiver = export_tree(exporter, owner, e)?;
            exporter.method(receiver, BinaryMethod::Mul, Operand::Constant(Number::Int(-1)))
        }
        Expr::Func(function, e) => {
            let arg = export_tree(exporter, owner, e)?;
            exporter.function(function_code(*function), arg)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay::{appended, ReplayLog};
    use crate::types::SymbolMap;

    /// Renders every step in prefix form, to check the dispatch decisions.
    struct Trace;

    impl SymbolicExporter for Trace {
        type Expr = String;

        fn symbol(&self, parameter: &Parameter) -> Result<String, ExprError> {
            Ok(parameter.name().to_string())
        }

        fn number(&self, value: Number) -> Result<String, ExprError> {
            Ok(format!("#{value}"))
        }

        fn method(
            &self,
            receiver: String,
            method: BinaryMethod,
            arg: Operand<String>,
        ) -> Result<String, ExprError> {
            Ok(format!("{method:?}({receiver}, {arg})"))
        }

        fn function(&self, op: OpCode, arg: String) -> Result<String, ExprError> {
            Ok(format!("{op}({arg})"))
        }

        fn diff(&self, expr: String, parameter: &Parameter) -> Result<Operand<String>, ExprError> {
            Ok(Operand::Symbolic(format!("d({expr}, {parameter})")))
        }

        fn subs(
            &self,
            expr: String,
            bindings: Vec<(Parameter, Operand<String>)>,
        ) -> Result<String, ExprError> {
            let rendered: Vec<String> = bindings
                .iter()
                .map(|(parameter, value)| format!("{parameter}={value}"))
                .collect();
            Ok(format!("subs({expr}, [{}])", rendered.join(", ")))
        }
    }

    #[test]
    fn test_chain() {
        let p = Parameter::new("p");
        let expr = ((&p + 1).unwrap() * 2).unwrap().sin();
        assert_eq!(export(&expr, &Trace).unwrap(), "sin(Mul(Add(p, 1), 2))");
    }

    #[test]
    fn test_literal_receiver_dispatches_reflected_method() {
        let p = Parameter::new("p");
        assert_eq!(export(&(2_i64 + &p).unwrap(), &Trace).unwrap(), "RAdd(p, 2)");
        assert_eq!(export(&(2_i64 * &p).unwrap(), &Trace).unwrap(), "RMul(p, 2)");
        assert_eq!(export(&(2_i64 - &p).unwrap(), &Trace).unwrap(), "RSub(p, 2)");
    }

    #[test]
    fn test_nested_operand() {
        let p = Parameter::new("p");
        let q = Parameter::new("q");
        let right = (&q * 3).unwrap();
        let expr = ((&p + 1).unwrap() - right).unwrap();
        assert_eq!(
            export(&expr, &Trace).unwrap(),
            "Sub(Add(p, 1), Mul(q, 3))"
        );
    }

    #[test]
    fn test_substitution_and_gradient() {
        let p = Parameter::new("p");
        let q = Parameter::new("q");
        let expr = (&p * &p).unwrap();
        let substituted = expr
            .subs(&std::collections::BTreeMap::from([(p.clone(), (&q + 1).unwrap())]), false)
            .unwrap();
        assert_eq!(
            export(&substituted, &Trace).unwrap(),
            "subs(Mul(p, p), [p=Add(q, 1)])"
        );

        let Operand::Symbolic(gradient) = expr.gradient(&p).unwrap() else {
            panic!("expected a symbolic gradient");
        };
        assert_eq!(export(&gradient, &Trace).unwrap(), "d(Mul(p, p), p)");
    }

    #[test]
    fn test_seed_exports_native_tree() {
        let expr = ParameterExpression::parse("-x / 2 + abs(y)").unwrap();
        assert_eq!(
            export(&expr, &Trace).unwrap(),
            "Add(Div(Mul(x, -1), 2), abs(y))"
        );
        assert_eq!(
            export(&ParameterExpression::constant(1.5), &Trace).unwrap(),
            "#1.5"
        );
    }

    #[test]
    fn test_malformed_logs() {
        let p = Parameter::new("p");
        let symbols = SymbolMap::unit(p.clone(), crate::expr::Symbol::new("p"));

        let dangling = appended(
            &ReplayLog::new(),
            Instruction::unary(OpCode::Sin, OperandRef::PriorResult),
        );
        let expr = ParameterExpression::from_parts(symbols.clone(), Expr::symbol("p"), dangling);
        assert!(matches!(export(&expr, &Trace), Err(ExprError::Replay(_))));

        let bad_gradient = appended(
            &ReplayLog::new(),
            Instruction::binary(
                OpCode::Grad,
                OperandRef::Nested(p.expr()),
                OperandRef::Literal(Number::Int(1)),
            ),
        );
        let expr = ParameterExpression::from_parts(symbols.clone(), Expr::symbol("p"), bad_gradient);
        assert!(matches!(export(&expr, &Trace), Err(ExprError::Replay(_))));

        let bad_code = appended(
            &ReplayLog::new(),
            Instruction::binary(
                OpCode::Substitute,
                OperandRef::Nested(p.expr()),
                OperandRef::Literal(Number::Int(1)),
            ),
        );
        let expr = ParameterExpression::from_parts(symbols, Expr::symbol("p"), bad_code);
        assert!(matches!(export(&expr, &Trace), Err(ExprError::Replay(_))));
    }
}
