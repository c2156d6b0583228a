//! Error types for the paramexpr crate.
//!
//! This module defines the error types that can occur while parsing formulas,
//! evaluating native expression trees and manipulating parameter expressions.
//! The main error types are:
//!
//! - `ConvertError`: Errors during conversion from the evalexpr AST to the native tree
//! - `EvalError`: Errors during numeric evaluation of a native tree
//! - `ExprError`: High-level errors raised by binding, substitution, operators,
//!   numeric casts and log replay
//!
//! Each error type implements the standard Error trait and provides detailed error messages.

use evalexpr::{DefaultNumericTypes, EvalexprError};
use thiserror::Error;

/// Errors that can occur during conversion from evalexpr AST to the native expression tree.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConvertError {
    /// Error when encountering an operator that has no native counterpart
    #[error("Unsupported operator: {0}")]
    UnsupportedOperator(String),
    /// Error when encountering a function that has no native counterpart
    #[error("Unsupported function: {0}")]
    UnsupportedFunction(String),
    /// Error when the root node does not have exactly one child
    #[error("Expected single child for root node: {0}")]
    RootNode(String),
    /// Error when a constant is neither an integer nor a float
    #[error("Expected numeric constant: {0}")]
    ConstOperator(String),
    /// Error when an identifier does not name one of the supplied parameters
    #[error("Variable not found: {0}")]
    VariableNotFound(String),
    /// Error when an operator node has an unexpected number of children
    #[error("Operator {operator} expects {expected} operand(s), got {got}")]
    Arity {
        operator: String,
        expected: usize,
        got: usize,
    },
}

/// Errors that can occur when evaluating a native expression tree to a number.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    /// The tree still references a free symbol
    #[error("Expression contains the free symbol '{0}'")]
    FreeSymbol(String),
}

/// High-level errors raised while working with parameter expressions.
///
/// None of these are retried or swallowed internally. A failed operation never
/// leaves a partially built expression behind: the receiver and every operand
/// are untouched.
#[derive(Debug, Error)]
pub enum ExprError {
    /// A bind or substitution references parameters absent from the expression
    #[error("Cannot bind parameters ({0}) not present in expression.")]
    UnknownParameters(String),
    /// A bind call supplies a symbolic value where a number is required
    #[error("Expression cannot bind non-numeric values ({0})")]
    NonNumericBinding(String),
    /// Two distinct parameters sharing one name would end up in one expression
    #[error("Name conflict applying operation for parameters: {0:?}")]
    NameConflict(Vec<String>),
    /// Division by the literal zero, or a binding that drives the value to infinity
    #[error("{0}")]
    DivisionByZero(String),
    /// The operand is not usable in arithmetic (NaN or infinite constants)
    #[error("Unsupported operand: {0}")]
    UnsupportedOperand(String),
    /// A numeric coercion was requested but the value cannot be reduced to that type
    #[error("{0}")]
    NotNumeric(String),
    /// A replay log is malformed and cannot be re-executed
    #[error("Cannot replay expression: {0}")]
    Replay(String),
    /// Error when parsing a formula string with evalexpr
    #[error("Failed to build Evalexpr AST")]
    Parse(#[from] EvalexprError<DefaultNumericTypes>),
    /// Error when converting the evalexpr AST into the native tree
    #[error("Failed to build native expression tree")]
    Convert(#[from] ConvertError),
    /// Error when the native tree cannot be evaluated
    #[error(transparent)]
    Eval(#[from] EvalError),
}
