//! Conversion module for transforming evalexpr AST nodes into the native expression tree.
//!
//! Formulas are parsed with `evalexpr::build_operator_tree` and then walked here to build
//! an [`Expr`]. Identifiers are resolved against a caller-supplied symbol table so a
//! formula can only ever reference parameters its owner knows about.
//!
//! The main entry points are `parse`, which goes from a string to a tree, and
//! `build_ast`, which recursively converts an already parsed evalexpr node.

use std::collections::{BTreeSet, HashMap};

use evalexpr::{build_operator_tree, Node, Operator};

use crate::errors::{ConvertError, ExprError};
use crate::expr::{Expr, Function, Symbol};

/// Parses a formula and converts it into a native tree.
///
/// # Arguments
/// * `formula` - The formula to parse, e.g. `"2*x + sin(y)"`
/// * `symbols` - Identifier to symbol mapping; every identifier in the formula must appear here
pub fn parse(formula: &str, symbols: &HashMap<String, Symbol>) -> Result<Expr, ExprError> {
    let node: Node = build_operator_tree(formula)?;
    Ok(build_ast(&node, symbols)?)
}

/// Converts an evalexpr AST node into the native expression representation.
///
/// Trees are assembled through the smart constructors of [`Expr`], so the result is
/// already simplified.
///
/// # Examples of supported operations:
/// * Basic arithmetic: +, -, *, /, ^ and unary minus
/// * Constants: integers and floats
/// * Functions: sin, cos, tan, asin, acos, atan (and their `arc` spellings), exp,
///   ln/log, sign, abs, conj/conjugate, sqrt
pub fn build_ast(node: &Node, symbols: &HashMap<String, Symbol>) -> Result<Expr, ConvertError> {
    match node.operator() {
        // Addition and multiplication may carry more than two children; fold them left to right
        Operator::Add => fold_children(node, "+", symbols, Expr::add),
        Operator::Mul => fold_children(node, "*", symbols, Expr::mul),
        Operator::Sub => {
            let [lhs, rhs] = binary(node, "-")?;
            Ok(Expr::sub(build_ast(lhs, symbols)?, build_ast(rhs, symbols)?))
        }
        Operator::Div => {
            let [lhs, rhs] = binary(node, "/")?;
            Ok(Expr::div(build_ast(lhs, symbols)?, build_ast(rhs, symbols)?))
        }
        Operator::Exp => {
            let [base, exponent] = binary(node, "^")?;
            Ok(Expr::pow(
                build_ast(base, symbols)?,
                build_ast(exponent, symbols)?,
            ))
        }
        Operator::Neg => {
            let arg = unary(node, "-")?;
            Ok(Expr::neg(build_ast(arg, symbols)?))
        }
        Operator::Const { value } => match value {
            evalexpr::Value::Float(f) => Ok(Expr::constant(*f)),
            evalexpr::Value::Int(i) => Ok(Expr::constant(*i)),
            _ => Err(ConvertError::ConstOperator(format!("{:?}", value))),
        },
        Operator::VariableIdentifierRead { identifier } => symbols
            .get(identifier.as_str())
            .map(|symbol| Expr::Symbol(symbol.clone()))
            .ok_or_else(|| ConvertError::VariableNotFound(identifier.to_string())),
        Operator::FunctionIdentifier { identifier } => {
            let arg = build_ast(unary(node, identifier)?, symbols)?;
            if identifier == "sqrt" {
                return Ok(Expr::pow(arg, Expr::constant(0.5)));
            }
            Function::from_name(identifier)
                .map(|function| Expr::func(function, arg))
                .ok_or_else(|| ConvertError::UnsupportedFunction(identifier.to_string()))
        }
        // Root node (also produced by parentheses) - should have exactly one child
        Operator::RootNode => match node.children() {
            [child] => build_ast(child, symbols),
            children => Err(ConvertError::RootNode(format!("{:?}", children))),
        },
        other => Err(ConvertError::UnsupportedOperator(format!("{:?}", other))),
    }
}

fn fold_children(
    node: &Node,
    operator: &str,
    symbols: &HashMap<String, Symbol>,
    combine: fn(Expr, Expr) -> Expr,
) -> Result<Expr, ConvertError> {
    let (first, rest) = node.children().split_first().ok_or(ConvertError::Arity {
        operator: operator.to_string(),
        expected: 2,
        got: 0,
    })?;
    rest.iter()
        .try_fold(build_ast(first, symbols)?, |acc, child| {
            Ok(combine(acc, build_ast(child, symbols)?))
        })
}

fn binary<'a>(node: &'a Node, operator: &str) -> Result<[&'a Node; 2], ConvertError> {
    match node.children() {
        [lhs, rhs] => Ok([lhs, rhs]),
        children => Err(ConvertError::Arity {
            operator: operator.to_string(),
            expected: 2,
            got: children.len(),
        }),
    }
}

fn unary<'a>(node: &'a Node, operator: &str) -> Result<&'a Node, ConvertError> {
    match node.children() {
        [arg] => Ok(arg),
        children => Err(ConvertError::Arity {
            operator: operator.to_string(),
            expected: 1,
            got: children.len(),
        }),
    }
}

/// Extracts all identifier names from a formula, sorted alphabetically.
pub fn extract_symbols(node: &Node) -> Vec<String> {
    let mut symbols = BTreeSet::new();
    extract_symbols_from_node(node, &mut symbols);
    symbols.into_iter().collect()
}

/// Recursively extracts variable names from an evalexpr tree node.
fn extract_symbols_from_node(node: &Node, symbols: &mut BTreeSet<String>) {
    match node.operator() {
        Operator::VariableIdentifierRead { identifier } => {
            symbols.insert(identifier.to_string());
        }
        _ => {
            for child in node.children() {
                extract_symbols_from_node(child, symbols);
            }
        }
    }
}
