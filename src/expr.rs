//! Native expression tree used as the evaluator behind parameter expressions.
//!
//! This module defines the algebraic value type that parameter expressions
//! delegate all actual algebra to. The main types are:
//!
//! - `Expr`: An enum representing the nodes of an expression tree
//! - `Symbol`: The evaluator's handle for a free parameter (its name)
//! - `Function`: The unary functions a tree can apply
//!
//! # Expression Tree Structure
//! The expression tree is built recursively with each node being one of:
//! - Leaf nodes: Constants and Symbols
//! - Unary operations: Neg and Func (sin, cos, tan, asin, acos, atan, exp, ln, sign, abs, conj)
//! - Binary operations: Add, Sub, Mul, Div, Pow
//!
//! # Construction
//! Trees are assembled through smart constructors (`Expr::add`, `Expr::mul`, ...)
//! which fold constants and drop neutral elements as they go:
//! - Constant folding (e.g. 2 + 3 → 5, 1 / 0 → inf, x / 0 → inf)
//! - Identity rules (e.g. x + 0 → x, x * 1 → x, x ^ 1 → x)
//! - Annihilation (x * 0 → 0). This can remove a symbol from the tree, so callers
//!   must never infer which parameters were bound from the symbols that remain.
//! - Cancellation (x - x → 0, x / x → 1, --x → x)
//!
//! Every tree produced by the smart constructors is already simplified, so
//! rebuilding one without replacements gives it back unchanged.
//!
//! # Symbolic Differentiation
//! The derivative method applies the sum, product, quotient, power and chain
//! rules for every node. Functions are differentiated under the assumption
//! that the expression is real-valued (d|f| = sign(f) f').
//!
//! # Substitution
//! `substitute` replaces symbols simultaneously: a replacement is never itself
//! substituted again, so swapping two symbols is a single well-defined call.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::errors::EvalError;
use crate::number::Number;

/// The evaluator's handle for a free parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(Arc<str>);

impl Symbol {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Symbol(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unary functions supported by the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Exp,
    Ln,
    Sign,
    Abs,
    Conj,
}

impl Function {
    /// Name used when rendering a tree; parseable by [`Function::from_name`].
    pub fn name(self) -> &'static str {
        match self {
            Function::Sin => "sin",
            Function::Cos => "cos",
            Function::Tan => "tan",
            Function::Asin => "asin",
            Function::Acos => "acos",
            Function::Atan => "atan",
            Function::Exp => "exp",
            Function::Ln => "log",
            Function::Sign => "sign",
            Function::Abs => "abs",
            Function::Conj => "conj",
        }
    }

    /// Looks a function up by name, accepting the common aliases.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "sin" => Function::Sin,
            "cos" => Function::Cos,
            "tan" => Function::Tan,
            "asin" | "arcsin" => Function::Asin,
            "acos" | "arccos" => Function::Acos,
            "atan" | "arctan" => Function::Atan,
            "exp" => Function::Exp,
            "ln" | "log" => Function::Ln,
            "sign" => Function::Sign,
            "abs" => Function::Abs,
            "conj" | "conjugate" => Function::Conj,
            _ => return None,
        })
    }

    /// Evaluates the function on a number.
    pub fn eval(self, x: Number) -> Number {
        match self {
            Function::Sin => x.sin(),
            Function::Cos => x.cos(),
            Function::Tan => x.tan(),
            Function::Asin => x.asin(),
            Function::Acos => x.acos(),
            Function::Atan => x.atan(),
            Function::Exp => x.exp(),
            Function::Ln => x.ln(),
            Function::Sign => x.sign(),
            Function::Abs => x.abs(),
            Function::Conj => x.conj(),
        }
    }
}

/// An expression tree node representing mathematical operations.
///
/// Equality is structural; two trees built through the same sequence of smart
/// constructor calls always compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    /// A numeric constant
    Const(Number),
    /// A free symbol
    Symbol(Symbol),
    /// Addition of two expressions
    Add(Box<Expr>, Box<Expr>),
    /// Subtraction of two expressions
    Sub(Box<Expr>, Box<Expr>),
    /// Multiplication of two expressions
    Mul(Box<Expr>, Box<Expr>),
    /// Division of two expressions
    Div(Box<Expr>, Box<Expr>),
    /// Exponentiation of an expression by another expression
    Pow(Box<Expr>, Box<Expr>),
    /// Negation of an expression
    Neg(Box<Expr>),
    /// A unary function applied to an expression
    Func(Function, Box<Expr>),
}

impl Expr {
    /// Creates a symbol leaf.
    pub fn symbol(name: impl Into<Arc<str>>) -> Expr {
        Expr::Symbol(Symbol::new(name))
    }

    /// Creates a constant leaf.
    pub fn constant(value: impl Into<Number>) -> Expr {
        Expr::Const(value.into())
    }

    pub fn add(lhs: Expr, rhs: Expr) -> Expr {
        match (lhs, rhs) {
            (Expr::Const(a), Expr::Const(b)) => Expr::Const(a + b),
            (expr, Expr::Const(z)) | (Expr::Const(z), expr) if z.is_zero() => expr,
            (l, r) => Expr::Add(Box::new(l), Box::new(r)),
        }
    }

    pub fn sub(lhs: Expr, rhs: Expr) -> Expr {
        match (lhs, rhs) {
            (Expr::Const(a), Expr::Const(b)) => Expr::Const(a - b),
            (expr, Expr::Const(z)) if z.is_zero() => expr,
            (Expr::Const(z), expr) if z.is_zero() => Expr::neg(expr),
            (l, r) if l == r => Expr::Const(Number::ZERO),
            (l, r) => Expr::Sub(Box::new(l), Box::new(r)),
        }
    }

    pub fn mul(lhs: Expr, rhs: Expr) -> Expr {
        match (lhs, rhs) {
            (Expr::Const(a), Expr::Const(b)) => Expr::Const(a * b),
            (_, Expr::Const(z)) | (Expr::Const(z), _) if z.is_zero() => Expr::Const(z),
            (expr, Expr::Const(one)) | (Expr::Const(one), expr) if one == Number::ONE => expr,
            (expr, Expr::Const(m)) | (Expr::Const(m), expr) if m == Number::Int(-1) => {
                Expr::neg(expr)
            }
            (l, r) => Expr::Mul(Box::new(l), Box::new(r)),
        }
    }

    pub fn div(lhs: Expr, rhs: Expr) -> Expr {
        match (lhs, rhs) {
            (Expr::Const(a), Expr::Const(b)) => Expr::Const(a / b),
            (Expr::Const(z), _) if z.is_zero() => Expr::Const(z),
            // Unsigned infinity: the sign of x is unknown
            (_, Expr::Const(z)) if z.is_zero() => Expr::Const(Number::Float(f64::INFINITY)),
            (expr, Expr::Const(one)) if one == Number::ONE => expr,
            (expr, Expr::Const(m)) if m == Number::Int(-1) => Expr::neg(expr),
            (l, r) if l == r => Expr::Const(Number::ONE),
            (l, r) => Expr::Div(Box::new(l), Box::new(r)),
        }
    }

    pub fn pow(base: Expr, exponent: Expr) -> Expr {
        match (base, exponent) {
            (Expr::Const(a), Expr::Const(b)) => Expr::Const(a.pow(b)),
            (_, Expr::Const(z)) if z.is_zero() => Expr::Const(Number::ONE),
            (expr, Expr::Const(one)) if one == Number::ONE => expr,
            (Expr::Const(one), _) if one == Number::ONE => Expr::Const(Number::ONE),
            (b, e) => Expr::Pow(Box::new(b), Box::new(e)),
        }
    }

    pub fn neg(expr: Expr) -> Expr {
        match expr {
            Expr::Const(n) => Expr::Const(-n),
            Expr::Neg(inner) => *inner,
            other => Expr::Neg(Box::new(other)),
        }
    }

    pub fn func(function: Function, arg: Expr) -> Expr {
        match (function, arg) {
            (f, Expr::Const(n)) => Expr::Const(f.eval(n)),
            (Function::Abs, Expr::Neg(inner)) => Expr::func(Function::Abs, *inner),
            (Function::Abs, inner @ Expr::Func(Function::Abs, _)) => inner,
            (Function::Sign, inner @ Expr::Func(Function::Sign, _)) => inner,
            (Function::Conj, Expr::Func(Function::Conj, inner)) => *inner,
            (f, other) => Expr::Func(f, Box::new(other)),
        }
    }

    /// Returns the constant value if this node is a constant leaf.
    pub fn as_constant(&self) -> Option<Number> {
        match self {
            Expr::Const(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns true if any constant in the tree is infinite.
    ///
    /// An infinite leaf keeps the whole expression infinite however the remaining
    /// symbols are later bound, so `inf + q` counts.
    pub fn is_infinite(&self) -> bool {
        match self {
            Expr::Const(n) => n.is_infinite(),
            Expr::Symbol(_) => false,
            Expr::Add(l, r)
            | Expr::Sub(l, r)
            | Expr::Mul(l, r)
            | Expr::Div(l, r)
            | Expr::Pow(l, r) => l.is_infinite() || r.is_infinite(),
            Expr::Neg(e) | Expr::Func(_, e) => e.is_infinite(),
        }
    }

    /// Collects the free symbols of the tree.
    pub fn symbols(&self) -> BTreeSet<Symbol> {
        let mut symbols = BTreeSet::new();
        self.collect_symbols(&mut symbols);
        symbols
    }

    fn collect_symbols(&self, symbols: &mut BTreeSet<Symbol>) {
        match self {
            Expr::Const(_) => {}
            Expr::Symbol(s) => {
                symbols.insert(s.clone());
            }
            Expr::Add(l, r)
            | Expr::Sub(l, r)
            | Expr::Mul(l, r)
            | Expr::Div(l, r)
            | Expr::Pow(l, r) => {
                l.collect_symbols(symbols);
                r.collect_symbols(symbols);
            }
            Expr::Neg(e) | Expr::Func(_, e) => e.collect_symbols(symbols),
        }
    }

    /// Returns true if the named symbol occurs anywhere in the tree.
    pub fn contains_symbol(&self, name: &str) -> bool {
        match self {
            Expr::Const(_) => false,
            Expr::Symbol(s) => s.name() == name,
            Expr::Add(l, r)
            | Expr::Sub(l, r)
            | Expr::Mul(l, r)
            | Expr::Div(l, r)
            | Expr::Pow(l, r) => l.contains_symbol(name) || r.contains_symbol(name),
            Expr::Neg(e) | Expr::Func(_, e) => e.contains_symbol(name),
        }
    }

    /// Evaluates the tree to a number.
    ///
    /// # Errors
    /// Returns `EvalError::FreeSymbol` if any symbol remains in the tree.
    pub fn value(&self) -> Result<Number, EvalError> {
        Ok(match self {
            Expr::Const(n) => *n,
            Expr::Symbol(s) => return Err(EvalError::FreeSymbol(s.name().to_string())),
            Expr::Add(l, r) => l.value()? + r.value()?,
            Expr::Sub(l, r) => l.value()? - r.value()?,
            Expr::Mul(l, r) => l.value()? * r.value()?,
            Expr::Div(l, r) => l.value()? / r.value()?,
            Expr::Pow(l, r) => l.value()?.pow(r.value()?),
            Expr::Neg(e) => -e.value()?,
            Expr::Func(f, e) => f.eval(e.value()?),
        })
    }

    /// Replaces symbols by expressions, simultaneously.
    ///
    /// Symbols absent from `replacements` are left untouched. The replacement
    /// trees are inserted as-is and never substituted a second time.
    pub fn substitute(&self, replacements: &HashMap<Symbol, Expr>) -> Box<Expr> {
        Box::new(self.rebuild(&|symbol| replacements.get(symbol).cloned()))
    }

    /// Replaces symbols by numeric values and folds the result.
    pub fn bind(&self, values: &HashMap<Symbol, Number>) -> Box<Expr> {
        Box::new(self.rebuild(&|symbol| values.get(symbol).map(|n| Expr::Const(*n))))
    }

    fn rebuild(&self, leaf: &dyn Fn(&Symbol) -> Option<Expr>) -> Expr {
        match self {
            Expr::Const(_) => self.clone(),
            Expr::Symbol(s) => leaf(s).unwrap_or_else(|| self.clone()),
            Expr::Add(l, r) => Expr::add(l.rebuild(leaf), r.rebuild(leaf)),
            Expr::Sub(l, r) => Expr::sub(l.rebuild(leaf), r.rebuild(leaf)),
            Expr::Mul(l, r) => Expr::mul(l.rebuild(leaf), r.rebuild(leaf)),
            Expr::Div(l, r) => Expr::div(l.rebuild(leaf), r.rebuild(leaf)),
            Expr::Pow(l, r) => Expr::pow(l.rebuild(leaf), r.rebuild(leaf)),
            Expr::Neg(e) => Expr::neg(e.rebuild(leaf)),
            Expr::Func(f, e) => Expr::func(*f, e.rebuild(leaf)),
        }
    }

    /// Computes the symbolic derivative of this expression with respect to a symbol.
    ///
    /// The rules implemented are:
    /// - d/dx(c) = 0 for constants, d/dx(x) = 1, d/dx(y) = 0 for other symbols
    /// - Sum rule: d/dx(f ± g) = df/dx ± dg/dx
    /// - Product rule: d/dx(f * g) = f * dg/dx + g * df/dx
    /// - Quotient rule: d/dx(f/g) = (g * df/dx - f * dg/dx) / g^2
    /// - Power rule: d/dx(f^c) = c * f^(c-1) * df/dx, d/dx(c^g) = c^g * ln(c) * dg/dx,
    ///   and d/dx(f^g) = f^g * (dg/dx * ln(f) + g * (df/dx) / f) in general
    /// - Chain rule for every function, e.g. d/dx(sin(f)) = cos(f) * df/dx
    ///
    /// # Arguments
    /// * `with_respect_to` - The name of the symbol to differentiate with respect to
    ///
    /// # Returns
    /// A new, already simplified, expression tree representing the derivative
    pub fn derivative(&self, with_respect_to: &str) -> Box<Expr> {
        Box::new(self.derive(with_respect_to))
    }

    fn derive(&self, wrt: &str) -> Expr {
        match self {
            Expr::Const(_) => Expr::Const(Number::ZERO),
            Expr::Symbol(s) if s.name() == wrt => Expr::Const(Number::ONE),
            Expr::Symbol(_) => Expr::Const(Number::ZERO),
            Expr::Add(l, r) => Expr::add(l.derive(wrt), r.derive(wrt)),
            Expr::Sub(l, r) => Expr::sub(l.derive(wrt), r.derive(wrt)),
            Expr::Mul(l, r) => Expr::add(
                Expr::mul((**l).clone(), r.derive(wrt)),
                Expr::mul((**r).clone(), l.derive(wrt)),
            ),
            Expr::Div(l, r) => Expr::div(
                Expr::sub(
                    Expr::mul((**r).clone(), l.derive(wrt)),
                    Expr::mul((**l).clone(), r.derive(wrt)),
                ),
                Expr::pow((**r).clone(), Expr::constant(2)),
            ),
            Expr::Pow(base, exponent) => {
                let (b, e) = ((**base).clone(), (**exponent).clone());
                if !exponent.contains_symbol(wrt) {
                    let lowered = Expr::pow(b, Expr::sub(e.clone(), Expr::constant(1)));
                    Expr::mul(Expr::mul(e, lowered), base.derive(wrt))
                } else if !base.contains_symbol(wrt) {
                    Expr::mul(
                        Expr::mul(self.clone(), Expr::func(Function::Ln, b)),
                        exponent.derive(wrt),
                    )
                } else {
                    let log_term = Expr::mul(exponent.derive(wrt), Expr::func(Function::Ln, b.clone()));
                    let ratio_term = Expr::mul(e, Expr::div(base.derive(wrt), b));
                    Expr::mul(self.clone(), Expr::add(log_term, ratio_term))
                }
            }
            Expr::Neg(e) => Expr::neg(e.derive(wrt)),
            Expr::Func(function, arg) => {
                let inner = arg.derive(wrt);
                let x = (**arg).clone();
                let outer = match function {
                    Function::Sin => Expr::func(Function::Cos, x),
                    Function::Cos => Expr::neg(Expr::func(Function::Sin, x)),
                    Function::Tan => Expr::add(
                        Expr::constant(1),
                        Expr::pow(Expr::func(Function::Tan, x), Expr::constant(2)),
                    ),
                    Function::Asin => Expr::pow(
                        Expr::sub(Expr::constant(1), Expr::pow(x, Expr::constant(2))),
                        Expr::constant(-0.5),
                    ),
                    Function::Acos => Expr::neg(Expr::pow(
                        Expr::sub(Expr::constant(1), Expr::pow(x, Expr::constant(2))),
                        Expr::constant(-0.5),
                    )),
                    Function::Atan => Expr::div(
                        Expr::constant(1),
                        Expr::add(Expr::constant(1), Expr::pow(x, Expr::constant(2))),
                    ),
                    Function::Exp => Expr::func(Function::Exp, x),
                    Function::Ln => Expr::div(Expr::constant(1), x),
                    Function::Sign => Expr::Const(Number::ZERO),
                    Function::Abs => Expr::func(Function::Sign, x),
                    Function::Conj => return Expr::func(Function::Conj, inner),
                };
                Expr::mul(outer, inner)
            }
        }
    }
}

/// Implements string formatting for expressions.
///
/// Binary operations are wrapped in parentheses, functions use call notation
/// and negative constants are parenthesised, so that the rendering of any real
/// tree can be parsed back by `convert::parse`.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Const(n) if n.as_f64().is_some_and(|v| v.is_sign_negative()) => {
                write!(f, "({n})")
            }
            Expr::Const(n) => write!(f, "{n}"),
            Expr::Symbol(s) => write!(f, "{s}"),
            Expr::Add(left, right) => write!(f, "({left} + {right})"),
            Expr::Sub(left, right) => write!(f, "({left} - {right})"),
            Expr::Mul(left, right) => write!(f, "({left} * {right})"),
            Expr::Div(left, right) => write!(f, "({left} / {right})"),
            Expr::Pow(base, exponent) => write!(f, "({base}^{exponent})"),
            Expr::Neg(expr) => write!(f, "-({expr})"),
            Expr::Func(function, expr) => write!(f, "{}({expr})", function.name()),
        }
    }
}
