//! The parameter expression value type.
//!
//! A [`ParameterExpression`] couples three things:
//!
//! - a native [`Expr`] tree holding the actual algebra
//! - the mapping from each free [`Parameter`] to the symbol standing for it in the tree
//! - the [`ReplayLog`] of operations that produced the value
//!
//! Values are immutable and cheap to clone: a clone shares the same allocation, and
//! every operation (see the `binding`, `dispatch` and `coerce` modules) builds a new
//! value instead of touching an existing one.
//!
//! # Example
//!
//! ```
//! use paramexpr::{Parameter, ParameterExpression};
//!
//! let theta = Parameter::new("theta");
//! let expr = ParameterExpression::from_formula(&[theta.clone()], "2 * theta + 1").unwrap();
//! assert!(expr.has_parameter(&theta));
//! assert_eq!(expr.to_string(), "((2 * theta) + 1)");
//! ```

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

use evalexpr::{build_operator_tree, Node};
use itertools::Itertools;

use crate::convert::{self, build_ast, extract_symbols};
use crate::errors::ExprError;
use crate::expr::{Expr, Symbol};
use crate::number::Number;
use crate::parameter::{Parameter, ParameterKey};
use crate::replay::ReplayLog;
use crate::types::SymbolMap;

/// Parameter lookup by name.
pub(crate) type NameIndex = HashMap<Arc<str>, Parameter>;

struct Inner {
    symbols: SymbolMap,
    keys: BTreeSet<ParameterKey>,
    value: Expr,
    names: OnceLock<NameIndex>,
    replay: ReplayLog,
    standalone: bool,
}

/// An immutable symbolic expression over parameters.
#[derive(Clone)]
pub struct ParameterExpression(Arc<Inner>);

impl ParameterExpression {
    fn build(
        symbols: SymbolMap,
        value: Expr,
        replay: ReplayLog,
        standalone: bool,
        names: OnceLock<NameIndex>,
    ) -> Self {
        let keys = symbols.keys().map(Parameter::hash_key).collect();
        Self(Arc::new(Inner {
            symbols,
            keys,
            value,
            names,
            replay,
            standalone,
        }))
    }

    /// Takes a symbol mapping, tree and log as given.
    pub(crate) fn from_parts(symbols: SymbolMap, value: Expr, replay: ReplayLog) -> Self {
        Self::build(symbols, value, replay, false, OnceLock::new())
    }

    /// Like `from_parts`, with the name index already known.
    pub(crate) fn from_parts_with_names(
        symbols: SymbolMap,
        value: Expr,
        replay: ReplayLog,
        names: NameIndex,
    ) -> Self {
        Self::build(symbols, value, replay, false, OnceLock::from(names))
    }

    /// A value without replay history, exported from its tree.
    pub(crate) fn from_root(symbols: SymbolMap, value: Expr) -> Self {
        Self::build(symbols, value, ReplayLog::new(), true, OnceLock::new())
    }

    pub(crate) fn from_parameter(parameter: &Parameter) -> Self {
        let symbol = Symbol::new(parameter.name());
        Self::build(
            SymbolMap::unit(parameter.clone(), symbol.clone()),
            Expr::Symbol(symbol),
            ReplayLog::new(),
            true,
            OnceLock::new(),
        )
    }

    /// Creates a fully bound expression holding a single number.
    pub fn constant(value: impl Into<Number>) -> Self {
        Self::build(
            SymbolMap::new(),
            Expr::Const(value.into()),
            ReplayLog::new(),
            true,
            OnceLock::new(),
        )
    }

    /// Parses a formula whose identifiers name the given parameters.
    ///
    /// Every supplied parameter becomes a parameter of the result, whether or not
    /// the formula references it. The result has an empty replay log.
    ///
    /// # Errors
    /// - `ExprError::Parse` if evalexpr cannot parse the formula
    /// - `ExprError::Convert` if the formula uses an unknown identifier or function
    /// - `ExprError::NameConflict` if two distinct parameters share a name
    pub fn from_formula(parameters: &[Parameter], formula: &str) -> Result<Self, ExprError> {
        let (symbols, table) = Self::symbol_table(parameters)?;
        let value = convert::parse(formula, &table)?;
        Ok(Self::from_root(symbols, value))
    }

    /// Parses a formula, creating a fresh parameter for every identifier it contains.
    ///
    /// # Example
    /// ```
    /// # use paramexpr::ParameterExpression;
    /// let expr = ParameterExpression::parse("b * a").unwrap();
    /// let names: Vec<_> = expr.parameters().map(|p| p.name().to_string()).collect();
    /// assert_eq!(names, vec!["a", "b"]);
    /// ```
    pub fn parse(formula: &str) -> Result<Self, ExprError> {
        let node: Node = build_operator_tree(formula)?;
        let parameters: Vec<Parameter> = extract_symbols(&node)
            .into_iter()
            .map(Parameter::new)
            .collect();
        let (symbols, table) = Self::symbol_table(&parameters)?;
        let value = build_ast(&node, &table)?;
        Ok(Self::from_root(symbols, value))
    }

    /// Symbol mapping and identifier table for a set of parameters.
    fn symbol_table(
        parameters: &[Parameter],
    ) -> Result<(SymbolMap, HashMap<String, Symbol>), ExprError> {
        let mut by_name: HashMap<&str, &Parameter> = HashMap::new();
        let mut conflicts = BTreeSet::new();
        for parameter in parameters {
            if let Some(existing) = by_name.insert(parameter.name(), parameter) {
                if existing != parameter {
                    conflicts.insert(parameter.name().to_string());
                }
            }
        }
        if !conflicts.is_empty() {
            return Err(ExprError::NameConflict(conflicts.into_iter().collect()));
        }

        let table = by_name
            .keys()
            .map(|name| (name.to_string(), Symbol::new(*name)))
            .collect();
        let symbols = by_name
            .values()
            .map(|parameter| ((*parameter).clone(), Symbol::new(parameter.name())))
            .collect();
        Ok((symbols, table))
    }

    /// The free parameters, in identity order.
    pub fn parameters(&self) -> impl Iterator<Item = &Parameter> + '_ {
        self.0.symbols.keys()
    }

    pub fn parameter_set(&self) -> BTreeSet<Parameter> {
        self.parameters().cloned().collect()
    }

    pub fn has_parameter(&self, parameter: &Parameter) -> bool {
        self.0.symbols.contains_key(parameter)
    }

    pub fn parameter_by_name(&self, name: &str) -> Option<&Parameter> {
        self.names().get(name)
    }

    pub fn num_parameters(&self) -> usize {
        self.0.symbols.len()
    }

    /// Returns true when no free parameter remains.
    pub fn is_bound(&self) -> bool {
        self.0.symbols.is_empty()
    }

    /// The operations that produced this value, oldest first.
    pub fn replay_log(&self) -> &ReplayLog {
        &self.0.replay
    }

    /// Whether the value is recorded as a nested operand when used in an operation.
    ///
    /// Values without history of their own (wrapped parameters, parsed formulas and
    /// constants) are standalone.
    pub fn is_standalone(&self) -> bool {
        self.0.standalone
    }

    /// The underlying native tree.
    pub fn native(&self) -> &Expr {
        &self.0.value
    }

    /// Returns true if both handles share one allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn symbol_map(&self) -> &SymbolMap {
        &self.0.symbols
    }

    pub(crate) fn names(&self) -> &NameIndex {
        self.0.names.get_or_init(|| {
            self.0
                .symbols
                .keys()
                .map(|parameter| (Arc::from(parameter.name()), parameter.clone()))
                .collect()
        })
    }

    /// Renders the free parameters as `{a, b}` for diagnostics.
    pub(crate) fn describe_parameters(&self) -> String {
        format!("{{{}}}", self.parameters().map(Parameter::name).join(", "))
    }
}

impl PartialEq for ParameterExpression {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || (self.0.keys == other.0.keys && self.0.value == other.0.value)
    }
}

impl Eq for ParameterExpression {}

impl PartialEq<Number> for ParameterExpression {
    fn eq(&self, other: &Number) -> bool {
        self.0.value == Expr::Const(*other)
    }
}

impl PartialEq<f64> for ParameterExpression {
    fn eq(&self, other: &f64) -> bool {
        *self == Number::Float(*other)
    }
}

impl PartialEq<i64> for ParameterExpression {
    fn eq(&self, other: &i64) -> bool {
        *self == Number::Int(*other)
    }
}

impl Hash for ParameterExpression {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self.0.value.as_constant() {
            Some(value) if self.is_bound() => value.hash(state),
            _ => {
                self.0.keys.hash(state);
                self.0.value.hash(state);
            }
        }
    }
}

impl fmt::Display for ParameterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.value)
    }
}

impl fmt::Debug for ParameterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ParameterExpression({})", self.0.value)
    }
}
