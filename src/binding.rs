//! Binding parameters to numbers and substituting them with other expressions.
//!
//! Both operations validate their input before touching the native tree, append a
//! single [`Substitution`] record to the log and return a new expression. A receiver
//! with an empty log (a parameter, a constant, a parsed formula) has nothing to
//! substitute into on replay, so its results start a fresh history instead.
//!
//! The free parameters of the result are computed from the known parameter set
//! (the receiver's parameters minus the bound or replaced ones) and never from the
//! symbols left in the tree: the evaluator may eliminate a symbol algebraically
//! (`s * 0`), which is not the same as that parameter having been bound.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use itertools::Itertools;
use rayon::prelude::*;
use tracing::{debug, trace};

use crate::errors::ExprError;
use crate::expr::{Expr, Symbol};
use crate::expression::ParameterExpression;
use crate::number::Number;
use crate::parameter::Parameter;
use crate::replay::{appended, Substitution};
use crate::types::{Bindings, Operand, SymbolMap};

impl ParameterExpression {
    /// Binds parameters to numeric values.
    ///
    /// # Arguments
    /// * `values` - The numeric value for each parameter to bind
    /// * `allow_unknown` - Ignore parameters that are not part of the expression instead of failing
    ///
    /// # Errors
    /// - `ExprError::UnknownParameters` if `values` names a parameter absent from the
    ///   expression and `allow_unknown` is false
    /// - `ExprError::NonNumericBinding` if any value is symbolic
    /// - `ExprError::DivisionByZero` if the bound value is infinite
    ///
    /// # Example
    /// ```
    /// # use paramexpr::{Bindings, Number, Parameter};
    /// let p = Parameter::new("p");
    /// let expr = ((&p + 1).unwrap() * 2).unwrap();
    /// let bound = expr.bind(&Bindings::from([(p, Number::Int(3).into())]), false).unwrap();
    /// assert_eq!(bound.numeric().unwrap(), Number::Int(8));
    /// ```
    pub fn bind(&self, values: &Bindings, allow_unknown: bool) -> Result<Self, ExprError> {
        if !allow_unknown {
            self.raise_if_unknown(values.keys())?;
        }
        let non_numeric: Vec<String> = values
            .iter()
            .filter_map(|(parameter, value)| {
                value
                    .as_symbolic()
                    .map(|expr| format!("{}: {expr}", parameter.name()))
            })
            .collect();
        if !non_numeric.is_empty() {
            debug!(parameters = ?non_numeric, "rejected symbolic bind values");
            return Err(ExprError::NonNumericBinding(non_numeric.join(", ")));
        }

        let symbol_values: HashMap<Symbol, Number> = values
            .iter()
            .filter_map(|(parameter, value)| {
                let symbol = self.symbol_map().get(parameter)?;
                Some((symbol.clone(), value.as_constant()?))
            })
            .collect();
        let bound = self.native().bind(&symbol_values);

        if bound.is_infinite() {
            debug!(expression = %self, "binding drives the value to infinity");
            return Err(ExprError::DivisionByZero(format!(
                "Binding provided for expression results in division by zero (Expression: {}, Bindings: {})",
                self,
                describe_bindings(values)
            )));
        }

        let mut symbols = self.symbol_map().clone();
        for parameter in values.keys() {
            symbols.remove(parameter);
        }
        trace!(bound = symbol_values.len(), remaining = symbols.len(), "bound parameters");
        Ok(self.substituted(
            symbols,
            *bound,
            Substitution {
                bindings: values.clone(),
            },
        ))
    }

    /// Replaces parameters with other expressions.
    ///
    /// All replacements happen simultaneously, so `{p: q, q: p}` swaps the two.
    ///
    /// # Errors
    /// - `ExprError::UnknownParameters` if `map` names a parameter absent from the
    ///   expression and `allow_unknown` is false
    /// - `ExprError::NameConflict` if a replacement brings in a parameter whose name is
    ///   already used by a different parameter that is not itself being replaced
    pub fn subs(
        &self,
        map: &BTreeMap<Parameter, ParameterExpression>,
        allow_unknown: bool,
    ) -> Result<Self, ExprError> {
        if !allow_unknown {
            self.raise_if_unknown(map.keys())?;
        }
        let outbound: HashSet<&str> = map.keys().map(Parameter::name).collect();
        self.raise_if_names_conflict(map.values().flat_map(|e| e.parameters()), &outbound)?;

        let mut symbols = self.symbol_map().clone();
        for parameter in map.keys() {
            symbols.remove(parameter);
        }
        let mut replacements = HashMap::new();
        for (old, new) in map {
            if let Some(symbol) = self.symbol_map().get(old) {
                replacements.insert(symbol.clone(), new.native().clone());
                for parameter in new.parameters() {
                    symbols.insert(parameter.clone(), Symbol::new(parameter.name()));
                }
            }
        }
        let value = self.native().substitute(&replacements);

        let bindings = map
            .iter()
            .map(|(parameter, expr)| (parameter.clone(), Operand::Symbolic(expr.clone())))
            .collect();
        trace!(replaced = replacements.len(), remaining = symbols.len(), "substituted parameters");
        Ok(self.substituted(symbols, *value, Substitution { bindings }))
    }

    /// Records a substitution. A receiver without history yields a result without
    /// history: there is no prior output for the record to apply to.
    fn substituted(&self, symbols: SymbolMap, value: Expr, substitution: Substitution) -> Self {
        if self.replay_log().is_empty() {
            return Self::from_root(symbols, value);
        }
        Self::from_parts(symbols, value, appended(self.replay_log(), substitution))
    }

    /// Binds or substitutes a single parameter, depending on the kind of value.
    pub fn assign(
        &self,
        parameter: &Parameter,
        value: impl Into<Operand>,
    ) -> Result<Self, ExprError> {
        match value.into() {
            Operand::Symbolic(expr) => {
                self.subs(&BTreeMap::from([(parameter.clone(), expr)]), false)
            }
            constant => self.bind(&Bindings::from([(parameter.clone(), constant)]), false),
        }
    }

    /// Binds the expression against many sets of values in parallel.
    ///
    /// Equivalent to calling [`bind`](Self::bind) for each set in order; returns the
    /// first error encountered.
    pub fn bind_batch(
        &self,
        batches: &[Bindings],
        allow_unknown: bool,
    ) -> Result<Vec<Self>, ExprError> {
        batches
            .par_iter()
            .map(|values| self.bind(values, allow_unknown))
            .collect()
    }

    fn raise_if_unknown<'a>(
        &self,
        parameters: impl IntoIterator<Item = &'a Parameter>,
    ) -> Result<(), ExprError> {
        let unknown: Vec<&str> = parameters
            .into_iter()
            .filter(|parameter| !self.has_parameter(parameter))
            .map(Parameter::name)
            .collect();
        if unknown.is_empty() {
            return Ok(());
        }
        debug!(parameters = ?unknown, "rejected unknown parameters");
        Err(ExprError::UnknownParameters(
            unknown.iter().map(|name| format!("'{name}'")).join(", "),
        ))
    }

    /// Fails if an inbound parameter shares its name with a different parameter of
    /// this expression, unless that name is in `outbound` (being replaced).
    pub(crate) fn raise_if_names_conflict<'a>(
        &self,
        inbound: impl IntoIterator<Item = &'a Parameter>,
        outbound: &HashSet<&str>,
    ) -> Result<(), ExprError> {
        let names = self.names();
        let conflicts: BTreeSet<String> = inbound
            .into_iter()
            .filter(|parameter| !outbound.contains(parameter.name()))
            .filter(|parameter| {
                names
                    .get(parameter.name())
                    .is_some_and(|existing| existing != *parameter)
            })
            .map(|parameter| parameter.name().to_string())
            .collect();
        if conflicts.is_empty() {
            return Ok(());
        }
        debug!(names = ?conflicts, "rejected name conflict");
        Err(ExprError::NameConflict(conflicts.into_iter().collect()))
    }
}

fn describe_bindings(values: &Bindings) -> String {
    format!(
        "{{{}}}",
        values
            .iter()
            .map(|(parameter, value)| format!("{parameter}: {value}"))
            .join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bindings(pairs: &[(&Parameter, f64)]) -> Bindings {
        pairs
            .iter()
            .map(|(parameter, value)| ((*parameter).clone(), Operand::Constant(Number::Float(*value))))
            .collect()
    }

    #[test]
    fn test_bind_example() {
        let p = Parameter::new("p");
        let expr = ((&p + 1).unwrap() * 2).unwrap();
        let bound = expr
            .bind(&Bindings::from([(p.clone(), Operand::Constant(Number::Int(3)))]), false)
            .unwrap();
        assert!(bound.is_bound());
        assert_eq!(bound.numeric().unwrap(), Number::Int(8));
        assert_eq!(bound.replay_log().len(), expr.replay_log().len() + 1);
    }

    #[test]
    fn test_bind_partial() {
        let p = Parameter::new("p");
        let q = Parameter::new("q");
        let expr = (&p / &q).unwrap();
        let bound = expr.bind(&bindings(&[(&p, 4.0)]), false).unwrap();
        assert_eq!(bound.parameter_set(), BTreeSet::from([q.clone()]));
        let bound = bound.bind(&bindings(&[(&q, 2.0)]), false).unwrap();
        assert_eq!(bound.numeric().unwrap(), Number::Float(2.0));
    }

    #[test]
    fn test_bind_division_by_zero() {
        let p = Parameter::new("p");
        let q = Parameter::new("q");
        let expr = (&p / &q).unwrap();
        let err = expr.bind(&bindings(&[(&q, 0.0)]), false).unwrap_err();
        assert!(matches!(err, ExprError::DivisionByZero(_)));

        let inverse = (1.0 / &p).unwrap();
        let err = inverse.bind(&bindings(&[(&p, 0.0)]), false).unwrap_err();
        assert!(matches!(err, ExprError::DivisionByZero(_)));
    }

    #[test]
    fn test_bind_division_by_zero_with_free_parameters() {
        let p = Parameter::new("p");
        let q = Parameter::new("q");
        let r = Parameter::new("r");

        // the divisor alone is bound; the numerator stays free
        let ratio = ((&p + &r).unwrap() / &q).unwrap();
        let err = ratio.bind(&bindings(&[(&q, 0.0)]), false).unwrap_err();
        assert!(matches!(err, ExprError::DivisionByZero(message) if message.contains("division by zero")));

        // the infinite term sits under a sum with a free parameter
        let shifted = ((1.0 / &p).unwrap() + &q).unwrap();
        let err = shifted.bind(&bindings(&[(&p, 0.0)]), false).unwrap_err();
        assert!(matches!(err, ExprError::DivisionByZero(_)));
        assert!(shifted.has_parameter(&p));

        // a non-zero divisor binds normally
        let bound = shifted.bind(&bindings(&[(&p, 2.0)]), false).unwrap();
        assert_eq!(bound.parameter_set(), BTreeSet::from([q.clone()]));
    }

    #[test]
    fn test_bind_unknown_parameter() {
        let p = Parameter::new("p");
        let r = Parameter::new("r");
        let expr = (&p + 1).unwrap();
        let err = expr.bind(&bindings(&[(&r, 1.0)]), false).unwrap_err();
        assert!(matches!(err, ExprError::UnknownParameters(names) if names == "'r'"));

        let bound = expr.bind(&bindings(&[(&p, 1.0), (&r, 1.0)]), true).unwrap();
        assert_eq!(bound.numeric().unwrap(), Number::Float(2.0));
    }

    #[test]
    fn test_bind_rejects_symbolic_value() {
        let p = Parameter::new("p");
        let q = Parameter::new("q");
        let expr = (&p + 1).unwrap();
        let values = Bindings::from([(p.clone(), Operand::from(&q))]);
        let err = expr.bind(&values, false).unwrap_err();
        assert!(matches!(err, ExprError::NonNumericBinding(names) if names == "p: q"));
    }

    #[test]
    fn test_bind_keeps_eliminated_parameters() {
        let s = Parameter::new("s");
        let t = Parameter::new("t");
        let expr = ((&s * 0).unwrap() + &t).unwrap();
        // `s` vanished from the tree but is still a parameter of the expression
        assert!(expr.has_parameter(&s));
        let bound = expr.bind(&bindings(&[(&t, 1.0)]), false).unwrap();
        assert!(bound.has_parameter(&s));
        assert!(!bound.is_bound());
    }

    #[test]
    fn test_subs_round_trip() {
        let p = Parameter::new("p");
        let q = Parameter::new("q");
        let x = Parameter::new("x");
        let a = ((&p * &x).unwrap() + 1).unwrap();
        let forward = a.subs(&BTreeMap::from([(p.clone(), q.expr())]), false).unwrap();
        assert!(forward.has_parameter(&q));
        assert!(!forward.has_parameter(&p));
        let back = forward.subs(&BTreeMap::from([(q.clone(), p.expr())]), false).unwrap();
        assert_eq!(back, a);
    }

    #[test]
    fn test_subs_is_simultaneous() {
        let p = Parameter::new("p");
        let q = Parameter::new("q");
        let expr = (&p - &q).unwrap();
        let swapped = expr
            .subs(&BTreeMap::from([(p.clone(), q.expr()), (q.clone(), p.expr())]), false)
            .unwrap();
        assert_eq!(swapped, (&q - &p).unwrap());
        assert_eq!(swapped.parameter_set(), BTreeSet::from([p, q]));
    }

    #[test]
    fn test_subs_name_conflict() {
        let p = Parameter::new("p");
        let x = Parameter::new("x");
        let impostor = Parameter::new("x");
        let expr = (&p + &x).unwrap();
        let err = expr
            .subs(&BTreeMap::from([(p.clone(), impostor.expr())]), false)
            .unwrap_err();
        assert!(matches!(err, ExprError::NameConflict(names) if names == vec!["x"]));

        // Replacing `x` itself with a same-named parameter is allowed
        let renamed = expr
            .subs(&BTreeMap::from([(x.clone(), impostor.expr())]), false)
            .unwrap();
        assert!(renamed.has_parameter(&impostor));
        assert!(!renamed.has_parameter(&x));
    }

    #[test]
    fn test_assign_dispatches_on_value() {
        let p = Parameter::new("p");
        let q = Parameter::new("q");
        let expr = (&p * 3).unwrap();
        let substituted = expr.assign(&p, &q).unwrap();
        assert!(substituted.has_parameter(&q));
        let bound = expr.assign(&p, 2).unwrap();
        assert_eq!(bound.numeric().unwrap(), Number::Int(6));
    }

    #[test]
    fn test_bind_batch_matches_sequential_binds() {
        let p = Parameter::new("p");
        let expr = ((&p * &p).unwrap() - 1).unwrap();
        let batches: Vec<Bindings> = (0..16).map(|i| bindings(&[(&p, i as f64)])).collect();
        let parallel = expr.bind_batch(&batches, false).unwrap();
        for (values, result) in batches.iter().zip(parallel) {
            assert_eq!(result, expr.bind(values, false).unwrap());
        }
    }

    #[test]
    fn test_substituting_a_value_without_history() {
        let p = Parameter::new("p");
        let q = Parameter::new("q");
        let bound = p.expr().assign(&p, 2).unwrap();
        assert!(bound.replay_log().is_empty());
        assert!(bound.is_standalone());
        assert_eq!(bound, Number::Int(2));

        let parsed = ParameterExpression::from_formula(&[p.clone()], "p * 2").unwrap();
        let replaced = parsed.assign(&p, q.expr()).unwrap();
        assert!(replaced.replay_log().is_empty());
        assert!(replaced.has_parameter(&q));
        let chained = (&replaced + 1).unwrap();
        assert_eq!(chained.replay_log().len(), 1);
    }

    #[test]
    fn test_failed_bind_leaves_receiver_intact() {
        let p = Parameter::new("p");
        let expr = (1.0 / &p).unwrap();
        let log_len = expr.replay_log().len();
        assert!(expr.bind(&bindings(&[(&p, 0.0)]), false).is_err());
        assert_eq!(expr.replay_log().len(), log_len);
        assert!(expr.has_parameter(&p));
    }
}
