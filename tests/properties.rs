//! Property-based tests for parameter expressions
//!
//! These tests check algebraic laws of binding, substitution and replay across
//! randomized inputs.

use std::collections::BTreeMap;

use paramexpr::{export, Bindings, ExprError, NativeReplay, Number, Operand, Parameter, ParameterExpression};
use proptest::prelude::*;

// ============================================================================
// Helper functions
// ============================================================================

fn bind_one(expr: &ParameterExpression, parameter: &Parameter, value: f64) -> ParameterExpression {
    expr.bind(
        &Bindings::from([(parameter.clone(), Operand::Constant(Number::Float(value)))]),
        false,
    )
    .unwrap()
}

fn bind_both(
    expr: &ParameterExpression,
    (p, a): (&Parameter, f64),
    (q, b): (&Parameter, f64),
) -> ParameterExpression {
    expr.bind(
        &Bindings::from([
            (p.clone(), Operand::Constant(Number::Float(a))),
            (q.clone(), Operand::Constant(Number::Float(b))),
        ]),
        false,
    )
    .unwrap()
}

fn close(actual: f64, expected: f64) -> bool {
    (actual - expected).abs() <= 1e-9 * (1.0 + expected.abs())
}

/// Applies a sequence of operations to `p`, occasionally mixing in `q`
fn build(p: &Parameter, q: &Parameter, steps: &[(u8, f64)]) -> ParameterExpression {
    let mut expr = p.expr();
    for &(op, c) in steps {
        expr = match op {
            0 => (&expr + c).unwrap(),
            1 => (&expr - c).unwrap(),
            2 => (&expr * c).unwrap(),
            3 => (&expr / c).unwrap(),
            4 => (c + &expr).unwrap(),
            5 => (c - &expr).unwrap(),
            6 => (c / &expr).unwrap(),
            7 => expr.sin(),
            8 => (&expr * q).unwrap(),
            _ => (&expr + (q * c).unwrap()).unwrap(),
        };
    }
    expr
}

fn steps() -> impl Strategy<Value = Vec<(u8, f64)>> {
    prop::collection::vec((0u8..10, 0.5f64..10.0), 0..12)
}

// ============================================================================
// Arithmetic
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_add_then_sub(a in -1e3f64..1e3, b in -1e3f64..1e3) {
        // (p + b) - b = p
        let p = Parameter::new("p");
        let expr = ((&p + b).unwrap() - b).unwrap();
        let value = bind_one(&expr, &p, a).to_f64().unwrap();
        prop_assert!(close(value, a), "{} != {}", value, a);
    }

    #[test]
    fn prop_mul_then_div(a in -1e3f64..1e3, c in 0.001f64..1e3, negative: bool) {
        // (p * c) / c = p
        let c = if negative { -c } else { c };
        let p = Parameter::new("p");
        let expr = ((&p * c).unwrap() / c).unwrap();
        let value = bind_one(&expr, &p, a).to_f64().unwrap();
        prop_assert!(close(value, a), "{} != {}", value, a);
    }

    #[test]
    fn prop_add_then_sub_symbolic(a in -1e3f64..1e3, v in -10f64..10.0, c in 0.5f64..10.0) {
        // (p + b) - b = p with b = sin(q * c)
        let p = Parameter::new("p");
        let q = Parameter::new("q");
        let b = (&q * c).unwrap().sin();
        let expr = ((&p + &b).unwrap() - &b).unwrap();
        prop_assert_eq!(expr.num_parameters(), 2);
        let value = bind_both(&expr, (&p, a), (&q, v)).to_f64().unwrap();
        prop_assert!(close(value, a), "{} != {}", value, a);
    }

    #[test]
    fn prop_mul_then_div_symbolic(a in -1e3f64..1e3, v in -2f64..2.0, c in 0.5f64..10.0) {
        // (p * b) / b = p with b = exp(q * c), which never vanishes
        let p = Parameter::new("p");
        let q = Parameter::new("q");
        let b = (&q * c).unwrap().exp();
        let expr = ((&p * &b).unwrap() / &b).unwrap();
        let value = bind_both(&expr, (&p, a), (&q, v)).to_f64().unwrap();
        prop_assert!(close(value, a), "{} != {}", value, a);
    }

    #[test]
    fn prop_reflected_sub(a in -1e3f64..1e3, c in -1e3f64..1e3) {
        // c - p binds to c - a
        let p = Parameter::new("p");
        let expr = (c - &p).unwrap();
        let value = bind_one(&expr, &p, a).to_f64().unwrap();
        prop_assert!(close(value, c - a));
    }
}

// ============================================================================
// Binding and substitution
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_subs_round_trip(steps in steps()) {
        // subs(p -> r) followed by subs(r -> p) gives the original back
        let p = Parameter::new("p");
        let q = Parameter::new("q");
        let r = Parameter::new("r");
        let expr = build(&p, &q, &steps);
        let there = expr.subs(&BTreeMap::from([(p.clone(), r.expr())]), false).unwrap();
        prop_assert!(!there.has_parameter(&p));
        let back = there.subs(&BTreeMap::from([(r.clone(), p.expr())]), false).unwrap();
        prop_assert_eq!(back, expr);
    }

    #[test]
    fn prop_partial_bind_is_not_numeric(a in -10f64..10.0, bind_p: bool) {
        // binding a strict subset leaves the expression symbolic
        let p = Parameter::new("p");
        let q = Parameter::new("q");
        let expr = ((&p * &q).unwrap() + 1).unwrap();
        let (bound, free) = if bind_p { (&p, &q) } else { (&q, &p) };
        let partial = bind_one(&expr, bound, a);
        prop_assert!(partial.has_parameter(free));
        prop_assert!(!partial.is_bound());
        prop_assert!(matches!(partial.to_f64(), Err(ExprError::NotNumeric(_))));
        prop_assert!(matches!(partial.numeric(), Err(ExprError::NotNumeric(_))));
    }

    #[test]
    fn prop_zero_divisor_fails_with_free_parameters(c in 0.5f64..10.0, in_sum: bool) {
        // binding only the divisor to zero is a division by zero, even with q still free
        let p = Parameter::new("p");
        let q = Parameter::new("q");
        let expr = if in_sum {
            ((c / &p).unwrap() + &q).unwrap()
        } else {
            ((&q * c).unwrap() / &p).unwrap()
        };
        let result = expr.bind(
            &Bindings::from([(p.clone(), Operand::Constant(Number::Float(0.0)))]),
            false,
        );
        prop_assert!(matches!(result, Err(ExprError::DivisionByZero(_))));
    }

    #[test]
    fn prop_gradient_of_absent_parameter(steps in steps()) {
        let p = Parameter::new("p");
        let q = Parameter::new("q");
        let absent = Parameter::new("absent");
        let expr = build(&p, &q, &steps);
        prop_assert_eq!(
            expr.gradient(&absent).unwrap(),
            Operand::Constant(Number::Float(0.0))
        );
    }
}

// ============================================================================
// Replay
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_native_replay_round_trip(steps in steps()) {
        let p = Parameter::new("p");
        let q = Parameter::new("q");
        let expr = build(&p, &q, &steps);
        let rebuilt = export(&expr, &NativeReplay).unwrap();
        prop_assert_eq!(rebuilt.to_string(), expr.to_string());
        prop_assert_eq!(rebuilt, expr);
    }

    #[test]
    fn prop_replay_after_bind(steps in steps(), a in 0.5f64..2.0) {
        let p = Parameter::new("p");
        let q = Parameter::new("q");
        let expr = build(&p, &q, &steps);
        let bound = bind_one(&expr, &p, a);
        let rebuilt = export(&bound, &NativeReplay).unwrap();
        prop_assert_eq!(rebuilt, bound);
    }
}
