//! Symbolic parameter expressions with binding, substitution and a replayable history.
//!
//! A [`ParameterExpression`] is an immutable value over named [`Parameter`]s. It can be
//! combined with numbers and other expressions, have its parameters bound to numbers or
//! replaced by other expressions, be differentiated, and be cast to a number once every
//! parameter is bound. The native tree is built from formulas parsed by
//! [evalexpr](https://github.com/ISibboI/evalexpr).
//!
//! Every operation also appends to the expression's replay log, an ordered record of
//! how the value was built. Replaying that log through a [`SymbolicExporter`] rebuilds
//! the expression in another symbolic backend.
//!
//! # Example
//!
//! ```rust
//! use paramexpr::prelude::*;
//!
//! let theta = Parameter::new("theta");
//! let phi = Parameter::new("phi");
//!
//! // 2 * theta + sin(phi)
//! let expr = ((2_i64 * &theta).unwrap() + phi.expr().sin()).unwrap();
//! assert_eq!(expr.num_parameters(), 2);
//!
//! // Bind theta, then phi
//! let half = expr.assign(&theta, 0.5).unwrap();
//! let value = half.assign(&phi, 0.0).unwrap();
//! assert_eq!(value.to_f64().unwrap(), 1.0);
//!
//! // d/dtheta = 2
//! assert_eq!(expr.gradient(&theta).unwrap(), Operand::Constant(Number::Int(2)));
//!
//! // Rebuild from the log
//! assert_eq!(export(&expr, &NativeReplay).unwrap(), expr);
//! ```

pub use backends::native::NativeReplay;
pub use errors::{ConvertError, EvalError, ExprError};
pub use export::{export, BinaryMethod, SymbolicExporter};
pub use expression::ParameterExpression;
pub use number::Number;
pub use opcode::OpCode;
pub use parameter::{Parameter, ParameterKey};
pub use types::{Bindings, Operand};

pub mod prelude {
    pub use crate::backends::native::NativeReplay;
    pub use crate::errors::ExprError;
    pub use crate::export::{export, SymbolicExporter};
    pub use crate::expression::ParameterExpression;
    pub use crate::number::Number;
    pub use crate::parameter::Parameter;
    pub use crate::types::{Bindings, Operand};
}

/// Exporters the replay log can be replayed against
pub mod backends {
    pub mod native;
    #[cfg(feature = "sympy")]
    pub mod sympy;
}
/// Binding and substitution of parameters
mod binding;
/// Numeric casts of bound expressions
mod coerce;
/// Conversion from parsed expressions to the native tree
pub mod convert;
/// Operators and functions on expressions
mod dispatch;
/// Error types for the various failure modes
pub mod errors;
/// Replay of the operation log against a symbolic backend
pub mod export;
/// Native expression tree, simplification and symbolic differentiation
pub mod expr;
/// The expression value
pub mod expression;
/// Numbers with an integer, float or complex tag
pub mod number;
/// Operation codes of the replay log
pub mod opcode;
/// Named symbolic parameters
pub mod parameter;
/// Replay log records
pub mod replay;
/// Shared aliases and the operand type
pub mod types;
/// Numeric kernels behind the native functions
pub(crate) mod operators {
    pub(crate) mod exp;
    pub(crate) mod ln;
    pub(crate) mod pow;
    pub(crate) mod trigonometric;
}
