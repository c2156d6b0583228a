//! The replay log: an append-only record of how an expression was built.
//!
//! Every operation that produces a new expression appends exactly one entry to a
//! structurally shared copy of its receiver's log. Replaying the entries in order
//! from an empty state rebuilds the expression, against this crate's own evaluator
//! or against any [`SymbolicExporter`](crate::export::SymbolicExporter).
//!
//! Operands that continue a left-to-right chain are recorded as
//! [`OperandRef::PriorResult`] instead of a full copy of the receiver, which keeps
//! logs of long chains compact.

use crate::expression::ParameterExpression;
use crate::number::Number;
use crate::opcode::OpCode;
use crate::types::Bindings;

/// Where an instruction reads one of its operands from.
#[derive(Debug, Clone, PartialEq)]
pub enum OperandRef {
    /// The running output of the entries replayed so far
    PriorResult,
    /// A plain number
    Literal(Number),
    /// A sub-expression, replayed recursively from its own log
    Nested(ParameterExpression),
}

impl OperandRef {
    /// Reference to the receiver of an operation: the receiver itself when it is
    /// standalone, otherwise the running output.
    pub(crate) fn receiver(expr: &ParameterExpression) -> Self {
        if expr.is_standalone() {
            OperandRef::Nested(expr.clone())
        } else {
            OperandRef::PriorResult
        }
    }
}

/// A recorded operation. `rhs` is `None` for unary operations.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub op: OpCode,
    pub lhs: OperandRef,
    pub rhs: Option<OperandRef>,
}

impl Instruction {
    pub fn unary(op: OpCode, lhs: OperandRef) -> Self {
        Self { op, lhs, rhs: None }
    }

    pub fn binary(op: OpCode, lhs: OperandRef, rhs: OperandRef) -> Self {
        Self {
            op,
            lhs,
            rhs: Some(rhs),
        }
    }
}

/// A recorded bind or substitution; the bindings are applied simultaneously on replay.
#[derive(Debug, Clone, PartialEq)]
pub struct Substitution {
    pub bindings: Bindings,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReplayEntry {
    Instruction(Instruction),
    Substitution(Substitution),
}

impl ReplayEntry {
    pub fn op_code(&self) -> OpCode {
        match self {
            ReplayEntry::Instruction(instruction) => instruction.op,
            ReplayEntry::Substitution(_) => OpCode::Substitute,
        }
    }
}

impl From<Instruction> for ReplayEntry {
    fn from(instruction: Instruction) -> Self {
        ReplayEntry::Instruction(instruction)
    }
}

impl From<Substitution> for ReplayEntry {
    fn from(substitution: Substitution) -> Self {
        ReplayEntry::Substitution(substitution)
    }
}

/// Persistent ordered log; `clone` plus `push_back` shares all earlier entries.
pub type ReplayLog = im::Vector<ReplayEntry>;

/// Returns a copy of `log` with `entry` appended, leaving `log` untouched.
pub(crate) fn appended(log: &ReplayLog, entry: impl Into<ReplayEntry>) -> ReplayLog {
    let mut log = log.clone();
    log.push_back(entry.into());
    log
}
