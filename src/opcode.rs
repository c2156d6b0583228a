//! Operation codes recorded in the replay log.
//!
//! The numeric values are stable and form part of the persisted log format, so
//! variants must never be renumbered.

use std::fmt;

/// A closed enumeration of the operations an expression can record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum OpCode {
    Add = 0,
    Sub = 1,
    Mul = 2,
    Div = 3,
    Pow = 4,
    Sin = 5,
    Cos = 6,
    Tan = 7,
    Asin = 8,
    Acos = 9,
    Exp = 10,
    Log = 11,
    Sign = 12,
    Grad = 13,
    Conj = 14,
    Substitute = 15,
    Abs = 16,
    Atan = 17,
    RSub = 18,
    RDiv = 19,
    RPow = 20,
}

impl OpCode {
    /// All codes in numeric order.
    pub const ALL: [OpCode; 21] = [
        OpCode::Add,
        OpCode::Sub,
        OpCode::Mul,
        OpCode::Div,
        OpCode::Pow,
        OpCode::Sin,
        OpCode::Cos,
        OpCode::Tan,
        OpCode::Asin,
        OpCode::Acos,
        OpCode::Exp,
        OpCode::Log,
        OpCode::Sign,
        OpCode::Grad,
        OpCode::Conj,
        OpCode::Substitute,
        OpCode::Abs,
        OpCode::Atan,
        OpCode::RSub,
        OpCode::RDiv,
        OpCode::RPow,
    ];

    /// Canonical method name of the operation.
    pub fn method_name(self) -> &'static str {
        match self {
            OpCode::Add => "add",
            OpCode::Sub => "sub",
            OpCode::Mul => "mul",
            OpCode::Div => "div",
            OpCode::Pow => "pow",
            OpCode::Sin => "sin",
            OpCode::Cos => "cos",
            OpCode::Tan => "tan",
            OpCode::Asin => "arcsin",
            OpCode::Acos => "arccos",
            OpCode::Exp => "exp",
            OpCode::Log => "log",
            OpCode::Sign => "sign",
            OpCode::Grad => "gradient",
            OpCode::Conj => "conjugate",
            OpCode::Substitute => "subs",
            OpCode::Abs => "abs",
            OpCode::Atan => "arctan",
            OpCode::RSub => "rsub",
            OpCode::RDiv => "rdiv",
            OpCode::RPow => "rpow",
        }
    }

    /// Returns true for operations that take two operands.
    pub fn is_binary(self) -> bool {
        matches!(
            self,
            OpCode::Add
                | OpCode::Sub
                | OpCode::Mul
                | OpCode::Div
                | OpCode::Pow
                | OpCode::Grad
                | OpCode::Substitute
                | OpCode::RSub
                | OpCode::RDiv
                | OpCode::RPow
        )
    }

    pub fn is_reflected(self) -> bool {
        matches!(self, OpCode::RSub | OpCode::RDiv | OpCode::RPow)
    }

    /// Add and mul: operand order does not matter.
    pub fn is_commutative(self) -> bool {
        matches!(self, OpCode::Add | OpCode::Mul)
    }

    /// The reflected code for `other op self`.
    ///
    /// Commutative operations keep their code; only sub, div and pow have
    /// distinct reflected codes.
    pub fn reflected(self) -> OpCode {
        match self {
            OpCode::Sub => OpCode::RSub,
            OpCode::Div => OpCode::RDiv,
            OpCode::Pow => OpCode::RPow,
            other => other,
        }
    }

    /// Maps a reflected code back onto its forward operation.
    pub fn unreflected(self) -> OpCode {
        match self {
            OpCode::RSub => OpCode::Sub,
            OpCode::RDiv => OpCode::Div,
            OpCode::RPow => OpCode::Pow,
            other => other,
        }
    }
}

impl TryFrom<u8> for OpCode {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        OpCode::ALL.get(usize::from(value)).copied().ok_or(value)
    }
}

impl From<OpCode> for u8 {
    fn from(code: OpCode) -> u8 {
        code as u8
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method_name())
    }
}
