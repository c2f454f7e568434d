//! Expression syntax tree.

use crate::Value;

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `!`
    Not,
    /// `-`
    Negate,
    /// `+`
    Plus,
}

impl UnaryOp {
    pub(crate) fn from_operator(op: &str) -> Option<Self> {
        match op {
            "!" => Some(Self::Not),
            "-" => Some(Self::Negate),
            "+" => Some(Self::Plus),
            _ => None,
        }
    }
}

/// Infix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    StrictEq,
    StrictNe,
    /// `&&`, short-circuits.
    And,
    /// `||`, short-circuits.
    Or,
    /// `??`, short-circuits.
    Nullish,
    /// `|>`, feeds the left value into the function on the right.
    Pipe,
}

impl BinaryOp {
    pub(crate) fn from_operator(op: &str) -> Option<Self> {
        Some(match op {
            "+" => Self::Add,
            "-" => Self::Sub,
            "*" => Self::Mul,
            "/" => Self::Div,
            "%" => Self::Rem,
            "<" => Self::Lt,
            "<=" => Self::Le,
            ">" => Self::Gt,
            ">=" => Self::Ge,
            "==" => Self::Eq,
            "!=" => Self::Ne,
            "===" => Self::StrictEq,
            "!==" => Self::StrictNe,
            "&&" => Self::And,
            "||" => Self::Or,
            "??" => Self::Nullish,
            "|>" => Self::Pipe,
            _ => return None,
        })
    }
}

/// A parsed expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// String, number, boolean, `null` or `undefined`.
    Literal(Value),
    /// Bare name such as `$` or `file`.
    Identifier(String),
    /// `object.property`
    Member {
        object: Box<Expr>,
        property: String,
    },
    /// `object[index]`
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    /// `callee(args)`. Only identifiers and members are callable.
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `condition ? consequent : alternate`
    Ternary {
        condition: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
    },
    /// `[a, b]`
    Array(Vec<Expr>),
    /// `{ key: value }`, keys in source order.
    Object(Vec<(String, Expr)>),
}
