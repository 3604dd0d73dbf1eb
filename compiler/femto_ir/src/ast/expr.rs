//! Syntactic expressions.

use super::ParsedType;
use crate::{Literal, Loc};

/// Operator subtype of an [`Expr::Op`] node.
///
/// Integrated functions (`sizeof`, `cast`, `make`, `len`, `move`) are
/// dedicated variants rather than calls; `cast` and `sizeof` may carry a
/// type operand instead of (or in addition to) expression operands.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum OpKind {
    // postfix / access
    Dot,
    Index,
    Slice,
    // unary
    Plus,
    Minus,
    LogicNot,
    BitNot,
    Ref,
    Deref,
    Inc,
    Dec,
    // binary
    Mul,
    Div,
    Mod,
    Add,
    Sub,
    Shl,
    Shr,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    BitAnd,
    BitXor,
    BitOr,
    LogicAnd,
    LogicOr,
    // ternary
    Cond,
    // integrated functions
    Sizeof,
    Cast,
    Make,
    Len,
    Move,
}

/// A syntactic expression.
#[derive(Clone, Debug)]
pub enum Expr {
    /// A literal value, possibly produced by constant folding.
    Literal { loc: Loc, value: Literal },
    /// `{ e, e, ... }` data literal.
    LitData { loc: Loc, elements: Vec<Expr> },
    /// A bare identifier, resolved by the analyzer.
    Name { loc: Loc, name: String },
    /// Operator node. Unused operand slots are `None`.
    Op {
        loc: Loc,
        op: OpKind,
        type_operand: Option<Box<ParsedType>>,
        operand0: Option<Box<Expr>>,
        operand1: Option<Box<Expr>>,
        operand2: Option<Box<Expr>>,
    },
    /// Function call; the callee is an arbitrary expression.
    Call {
        loc: Loc,
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
}

impl Expr {
    #[inline]
    pub fn loc(&self) -> Loc {
        match self {
            Expr::Literal { loc, .. }
            | Expr::LitData { loc, .. }
            | Expr::Name { loc, .. }
            | Expr::Op { loc, .. }
            | Expr::Call { loc, .. } => *loc,
        }
    }

    #[inline]
    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Expr::Literal { value, .. } => Some(value),
            _ => None,
        }
    }

    #[inline]
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Expr::Name { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Build an operator node with up to three operands.
    pub fn op(loc: Loc, op: OpKind) -> Expr {
        Expr::Op {
            loc,
            op,
            type_operand: None,
            operand0: None,
            operand1: None,
            operand2: None,
        }
    }
}
