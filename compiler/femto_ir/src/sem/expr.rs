//! Analyzed expressions.

use super::Type;
use crate::{Literal, Loc};

/// Operator subtype of an analyzed operator node.
///
/// `Dot`/`Arrow` carry the member index in `access_pos`; `Cast` and `Sizeof`
/// carry a type operand; integrated functions never go through the call path.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum OpKind {
    // unary
    Plus,
    Minus,
    LogicNot,
    BitNot,
    Ref,
    Deref,
    Inc,
    Dec,
    // member access
    Dot,
    Arrow,
    Index,
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
    Slice,
    Cond,
    // integrated functions
    Sizeof,
    Cast,
    Make,
    Len,
    Move,
}

/// What a resolved name refers to.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum NameKind {
    Var,
    Func,
    Struct,
    Enum,
}

/// Callee of an analyzed call.
#[derive(Clone, Debug)]
pub enum CallTarget {
    /// Static function or method: declaration handle.
    Decl {
        uname: String,
        name: String,
        uid: i64,
    },
    /// Function pointer expression.
    Ptr(Box<Expr>),
}

/// Payload of an analyzed expression.
#[derive(Clone, Debug)]
pub enum ExprKind {
    Literal {
        value: Literal,
        /// Set when an integer literal was converted in an enum context.
        enum_name: Option<String>,
    },
    LitData {
        elements: Vec<Expr>,
    },
    Op {
        op: OpKind,
        type_operand: Option<Box<Type>>,
        operand0: Option<Box<Expr>>,
        operand1: Option<Box<Expr>>,
        operand2: Option<Box<Expr>>,
        /// Struct member index for `Dot`/`Arrow`.
        access_pos: i64,
    },
    /// A resolved name. Locals have an empty `uname`; cross-module names are
    /// dereferenced through the module table by `(uname, name)`.
    Name {
        name_kind: NameKind,
        uname: String,
        name: String,
        uid: i64,
    },
    Call {
        target: CallTarget,
        args: Vec<Expr>,
    },
}

/// An analyzed expression: payload plus resolved type and value category.
#[derive(Clone, Debug)]
pub struct Expr {
    pub loc: Loc,
    pub ty: Type,
    pub is_lvalue: bool,
    pub is_const: bool,
    pub kind: ExprKind,
}

impl Expr {
    /// An rvalue, non-const expression of the given type.
    pub fn rvalue(loc: Loc, ty: Type, kind: ExprKind) -> Self {
        Expr {
            loc,
            ty,
            is_lvalue: false,
            is_const: false,
            kind,
        }
    }

    /// A typed literal.
    pub fn literal(loc: Loc, ty: Type, value: Literal) -> Self {
        Expr::rvalue(
            loc,
            ty,
            ExprKind::Literal {
                value,
                enum_name: None,
            },
        )
    }

    #[inline]
    pub fn as_literal(&self) -> Option<&Literal> {
        match &self.kind {
            ExprKind::Literal { value, .. } => Some(value),
            _ => None,
        }
    }
}
