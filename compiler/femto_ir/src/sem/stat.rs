//! Analyzed statements.

use super::{Decl, Expr};
use crate::ast::AssignOp;
use crate::Loc;

/// An analyzed scope.
///
/// Deferred expressions collected from the scope's `defer` statements run at
/// scope exit in declaration order. `returns` is the bottom-up
/// control-flow bit: true when the scope always reaches a `return`.
#[derive(Clone, Debug, Default)]
pub struct Scope {
    pub uid: i64,
    pub loc: Loc,
    pub body: Vec<Stat>,
    pub defers: Vec<Expr>,
    pub is_func_body: bool,
    pub is_loop_body: bool,
    pub returns: bool,
}

/// Payload of an analyzed statement.
#[derive(Clone, Debug)]
pub enum StatKind {
    RawC {
        code: String,
    },
    RawIr {
        code: String,
    },
    Expr {
        expr: Expr,
    },
    /// Local variable declaration.
    Decl {
        decl: Box<Decl>,
    },
    Assign {
        op: AssignOp,
        left: Expr,
        right: Expr,
    },
    Return {
        value: Option<Expr>,
    },
    /// `loop_uid` is the uid of the enclosing loop statement.
    Break {
        loop_uid: i64,
    },
    Continue {
        loop_uid: i64,
    },
    Scope(Scope),
    If {
        cond: Expr,
        then_body: Box<Stat>,
        else_body: Option<Box<Stat>>,
    },
    While {
        cond: Expr,
        body: Box<Stat>,
    },
    /// Classic for; the init declaration was hoisted into the enclosing scope
    /// by the parser.
    For {
        cond: Expr,
        step: Option<Box<Stat>>,
        body: Box<Stat>,
    },
    /// Iteration variables are `(name, uid)` of declarations in the
    /// enclosing scope.
    Foreach {
        var_i: (String, i64),
        var_r: (String, i64),
        iter: Expr,
        body: Box<Stat>,
    },
    Switch {
        cond: Expr,
        case_conds: Vec<i64>,
        case_falls: Vec<bool>,
        case_bodies: Vec<Scope>,
        default_body: Option<Scope>,
    },
}

/// An analyzed statement: payload plus uid and the `returns` bit.
#[derive(Clone, Debug)]
pub struct Stat {
    pub loc: Loc,
    pub uid: i64,
    pub returns: bool,
    pub kind: StatKind,
}

impl Stat {
    pub fn new(loc: Loc, uid: i64, kind: StatKind) -> Self {
        let returns = matches!(kind, StatKind::Return { .. });
        Stat {
            loc,
            uid,
            returns,
            kind,
        }
    }
}
