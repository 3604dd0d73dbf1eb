//! Syntactic statements.

use super::{DeclId, Expr, ScopeId};
use crate::Loc;

/// Assignment operator of an assign statement.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum AssignOp {
    Set,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

/// Switch statement payload: parallel case vectors plus an optional default.
///
/// `case_falls[i]` marks case `i` as falling through into the next case.
#[derive(Clone, Debug)]
pub struct SwitchStat {
    pub cond: Option<Expr>,
    pub case_conds: Vec<i64>,
    pub case_falls: Vec<bool>,
    pub case_bodies: Vec<ScopeId>,
    pub default_body: Option<ScopeId>,
}

/// A syntactic statement.
#[derive(Clone, Debug)]
pub enum Stat {
    RawC { loc: Loc, code: String },
    RawIr { loc: Loc, code: String },
    Expr { loc: Loc, expr: Expr },
    Decl { loc: Loc, decl: DeclId },
    Assign {
        loc: Loc,
        op: AssignOp,
        left: Expr,
        right: Expr,
    },
    Return { loc: Loc, value: Option<Expr> },
    Defer { loc: Loc, expr: Expr },
    Break { loc: Loc },
    Continue { loc: Loc },
    Fall { loc: Loc },
    Scope { loc: Loc, scope: ScopeId },
    If {
        loc: Loc,
        cond: Option<Expr>,
        then_body: Option<Box<Stat>>,
        else_body: Option<Box<Stat>>,
    },
    While {
        loc: Loc,
        cond: Option<Expr>,
        body: Option<Box<Stat>>,
    },
    For {
        loc: Loc,
        cond: Option<Expr>,
        step: Option<Box<Stat>>,
        body: Option<Box<Stat>>,
    },
    Foreach {
        loc: Loc,
        var_i: String,
        var_r: String,
        iter: Option<Expr>,
        body: Option<Box<Stat>>,
    },
    Switch { loc: Loc, switch: SwitchStat },
}

impl Stat {
    #[inline]
    pub fn loc(&self) -> Loc {
        match self {
            Stat::RawC { loc, .. }
            | Stat::RawIr { loc, .. }
            | Stat::Expr { loc, .. }
            | Stat::Decl { loc, .. }
            | Stat::Assign { loc, .. }
            | Stat::Return { loc, .. }
            | Stat::Defer { loc, .. }
            | Stat::Break { loc }
            | Stat::Continue { loc }
            | Stat::Fall { loc }
            | Stat::Scope { loc, .. }
            | Stat::If { loc, .. }
            | Stat::While { loc, .. }
            | Stat::For { loc, .. }
            | Stat::Foreach { loc, .. }
            | Stat::Switch { loc, .. } => *loc,
        }
    }
}
