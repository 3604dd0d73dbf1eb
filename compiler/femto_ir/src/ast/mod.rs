//! Syntactic AST (AST1).
//!
//! Produced by `femto_parse`. Types may still contain unresolved forward
//! references (`Name`/`Foreign` with `size == -1`); struct sizes are filled in
//! by the parser's fixed-point pass. Scopes and declarations live in
//! per-module arenas addressed by [`ScopeId`] and [`DeclId`], so a name map
//! entry and a body statement can refer to the same declaration without
//! shared ownership.

mod decl;
mod expr;
mod module;
mod stat;
mod ty;

pub use decl::{Decl, DeclKind, EnumDecl, FuncDecl, StructDecl, VarDecl};
pub use expr::{Expr, OpKind};
pub use module::{DeclId, Module, Scope, ScopeId};
pub use stat::{AssignOp, Stat, SwitchStat};
pub use ty::{ParsedType, ParsedTypeKind};
