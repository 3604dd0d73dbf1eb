//! Analyzed AST (AST2).
//!
//! Produced by `femto_analyze`. Every expression node carries a resolved
//! [`Type`], an lvalue flag and a const flag; implicit conversions have been
//! made explicit; names are resolved to declaration handles (module uname +
//! name + uid). Statements carry a unique id and a bottom-up `returns` bit.

mod decl;
mod expr;
mod module;
mod stat;
mod ty;

pub use decl::{Decl, DeclBody, DeclKind, EnumDecl, FuncDecl, StructDecl, VarDecl};
pub use expr::{CallTarget, Expr, ExprKind, NameKind, OpKind};
pub use module::Module;
pub use stat::{Scope, Stat, StatKind};
pub use ty::{Type, TypeKind};
