//! Shared IR for the Femto compiler.
//!
//! The front-end works over two tree shapes:
//!
//! - [`ast`] - the syntactic AST produced by the parser (AST1). Types may be
//!   unresolved forward references, sizes may still be `-1`, and names are
//!   plain strings resolved through scope maps.
//! - [`sem`] - the analyzed AST produced by the semantic pass (AST2). Every
//!   expression carries a resolved [`sem::Type`], an lvalue flag and a const
//!   flag; cross-module references are `(module uname, name)` pairs resolved
//!   through the module table, never pointers.
//!
//! Supporting types live at the crate root: [`Loc`] for source locations,
//! [`Literal`] for folded constant values, and [`Token`]/[`TokenKind`] for
//! the lexer output.

pub mod ast;
pub mod sem;

mod literal;
mod loc;
mod token;

pub use literal::{Literal, LiteralKind};
pub use loc::Loc;
pub use token::{Token, TokenKind};
