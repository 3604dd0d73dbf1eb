//! Analyzed declarations.

use super::{Expr, Scope, Type};
use crate::Loc;

/// Kind tag for [`Decl`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum DeclKind {
    RawC,
    RawIr,
    Var,
    Func,
    Struct,
    Enum,
}

/// Analyzed variable declaration.
#[derive(Clone, Debug)]
pub struct VarDecl {
    pub init: Option<Expr>,
    pub is_define: bool,
    pub is_const: bool,
    pub is_volatile: bool,
    pub is_extern: bool,
    pub is_param: bool,
}

/// Analyzed function declaration. `body` is filled by the second analysis
/// phase; extern declarations keep it `None`.
#[derive(Clone, Debug)]
pub struct FuncDecl {
    pub struct_name: String,
    pub func_name: String,
    pub params: Vec<String>,
    pub body: Option<Scope>,
    pub is_va_arg: bool,
    pub is_va_arg_ad: bool,
}

/// Analyzed struct declaration with resolved member layout.
#[derive(Clone, Debug)]
pub struct StructDecl {
    pub mem_types: Vec<Type>,
    pub mem_names: Vec<String>,
    pub mem_offsets: Vec<i64>,
}

/// Analyzed enum declaration.
#[derive(Clone, Debug)]
pub struct EnumDecl {
    pub mem_names: Vec<String>,
    pub mem_values: Vec<i64>,
}

/// Payload of an analyzed declaration.
#[derive(Clone, Debug)]
pub enum DeclBody {
    RawC { code: String },
    RawIr { code: String },
    Var(VarDecl),
    Func(FuncDecl),
    Struct(StructDecl),
    Enum(EnumDecl),
}

/// An analyzed top-level declaration.
///
/// `uid` is globally unique across the whole compilation (atomic counter);
/// `ty` is the variable type, the function signature, or the nominal
/// struct/enum type carrying size and alignment.
#[derive(Clone, Debug)]
pub struct Decl {
    pub loc: Loc,
    pub uid: i64,
    pub name: String,
    pub src_uname: String,
    pub ty: Type,
    pub exported: bool,
    pub body: DeclBody,
}

impl Decl {
    #[inline]
    pub fn kind(&self) -> DeclKind {
        match &self.body {
            DeclBody::RawC { .. } => DeclKind::RawC,
            DeclBody::RawIr { .. } => DeclKind::RawIr,
            DeclBody::Var(_) => DeclKind::Var,
            DeclBody::Func(_) => DeclKind::Func,
            DeclBody::Struct(_) => DeclKind::Struct,
            DeclBody::Enum(_) => DeclKind::Enum,
        }
    }

    #[inline]
    pub fn as_var(&self) -> Option<&VarDecl> {
        match &self.body {
            DeclBody::Var(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_func(&self) -> Option<&FuncDecl> {
        match &self.body {
            DeclBody::Func(f) => Some(f),
            _ => None,
        }
    }

    #[inline]
    pub fn as_struct(&self) -> Option<&StructDecl> {
        match &self.body {
            DeclBody::Struct(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    pub fn as_enum(&self) -> Option<&EnumDecl> {
        match &self.body {
            DeclBody::Enum(e) => Some(e),
            _ => None,
        }
    }
}
