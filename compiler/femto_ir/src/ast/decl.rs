//! Syntactic declarations.

use super::{Expr, ParsedType, ScopeId};
use crate::Loc;

/// A variable declaration, top-level or local.
#[derive(Clone, Debug)]
pub struct VarDecl {
    pub loc: Loc,
    pub name: String,
    /// `None` only for foreach variables declared with `auto i, r :`.
    pub ty: Option<ParsedType>,
    pub init: Option<Expr>,
    pub exported: bool,
    pub is_define: bool,
    pub is_const: bool,
    pub is_volatile: bool,
    pub is_extern: bool,
    pub is_param: bool,
}

/// A function or method declaration.
///
/// For methods `name` is `Struct.method`; `struct_name`/`func_name` hold the
/// split components and are empty/equal to `name` for free functions.
#[derive(Clone, Debug)]
pub struct FuncDecl {
    pub loc: Loc,
    pub name: String,
    pub struct_name: String,
    pub func_name: String,
    /// `Func` type: return in `direct`, parameter types in `indirect`.
    pub ty: ParsedType,
    pub params: Vec<String>,
    /// Body scope: parameter declarations followed by the brace scope.
    pub body: ScopeId,
    pub exported: bool,
    pub is_va_arg: bool,
    pub is_va_arg_ad: bool,
}

/// A struct declaration. Offsets are `-1` until the sizing pass completes.
#[derive(Clone, Debug)]
pub struct StructDecl {
    pub loc: Loc,
    pub name: String,
    /// `Name` type carrying the struct's resolved size/align.
    pub ty: ParsedType,
    pub mem_types: Vec<ParsedType>,
    pub mem_names: Vec<String>,
    pub mem_offsets: Vec<i64>,
    pub exported: bool,
}

/// An enum declaration. The backing type width is the smallest signed
/// integer containing `[min, max]` of the member values.
#[derive(Clone, Debug)]
pub struct EnumDecl {
    pub loc: Loc,
    pub name: String,
    pub ty: ParsedType,
    pub mem_names: Vec<String>,
    pub mem_values: Vec<i64>,
    pub exported: bool,
}

/// Kind tag for [`Decl`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum DeclKind {
    RawC,
    RawIr,
    Include,
    Typedef,
    Template,
    Var,
    Func,
    Struct,
    Enum,
}

/// A syntactic declaration.
#[derive(Clone, Debug)]
pub enum Decl {
    RawC {
        loc: Loc,
        code: String,
    },
    RawIr {
        loc: Loc,
        code: String,
    },
    /// `include<T,...> "path" alias` - resolved to an absolute path and the
    /// target module's unique name.
    Include {
        loc: Loc,
        name: String,
        tgt_path: String,
        tgt_uname: String,
        arg_types: Vec<ParsedType>,
    },
    Typedef {
        loc: Loc,
        name: String,
        ty: ParsedType,
        exported: bool,
    },
    /// A module-level template parameter bound to an include-site argument.
    Template {
        loc: Loc,
        name: String,
        ty: Option<ParsedType>,
    },
    Var(VarDecl),
    Func(FuncDecl),
    Struct(StructDecl),
    Enum(EnumDecl),
}

impl Decl {
    #[inline]
    pub fn kind(&self) -> DeclKind {
        match self {
            Decl::RawC { .. } => DeclKind::RawC,
            Decl::RawIr { .. } => DeclKind::RawIr,
            Decl::Include { .. } => DeclKind::Include,
            Decl::Typedef { .. } => DeclKind::Typedef,
            Decl::Template { .. } => DeclKind::Template,
            Decl::Var(_) => DeclKind::Var,
            Decl::Func(_) => DeclKind::Func,
            Decl::Struct(_) => DeclKind::Struct,
            Decl::Enum(_) => DeclKind::Enum,
        }
    }

    #[inline]
    pub fn loc(&self) -> Loc {
        match self {
            Decl::RawC { loc, .. }
            | Decl::RawIr { loc, .. }
            | Decl::Include { loc, .. }
            | Decl::Typedef { loc, .. }
            | Decl::Template { loc, .. } => *loc,
            Decl::Var(v) => v.loc,
            Decl::Func(f) => f.loc,
            Decl::Struct(s) => s.loc,
            Decl::Enum(e) => e.loc,
        }
    }

    /// Declared name; empty for raw code blocks.
    pub fn name(&self) -> &str {
        match self {
            Decl::RawC { .. } | Decl::RawIr { .. } => "",
            Decl::Include { name, .. }
            | Decl::Typedef { name, .. }
            | Decl::Template { name, .. } => name,
            Decl::Var(v) => &v.name,
            Decl::Func(f) => &f.name,
            Decl::Struct(s) => &s.name,
            Decl::Enum(e) => &e.name,
        }
    }

    /// The declared type, where one exists.
    pub fn ty(&self) -> Option<&ParsedType> {
        match self {
            Decl::Typedef { ty, .. } => Some(ty),
            Decl::Template { ty, .. } => ty.as_ref(),
            Decl::Var(v) => v.ty.as_ref(),
            Decl::Func(f) => Some(&f.ty),
            Decl::Struct(s) => Some(&s.ty),
            Decl::Enum(e) => Some(&e.ty),
            _ => None,
        }
    }

    /// Cross-module exportability: the name starts with an uppercase ASCII
    /// letter; methods additionally require an uppercase owner struct name.
    pub fn is_exported_name(&self) -> bool {
        fn upper(s: &str) -> bool {
            s.as_bytes().first().is_some_and(u8::is_ascii_uppercase)
        }
        match self {
            Decl::Func(f) if !f.struct_name.is_empty() => {
                upper(&f.struct_name) && upper(&f.func_name)
            }
            d => upper(d.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exported_name_rule() {
        let var = Decl::Var(VarDecl {
            loc: Loc::NONE,
            name: "Count".into(),
            ty: None,
            init: None,
            exported: false,
            is_define: false,
            is_const: false,
            is_volatile: false,
            is_extern: false,
            is_param: false,
        });
        assert!(var.is_exported_name());

        let mk_func = |name: &str, st: &str, f: &str| {
            Decl::Func(FuncDecl {
                loc: Loc::NONE,
                name: name.into(),
                struct_name: st.into(),
                func_name: f.into(),
                ty: ParsedType::new(
                    crate::ast::ParsedTypeKind::Func,
                    Loc::NONE,
                    "()",
                    "",
                    "",
                ),
                params: vec![],
                body: ScopeId(0),
                exported: false,
                is_va_arg: false,
                is_va_arg_ad: false,
            })
        };
        assert!(mk_func("Main", "", "Main").is_exported_name());
        assert!(mk_func("List.Push", "List", "Push").is_exported_name());
        assert!(!mk_func("List.push", "List", "push").is_exported_name());
        assert!(!mk_func("list.Push", "list", "Push").is_exported_name());
    }
}
