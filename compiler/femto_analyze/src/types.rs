//! AST1 → AST2 type conversion.

use crate::Analyzer;
use femto_ir::ast::{self, ParsedType, ParsedTypeKind};
use femto_ir::sem::{Type, TypeKind};

impl Analyzer<'_> {
    /// Convert a syntactic type to an analyzed type.
    ///
    /// `Name` references resolve in their declaring module: structs and
    /// enums become nominal types; typedefs and templates were substituted
    /// during parsing and are rejected here. `Foreign` references hop
    /// through the include declaration into the target module.
    pub(crate) fn convert_type(&self, a1: &[ast::Module], src: &ParsedType) -> Option<Type> {
        match src.kind {
            ParsedTypeKind::Auto => None,

            ParsedTypeKind::Primitive => {
                let mut t = Type::new(TypeKind::Primitive, src.loc, &src.name, "");
                t.size = src.size;
                t.align = src.align;
                Some(t)
            }

            ParsedTypeKind::Ptr => {
                let inner = self.convert_type(a1, src.direct.as_deref()?)?;
                let mut t = Type::ptr_to(inner, self.arch);
                t.loc = src.loc;
                Some(t)
            }

            ParsedTypeKind::Slice => {
                let inner = self.convert_type(a1, src.direct.as_deref()?)?;
                let mut t = Type::slice_of(inner, self.arch);
                t.loc = src.loc;
                Some(t)
            }

            ParsedTypeKind::Arr => {
                let inner = self.convert_type(a1, src.direct.as_deref()?)?;
                let mut t = Type::new(TypeKind::Arr, src.loc, "[N]", "");
                t.arr_len = src.arr_len;
                t.size = inner.size * src.arr_len;
                t.align = inner.align;
                t.direct = Some(Box::new(inner));
                Some(t)
            }

            ParsedTypeKind::Func => {
                let ret = match src.direct.as_deref() {
                    Some(r) => self.convert_type(a1, r)?,
                    // parse error path: recover with void
                    None => Type::primitive("void", 0, 1),
                };
                let mut t = Type::new(TypeKind::Func, src.loc, "()", "");
                t.size = self.arch;
                t.align = self.arch;
                t.direct = Some(Box::new(ret));
                for p in &src.indirect {
                    t.indirect.push(self.convert_type(a1, p)?);
                }
                Some(t)
            }

            ParsedTypeKind::Name => {
                let Some(pos) = a1.iter().position(|m| m.uname == src.src_uname) else {
                    self.reporter().fatal(&format!(
                        "E1002 cannot find module {} at {}",
                        src.src_uname,
                        self.reporter().loc(src.loc)
                    ));
                    return None;
                };
                let Some(id) = a1[pos].find_decl(&src.name, false) else {
                    self.reporter().fatal(&format!(
                        "E1003 cannot find name {}.{} at {}",
                        src.src_uname,
                        src.name,
                        self.reporter().loc(src.loc)
                    ));
                    return None;
                };
                let (kind, decl_ty) = match a1[pos].decl(id) {
                    ast::Decl::Struct(s) => (TypeKind::Struct, &s.ty),
                    ast::Decl::Enum(e) => (TypeKind::Enum, &e.ty),
                    _ => {
                        // typedefs and templates were substituted in AST1
                        self.reporter().fatal(&format!(
                            "E1004 name {}.{} cannot be a type at {}",
                            src.src_uname,
                            src.name,
                            self.reporter().loc(src.loc)
                        ));
                        return None;
                    }
                };
                if decl_ty.size <= 0 {
                    self.reporter().fatal(&format!(
                        "E1001 incomplete type {} at {}",
                        src.name,
                        self.reporter().loc(src.loc)
                    ));
                }
                let mut t = Type::new(kind, src.loc, &src.name, &src.src_uname);
                t.size = decl_ty.size;
                t.align = decl_ty.align;
                Some(t)
            }

            ParsedTypeKind::Foreign => {
                let Some(pos) = a1.iter().position(|m| m.uname == src.src_uname) else {
                    self.reporter().fatal(&format!(
                        "E1005 cannot find module {} at {}",
                        src.src_uname,
                        self.reporter().loc(src.loc)
                    ));
                    return None;
                };
                let inc = a1[pos].find_decl(&src.inc_name, false);
                let Some(ast::Decl::Include { tgt_uname, .. }) =
                    inc.map(|id| a1[pos].decl(id))
                else {
                    self.reporter().fatal(&format!(
                        "E1006 cannot find include {}.{} at {}",
                        src.src_uname,
                        src.inc_name,
                        self.reporter().loc(src.loc)
                    ));
                    return None;
                };
                let mut name_ty = ParsedType::new(
                    ParsedTypeKind::Name,
                    src.loc,
                    &src.name,
                    "",
                    tgt_uname.clone(),
                );
                name_ty.size = src.size;
                name_ty.align = src.align;
                self.convert_type(a1, &name_ty)
            }
        }
    }
}
