//! Declaration conversion (phase 1) and the per-module body driver (phase 2).

use crate::context::Context;
use crate::Analyzer;
use femto_ir::ast::{self, Stat};
use femto_ir::sem::{self, Decl, DeclBody, Type};

impl Analyzer<'_> {
    /// Convert a module's top-level declarations into an analyzed module.
    ///
    /// Includes, typedefs and templates are compile-time only and have no
    /// analyzed counterpart; raw blocks pass through unchanged.
    pub(crate) fn convert_module_decls(
        &self,
        a1: &[ast::Module],
        module: &ast::Module,
    ) -> sem::Module {
        let mut out = sem::Module::new(module.src_id, &module.uname, module.chunk_id);
        for st in &module.scope(ast::Module::TOP).body {
            let Stat::Decl { decl, .. } = st else { continue };
            if let Some(d) = self.convert_decl(a1, module, module.decl(*decl)) {
                out.push_decl(d);
            }
        }
        out
    }

    fn convert_decl(
        &self,
        a1: &[ast::Module],
        module: &ast::Module,
        decl: &ast::Decl,
    ) -> Option<Decl> {
        let uname = module.uname.clone();
        match decl {
            ast::Decl::RawC { loc, code } => Some(Decl {
                loc: *loc,
                uid: self.next_uid(),
                name: String::new(),
                src_uname: uname,
                ty: self.ty_void(),
                exported: false,
                body: DeclBody::RawC { code: code.clone() },
            }),
            ast::Decl::RawIr { loc, code } => Some(Decl {
                loc: *loc,
                uid: self.next_uid(),
                name: String::new(),
                src_uname: uname,
                ty: self.ty_void(),
                exported: false,
                body: DeclBody::RawIr { code: code.clone() },
            }),

            ast::Decl::Var(v) => {
                // global initializers are constexpr literals after folding;
                // an auto global takes its literal's default type
                let parsed = v.ty.as_ref()?;
                let (ty, init) = if parsed.kind == ast::ParsedTypeKind::Auto {
                    let Some(init) = v.init.as_ref().and_then(|e| self.convert_expr_global(e, None))
                    else {
                        self.reporter().error(&format!(
                            "E1612 auto variable {} needs an initializer at {}",
                            v.name,
                            self.reporter().loc(v.loc)
                        ));
                        return None;
                    };
                    (init.ty.clone(), Some(init))
                } else {
                    let ty = self.convert_type(a1, parsed)?;
                    let init = match &v.init {
                        Some(e) => self.convert_expr_global(e, Some(&ty)),
                        None => None,
                    };
                    (ty, init)
                };
                Some(Decl {
                    loc: v.loc,
                    uid: self.next_uid(),
                    name: v.name.clone(),
                    src_uname: uname,
                    ty,
                    exported: decl.is_exported_name(),
                    body: DeclBody::Var(sem::VarDecl {
                        init,
                        is_define: v.is_define,
                        is_const: v.is_const,
                        is_volatile: v.is_volatile,
                        is_extern: v.is_extern,
                        is_param: v.is_param,
                    }),
                })
            }

            ast::Decl::Func(f) => {
                let ty = self.convert_type(a1, &f.ty)?;
                Some(Decl {
                    loc: f.loc,
                    uid: self.next_uid(),
                    name: f.name.clone(),
                    src_uname: uname,
                    ty,
                    exported: decl.is_exported_name(),
                    body: DeclBody::Func(sem::FuncDecl {
                        struct_name: f.struct_name.clone(),
                        func_name: f.func_name.clone(),
                        params: f.params.clone(),
                        body: None,
                        is_va_arg: f.is_va_arg,
                        is_va_arg_ad: f.is_va_arg_ad,
                    }),
                })
            }

            ast::Decl::Struct(s) => {
                let mut mem_types = Vec::with_capacity(s.mem_types.len());
                for t in &s.mem_types {
                    mem_types.push(self.convert_type(a1, t)?);
                }
                let mut ty = Type::new(sem::TypeKind::Struct, s.loc, &s.name, &uname);
                ty.size = s.ty.size;
                ty.align = s.ty.align;
                Some(Decl {
                    loc: s.loc,
                    uid: self.next_uid(),
                    name: s.name.clone(),
                    src_uname: uname,
                    ty,
                    exported: decl.is_exported_name(),
                    body: DeclBody::Struct(sem::StructDecl {
                        mem_types,
                        mem_names: s.mem_names.clone(),
                        mem_offsets: s.mem_offsets.clone(),
                    }),
                })
            }

            ast::Decl::Enum(e) => {
                let mut ty = Type::new(sem::TypeKind::Enum, e.loc, &e.name, &uname);
                ty.size = e.ty.size;
                ty.align = e.ty.align;
                Some(Decl {
                    loc: e.loc,
                    uid: self.next_uid(),
                    name: e.name.clone(),
                    src_uname: uname,
                    ty,
                    exported: decl.is_exported_name(),
                    body: DeclBody::Enum(sem::EnumDecl {
                        mem_names: e.mem_names.clone(),
                        mem_values: e.mem_values.clone(),
                    }),
                })
            }

            // compile-time only declarations
            ast::Decl::Include { .. } | ast::Decl::Typedef { .. } | ast::Decl::Template { .. } => {
                None
            }
        }
    }

    /// Convert one module's function bodies. Reads only this module's AST1
    /// and the read-only declaration tables of all modules; safe to run in
    /// parallel across modules.
    pub(crate) fn analyze_module_functions(
        &self,
        a1: &[ast::Module],
        mi: usize,
    ) -> Vec<(usize, sem::Scope)> {
        let mut out = Vec::new();
        for (di, decl) in self.modules[mi].decls.iter().enumerate() {
            let DeclBody::Func(f) = &decl.body else {
                continue;
            };
            let Some(a1_id) = a1[mi].find_decl(&decl.name, false) else {
                continue;
            };
            let ast::Decl::Func(a1f) = a1[mi].decl(a1_id) else {
                continue;
            };
            let ret = decl
                .ty
                .direct
                .as_deref()
                .cloned()
                .unwrap_or_else(|| self.ty_void());

            let mut ctx = Context::new(
                mi,
                self.modules[mi].uname.clone(),
                f.struct_name.clone(),
                ret.clone(),
            );
            let mut scope = self.convert_scope(&mut ctx, a1, mi, a1f.body);
            scope.is_func_body = true;
            if !ret.is_void() && !scope.returns {
                self.reporter().error(&format!(
                    "E1616 function {} does not return a value at {}",
                    decl.name,
                    self.reporter().loc(decl.loc)
                ));
            }
            out.push((di, scope));
        }
        out
    }
}
