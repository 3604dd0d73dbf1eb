//! Expression conversion: AST1 expressions to typed AST2 expressions.

use crate::context::{visibility, Context, Domain, Visibility};
use crate::Analyzer;
use femto_ir::ast::{self, OpKind as Op1};
use femto_ir::sem::{self, CallTarget, DeclBody, ExprKind, NameKind, OpKind, Type, TypeKind};
use femto_ir::{Literal, Loc};

/// Build an rvalue operator expression.
fn op_expr(
    loc: Loc,
    ty: Type,
    op: OpKind,
    o0: Option<sem::Expr>,
    o1: Option<sem::Expr>,
    o2: Option<sem::Expr>,
) -> sem::Expr {
    sem::Expr::rvalue(
        loc,
        ty,
        ExprKind::Op {
            op,
            type_operand: None,
            operand0: o0.map(Box::new),
            operand1: o1.map(Box::new),
            operand2: o2.map(Box::new),
            access_pos: -1,
        },
    )
}

impl Analyzer<'_> {
    /// Convert an expression, optionally against a forced type. A forced
    /// type both guides literal conversion and is enforced on the result.
    pub(crate) fn convert_expr(
        &self,
        ctx: &mut Context,
        a1: &[ast::Module],
        e: &ast::Expr,
        forced: Option<&Type>,
    ) -> Option<sem::Expr> {
        match e {
            ast::Expr::Literal { loc, value } => self.convert_literal(*loc, value, forced),

            ast::Expr::LitData { loc, elements } => {
                self.convert_litdata(ctx, a1, *loc, elements, forced)
            }

            ast::Expr::Name { loc, name } => {
                let res = self.convert_name(ctx, *loc, name)?;
                self.check_forced(res, forced, "E1102")
            }

            ast::Expr::Op { op: Op1::Dot, .. } => {
                let res = self.convert_dot(ctx, a1, e)?;
                self.check_forced(res, forced, "E1107")
            }

            ast::Expr::Op { .. } => {
                let res = self.convert_op(ctx, a1, e)?;
                self.check_forced(res, forced, "E1107")
            }

            ast::Expr::Call { .. } => {
                let res = self.convert_call(ctx, a1, e)?;
                self.check_forced(res, forced, "E1107")
            }
        }
    }

    /// Conversion for global initializers: after folding, these are plain
    /// literals, so no scope context is needed.
    pub(crate) fn convert_expr_global(
        &self,
        e: &ast::Expr,
        forced: Option<&Type>,
    ) -> Option<sem::Expr> {
        match e {
            ast::Expr::Literal { loc, value } => self.convert_literal(*loc, value, forced),
            // non-constexpr initializers were already rejected at parse
            _ => None,
        }
    }

    fn check_forced(
        &self,
        e: sem::Expr,
        forced: Option<&Type>,
        code: &str,
    ) -> Option<sem::Expr> {
        if let Some(f) = forced {
            if !f.equals(&e.ty) {
                self.reporter().error(&format!(
                    "{code} expected type {f}, got {} at {}",
                    e.ty,
                    self.reporter().loc(e.loc)
                ));
                return None;
            }
        }
        Some(e)
    }

    /// Typed literal conversion.
    ///
    /// Integer literals convert to any integer primitive or any enum (the
    /// enum name is recorded on the literal); floats to float primitives;
    /// strings to `u8[]`, `u8*`, or `u8[N]` with room for the bytes; `null`
    /// to any pointer, slice or function type.
    pub(crate) fn convert_literal(
        &self,
        loc: Loc,
        value: &Literal,
        forced: Option<&Type>,
    ) -> Option<sem::Expr> {
        let Some(forced) = forced else {
            let ty = match value {
                Literal::Int(_) => self.ty_int(),
                Literal::Float(_) => self
                    .pool()
                    .get("f64")
                    .unwrap_or_else(|| Type::primitive("f64", 8, 8)),
                Literal::Str(_) => self.ty_slice_of(
                    self.pool()
                        .get("u8")
                        .unwrap_or_else(|| Type::primitive("u8", 1, 1)),
                ),
                Literal::Bool(_) => self.ty_bool(),
                Literal::Null => self.ty_ptr_to(self.ty_void()),
            };
            return Some(sem::Expr::literal(loc, ty, value.clone()));
        };

        let mismatch = || {
            self.reporter().error(&format!(
                "E1105 cannot convert {value} literal to {forced} at {}",
                self.reporter().loc(loc)
            ));
            None
        };
        let u8_elem = |t: &Type| t.elem().is_some_and(|e| e.is_uint() && e.size == 1);

        let ok = match forced.kind {
            TypeKind::Primitive => match value {
                Literal::Int(_) => forced.is_int(),
                Literal::Float(_) => forced.is_float(),
                Literal::Bool(_) => forced.is_bool(),
                _ => false,
            },
            TypeKind::Ptr => match value {
                Literal::Str(_) => u8_elem(forced),
                Literal::Null => true,
                _ => false,
            },
            TypeKind::Arr => match value {
                Literal::Str(s) => {
                    if !u8_elem(forced) {
                        false
                    } else if forced.arr_len <= s.len() as i64 {
                        self.reporter().error(&format!(
                            "E1108 string of {} bytes does not fit {forced} at {}",
                            s.len(),
                            self.reporter().loc(loc)
                        ));
                        return None;
                    } else {
                        true
                    }
                }
                _ => false,
            },
            TypeKind::Slice => matches!(value, Literal::Str(_) | Literal::Null) && match value {
                Literal::Str(_) => u8_elem(forced),
                _ => true,
            },
            TypeKind::Func => matches!(value, Literal::Null),
            TypeKind::Enum => matches!(value, Literal::Int(_)),
            TypeKind::Struct => false,
        };
        if !ok {
            return mismatch();
        }

        let mut res = sem::Expr::literal(loc, forced.clone(), value.clone());
        if forced.kind == TypeKind::Enum {
            if let ExprKind::Literal { enum_name, .. } = &mut res.kind {
                *enum_name = Some(forced.name.clone());
            }
        }
        Some(res)
    }

    /// `{ e, e, ... }` data literal conversion.
    fn convert_litdata(
        &self,
        ctx: &mut Context,
        a1: &[ast::Module],
        loc: Loc,
        elements: &[ast::Expr],
        forced: Option<&Type>,
    ) -> Option<sem::Expr> {
        let Some(forced) = forced else {
            // no expectation: all elements must agree; result is Arr[N]
            if elements.is_empty() {
                self.reporter().error(&format!(
                    "E1101 literal data requires a type expectation at {}",
                    self.reporter().loc(loc)
                ));
                return None;
            }
            let mut converted = Vec::with_capacity(elements.len());
            for e in elements {
                converted.push(self.convert_expr(ctx, a1, e, None)?);
            }
            let elem_ty = converted[0].ty.clone();
            if converted.iter().any(|c| !c.ty.equals(&elem_ty)) {
                self.reporter().error(&format!(
                    "E1109 literal data elements disagree at {}",
                    self.reporter().loc(loc)
                ));
                return None;
            }
            let mut ty = Type::new(TypeKind::Arr, loc, "[N]", "");
            ty.arr_len = converted.len() as i64;
            ty.size = elem_ty.size * ty.arr_len;
            ty.align = elem_ty.align;
            ty.direct = Some(Box::new(elem_ty));
            return Some(sem::Expr::rvalue(
                loc,
                ty,
                ExprKind::LitData {
                    elements: converted,
                },
            ));
        };

        let mut converted = Vec::with_capacity(elements.len());
        match forced.kind {
            TypeKind::Struct => {
                let Some((_, sdecl)) = self.find_struct_decl(forced) else {
                    self.reporter().error(&format!(
                        "E1208 struct {}.{} not found at {}",
                        forced.src_uname,
                        forced.name,
                        self.reporter().loc(loc)
                    ));
                    return None;
                };
                let mem_types = sdecl.mem_types.clone();
                if mem_types.len() != elements.len() {
                    self.reporter().error(&format!(
                        "E1103 {} has {} members but {} were given at {}",
                        forced,
                        mem_types.len(),
                        elements.len(),
                        self.reporter().loc(loc)
                    ));
                    return None;
                }
                for (e, mt) in elements.iter().zip(&mem_types) {
                    converted.push(self.convert_expr(ctx, a1, e, Some(mt))?);
                }
            }
            TypeKind::Arr | TypeKind::Slice => {
                if forced.kind == TypeKind::Arr && forced.arr_len != elements.len() as i64 {
                    self.reporter().error(&format!(
                        "E1104 expected {} elements but {} were given at {}",
                        forced.arr_len,
                        elements.len(),
                        self.reporter().loc(loc)
                    ));
                    return None;
                }
                let elem = forced.elem()?.clone();
                for e in elements {
                    converted.push(self.convert_expr(ctx, a1, e, Some(&elem))?);
                }
            }
            _ => {
                self.reporter().error(&format!(
                    "E1111 cannot convert literal data to {forced} at {}",
                    self.reporter().loc(loc)
                ));
                return None;
            }
        }
        Some(sem::Expr::rvalue(
            loc,
            forced.clone(),
            ExprKind::LitData {
                elements: converted,
            },
        ))
    }

    /// A bare identifier: local scope stack first, then the module's
    /// top-level declarations.
    fn convert_name(&self, ctx: &mut Context, loc: Loc, name: &str) -> Option<sem::Expr> {
        if let Some(v) = ctx.find_var(self, name) {
            return Some(sem::Expr {
                loc,
                ty: v.ty,
                is_lvalue: true,
                is_const: v.is_const || v.is_define,
                kind: ExprKind::Name {
                    name_kind: NameKind::Var,
                    uname: v.uname,
                    name: name.to_string(),
                    uid: v.uid,
                },
            });
        }
        let module = &self.modules[ctx.mi];
        if let Some(decl) = module.find_decl(name) {
            if matches!(decl.body, DeclBody::Func(_)) {
                return Some(sem::Expr {
                    loc,
                    ty: decl.ty.clone(),
                    is_lvalue: true,
                    is_const: true,
                    kind: ExprKind::Name {
                        name_kind: NameKind::Func,
                        uname: decl.src_uname.clone(),
                        name: name.to_string(),
                        uid: decl.uid,
                    },
                });
            }
        }
        self.reporter().error(&format!(
            "E1106 name {name} is not found at {}",
            self.reporter().loc(loc)
        ));
        None
    }

    /// Find the struct declaration behind a nominal struct type.
    pub(crate) fn find_struct_decl(&self, ty: &Type) -> Option<(&sem::Decl, &sem::StructDecl)> {
        let mi = self.find_module(&ty.src_uname)?;
        let decl = self.modules[mi].find_decl(&ty.name)?;
        match &decl.body {
            DeclBody::Struct(s) => Some((decl, s)),
            _ => None,
        }
    }

    /// Is `member` of the given owner (struct or enum type) accessible from
    /// the current context? Public always; private requires the same module
    /// and the same struct; protected requires the same module.
    fn member_visible(&self, ctx: &Context, owner: &Type, member: &str) -> bool {
        match visibility(member) {
            Visibility::Public => true,
            Visibility::Private => {
                owner.src_uname == ctx.uname
                    && (owner.kind != TypeKind::Struct || ctx.struct_name == owner.name)
            }
            Visibility::Protected => owner.src_uname == ctx.uname,
        }
    }

    /// Dotted expression: the left-hand side's domain decides the shape.
    fn convert_dot(
        &self,
        ctx: &mut Context,
        a1: &[ast::Module],
        e: &ast::Expr,
    ) -> Option<sem::Expr> {
        let ast::Expr::Op {
            loc,
            op: Op1::Dot,
            operand0: Some(lhs_ast),
            operand1: Some(rhs_ast),
            ..
        } = e
        else {
            return None;
        };
        let loc = *loc;
        let Some(rname) = rhs_ast.as_name().map(str::to_string) else {
            self.reporter().error(&format!(
                "E1207 invalid member access at {}",
                self.reporter().loc(loc)
            ));
            return None;
        };

        // step 1: classify the left-hand side
        let lhs = if let Some(lname) = lhs_ast.as_name() {
            let Some(domain) = ctx.find_domain(self, a1, lname) else {
                self.reporter().error(&format!(
                    "E0903 undefined name {lname} at {}",
                    self.reporter().loc(loc)
                ));
                return None;
            };
            match domain {
                Domain::Include => {
                    // cross-module: forward to the target module's name
                    return self.convert_include_member(ctx, a1, loc, lname, &rname);
                }
                Domain::Struct | Domain::Enum => {
                    let decl = self.modules[ctx.mi].find_decl(lname)?;
                    let name_kind = if domain == Domain::Struct {
                        NameKind::Struct
                    } else {
                        NameKind::Enum
                    };
                    sem::Expr {
                        loc,
                        ty: decl.ty.clone(),
                        is_lvalue: false,
                        is_const: true,
                        kind: ExprKind::Name {
                            name_kind,
                            uname: decl.src_uname.clone(),
                            name: lname.to_string(),
                            uid: decl.uid,
                        },
                    }
                }
                Domain::Var | Domain::Func => self.convert_expr(ctx, a1, lhs_ast, None)?,
            }
        } else {
            self.convert_expr(ctx, a1, lhs_ast, None)?
        };

        // step 2: resolve against the lhs shape
        let is_struct_name = matches!(
            lhs.kind,
            ExprKind::Name {
                name_kind: NameKind::Struct,
                ..
            }
        );
        let is_enum_name = matches!(
            lhs.kind,
            ExprKind::Name {
                name_kind: NameKind::Enum,
                ..
            }
        );

        if is_struct_name {
            // StructName.method
            if !self.member_visible(ctx, &lhs.ty, &rname) {
                self.reporter().error(&format!(
                    "E1206 {rname} is not visible here at {}",
                    self.reporter().loc(loc)
                ));
                return None;
            }
            let owner_mi = self.find_module(&lhs.ty.src_uname)?;
            let method = format!("{}.{}", lhs.ty.name, rname);
            let Some(decl) = self.modules[owner_mi].find_decl(&method) else {
                self.reporter().error(&format!(
                    "E1203 method {method} is not found at {}",
                    self.reporter().loc(loc)
                ));
                return None;
            };
            return Some(sem::Expr {
                loc,
                ty: decl.ty.clone(),
                is_lvalue: true,
                is_const: true,
                kind: ExprKind::Name {
                    name_kind: NameKind::Func,
                    uname: decl.src_uname.clone(),
                    name: method,
                    uid: decl.uid,
                },
            });
        }

        if is_enum_name {
            // EnumName.member → integer literal with the enum annotation
            if !self.member_visible(ctx, &lhs.ty, &rname) {
                self.reporter().error(&format!(
                    "E1206 {rname} is not visible here at {}",
                    self.reporter().loc(loc)
                ));
                return None;
            }
            let owner_mi = self.find_module(&lhs.ty.src_uname)?;
            let decl = self.modules[owner_mi].find_decl(&lhs.ty.name)?;
            let DeclBody::Enum(ed) = &decl.body else {
                return None;
            };
            let Some(pos) = ed.mem_names.iter().position(|n| *n == rname) else {
                self.reporter().error(&format!(
                    "E1204 {}.{rname} is not found at {}",
                    lhs.ty.name,
                    self.reporter().loc(loc)
                ));
                return None;
            };
            let mut lit =
                sem::Expr::literal(loc, decl.ty.clone(), Literal::Int(ed.mem_values[pos]));
            if let ExprKind::Literal { enum_name, .. } = &mut lit.kind {
                *enum_name = Some(lhs.ty.name.clone());
            }
            return Some(lit);
        }

        self.convert_instance_member(ctx, loc, lhs, &rname)
    }

    /// `include_name.member`: forwarded cross-module name with the
    /// exportability filter.
    fn convert_include_member(
        &self,
        ctx: &mut Context,
        a1: &[ast::Module],
        loc: Loc,
        inc_name: &str,
        rname: &str,
    ) -> Option<sem::Expr> {
        let inc_id = a1[ctx.mi].find_decl(inc_name, false)?;
        let ast::Decl::Include { tgt_uname, .. } = a1[ctx.mi].decl(inc_id) else {
            return None;
        };
        let Some(tmi) = self.find_module(tgt_uname) else {
            return None;
        };
        let Some(decl) = self.modules[tmi].find_exported(rname) else {
            self.reporter().error(&format!(
                "E1202 {inc_name}.{rname} is not found at {}",
                self.reporter().loc(loc)
            ));
            return None;
        };
        let (name_kind, is_lvalue, is_const) = match &decl.body {
            DeclBody::Var(v) => (NameKind::Var, true, v.is_const || v.is_define),
            DeclBody::Func(_) => (NameKind::Func, true, true),
            DeclBody::Struct(_) => (NameKind::Struct, false, true),
            DeclBody::Enum(_) => (NameKind::Enum, false, true),
            _ => return None,
        };
        Some(sem::Expr {
            loc,
            ty: decl.ty.clone(),
            is_lvalue,
            is_const,
            kind: ExprKind::Name {
                name_kind,
                uname: decl.src_uname.clone(),
                name: rname.to_string(),
                uid: decl.uid,
            },
        })
    }

    /// Instance member access: `value.member` or `ptr.member`.
    fn convert_instance_member(
        &self,
        ctx: &Context,
        loc: Loc,
        lhs: sem::Expr,
        rname: &str,
    ) -> Option<sem::Expr> {
        let (struct_ty, op) = if lhs.ty.kind == TypeKind::Struct {
            (lhs.ty.clone(), OpKind::Dot)
        } else if let Some(s) = lhs.ty.ptr_struct() {
            (s.clone(), OpKind::Arrow)
        } else {
            self.reporter().error(&format!(
                "E1207 invalid member access .{rname} on {} at {}",
                lhs.ty,
                self.reporter().loc(loc)
            ));
            return None;
        };

        if !self.member_visible(ctx, &struct_ty, rname) {
            self.reporter().error(&format!(
                "E1206 {rname} is not visible here at {}",
                self.reporter().loc(loc)
            ));
            return None;
        }

        let Some((_, sdecl)) = self.find_struct_decl(&struct_ty) else {
            self.reporter().error(&format!(
                "E1208 struct {}.{} not found at {}",
                struct_ty.src_uname,
                struct_ty.name,
                self.reporter().loc(loc)
            ));
            return None;
        };
        let Some(pos) = sdecl.mem_names.iter().position(|n| n == rname) else {
            self.reporter().error(&format!(
                "E1205 member {rname} not found in {} at {}",
                struct_ty.name,
                self.reporter().loc(loc)
            ));
            return None;
        };
        let mem_ty = sdecl.mem_types[pos].clone();

        let is_lvalue = op == OpKind::Arrow || lhs.is_lvalue;
        let is_const = if op == OpKind::Dot { lhs.is_const } else { false };
        let mut res = op_expr(loc, mem_ty, op, Some(lhs), None, None);
        res.is_lvalue = is_lvalue;
        res.is_const = is_const;
        if let ExprKind::Op { access_pos, .. } = &mut res.kind {
            *access_pos = pos as i64;
        }
        Some(res)
    }

    /// Non-dot operator conversion: each operand is converted under the
    /// operator's contract; lvalue/const flags derive from the operands.
    fn convert_op(&self, ctx: &mut Context, a1: &[ast::Module], e: &ast::Expr) -> Option<sem::Expr> {
        let ast::Expr::Op {
            loc,
            op,
            type_operand,
            operand0,
            operand1,
            operand2,
        } = e
        else {
            return None;
        };
        let loc = *loc;
        let o0 = operand0.as_deref();
        let o1 = operand1.as_deref();
        let o2 = operand2.as_deref();
        let at = || self.reporter().loc(loc);

        match op {
            Op1::Plus | Op1::Minus => {
                let v = self.convert_expr(ctx, a1, o0?, None)?;
                if !v.ty.is_int() && !v.ty.is_float() {
                    self.reporter().error(&format!(
                        "E1301 unary operand must be numeric, got {} at {}",
                        v.ty,
                        at()
                    ));
                    return None;
                }
                let ty = v.ty.clone();
                let kind = if *op == Op1::Plus {
                    OpKind::Plus
                } else {
                    OpKind::Minus
                };
                Some(op_expr(loc, ty, kind, Some(v), None, None))
            }

            Op1::BitNot => {
                let v = self.convert_expr(ctx, a1, o0?, None)?;
                if !v.ty.is_int() {
                    self.reporter().error(&format!(
                        "E1302 bit-not requires an integer, got {} at {}",
                        v.ty,
                        at()
                    ));
                    return None;
                }
                let ty = v.ty.clone();
                Some(op_expr(loc, ty, OpKind::BitNot, Some(v), None, None))
            }

            Op1::LogicNot => {
                let b = self.ty_bool();
                let v = self.convert_expr(ctx, a1, o0?, Some(&b))?;
                Some(op_expr(loc, b, OpKind::LogicNot, Some(v), None, None))
            }

            Op1::Ref => {
                let v = self.convert_expr(ctx, a1, o0?, None)?;
                if !v.is_lvalue {
                    self.reporter().error(&format!(
                        "E1303 cannot take the address of an rvalue at {}",
                        at()
                    ));
                    return None;
                }
                let ty = self.ty_ptr_to(v.ty.clone());
                let is_const = v.is_const;
                let mut res = op_expr(loc, ty, OpKind::Ref, Some(v), None, None);
                res.is_lvalue = true;
                res.is_const = is_const;
                Some(res)
            }

            Op1::Deref => {
                let v = self.convert_expr(ctx, a1, o0?, None)?;
                if !v.ty.is_ptr() {
                    self.reporter().error(&format!(
                        "E1304 cannot dereference non-pointer {} at {}",
                        v.ty,
                        at()
                    ));
                    return None;
                }
                let target = v.ty.elem()?.clone();
                if target.is_void() {
                    self.reporter()
                        .error(&format!("E1305 cannot dereference void* at {}", at()));
                    return None;
                }
                let is_const = v.is_const;
                let mut res = op_expr(loc, target, OpKind::Deref, Some(v), None, None);
                res.is_lvalue = true;
                res.is_const = is_const;
                Some(res)
            }

            Op1::Inc | Op1::Dec => {
                let v = self.convert_expr(ctx, a1, o0?, None)?;
                if !v.ty.is_int() || !v.is_lvalue || v.is_const {
                    self.reporter().error(&format!(
                        "E1321 increment/decrement requires a mutable integer lvalue at {}",
                        at()
                    ));
                    return None;
                }
                let ty = v.ty.clone();
                let kind = if *op == Op1::Inc {
                    OpKind::Inc
                } else {
                    OpKind::Dec
                };
                Some(op_expr(loc, ty, kind, Some(v), None, None))
            }

            Op1::Index => {
                let base = self.convert_expr(ctx, a1, o0?, None)?;
                let index = self.convert_expr(ctx, a1, o1?, None)?;
                let (elem, lvalue) = match base.ty.kind {
                    TypeKind::Arr => (base.ty.elem()?.clone(), base.is_lvalue),
                    TypeKind::Slice | TypeKind::Ptr => (base.ty.elem()?.clone(), true),
                    _ => {
                        self.reporter().error(&format!(
                            "E1306 cannot index {} at {}",
                            base.ty,
                            at()
                        ));
                        return None;
                    }
                };
                if !index.ty.is_int() {
                    self.reporter()
                        .error(&format!("E1307 index must be an integer at {}", at()));
                    return None;
                }
                let is_const = base.is_const;
                let mut res = op_expr(loc, elem, OpKind::Index, Some(base), Some(index), None);
                res.is_lvalue = lvalue;
                res.is_const = is_const;
                Some(res)
            }

            Op1::Slice => {
                let base = self.convert_expr(ctx, a1, o0?, None)?;
                if !base.ty.is_arr() && !base.ty.is_slice() {
                    self.reporter().error(&format!(
                        "E1308 slicing requires an array or slice, got {} at {}",
                        base.ty,
                        at()
                    ));
                    return None;
                }
                let mut bounds = [None, None];
                for (slot, opnd) in bounds.iter_mut().zip([o1, o2]) {
                    if let Some(b) = opnd {
                        let v = self.convert_expr(ctx, a1, b, None)?;
                        if !v.ty.is_int() {
                            self.reporter().error(&format!(
                                "E1309 slice bounds must be integers at {}",
                                at()
                            ));
                            return None;
                        }
                        *slot = Some(v);
                    }
                }
                let [lo, hi] = bounds;
                let ty = self.ty_slice_of(base.ty.elem()?.clone());
                Some(op_expr(loc, ty, OpKind::Slice, Some(base), lo, hi))
            }

            Op1::Mul | Op1::Div | Op1::Mod | Op1::Add | Op1::Sub => {
                self.convert_arith(ctx, a1, loc, *op, o0?, o1?)
            }

            Op1::Shl | Op1::Shr | Op1::BitAnd | Op1::BitXor | Op1::BitOr => {
                let lhs = self.convert_expr(ctx, a1, o0?, None)?;
                let lty = lhs.ty.clone();
                let rhs = self.convert_expr(ctx, a1, o1?, Some(&lty))?;
                if !lty.is_int() {
                    self.reporter().error(&format!(
                        "E1313 bitwise operator requires integers, got {lty} at {}",
                        at()
                    ));
                    return None;
                }
                let kind = match op {
                    Op1::Shl => OpKind::Shl,
                    Op1::Shr => OpKind::Shr,
                    Op1::BitAnd => OpKind::BitAnd,
                    Op1::BitXor => OpKind::BitXor,
                    _ => OpKind::BitOr,
                };
                Some(op_expr(loc, lty, kind, Some(lhs), Some(rhs), None))
            }

            Op1::Lt | Op1::Le | Op1::Gt | Op1::Ge => {
                let lhs = self.convert_expr(ctx, a1, o0?, None)?;
                let lty = lhs.ty.clone();
                let rhs = self.convert_expr(ctx, a1, o1?, Some(&lty))?;
                if !lty.is_int() && !lty.is_float() {
                    self.reporter().error(&format!(
                        "E1314 cannot order values of type {lty} at {}",
                        at()
                    ));
                    return None;
                }
                let kind = match op {
                    Op1::Lt => OpKind::Lt,
                    Op1::Le => OpKind::Le,
                    Op1::Gt => OpKind::Gt,
                    _ => OpKind::Ge,
                };
                Some(op_expr(loc, self.ty_bool(), kind, Some(lhs), Some(rhs), None))
            }

            Op1::Eq | Op1::Ne => {
                let lhs = self.convert_expr(ctx, a1, o0?, None)?;
                let lty = lhs.ty.clone();
                let rhs = self.convert_expr(ctx, a1, o1?, Some(&lty))?;
                if !matches!(
                    lty.kind,
                    TypeKind::Primitive | TypeKind::Ptr | TypeKind::Func | TypeKind::Enum
                ) {
                    self.reporter().error(&format!(
                        "E1315 cannot compare values of type {lty} at {}",
                        at()
                    ));
                    return None;
                }
                let kind = if *op == Op1::Eq { OpKind::Eq } else { OpKind::Ne };
                Some(op_expr(loc, self.ty_bool(), kind, Some(lhs), Some(rhs), None))
            }

            Op1::LogicAnd | Op1::LogicOr => {
                let b = self.ty_bool();
                let lhs = self.convert_expr(ctx, a1, o0?, Some(&b))?;
                let rhs = self.convert_expr(ctx, a1, o1?, Some(&b))?;
                let kind = if *op == Op1::LogicAnd {
                    OpKind::LogicAnd
                } else {
                    OpKind::LogicOr
                };
                Some(op_expr(loc, b, kind, Some(lhs), Some(rhs), None))
            }

            Op1::Cond => {
                let b = self.ty_bool();
                let cond = self.convert_expr(ctx, a1, o0?, Some(&b))?;
                let then_arm = self.convert_expr(ctx, a1, o1?, None)?;
                let arm_ty = then_arm.ty.clone();
                let else_arm = self.convert_expr(ctx, a1, o2?, Some(&arm_ty))?;
                Some(op_expr(
                    loc,
                    arm_ty,
                    OpKind::Cond,
                    Some(cond),
                    Some(then_arm),
                    Some(else_arm),
                ))
            }

            Op1::Sizeof => {
                let ty_op = match type_operand {
                    Some(t) => self.convert_type(a1, t)?,
                    None => self.convert_expr(ctx, a1, o0?, None)?.ty,
                };
                let mut res = op_expr(loc, self.ty_int(), OpKind::Sizeof, None, None, None);
                if let ExprKind::Op { type_operand, .. } = &mut res.kind {
                    *type_operand = Some(Box::new(ty_op));
                }
                Some(res)
            }

            Op1::Cast => {
                let to = self.convert_type(a1, type_operand.as_deref()?)?;
                let v = self.convert_expr(ctx, a1, o0?, None)?;
                let from = &v.ty;
                let numeric = |t: &Type| t.is_int() || t.is_float();
                let valid = (numeric(from) && numeric(&to))
                    || (from.is_ptr() && to.is_ptr())
                    || (from.is_int() && to.is_ptr())
                    || (from.is_ptr() && to.is_int())
                    || (from.is_enum() && to.is_int())
                    || (from.is_int() && to.is_enum());
                if !valid {
                    self.reporter().error(&format!(
                        "E1317 cannot cast {from} to {to} at {}",
                        at()
                    ));
                    return None;
                }
                let mut res = op_expr(loc, to.clone(), OpKind::Cast, Some(v), None, None);
                if let ExprKind::Op { type_operand, .. } = &mut res.kind {
                    *type_operand = Some(Box::new(to));
                }
                Some(res)
            }

            Op1::Make => {
                let ptr = self.convert_expr(ctx, a1, o0?, None)?;
                let count = self.convert_expr(ctx, a1, o1?, None)?;
                let Some(pointee) = ptr.ty.elem().filter(|_| ptr.ty.is_ptr()).cloned() else {
                    self.reporter().error(&format!(
                        "E1318 make() requires a pointer, got {} at {}",
                        ptr.ty,
                        at()
                    ));
                    return None;
                };
                if pointee.is_void() {
                    self.reporter().error(&format!(
                        "E1318 make() requires a pointer, got {} at {}",
                        ptr.ty,
                        at()
                    ));
                    return None;
                }
                if !count.ty.is_int() {
                    self.reporter().error(&format!(
                        "E1319 make() count must be an integer at {}",
                        at()
                    ));
                    return None;
                }
                let ty = self.ty_slice_of(pointee);
                Some(op_expr(loc, ty, OpKind::Make, Some(ptr), Some(count), None))
            }

            Op1::Len => {
                let v = self.convert_expr(ctx, a1, o0?, None)?;
                if !v.ty.is_arr() && !v.ty.is_slice() {
                    self.reporter().error(&format!(
                        "E1320 len() requires an array or slice, got {} at {}",
                        v.ty,
                        at()
                    ));
                    return None;
                }
                Some(op_expr(loc, self.ty_int(), OpKind::Len, Some(v), None, None))
            }

            Op1::Move => {
                let v = self.convert_expr(ctx, a1, o0?, None)?;
                if !v.ty.is_slice() {
                    self.reporter().error(&format!(
                        "E1324 move() requires a slice, got {} at {}",
                        v.ty,
                        at()
                    ));
                    return None;
                }
                let ty = v.ty.clone();
                Some(op_expr(loc, ty, OpKind::Move, Some(v), None, None))
            }

            Op1::Dot => None,
        }
    }

    /// Arithmetic with pointer-offset support: `ptr ± int` keeps the
    /// pointer type, `int + ptr` swaps its operands.
    fn convert_arith(
        &self,
        ctx: &mut Context,
        a1: &[ast::Module],
        loc: Loc,
        op: Op1,
        lhs_ast: &ast::Expr,
        rhs_ast: &ast::Expr,
    ) -> Option<sem::Expr> {
        let kind = match op {
            Op1::Mul => OpKind::Mul,
            Op1::Div => OpKind::Div,
            Op1::Mod => OpKind::Mod,
            Op1::Add => OpKind::Add,
            Op1::Sub => OpKind::Sub,
            _ => return None,
        };
        let lhs = self.convert_expr(ctx, a1, lhs_ast, None)?;

        // literal right-hand sides adopt the left type; pointer arithmetic
        // and int + ptr keep the operand unforced
        let is_add_sub = matches!(kind, OpKind::Add | OpKind::Sub);
        let expected = if is_add_sub
            && (lhs.ty.is_ptr() || !matches!(rhs_ast, ast::Expr::Literal { .. }))
        {
            None
        } else {
            Some(lhs.ty.clone())
        };
        let rhs = self.convert_expr(ctx, a1, rhs_ast, expected.as_ref())?;

        if is_add_sub && lhs.ty.is_ptr() {
            if !rhs.ty.is_int() {
                self.reporter().error(&format!(
                    "E1316 pointer arithmetic requires an integer offset, got {} at {}",
                    rhs.ty,
                    self.reporter().loc(loc)
                ));
                return None;
            }
            let ty = lhs.ty.clone();
            return Some(op_expr(loc, ty, kind, Some(lhs), Some(rhs), None));
        }
        if kind == OpKind::Add && rhs.ty.is_ptr() && lhs.ty.is_int() {
            // int + ptr → ptr + int
            let ty = rhs.ty.clone();
            return Some(op_expr(loc, ty, kind, Some(rhs), Some(lhs), None));
        }

        if !lhs.ty.equals(&rhs.ty) {
            self.reporter().error(&format!(
                "E1310 type mismatch {} and {} at {}",
                lhs.ty,
                rhs.ty,
                self.reporter().loc(loc)
            ));
            return None;
        }
        if !lhs.ty.is_int() && !lhs.ty.is_float() {
            self.reporter().error(&format!(
                "E1311 invalid type {} for arithmetic at {}",
                lhs.ty,
                self.reporter().loc(loc)
            ));
            return None;
        }
        if kind == OpKind::Mod && lhs.ty.is_float() {
            self.reporter().error(&format!(
                "E1312 modulo requires integers at {}",
                self.reporter().loc(loc)
            ));
            return None;
        }
        let ty = lhs.ty.clone();
        Some(op_expr(loc, ty, kind, Some(lhs), Some(rhs), None))
    }

    /// Function call: method-call detection on dotted callees, then static
    /// calls and function-pointer calls.
    fn convert_call(
        &self,
        ctx: &mut Context,
        a1: &[ast::Module],
        e: &ast::Expr,
    ) -> Option<sem::Expr> {
        let ast::Expr::Call { loc, callee, args } = e else {
            return None;
        };
        let loc = *loc;

        // method call: instance.member where Struct.member names a function
        if let ast::Expr::Op {
            op: Op1::Dot,
            operand0: Some(lhs_ast),
            operand1: Some(rhs_ast),
            ..
        } = callee.as_ref()
        {
            let is_instance = match lhs_ast.as_name() {
                Some(lname) => matches!(
                    ctx.find_domain(self, a1, lname),
                    Some(Domain::Var) | Some(Domain::Func)
                ),
                None => true,
            };
            if is_instance {
                if let Some(rname) = rhs_ast.as_name() {
                    let lhs = self.convert_expr(ctx, a1, lhs_ast, None)?;
                    let struct_ty = if lhs.ty.kind == TypeKind::Struct {
                        Some(lhs.ty.clone())
                    } else {
                        lhs.ty.ptr_struct().cloned()
                    };
                    if let Some(struct_ty) = struct_ty {
                        let method = format!("{}.{rname}", struct_ty.name);
                        let owner_mi = self.find_module(&struct_ty.src_uname)?;
                        if let Some(decl) = self.modules[owner_mi].find_decl(&method) {
                            if matches!(decl.body, DeclBody::Func(_)) {
                                return self.convert_method_call(
                                    ctx, a1, loc, lhs, &struct_ty, decl.uid, &method, owner_mi,
                                    args, rname,
                                );
                            }
                        }
                    }
                    // not a method: fall through, re-converting the callee
                    let _ = lhs;
                }
            }
        }

        let callee_expr = self.convert_expr(ctx, a1, callee, None)?;
        if let ExprKind::Name {
            name_kind: NameKind::Func,
            uname,
            name,
            uid,
        } = &callee_expr.kind
        {
            // static call
            let owner_mi = self.find_module(uname)?;
            let decl = self.modules[owner_mi].find_decl(name)?;
            let sig = decl.ty.clone();
            let (is_va, is_va_ad) = match &decl.body {
                DeclBody::Func(f) => (f.is_va_arg, f.is_va_arg_ad),
                _ => (false, false),
            };
            let target = CallTarget::Decl {
                uname: uname.clone(),
                name: name.clone(),
                uid: *uid,
            };
            let fixed = Self::fixed_params(&sig, is_va, is_va_ad);
            let converted = self.convert_args(ctx, a1, &sig, args, 0, fixed)?;
            self.call_arg_check(&sig, is_va, is_va_ad, &converted, loc);
            let ret = sig.elem().cloned().unwrap_or_else(|| self.ty_void());
            Some(sem::Expr::rvalue(
                loc,
                ret,
                ExprKind::Call {
                    target,
                    args: converted,
                },
            ))
        } else if callee_expr.ty.is_func() {
            // function pointer call
            let sig = callee_expr.ty.clone();
            let fixed = sig.indirect.len();
            let converted = self.convert_args(ctx, a1, &sig, args, 0, fixed)?;
            self.call_arg_check(&sig, false, false, &converted, loc);
            let ret = sig.elem().cloned().unwrap_or_else(|| self.ty_void());
            Some(sem::Expr::rvalue(
                loc,
                ret,
                ExprKind::Call {
                    target: CallTarget::Ptr(Box::new(callee_expr)),
                    args: converted,
                },
            ))
        } else {
            self.reporter().error(&format!(
                "E1322 type {} is not callable at {}",
                callee_expr.ty,
                self.reporter().loc(loc)
            ));
            None
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn convert_method_call(
        &self,
        ctx: &mut Context,
        a1: &[ast::Module],
        loc: Loc,
        receiver: sem::Expr,
        struct_ty: &Type,
        method_uid: i64,
        method: &str,
        owner_mi: usize,
        args: &[ast::Expr],
        rname: &str,
    ) -> Option<sem::Expr> {
        if !self.member_visible(ctx, struct_ty, rname) {
            self.reporter().error(&format!(
                "E1206 {rname} is not visible here at {}",
                self.reporter().loc(loc)
            ));
            return None;
        }
        let decl = self.modules[owner_mi].find_decl(method)?;
        let sig = decl.ty.clone();
        let (is_va, is_va_ad) = match &decl.body {
            DeclBody::Func(f) => (f.is_va_arg, f.is_va_arg_ad),
            _ => (false, false),
        };

        // the receiver becomes the first argument; values auto-ref
        let recv = if receiver.ty.kind == TypeKind::Struct {
            if !receiver.is_lvalue {
                self.reporter().error(&format!(
                    "E1323 cannot call a method on an rvalue struct at {}",
                    self.reporter().loc(loc)
                ));
                return None;
            }
            let ty = self.ty_ptr_to(receiver.ty.clone());
            op_expr(loc, ty, OpKind::Ref, Some(receiver), None, None)
        } else {
            receiver
        };

        let fixed = Self::fixed_params(&sig, is_va, is_va_ad);
        let mut converted = vec![recv];
        converted.extend(self.convert_args(ctx, a1, &sig, args, 1, fixed)?);
        self.call_arg_check(&sig, is_va, is_va_ad, &converted, loc);
        let ret = sig.elem().cloned().unwrap_or_else(|| self.ty_void());
        Some(sem::Expr::rvalue(
            loc,
            ret,
            ExprKind::Call {
                target: CallTarget::Decl {
                    uname: self.modules[owner_mi].uname.clone(),
                    name: method.to_string(),
                    uid: method_uid,
                },
                args: converted,
            },
        ))
    }

    /// Convert call arguments; fixed positions get their parameter type as
    /// the forced type, variadic extras convert unforced.
    fn convert_args(
        &self,
        ctx: &mut Context,
        a1: &[ast::Module],
        sig: &Type,
        args: &[ast::Expr],
        offset: usize,
        fixed: usize,
    ) -> Option<Vec<sem::Expr>> {
        let mut out = Vec::with_capacity(args.len());
        for (i, arg) in args.iter().enumerate() {
            let expected = if i + offset < fixed {
                sig.indirect.get(i + offset)
            } else {
                None
            };
            out.push(self.convert_expr(ctx, a1, arg, expected)?);
        }
        Some(out)
    }

    /// Number of non-variadic parameters in a signature.
    fn fixed_params(sig: &Type, is_va: bool, is_va_ad: bool) -> usize {
        let mut fixed = sig.indirect.len();
        if is_va {
            fixed = fixed.saturating_sub(1);
        }
        if is_va_ad {
            fixed = fixed.saturating_sub(1);
        }
        fixed
    }

    /// Argument count/type contract against the callable signature.
    pub(crate) fn call_arg_check(
        &self,
        sig: &Type,
        is_va: bool,
        is_va_ad: bool,
        args: &[sem::Expr],
        loc: Loc,
    ) {
        let mut fixed = sig.indirect.len();
        if is_va {
            fixed = fixed.saturating_sub(1);
        }
        if is_va_ad {
            fixed = fixed.saturating_sub(1);
        }
        let given = args.len();
        if (is_va && fixed > given) || (!is_va && fixed != given) {
            self.reporter().error(&format!(
                "E0901 need {fixed} arguments but {given} were given at {}",
                self.reporter().loc(loc)
            ));
            return;
        }
        for i in 0..fixed {
            if !sig.indirect[i].equals(&args[i].ty) {
                self.reporter().error(&format!(
                    "E0902 argument {i} needs {} but {} was given at {}",
                    sig.indirect[i],
                    args[i].ty,
                    self.reporter().loc(loc)
                ));
            }
        }
    }
}
