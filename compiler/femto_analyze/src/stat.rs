//! Statement conversion: AST1 statements to analyzed statements with
//! bottom-up `returns` propagation.

use crate::context::{Context, VarInfo};
use crate::Analyzer;
use femto_ir::ast::{self, AssignOp, ParsedTypeKind};
use femto_ir::sem::{self, DeclBody, Stat, StatKind, Type};
use femto_ir::Literal;
use rustc_hash::FxHashMap;

/// `returns` rule for a statement list: a member that always returns makes
/// the list return; a break or continue gives up first.
fn body_returns(body: &[Stat]) -> bool {
    for st in body {
        if matches!(st.kind, StatKind::Break { .. } | StatKind::Continue { .. }) {
            return false;
        }
        if st.returns {
            return true;
        }
    }
    false
}

impl Analyzer<'_> {
    /// Convert a scope: fresh frame, statements in order, defers collected,
    /// `returns` computed from the resulting body.
    pub(crate) fn convert_scope(
        &self,
        ctx: &mut Context,
        a1: &[ast::Module],
        mi: usize,
        sid: ast::ScopeId,
    ) -> sem::Scope {
        let a1_scope = a1[mi].scope(sid);
        let mut scope = sem::Scope {
            uid: self.next_uid(),
            loc: a1_scope.loc,
            ..sem::Scope::default()
        };
        ctx.frames.push(FxHashMap::default());
        for st in &a1[mi].scope(sid).body {
            if let Some(s) = self.convert_stat(ctx, a1, mi, st, &mut scope) {
                scope.body.push(s);
            }
        }
        ctx.frames.pop();
        scope.returns = body_returns(&scope.body);
        scope
    }

    /// Convert one statement into the given enclosing scope. Defers attach
    /// to the scope and produce no statement.
    fn convert_stat(
        &self,
        ctx: &mut Context,
        a1: &[ast::Module],
        mi: usize,
        st: &ast::Stat,
        parent: &mut sem::Scope,
    ) -> Option<Stat> {
        match st {
            ast::Stat::RawC { loc, code } => Some(Stat::new(
                *loc,
                self.next_uid(),
                StatKind::RawC { code: code.clone() },
            )),
            ast::Stat::RawIr { loc, code } => Some(Stat::new(
                *loc,
                self.next_uid(),
                StatKind::RawIr { code: code.clone() },
            )),

            ast::Stat::Expr { loc, expr } => {
                let e = self.convert_expr(ctx, a1, expr, None)?;
                Some(Stat::new(*loc, self.next_uid(), StatKind::Expr { expr: e }))
            }

            ast::Stat::Decl { loc, decl } => {
                self.convert_local_decl(ctx, a1, *loc, a1[mi].decl(*decl))
            }

            ast::Stat::Assign {
                loc,
                op,
                left,
                right,
            } => self.convert_assign(ctx, a1, *loc, *op, left, right),

            ast::Stat::Return { loc, value } => {
                let expected = ctx.ret.clone();
                let value = match value {
                    Some(e) => {
                        if expected.is_void() {
                            self.reporter().error(&format!(
                                "E1603 void function cannot return a value at {}",
                                self.reporter().loc(*loc)
                            ));
                            return None;
                        }
                        Some(self.convert_expr(ctx, a1, e, Some(&expected))?)
                    }
                    None => {
                        if !expected.is_void() {
                            self.reporter().error(&format!(
                                "E1604 return value required in a function returning {expected} at {}",
                                self.reporter().loc(*loc)
                            ));
                            return None;
                        }
                        None
                    }
                };
                Some(Stat::new(*loc, self.next_uid(), StatKind::Return { value }))
            }

            ast::Stat::Defer { expr, .. } => {
                if let Some(e) = self.convert_expr(ctx, a1, expr, None) {
                    parent.defers.push(e);
                }
                None
            }

            ast::Stat::Break { loc } => {
                let Some(&loop_uid) = ctx.loops.last() else {
                    self.reporter().error(&format!(
                        "E1606 break outside of a loop at {}",
                        self.reporter().loc(*loc)
                    ));
                    return None;
                };
                Some(Stat::new(*loc, self.next_uid(), StatKind::Break { loop_uid }))
            }
            ast::Stat::Continue { loc } => {
                let Some(&loop_uid) = ctx.loops.last() else {
                    self.reporter().error(&format!(
                        "E1607 continue outside of a loop at {}",
                        self.reporter().loc(*loc)
                    ));
                    return None;
                };
                Some(Stat::new(
                    *loc,
                    self.next_uid(),
                    StatKind::Continue { loop_uid },
                ))
            }

            ast::Stat::Fall { loc } => {
                self.reporter().error(&format!(
                    "E1610 fall outside of a switch at {}",
                    self.reporter().loc(*loc)
                ));
                None
            }

            ast::Stat::Scope { loc, scope } => {
                let s = self.convert_scope(ctx, a1, mi, *scope);
                let returns = s.returns;
                let mut stat = Stat::new(*loc, s.uid, StatKind::Scope(s));
                stat.returns = returns;
                Some(stat)
            }

            ast::Stat::If {
                loc,
                cond,
                then_body,
                else_body,
            } => {
                let b = self.ty_bool();
                let cond = self.convert_expr(ctx, a1, cond.as_ref()?, Some(&b))?;
                let then_stat = self.convert_stat(ctx, a1, mi, then_body.as_deref()?, parent)?;
                let else_stat = match else_body {
                    Some(e) => self.convert_stat(ctx, a1, mi, e, parent),
                    None => None,
                };
                let returns =
                    then_stat.returns && else_stat.as_ref().is_some_and(|e| e.returns);
                let mut stat = Stat::new(
                    *loc,
                    self.next_uid(),
                    StatKind::If {
                        cond,
                        then_body: Box::new(then_stat),
                        else_body: else_stat.map(Box::new),
                    },
                );
                stat.returns = returns;
                Some(stat)
            }

            ast::Stat::While { loc, cond, body } => {
                let b = self.ty_bool();
                let cond = self.convert_expr(ctx, a1, cond.as_ref()?, Some(&b))?;
                let uid = self.next_uid();
                ctx.loops.push(uid);
                let body_stat = self.convert_stat(ctx, a1, mi, body.as_deref()?, parent);
                ctx.loops.pop();
                let mut body_stat = body_stat?;
                if let StatKind::Scope(s) = &mut body_stat.kind {
                    s.is_loop_body = true;
                }
                Some(Stat::new(
                    *loc,
                    uid,
                    StatKind::While {
                        cond,
                        body: Box::new(body_stat),
                    },
                ))
            }

            ast::Stat::For {
                loc,
                cond,
                step,
                body,
            } => {
                let b = self.ty_bool();
                let cond = match cond {
                    Some(c) => self.convert_expr(ctx, a1, c, Some(&b))?,
                    // empty condition loops forever
                    None => sem::Expr::literal(*loc, b, Literal::Bool(true)),
                };
                let uid = self.next_uid();
                ctx.loops.push(uid);
                let body_stat = self.convert_stat(ctx, a1, mi, body.as_deref()?, parent);
                let step_stat = match step {
                    Some(s) => self
                        .convert_stat(ctx, a1, mi, s, parent)
                        .map(Box::new),
                    None => None,
                };
                ctx.loops.pop();
                let mut body_stat = body_stat?;
                if let StatKind::Scope(s) = &mut body_stat.kind {
                    s.is_loop_body = true;
                }
                Some(Stat::new(
                    *loc,
                    uid,
                    StatKind::For {
                        cond,
                        step: step_stat,
                        body: Box::new(body_stat),
                    },
                ))
            }

            ast::Stat::Foreach {
                loc,
                var_i,
                var_r,
                iter,
                body,
            } => self.convert_foreach(
                ctx,
                a1,
                mi,
                *loc,
                var_i,
                var_r,
                iter.as_ref()?,
                body.as_deref()?,
                parent,
            ),

            ast::Stat::Switch { loc, switch } => {
                self.convert_switch(ctx, a1, mi, *loc, switch)
            }
        }
    }

    /// Local variable declaration: `auto` infers from the initializer;
    /// foreach variables (no type, no initializer) are handled by the
    /// foreach statement itself.
    fn convert_local_decl(
        &self,
        ctx: &mut Context,
        a1: &[ast::Module],
        loc: femto_ir::Loc,
        decl: &ast::Decl,
    ) -> Option<Stat> {
        let v = match decl {
            ast::Decl::Var(v) => v,
            // local typedefs are compile-time only
            _ => return None,
        };
        let (ty, init) = match &v.ty {
            None => return None, // foreach variable, typed by the foreach
            Some(t) if t.kind == ParsedTypeKind::Auto => {
                let Some(init_ast) = &v.init else {
                    self.reporter().error(&format!(
                        "E1612 auto variable {} needs an initializer at {}",
                        v.name,
                        self.reporter().loc(loc)
                    ));
                    return None;
                };
                let init = self.convert_expr(ctx, a1, init_ast, None)?;
                (init.ty.clone(), Some(init))
            }
            Some(t) => {
                let ty = self.convert_type(a1, t)?;
                let init = match &v.init {
                    Some(e) => Some(self.convert_expr(ctx, a1, e, Some(&ty))?),
                    None => None,
                };
                (ty, init)
            }
        };

        let uid = self.next_uid();
        ctx.bind(
            &v.name,
            VarInfo {
                uid,
                ty: ty.clone(),
                is_const: v.is_const,
                is_define: v.is_define,
                uname: String::new(),
            },
        );
        let sem_decl = sem::Decl {
            loc: v.loc,
            uid,
            name: v.name.clone(),
            src_uname: String::new(),
            ty,
            exported: false,
            body: DeclBody::Var(sem::VarDecl {
                init,
                is_define: v.is_define,
                is_const: v.is_const,
                is_volatile: v.is_volatile,
                is_extern: v.is_extern,
                is_param: v.is_param,
            }),
        };
        Some(Stat::new(
            loc,
            uid,
            StatKind::Decl {
                decl: Box::new(sem_decl),
            },
        ))
    }

    /// Assignment: the left side must be a mutable lvalue; compound forms
    /// carry the arithmetic operator's type contract.
    fn convert_assign(
        &self,
        ctx: &mut Context,
        a1: &[ast::Module],
        loc: femto_ir::Loc,
        op: AssignOp,
        left: &ast::Expr,
        right: &ast::Expr,
    ) -> Option<Stat> {
        let l = self.convert_expr(ctx, a1, left, None)?;
        if !l.is_lvalue {
            self.reporter().error(&format!(
                "E1601 left side of an assignment must be an lvalue at {}",
                self.reporter().loc(loc)
            ));
            return None;
        }
        if l.is_const {
            self.reporter().error(&format!(
                "E1611 cannot assign to a constant at {}",
                self.reporter().loc(loc)
            ));
            return None;
        }

        let expected = if op == AssignOp::Set {
            Some(l.ty.clone())
        } else {
            None
        };
        let r = self.convert_expr(ctx, a1, right, expected.as_ref())?;

        if op != AssignOp::Set {
            let lt = &l.ty;
            let rt = &r.ty;
            let numeric = |t: &Type| t.is_int() || t.is_float();
            let valid = match op {
                AssignOp::Add | AssignOp::Sub => {
                    (numeric(lt) && lt.equals(rt)) || (lt.is_ptr() && rt.is_int())
                }
                AssignOp::Mul | AssignOp::Div => numeric(lt) && lt.equals(rt),
                AssignOp::Mod => lt.is_int() && lt.equals(rt),
                AssignOp::Set => true,
            };
            if !valid {
                self.reporter().error(&format!(
                    "E1602 invalid types {lt} and {rt} for a compound assignment at {}",
                    self.reporter().loc(loc)
                ));
                return None;
            }
        }
        Some(Stat::new(
            loc,
            self.next_uid(),
            StatKind::Assign {
                op,
                left: l,
                right: r,
            },
        ))
    }

    /// Foreach: the iterator must be an array or slice; the index variable
    /// is an `int`, the value variable has the element type. Fresh
    /// (`auto i, r :`) declarations were left untyped by the parser and are
    /// declared here in the enclosing scope.
    #[allow(clippy::too_many_arguments)]
    fn convert_foreach(
        &self,
        ctx: &mut Context,
        a1: &[ast::Module],
        mi: usize,
        loc: femto_ir::Loc,
        var_i: &str,
        var_r: &str,
        iter: &ast::Expr,
        body: &ast::Stat,
        parent: &mut sem::Scope,
    ) -> Option<Stat> {
        let iter = self.convert_expr(ctx, a1, iter, None)?;
        if !iter.ty.is_arr() && !iter.ty.is_slice() {
            self.reporter().error(&format!(
                "E1613 foreach iterator must be an array or slice, got {} at {}",
                iter.ty,
                self.reporter().loc(loc)
            ));
            return None;
        }
        let elem = iter.ty.elem()?.clone();

        let mut resolve = |name: &str, want: &Type, code: &str, what: &str| -> Option<(String, i64)> {
            if let Some(v) = ctx.find_var(self, name) {
                // reuse form: the declared variable must fit
                if !v.ty.equals(want) {
                    self.reporter().error(&format!(
                        "{code} foreach {what} variable {name} must be {want}, got {} at {}",
                        v.ty,
                        self.reporter().loc(loc)
                    ));
                    return None;
                }
                Some((name.to_string(), v.uid))
            } else {
                // fresh declaration into the enclosing scope
                let uid = self.next_uid();
                ctx.bind(
                    name,
                    VarInfo {
                        uid,
                        ty: want.clone(),
                        is_const: false,
                        is_define: false,
                        uname: String::new(),
                    },
                );
                parent.body.push(Stat::new(
                    loc,
                    uid,
                    StatKind::Decl {
                        decl: Box::new(sem::Decl {
                            loc,
                            uid,
                            name: name.to_string(),
                            src_uname: String::new(),
                            ty: want.clone(),
                            exported: false,
                            body: DeclBody::Var(sem::VarDecl {
                                init: None,
                                is_define: false,
                                is_const: false,
                                is_volatile: false,
                                is_extern: false,
                                is_param: false,
                            }),
                        }),
                    },
                ));
                Some((name.to_string(), uid))
            }
        };

        let int_ty = self.ty_int();
        let vi = resolve(var_i, &int_ty, "E1614", "index")?;
        let vr = resolve(var_r, &elem, "E1615", "value")?;

        let uid = self.next_uid();
        ctx.loops.push(uid);
        let body_stat = self.convert_stat(ctx, a1, mi, body, parent);
        ctx.loops.pop();
        let mut body_stat = body_stat?;
        if let StatKind::Scope(s) = &mut body_stat.kind {
            s.is_loop_body = true;
        }
        Some(Stat::new(
            loc,
            uid,
            StatKind::Foreach {
                var_i: vi,
                var_r: vr,
                iter,
                body: Box::new(body_stat),
            },
        ))
    }

    /// Switch: integer or enum condition; case bodies and the default are
    /// scopes of their own. The switch returns when a default exists and
    /// every body returns.
    fn convert_switch(
        &self,
        ctx: &mut Context,
        a1: &[ast::Module],
        mi: usize,
        loc: femto_ir::Loc,
        sw: &ast::SwitchStat,
    ) -> Option<Stat> {
        let cond = self.convert_expr(ctx, a1, sw.cond.as_ref()?, None)?;
        if !cond.ty.is_int() && !cond.ty.is_enum() {
            self.reporter().error(&format!(
                "E1608 switch condition must be an integer or enum, got {} at {}",
                cond.ty,
                self.reporter().loc(loc)
            ));
            return None;
        }

        let mut case_bodies = Vec::with_capacity(sw.case_bodies.len());
        for &cb in &sw.case_bodies {
            case_bodies.push(self.convert_scope(ctx, a1, mi, cb));
        }
        let default_body = sw.default_body.map(|db| self.convert_scope(ctx, a1, mi, db));

        let returns = match &default_body {
            Some(d) => d.returns && case_bodies.iter().all(|c| c.returns),
            None => false,
        };
        let mut stat = Stat::new(
            loc,
            self.next_uid(),
            StatKind::Switch {
                cond,
                case_conds: sw.case_conds.clone(),
                case_falls: sw.case_falls.clone(),
                case_bodies,
                default_body,
            },
        );
        stat.returns = returns;
        Some(stat)
    }
}
