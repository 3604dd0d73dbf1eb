//! Statement parsers.

use crate::{Cursor, Parser};
use femto_ir::ast::{AssignOp, Expr, ScopeId, Stat, SwitchStat};
use femto_ir::{Literal, TokenKind};

fn assign_op(kind: TokenKind) -> Option<AssignOp> {
    Some(match kind {
        TokenKind::Assign => AssignOp::Set,
        TokenKind::AddAssign => AssignOp::Add,
        TokenKind::SubAssign => AssignOp::Sub,
        TokenKind::MulAssign => AssignOp::Mul,
        TokenKind::DivAssign => AssignOp::Div,
        TokenKind::ModAssign => AssignOp::Mod,
        _ => return None,
    })
}

impl Parser<'_> {
    /// Parse one statement. Returns `None` for empty statements and after
    /// unrecoverable statement-level errors.
    pub(crate) fn parse_stat(&mut self, m: usize, cur: &mut Cursor, scope: ScopeId) -> Option<Stat> {
        let mut is_define = false;
        let mut is_const = false;
        let mut is_volatile = false;
        let mut is_extern = false;
        while cur.can_pop(1) {
            let tok = cur.seek().clone();
            match tok.kind {
                // modifier tags accumulate until the declaration itself
                TokenKind::KwDefine => {
                    cur.pop();
                    is_define = true;
                }
                TokenKind::KwConst => {
                    cur.pop();
                    is_const = true;
                }
                TokenKind::KwVolatile => {
                    cur.pop();
                    is_volatile = true;
                }
                TokenKind::KwExtern => {
                    cur.pop();
                    is_extern = true;
                }

                TokenKind::LBrace => return Some(self.parse_stat_scope(m, cur, scope)),
                TokenKind::KwIf => {
                    cur.pop();
                    return self.parse_stat_if(m, cur, scope);
                }
                TokenKind::KwWhile => {
                    cur.pop();
                    return self.parse_stat_while(m, cur, scope);
                }
                TokenKind::KwFor => {
                    cur.pop();
                    return self.parse_stat_for(m, cur, scope);
                }
                TokenKind::KwSwitch => {
                    cur.pop();
                    return self.parse_stat_switch(m, cur, scope);
                }

                TokenKind::Semi => {
                    cur.pop();
                    return None;
                }

                TokenKind::KwRawC | TokenKind::KwRawIr => {
                    let kw = cur.pop();
                    let code = cur.pop();
                    if code.kind != TokenKind::LitStr {
                        self.reporter().fatal(&format!(
                            "E0406 expected string, got {} at {}",
                            Self::tok_text(&code),
                            self.reporter().loc(code.loc)
                        ));
                    }
                    return Some(if kw.kind == TokenKind::KwRawC {
                        Stat::RawC {
                            loc: kw.loc,
                            code: code.text,
                        }
                    } else {
                        Stat::RawIr {
                            loc: kw.loc,
                            code: code.text,
                        }
                    });
                }

                TokenKind::KwBreak => {
                    cur.pop();
                    return Some(Stat::Break { loc: tok.loc });
                }
                TokenKind::KwContinue => {
                    cur.pop();
                    return Some(Stat::Continue { loc: tok.loc });
                }
                TokenKind::KwFall => {
                    cur.pop();
                    return Some(Stat::Fall { loc: tok.loc });
                }

                TokenKind::KwReturn => {
                    cur.pop();
                    let value = if cur.seek().kind != TokenKind::Semi {
                        self.parse_expr(m, cur, scope)
                    } else {
                        None
                    };
                    self.expect_tok(cur, TokenKind::Semi, "E0407");
                    return Some(Stat::Return {
                        loc: tok.loc,
                        value,
                    });
                }

                TokenKind::KwDefer => {
                    cur.pop();
                    let expr = self.parse_expr(m, cur, scope)?;
                    self.expect_tok(cur, TokenKind::Semi, "E0408");
                    return Some(Stat::Defer { loc: tok.loc, expr });
                }

                TokenKind::KwTypedef => {
                    cur.pop();
                    let name = cur.pop();
                    if name.kind != TokenKind::Ident {
                        self.reporter().fatal(&format!(
                            "E0409 expected name, got {} at {}",
                            Self::tok_text(&name),
                            self.reporter().loc(name.loc)
                        ));
                    }
                    let ty = match self.parse_type(m, cur, scope) {
                        Ok(t) => t,
                        Err(msg) => {
                            self.reporter().fatal(&msg);
                            return None;
                        }
                    };
                    let id = self.modules[m].alloc_decl(femto_ir::ast::Decl::Typedef {
                        loc: name.loc,
                        name: name.text.clone(),
                        ty,
                        exported: false,
                    });
                    self.modules[m]
                        .scope_mut(scope)
                        .names
                        .insert(name.text, id);
                    return Some(Stat::Decl {
                        loc: name.loc,
                        decl: id,
                    });
                }

                _ => {
                    if self.is_type_start(m, cur, scope) {
                        // local variable declaration
                        let ty = match self.parse_type(m, cur, scope) {
                            Ok(t) => Some(t),
                            Err(msg) => {
                                self.reporter().fatal(&msg);
                                None
                            }
                        };
                        let id = self.parse_decl_var(
                            m, cur, scope, ty, is_define, is_const, is_volatile, is_extern,
                            false,
                        );
                        return Some(Stat::Decl {
                            loc: tok.loc,
                            decl: id,
                        });
                    }
                    // expression or assignment statement
                    let left = self.parse_expr(m, cur, scope)?;
                    let end = cur.pop();
                    if end.kind == TokenKind::Semi {
                        return Some(Stat::Expr {
                            loc: left.loc(),
                            expr: left,
                        });
                    }
                    return self.parse_stat_assign(m, cur, scope, left, end.kind, TokenKind::Semi);
                }
            }
        }
        None
    }

    /// Assignment tail: the operator token has already been consumed.
    pub(crate) fn parse_stat_assign(
        &mut self,
        m: usize,
        cur: &mut Cursor,
        scope: ScopeId,
        left: Expr,
        op_kind: TokenKind,
        end: TokenKind,
    ) -> Option<Stat> {
        let op = match assign_op(op_kind) {
            Some(op) => op,
            None => {
                self.reporter().fatal(&format!(
                    "E0601 invalid assignment operator at {}",
                    self.reporter().loc(left.loc())
                ));
                AssignOp::Set
            }
        };
        let right = self.parse_expr(m, cur, scope)?;
        let tok = cur.pop();
        if tok.kind != end {
            self.reporter().fatal(&format!(
                "E0602 expected '{}', got {} at {}",
                end.display_name(),
                Self::tok_text(&tok),
                self.reporter().loc(tok.loc)
            ));
            cur.rewind(1);
        }
        Some(Stat::Assign {
            loc: left.loc(),
            op,
            left,
            right,
        })
    }

    /// `{ ... }` scope.
    pub(crate) fn parse_stat_scope(&mut self, m: usize, cur: &mut Cursor, parent: ScopeId) -> Stat {
        let open = self.expect_tok(cur, TokenKind::LBrace, "E0603");
        let id = self.modules[m].alloc_scope(open.loc, Some(parent));
        while cur.can_pop(1) {
            if cur.seek().kind == TokenKind::RBrace {
                cur.pop();
                break;
            }
            if let Some(st) = self.parse_stat(m, cur, id) {
                self.modules[m].scope_mut(id).body.push(st);
            }
        }
        Stat::Scope {
            loc: open.loc,
            scope: id,
        }
    }

    fn parse_stat_if(&mut self, m: usize, cur: &mut Cursor, scope: ScopeId) -> Option<Stat> {
        let open = self.expect_tok(cur, TokenKind::LParen, "E0604");
        let cond = self.parse_expr(m, cur, scope);
        if cond.is_none() {
            self.reporter().fatal(&format!(
                "E0605 expected condition expression at {}",
                self.reporter().loc(open.loc)
            ));
        }
        self.expect_tok(cur, TokenKind::RParen, "E0606");
        let then_body = self.parse_stat(m, cur, scope);
        if then_body.is_none() {
            self.reporter().fatal(&format!(
                "E0607 expected then statement at {}",
                self.reporter().loc(open.loc)
            ));
        }
        let mut else_body = None;
        if cur.seek().kind == TokenKind::KwElse {
            cur.pop();
            else_body = self.parse_stat(m, cur, scope);
            if else_body.is_none() {
                self.reporter().fatal(&format!(
                    "E0608 expected else statement at {}",
                    self.reporter().loc(open.loc)
                ));
            }
        }
        Some(Stat::If {
            loc: open.loc,
            cond,
            then_body: then_body.map(Box::new),
            else_body: else_body.map(Box::new),
        })
    }

    fn parse_stat_while(&mut self, m: usize, cur: &mut Cursor, scope: ScopeId) -> Option<Stat> {
        let open = self.expect_tok(cur, TokenKind::LParen, "E0609");
        let cond = self.parse_expr(m, cur, scope);
        if cond.is_none() {
            self.reporter().fatal(&format!(
                "E0610 expected condition expression at {}",
                self.reporter().loc(open.loc)
            ));
        }
        self.expect_tok(cur, TokenKind::RParen, "E0611");
        let body = self.parse_stat(m, cur, scope);
        if body.is_none() {
            self.reporter().fatal(&format!(
                "E0612 expected body statement at {}",
                self.reporter().loc(open.loc)
            ));
        }
        Some(Stat::While {
            loc: open.loc,
            cond,
            body: body.map(Box::new),
        })
    }

    /// The three `for` heads: `auto i, r : iter`, `i, r : iter`, and the
    /// classic `init; cond; step`. Heads that declare variables get a fresh
    /// wrapper scope that owns the declarations.
    fn parse_stat_for(&mut self, m: usize, cur: &mut Cursor, scope: ScopeId) -> Option<Stat> {
        let open = self.expect_tok(cur, TokenKind::LParen, "E0613");

        if cur.match_seq(&[
            TokenKind::KwAuto,
            TokenKind::Ident,
            TokenKind::Comma,
            TokenKind::Ident,
            TokenKind::Colon,
        ]) {
            // foreach with fresh declarations
            cur.pop();
            let tok_i = cur.pop();
            cur.pop();
            let tok_r = cur.pop();
            cur.pop();
            if tok_i.text == tok_r.text {
                self.reporter().fatal(&format!(
                    "E0614 foreach variable names are the same at {}",
                    self.reporter().loc(open.loc)
                ));
            }
            let wrapper = self.modules[m].alloc_scope(open.loc, Some(scope));
            self.modules[m].scope_mut(wrapper).is_foreach = true;
            for tok in [&tok_i, &tok_r] {
                let id = self.modules[m].alloc_decl(femto_ir::ast::Decl::Var(
                    femto_ir::ast::VarDecl {
                        loc: tok.loc,
                        name: tok.text.clone(),
                        ty: None,
                        init: None,
                        exported: false,
                        is_define: false,
                        is_const: false,
                        is_volatile: false,
                        is_extern: false,
                        is_param: false,
                    },
                ));
                let s = self.modules[m].scope_mut(wrapper);
                s.names.insert(tok.text.clone(), id);
                s.body.push(Stat::Decl {
                    loc: tok.loc,
                    decl: id,
                });
            }

            let iter = self.parse_expr(m, cur, wrapper);
            if iter.is_none() {
                self.reporter().fatal(&format!(
                    "E0615 expected iterator expression at {}",
                    self.reporter().loc(open.loc)
                ));
            }
            self.expect_tok(cur, TokenKind::RParen, "E0616");
            let body = self.parse_stat(m, cur, wrapper);
            if body.is_none() {
                self.reporter().fatal(&format!(
                    "E0617 expected body statement at {}",
                    self.reporter().loc(open.loc)
                ));
            }
            let foreach = Stat::Foreach {
                loc: open.loc,
                var_i: tok_i.text,
                var_r: tok_r.text,
                iter,
                body: body.map(Box::new),
            };
            self.modules[m].scope_mut(wrapper).body.push(foreach);
            return Some(Stat::Scope {
                loc: open.loc,
                scope: wrapper,
            });
        }

        if cur.match_seq(&[
            TokenKind::Ident,
            TokenKind::Comma,
            TokenKind::Ident,
            TokenKind::Colon,
        ]) {
            // foreach reusing declared variables
            let tok_i = cur.pop();
            cur.pop();
            let tok_r = cur.pop();
            cur.pop();
            if tok_i.text == tok_r.text {
                self.reporter().fatal(&format!(
                    "E0618 foreach variable names are the same at {}",
                    self.reporter().loc(open.loc)
                ));
            }
            let iter = self.parse_expr(m, cur, scope);
            if iter.is_none() {
                self.reporter().fatal(&format!(
                    "E0619 expected iterator expression at {}",
                    self.reporter().loc(open.loc)
                ));
            }
            self.expect_tok(cur, TokenKind::RParen, "E0620");
            let body = self.parse_stat(m, cur, scope);
            if body.is_none() {
                self.reporter().fatal(&format!(
                    "E0621 expected body statement at {}",
                    self.reporter().loc(open.loc)
                ));
            }
            return Some(Stat::Foreach {
                loc: open.loc,
                var_i: tok_i.text,
                var_r: tok_r.text,
                iter,
                body: body.map(Box::new),
            });
        }

        // classic for; an init declaration lives in a wrapper scope
        let wrapper = self.modules[m].alloc_scope(open.loc, Some(scope));
        let init = self.parse_stat(m, cur, wrapper);
        let cond = if cur.seek().kind != TokenKind::Semi {
            self.parse_expr(m, cur, wrapper)
        } else {
            None
        };
        self.expect_tok(cur, TokenKind::Semi, "E0622");

        let step = if cur.seek().kind != TokenKind::RParen {
            let left = self.parse_expr(m, cur, wrapper)?;
            let tok = cur.pop();
            if tok.kind == TokenKind::RParen {
                Some(Stat::Expr {
                    loc: left.loc(),
                    expr: left,
                })
            } else {
                self.parse_stat_assign(m, cur, wrapper, left, tok.kind, TokenKind::RParen)
            }
        } else {
            cur.pop();
            None
        };

        if init.is_none() {
            let body = self.parse_stat(m, cur, scope);
            if body.is_none() {
                self.reporter().fatal(&format!(
                    "E0623 expected body statement at {}",
                    self.reporter().loc(open.loc)
                ));
            }
            Some(Stat::For {
                loc: open.loc,
                cond,
                step: step.map(Box::new),
                body: body.map(Box::new),
            })
        } else {
            let body = self.parse_stat(m, cur, wrapper);
            if body.is_none() {
                self.reporter().fatal(&format!(
                    "E0624 expected body statement at {}",
                    self.reporter().loc(open.loc)
                ));
            }
            let for_stat = Stat::For {
                loc: open.loc,
                cond,
                step: step.map(Box::new),
                body: body.map(Box::new),
            };
            let s = self.modules[m].scope_mut(wrapper);
            s.body.push(init.unwrap());
            s.body.push(for_stat);
            Some(Stat::Scope {
                loc: open.loc,
                scope: wrapper,
            })
        }
    }

    /// `switch (cond) { case INT: ... fall? ... default: ... }`.
    ///
    /// Case constants must fold to distinct integers; `fall` is only legal
    /// as the last statement of a case body, never in `default`, never
    /// doubled, never before the first case. A falling case may not declare
    /// names.
    fn parse_stat_switch(&mut self, m: usize, cur: &mut Cursor, scope: ScopeId) -> Option<Stat> {
        let open = self.expect_tok(cur, TokenKind::LParen, "E0625");
        let cond = self.parse_expr(m, cur, scope);
        if cond.is_none() {
            self.reporter().fatal(&format!(
                "E0626 expected condition expression at {}",
                self.reporter().loc(open.loc)
            ));
        }
        self.expect_tok(cur, TokenKind::RParen, "E0627");
        self.expect_tok(cur, TokenKind::LBrace, "E0628");

        let mut sw = SwitchStat {
            cond,
            case_conds: Vec::new(),
            case_falls: Vec::new(),
            case_bodies: Vec::new(),
            default_body: None,
        };
        let mut was_fall = false;
        let mut scratch: Option<ScopeId> = None;

        while cur.can_pop(1) {
            let tok = cur.seek().clone();
            match tok.kind {
                TokenKind::KwCase => {
                    cur.pop();
                    if sw.default_body.is_some() {
                        self.reporter().fatal(&format!(
                            "E0629 case cannot come after default at {}",
                            self.reporter().loc(tok.loc)
                        ));
                    }
                    let cexpr = self.parse_expr(m, cur, scope);
                    let value = match cexpr.as_ref().and_then(|e| e.as_literal()) {
                        Some(Literal::Int(v)) => *v,
                        _ => {
                            self.reporter().fatal(&format!(
                                "E0630 case must be an integer constexpr at {}",
                                self.reporter().loc(tok.loc)
                            ));
                            0
                        }
                    };
                    if sw.case_conds.contains(&value) {
                        self.reporter().fatal(&format!(
                            "E0631 duplicate case {value} at {}",
                            self.reporter().loc(tok.loc)
                        ));
                    }
                    self.expect_tok(cur, TokenKind::Colon, "E0632");
                    sw.case_conds.push(value);
                    sw.case_falls.push(false);
                    sw.case_bodies
                        .push(self.modules[m].alloc_scope(tok.loc, Some(scope)));
                    was_fall = false;
                }

                TokenKind::KwDefault => {
                    cur.pop();
                    if sw.default_body.is_some() {
                        self.reporter().fatal(&format!(
                            "E0633 double default at {}",
                            self.reporter().loc(tok.loc)
                        ));
                    }
                    self.expect_tok(cur, TokenKind::Colon, "E0632");
                    sw.default_body = Some(self.modules[m].alloc_scope(tok.loc, Some(scope)));
                    was_fall = false;
                }

                TokenKind::RBrace => {
                    cur.pop();
                    break;
                }

                TokenKind::KwFall => {
                    cur.pop();
                    if sw.case_conds.is_empty() {
                        self.reporter().fatal(&format!(
                            "E0634 fall before any case at {}",
                            self.reporter().loc(tok.loc)
                        ));
                    } else if was_fall {
                        self.reporter().fatal(&format!(
                            "E0635 double fall at {}",
                            self.reporter().loc(tok.loc)
                        ));
                    } else if sw.default_body.is_some() {
                        self.reporter().fatal(&format!(
                            "E0636 cannot fall inside default at {}",
                            self.reporter().loc(tok.loc)
                        ));
                    } else {
                        *sw.case_falls.last_mut().unwrap() = true;
                    }
                    was_fall = true;
                }

                _ => {
                    let in_default = sw.default_body.is_some();
                    let body_scope = if in_default {
                        sw.default_body.unwrap()
                    } else if let Some(&last) = sw.case_bodies.last() {
                        last
                    } else {
                        self.reporter().fatal(&format!(
                            "E0637 statement before the first case at {}",
                            self.reporter().loc(tok.loc)
                        ));
                        *scratch
                            .get_or_insert_with(|| self.modules[m].alloc_scope(tok.loc, Some(scope)))
                    };
                    if let Some(st) = self.parse_stat(m, cur, body_scope) {
                        if was_fall {
                            self.reporter().fatal(&format!(
                                "E0638 statement after fall at {}",
                                self.reporter().loc(st.loc())
                            ));
                        }
                        self.modules[m].scope_mut(body_scope).body.push(st);
                    }
                }
            }
        }

        // a falling case may not declare names
        for (i, &falls) in sw.case_falls.iter().enumerate() {
            if falls && !self.modules[m].scope(sw.case_bodies[i]).names.is_empty() {
                self.reporter().fatal(&format!(
                    "E0641 name declaration inside a falling case at {}",
                    self.reporter()
                        .loc(self.modules[m].scope(sw.case_bodies[i]).loc)
                ));
            }
        }
        Some(Stat::Switch {
            loc: open.loc,
            switch: sw,
        })
    }
}
