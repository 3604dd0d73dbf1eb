//! Pratt expression parser.

use crate::{Cursor, Parser};
use femto_ir::ast::{Expr, OpKind, ScopeId};
use femto_ir::{Literal, Token, TokenKind};

/// Precedence of a unary prefix operator.
const UNARY_LEVEL: i32 = 15;

/// Infix/postfix binding strength; `-1` for non-operators.
fn infix_precedence(kind: TokenKind) -> i32 {
    use TokenKind::*;
    match kind {
        Dot | LParen | LBracket | Inc | Dec => 20,
        Mul | Div | Mod => 11,
        Add | Sub => 10,
        Shl | Shr => 9,
        Lt | Le | Gt | Ge => 8,
        EqEq | Ne => 7,
        BitAnd => 6,
        BitXor => 5,
        BitOr => 4,
        AndAnd => 3,
        OrOr => 2,
        Question => 1,
        _ => -1,
    }
}

fn unary_op(kind: TokenKind) -> Option<OpKind> {
    use TokenKind::*;
    Some(match kind {
        Add => OpKind::Plus,
        Sub => OpKind::Minus,
        Not => OpKind::LogicNot,
        BitNot => OpKind::BitNot,
        Mul => OpKind::Deref,
        BitAnd => OpKind::Ref,
        _ => return None,
    })
}

fn binary_op(kind: TokenKind) -> Option<OpKind> {
    use TokenKind::*;
    Some(match kind {
        Mul => OpKind::Mul,
        Div => OpKind::Div,
        Mod => OpKind::Mod,
        Add => OpKind::Add,
        Sub => OpKind::Sub,
        Shl => OpKind::Shl,
        Shr => OpKind::Shr,
        Lt => OpKind::Lt,
        Le => OpKind::Le,
        Gt => OpKind::Gt,
        Ge => OpKind::Ge,
        EqEq => OpKind::Eq,
        Ne => OpKind::Ne,
        BitAnd => OpKind::BitAnd,
        BitXor => OpKind::BitXor,
        BitOr => OpKind::BitOr,
        AndAnd => OpKind::LogicAnd,
        OrOr => OpKind::LogicOr,
        _ => return None,
    })
}

impl Parser<'_> {
    /// Token text for diagnostics; falls back to the kind's display name.
    pub(crate) fn tok_text(tok: &Token) -> &str {
        if tok.text.is_empty() {
            tok.kind.display_name()
        } else {
            &tok.text
        }
    }

    /// Pop a token, requiring `kind`. On mismatch report under `code` and
    /// rewind one token so parsing resumes at the unexpected token.
    pub(crate) fn expect_tok(&self, cur: &mut Cursor, kind: TokenKind, code: &str) -> Token {
        let tok = cur.pop();
        if tok.kind != kind {
            self.reporter().fatal(&format!(
                "{code} expected '{}', got {} at {}",
                kind.display_name(),
                Self::tok_text(&tok),
                self.reporter().loc(tok.loc)
            ));
            cur.rewind(1);
        }
        tok
    }

    /// Parse an expression and fold it; a fully constant expression comes
    /// back as a single literal node.
    pub(crate) fn parse_expr(&self, m: usize, cur: &mut Cursor, scope: ScopeId) -> Option<Expr> {
        let mut e = self.parse_pratt_expr(m, cur, scope, 0)?;
        match self.fold_node(&mut e, m, scope) {
            Some(lit) => Some(Expr::Literal {
                loc: e.loc(),
                value: lit,
            }),
            None => Some(e),
        }
    }

    /// Pratt loop: parse an atom, then consume infix/postfix operators whose
    /// precedence is at least `level`. Binary right-hand sides recurse at
    /// `level + 1` (strict left associativity); ternary arms re-enter at 0.
    pub(crate) fn parse_pratt_expr(
        &self,
        m: usize,
        cur: &mut Cursor,
        scope: ScopeId,
        level: i32,
    ) -> Option<Expr> {
        let mut lhs = self.parse_atomic_expr(m, cur, scope)?;
        while cur.can_pop(1) {
            let cur_level = infix_precedence(cur.seek().kind);
            if cur_level < level {
                break;
            }
            let op = cur.pop();
            match op.kind {
                TokenKind::Inc | TokenKind::Dec => {
                    let kind = if op.kind == TokenKind::Inc {
                        OpKind::Inc
                    } else {
                        OpKind::Dec
                    };
                    let mut node = Expr::op(op.loc, kind);
                    if let Expr::Op { operand0, .. } = &mut node {
                        *operand0 = Some(Box::new(lhs));
                    }
                    lhs = node;
                }

                TokenKind::Dot => {
                    let name = cur.pop();
                    if name.kind != TokenKind::Ident {
                        self.reporter().fatal(&format!(
                            "E0315 expected name, got {} at {}",
                            Self::tok_text(&name),
                            self.reporter().loc(name.loc)
                        ));
                        cur.rewind(1);
                    }
                    let rhs = Expr::Name {
                        loc: name.loc,
                        name: name.text,
                    };
                    let mut node = Expr::op(op.loc, OpKind::Dot);
                    if let Expr::Op {
                        operand0, operand1, ..
                    } = &mut node
                    {
                        *operand0 = Some(Box::new(lhs));
                        *operand1 = Some(Box::new(rhs));
                    }
                    lhs = node;
                }

                TokenKind::LParen => {
                    let mut args = Vec::new();
                    if cur.seek().kind != TokenKind::RParen {
                        while cur.can_pop(1) {
                            if let Some(a) = self.parse_pratt_expr(m, cur, scope, 0) {
                                args.push(a);
                            }
                            let tok = cur.seek();
                            if tok.kind == TokenKind::Comma {
                                cur.pop();
                                // trailing comma
                                if cur.seek().kind == TokenKind::RParen {
                                    break;
                                }
                            } else if tok.kind == TokenKind::RParen {
                                break;
                            } else {
                                self.reporter().fatal(&format!(
                                    "E0316 expected ')', got {} at {}",
                                    Self::tok_text(tok),
                                    self.reporter().loc(tok.loc)
                                ));
                                break;
                            }
                        }
                    }
                    self.expect_tok(cur, TokenKind::RParen, "E0317");
                    lhs = Expr::Call {
                        loc: op.loc,
                        callee: Box::new(lhs),
                        args,
                    };
                }

                TokenKind::LBracket => {
                    let mut is_index = true;
                    let mut left = None;
                    let mut right = None;
                    if cur.seek().kind != TokenKind::Colon {
                        left = self.parse_pratt_expr(m, cur, scope, 0);
                    }
                    if cur.seek().kind == TokenKind::Colon {
                        is_index = false;
                        cur.pop();
                        if cur.seek().kind != TokenKind::RBracket {
                            right = self.parse_pratt_expr(m, cur, scope, 0);
                        }
                    }
                    self.expect_tok(cur, TokenKind::RBracket, "E0318");
                    let kind = if is_index { OpKind::Index } else { OpKind::Slice };
                    let mut node = Expr::op(op.loc, kind);
                    if let Expr::Op {
                        operand0,
                        operand1,
                        operand2,
                        ..
                    } = &mut node
                    {
                        *operand0 = Some(Box::new(lhs));
                        *operand1 = left.map(Box::new);
                        *operand2 = right.map(Box::new);
                    }
                    lhs = node;
                }

                TokenKind::Question => {
                    let then_arm = self.parse_pratt_expr(m, cur, scope, 0);
                    self.expect_tok(cur, TokenKind::Colon, "E0319");
                    let else_arm = self.parse_pratt_expr(m, cur, scope, 0);
                    let mut node = Expr::op(op.loc, OpKind::Cond);
                    if let Expr::Op {
                        operand0,
                        operand1,
                        operand2,
                        ..
                    } = &mut node
                    {
                        *operand0 = Some(Box::new(lhs));
                        *operand1 = then_arm.map(Box::new);
                        *operand2 = else_arm.map(Box::new);
                    }
                    lhs = node;
                }

                _ => {
                    let Some(kind) = binary_op(op.kind) else {
                        cur.rewind(1);
                        break;
                    };
                    let rhs = self.parse_pratt_expr(m, cur, scope, level + 1);
                    let mut node = Expr::op(op.loc, kind);
                    if let Expr::Op {
                        operand0, operand1, ..
                    } = &mut node
                    {
                        *operand0 = Some(Box::new(lhs));
                        *operand1 = rhs.map(Box::new);
                    }
                    lhs = node;
                }
            }
        }
        Some(lhs)
    }

    /// Parse an atom: literal, name, parenthesized expression, data literal,
    /// prefix unary, or an integrated function.
    pub(crate) fn parse_atomic_expr(
        &self,
        m: usize,
        cur: &mut Cursor,
        scope: ScopeId,
    ) -> Option<Expr> {
        let tok = cur.pop();
        match tok.kind {
            TokenKind::LitInt | TokenKind::LitFloat | TokenKind::LitStr => Some(Expr::Literal {
                loc: tok.loc,
                value: tok.value.unwrap_or(Literal::Null),
            }),

            TokenKind::KwTrue => Some(Expr::Literal {
                loc: tok.loc,
                value: Literal::Bool(true),
            }),
            TokenKind::KwFalse => Some(Expr::Literal {
                loc: tok.loc,
                value: Literal::Bool(false),
            }),
            TokenKind::KwNull => Some(Expr::Literal {
                loc: tok.loc,
                value: Literal::Null,
            }),

            TokenKind::Ident => Some(Expr::Name {
                loc: tok.loc,
                name: tok.text,
            }),

            TokenKind::LParen => {
                let e = self.parse_pratt_expr(m, cur, scope, 0);
                self.expect_tok(cur, TokenKind::RParen, "E0301");
                e
            }

            TokenKind::LBrace => {
                let mut elements = Vec::new();
                if cur.seek().kind == TokenKind::RBrace {
                    cur.pop();
                } else {
                    while cur.can_pop(1) {
                        if let Some(e) = self.parse_expr(m, cur, scope) {
                            elements.push(e);
                        }
                        let t = cur.pop();
                        match t.kind {
                            TokenKind::Comma => {
                                // trailing comma
                                if cur.seek().kind == TokenKind::RBrace {
                                    cur.pop();
                                    break;
                                }
                            }
                            TokenKind::RBrace => break,
                            _ => {
                                self.reporter().fatal(&format!(
                                    "E0302 expected '}}', got {} at {}",
                                    Self::tok_text(&t),
                                    self.reporter().loc(t.loc)
                                ));
                                cur.rewind(1);
                                break;
                            }
                        }
                    }
                }
                Some(Expr::LitData {
                    loc: tok.loc,
                    elements,
                })
            }

            TokenKind::Add
            | TokenKind::Sub
            | TokenKind::BitNot
            | TokenKind::Not
            | TokenKind::Mul
            | TokenKind::BitAnd => {
                let kind = unary_op(tok.kind).expect("unary operator");
                let operand = self.parse_pratt_expr(m, cur, scope, UNARY_LEVEL);
                let mut node = Expr::op(tok.loc, kind);
                if let Expr::Op { operand0, .. } = &mut node {
                    *operand0 = operand.map(Box::new);
                }
                Some(node)
            }

            TokenKind::KwSizeof => {
                self.expect_tok(cur, TokenKind::LParen, "E0303");
                let mut node = Expr::op(tok.loc, OpKind::Sizeof);
                if self.is_type_start(m, cur, scope) {
                    match self.parse_type(m, cur, scope) {
                        Ok(ty) => {
                            if let Expr::Op { type_operand, .. } = &mut node {
                                *type_operand = Some(Box::new(ty));
                            }
                        }
                        Err(msg) => self.reporter().fatal(&msg),
                    }
                } else {
                    let operand = self.parse_pratt_expr(m, cur, scope, 0);
                    if let Expr::Op { operand0, .. } = &mut node {
                        *operand0 = operand.map(Box::new);
                    }
                }
                self.expect_tok(cur, TokenKind::RParen, "E0304");
                Some(node)
            }

            TokenKind::KwCast => {
                self.expect_tok(cur, TokenKind::Lt, "E0305");
                let mut node = Expr::op(tok.loc, OpKind::Cast);
                match self.parse_type(m, cur, scope) {
                    Ok(ty) => {
                        if let Expr::Op { type_operand, .. } = &mut node {
                            *type_operand = Some(Box::new(ty));
                        }
                    }
                    Err(msg) => self.reporter().fatal(&msg),
                }
                self.expect_tok(cur, TokenKind::Gt, "E0306");
                self.expect_tok(cur, TokenKind::LParen, "E0307");
                let operand = self.parse_pratt_expr(m, cur, scope, 0);
                if let Expr::Op { operand0, .. } = &mut node {
                    *operand0 = operand.map(Box::new);
                }
                self.expect_tok(cur, TokenKind::RParen, "E0308");
                Some(node)
            }

            TokenKind::KwMake => {
                self.expect_tok(cur, TokenKind::LParen, "E0309");
                let a = self.parse_pratt_expr(m, cur, scope, 0);
                self.expect_tok(cur, TokenKind::Comma, "E0310");
                let b = self.parse_pratt_expr(m, cur, scope, 0);
                self.expect_tok(cur, TokenKind::RParen, "E0311");
                let mut node = Expr::op(tok.loc, OpKind::Make);
                if let Expr::Op {
                    operand0, operand1, ..
                } = &mut node
                {
                    *operand0 = a.map(Box::new);
                    *operand1 = b.map(Box::new);
                }
                Some(node)
            }

            TokenKind::KwLen | TokenKind::KwMove => {
                let kind = if tok.kind == TokenKind::KwLen {
                    OpKind::Len
                } else {
                    OpKind::Move
                };
                self.expect_tok(cur, TokenKind::LParen, "E0312");
                let operand = self.parse_pratt_expr(m, cur, scope, 0);
                self.expect_tok(cur, TokenKind::RParen, "E0313");
                let mut node = Expr::op(tok.loc, kind);
                if let Expr::Op { operand0, .. } = &mut node {
                    *operand0 = operand.map(Box::new);
                }
                Some(node)
            }

            _ => {
                self.reporter().fatal(&format!(
                    "E0314 invalid expression start {} at {}",
                    Self::tok_text(&tok),
                    self.reporter().loc(tok.loc)
                ));
                None
            }
        }
    }
}
