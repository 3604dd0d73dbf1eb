//! Type expressions: a leftmost base followed by right-trailing modifiers.

use crate::{Cursor, Parser};
use femto_ir::ast::{Decl, ParsedType, ParsedTypeKind, ScopeId};
use femto_ir::{Literal, TokenKind};

impl Parser<'_> {
    /// Parse a type expression.
    ///
    /// The base is a foreign reference (`inc.Name`), a local name (typedef
    /// and template bases are substituted by deep clone, struct/enum and
    /// unresolved names become forward `Name` references), `auto`, or a
    /// primitive keyword. Modifiers extend the result to the left: `*`
    /// wraps a pointer, `[...]` an array or slice, `(...)` a function.
    ///
    /// Errors are returned as pre-rendered messages; the caller reports
    /// them and continues with a best-effort type.
    pub(crate) fn parse_type(
        &self,
        m: usize,
        cur: &mut Cursor,
        scope: ScopeId,
    ) -> Result<ParsedType, String> {
        let module = &self.modules[m];

        // base type
        let mut base;
        if cur.match_seq(&[TokenKind::Ident, TokenKind::Dot, TokenKind::Ident]) {
            // foreign reference through an include alias
            let inc = cur.pop();
            cur.pop();
            let tgt = cur.pop();
            let ok = module
                .find_decl(&inc.text, false)
                .is_some_and(|id| matches!(module.decl(id), Decl::Include { .. }));
            if !ok {
                return Err(format!(
                    "E0201 include {} not found at {}",
                    inc.text,
                    self.reporter().loc(inc.loc)
                ));
            }
            base = ParsedType::new(
                ParsedTypeKind::Foreign,
                inc.loc,
                tgt.text,
                inc.text,
                &module.uname,
            );
        } else if cur.match_seq(&[TokenKind::Ident]) {
            let tgt = cur.pop();
            match module.find_decl_from(scope, &tgt.text) {
                Some(id) => match module.decl(id) {
                    Decl::Typedef { ty, .. } => base = ty.clone(),
                    Decl::Template { ty: Some(ty), .. } => base = ty.clone(),
                    // unbound template: already reported at the binding
                    // check; recover with a forward reference
                    Decl::Template { ty: None, .. } => {
                        base = ParsedType::new(
                            ParsedTypeKind::Name,
                            tgt.loc,
                            tgt.text,
                            "",
                            &module.uname,
                        );
                    }
                    _ => {
                        base = ParsedType::new(
                            ParsedTypeKind::Name,
                            tgt.loc,
                            tgt.text,
                            "",
                            &module.uname,
                        );
                    }
                },
                // use before definition: forward reference, resolved in pass 2
                None => {
                    base = ParsedType::new(
                        ParsedTypeKind::Name,
                        tgt.loc,
                        tgt.text,
                        "",
                        &module.uname,
                    );
                }
            }
        } else if cur.can_pop(1) {
            let tok = cur.pop();
            if tok.kind == TokenKind::KwAuto {
                // auto takes no modifiers
                return Ok(ParsedType::new(
                    ParsedTypeKind::Auto,
                    tok.loc,
                    "auto",
                    "",
                    "",
                ));
            }
            if !tok.kind.is_primitive() {
                return Err(format!(
                    "E0202 unknown type {} at {}",
                    tok.text,
                    self.reporter().loc(tok.loc)
                ));
            }
            base = ParsedType::new(ParsedTypeKind::Primitive, tok.loc, &tok.text, "", "");
            let (size, align) = self.primitive_layout(tok.kind);
            base.size = size;
            base.align = align;
        } else {
            return Err(format!("E0203 unexpected EOF in {}", module.path));
        }

        // modifiers
        let mut res = base;
        while cur.can_pop(1) {
            let tok = cur.pop();
            match tok.kind {
                TokenKind::Mul => {
                    let mut ptr =
                        ParsedType::new(ParsedTypeKind::Ptr, tok.loc, "*", "", "");
                    ptr.size = self.arch;
                    ptr.align = self.arch;
                    ptr.direct = Some(Box::new(res));
                    res = ptr;
                }

                TokenKind::LBracket => {
                    if res.size == 0 {
                        return Err(format!(
                            "E0204 cannot create void array or slice at {}",
                            self.reporter().loc(tok.loc)
                        ));
                    }
                    let mut arr;
                    if cur.match_seq(&[TokenKind::RBracket]) {
                        cur.pop();
                        arr = ParsedType::new(ParsedTypeKind::Slice, tok.loc, "[]", "", "");
                        arr.size = self.arch * 2;
                        arr.align = self.arch;
                    } else if cur.match_seq(&[TokenKind::LitInt, TokenKind::RBracket]) {
                        let len_tok = cur.pop();
                        cur.pop();
                        let len = len_tok.value.as_ref().and_then(Literal::as_int).unwrap_or(0);
                        if len <= 0 {
                            return Err(format!(
                                "E0205 array length must be positive at {}",
                                self.reporter().loc(len_tok.loc)
                            ));
                        }
                        arr = ParsedType::new(ParsedTypeKind::Arr, tok.loc, "[N]", "", "");
                        arr.arr_len = len;
                    } else if cur.match_seq(&[TokenKind::Ident, TokenKind::RBracket]) {
                        let len_tok = cur.pop();
                        cur.pop();
                        let lit = self.modules[m].find_literal_from(scope, &len_tok.text);
                        let Some(Literal::Int(len)) = lit else {
                            return Err(format!(
                                "E0206 cannot find integer constant {} at {}",
                                len_tok.text,
                                self.reporter().loc(len_tok.loc)
                            ));
                        };
                        if len <= 0 {
                            return Err(format!(
                                "E0207 array length must be positive at {}",
                                self.reporter().loc(len_tok.loc)
                            ));
                        }
                        arr = ParsedType::new(ParsedTypeKind::Arr, tok.loc, "[N]", "", "");
                        arr.arr_len = len;
                    } else {
                        return Err(format!(
                            "E0208 expected ']' at {}",
                            self.reporter().loc(tok.loc)
                        ));
                    }
                    if arr.kind == ParsedTypeKind::Arr && res.size > 0 {
                        arr.size = res.size * arr.arr_len;
                        arr.align = res.align;
                    }

                    // Nested arrays grow rightward into the element chain:
                    // a later bracket is spliced under the innermost array
                    // instead of wrapping the outside.
                    if matches!(res.kind, ParsedTypeKind::Arr | ParsedTypeKind::Slice) {
                        let mut t = &mut res;
                        while t
                            .direct
                            .as_deref()
                            .is_some_and(|d| matches!(d.kind, ParsedTypeKind::Arr | ParsedTypeKind::Slice))
                        {
                            t = t.direct.as_deref_mut().unwrap();
                        }
                        arr.direct = t.direct.take();
                        // splice invalidates the computed sizes up the chain
                        if let Some(elem) = &arr.direct {
                            if arr.kind == ParsedTypeKind::Arr {
                                if elem.size > 0 {
                                    arr.size = elem.size * arr.arr_len;
                                    arr.align = elem.align;
                                } else {
                                    arr.size = -1;
                                    arr.align = -1;
                                }
                            }
                        }
                        t.direct = Some(Box::new(arr));
                        refresh_array_sizes(&mut res);
                    } else {
                        arr.direct = Some(Box::new(res));
                        res = arr;
                    }
                }

                TokenKind::LParen => {
                    let mut f = ParsedType::new(ParsedTypeKind::Func, tok.loc, "()", "", "");
                    f.size = self.arch;
                    f.align = self.arch;
                    if cur.seek().kind != TokenKind::RParen {
                        while cur.can_pop(1) {
                            let p = self.parse_type(m, cur, scope)?;
                            f.indirect.push(p);
                            if cur.seek().kind == TokenKind::Comma {
                                cur.pop();
                            } else {
                                break;
                            }
                        }
                    }
                    if cur.pop().kind != TokenKind::RParen {
                        return Err(format!(
                            "E0209 expected ')' at {}",
                            self.reporter().loc(tok.loc)
                        ));
                    }
                    f.direct = Some(Box::new(res));
                    res = f;
                }

                _ => {
                    cur.rewind(1);
                    return Ok(res);
                }
            }
        }
        Ok(res)
    }

    /// Canonical size/align of a primitive keyword on this arch.
    pub(crate) fn primitive_layout(&self, kind: TokenKind) -> (i64, i64) {
        use TokenKind::*;
        match kind {
            KwInt | KwUint => (self.arch, self.arch),
            KwI8 | KwU8 | KwBool => (1, 1),
            KwI16 | KwU16 => (2, 2),
            KwI32 | KwU32 | KwF32 => (4, 4),
            KwI64 | KwU64 | KwF64 => (8, 8),
            KwVoid => (0, 1),
            _ => (-1, -1),
        }
    }

    /// Whether the upcoming tokens start a type expression.
    ///
    /// Name lookups consult the local scope chain, so locally-introduced
    /// typedefs shadow module-level declarations. `name.member` shapes where
    /// the reference is followed by another `.` are value accesses, not
    /// types.
    pub(crate) fn is_type_start(&self, m: usize, cur: &Cursor, scope: ScopeId) -> bool {
        let module = &self.modules[m];
        let first = cur.seek();
        if first.kind.is_primitive() || first.kind == TokenKind::KwAuto {
            return true;
        }

        if cur.match_seq(&[TokenKind::Ident, TokenKind::Dot, TokenKind::Ident]) {
            // foreign: inc.Name where Name is an exported type
            let next = cur.peek(3);
            let Some(id) = module.find_decl(&first.text, false) else {
                return false;
            };
            let Decl::Include { tgt_path, .. } = module.decl(id) else {
                return false;
            };
            let Some(pos) = self.find_module_by_path(tgt_path) else {
                return false;
            };
            let Some(tgt_id) = self.modules[pos].find_decl(&cur.peek(2).text, true) else {
                return false;
            };
            let is_type = matches!(
                self.modules[pos].decl(tgt_id),
                Decl::Struct(_) | Decl::Enum(_) | Decl::Typedef { .. }
            );
            return is_type && next.kind != TokenKind::Dot;
        }

        if cur.match_seq(&[TokenKind::Ident]) {
            let next = cur.peek(1);
            let Some(id) = module.find_decl_from(scope, &first.text) else {
                return false;
            };
            let is_type = matches!(
                module.decl(id),
                Decl::Struct(_) | Decl::Enum(_) | Decl::Typedef { .. } | Decl::Template { .. }
            );
            return is_type && next.kind != TokenKind::Dot;
        }
        false
    }
}

/// Recompute array sizes along the element chain after a splice.
fn refresh_array_sizes(ty: &mut ParsedType) {
    if let Some(elem) = ty.direct.as_deref_mut() {
        refresh_array_sizes(elem);
    }
    if ty.kind == ParsedTypeKind::Arr {
        match ty.direct.as_deref() {
            Some(elem) if elem.size > 0 => {
                ty.size = elem.size * ty.arr_len;
                ty.align = elem.align;
            }
            _ => {
                ty.size = -1;
                ty.align = -1;
            }
        }
    }
}
