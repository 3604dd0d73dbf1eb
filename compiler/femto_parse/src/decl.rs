//! Declaration parsers: variables, functions, structs, enums, typedefs,
//! templates, includes, raw blocks.

use crate::{Cursor, Parser};
use femto_ir::ast::{
    Decl, DeclId, EnumDecl, FuncDecl, ParsedType, ParsedTypeKind, ScopeId, Stat, StructDecl,
    VarDecl,
};
use femto_ir::{Literal, TokenKind};
use tracing::trace;

impl Parser<'_> {
    /// Parse one top-level declaration (with its modifier tags).
    pub(crate) fn parse_toplevel(
        &mut self,
        m: usize,
        cur: &mut Cursor,
        scope: ScopeId,
    ) -> Vec<DeclId> {
        let mut is_define = false;
        let mut is_const = false;
        let mut is_volatile = false;
        let mut is_extern = false;
        let mut is_exported = false;
        let mut is_va_arg = false;
        while cur.can_pop(1) {
            let tok = cur.seek().clone();
            match tok.kind {
                TokenKind::KwInclude => {
                    cur.pop();
                    return self.parse_include(m, cur, scope).into_iter().collect();
                }
                TokenKind::KwTemplate => {
                    cur.pop();
                    return self.parse_template(m, cur, scope);
                }
                TokenKind::Semi => {
                    cur.pop();
                    return Vec::new();
                }
                TokenKind::KwStruct => {
                    cur.pop();
                    return vec![self.parse_decl_struct(m, cur, scope, is_exported)];
                }
                TokenKind::KwEnum => {
                    cur.pop();
                    return vec![self.parse_decl_enum(m, cur, scope, is_exported)];
                }

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
                TokenKind::KwExport => {
                    cur.pop();
                    is_exported = true;
                }
                TokenKind::KwVaArg => {
                    cur.pop();
                    is_va_arg = true;
                }

                TokenKind::KwRawC | TokenKind::KwRawIr => {
                    let kw = cur.pop();
                    let code = cur.pop();
                    if code.kind != TokenKind::LitStr {
                        self.reporter().fatal(&format!(
                            "E0401 expected string, got {} at {}",
                            Self::tok_text(&code),
                            self.reporter().loc(code.loc)
                        ));
                    }
                    let decl = if kw.kind == TokenKind::KwRawC {
                        Decl::RawC {
                            loc: kw.loc,
                            code: code.text,
                        }
                    } else {
                        Decl::RawIr {
                            loc: kw.loc,
                            code: code.text,
                        }
                    };
                    return vec![self.modules[m].alloc_decl(decl)];
                }

                TokenKind::KwTypedef => {
                    cur.pop();
                    let name = cur.pop();
                    if name.kind != TokenKind::Ident {
                        self.reporter().fatal(&format!(
                            "E0402 expected name, got {} at {}",
                            Self::tok_text(&name),
                            self.reporter().loc(name.loc)
                        ));
                    }
                    if !self.modules[m].is_name_usable(&name.text) {
                        self.reporter().fatal(&format!(
                            "E0403 name {} is not usable at {}",
                            name.text,
                            self.reporter().loc(name.loc)
                        ));
                    }
                    let ty = match self.parse_type(m, cur, scope) {
                        Ok(t) => t,
                        Err(msg) => {
                            self.reporter().fatal(&msg);
                            return Vec::new();
                        }
                    };
                    let id = self.modules[m].alloc_decl(Decl::Typedef {
                        loc: name.loc,
                        name: name.text.clone(),
                        ty,
                        exported: is_exported,
                    });
                    self.modules[m].scope_mut(scope).names.insert(name.text, id);
                    return vec![id];
                }

                _ => {
                    // variable or function declaration
                    let ty = match self.parse_type(m, cur, scope) {
                        Ok(t) => Some(t),
                        Err(msg) => {
                            self.reporter().fatal(&msg);
                            None
                        }
                    };
                    if cur.match_seq(&[TokenKind::Ident, TokenKind::Semi])
                        || cur.match_seq(&[TokenKind::Ident, TokenKind::Assign])
                    {
                        let name = cur.seek().text.clone();
                        if !self.modules[m].is_name_usable(&name) {
                            self.reporter().fatal(&format!(
                                "E0404 name {} is not usable at {}",
                                name,
                                self.reporter().loc(tok.loc)
                            ));
                        }
                        let id = self.parse_decl_var(
                            m, cur, scope, ty, is_define, is_const, is_volatile, is_extern,
                            is_exported,
                        );
                        if let Decl::Var(v) = self.modules[m].decl(id) {
                            if v.init.as_ref().is_some_and(|e| e.as_literal().is_none()) {
                                self.reporter().fatal(&format!(
                                    "E0405 global variable initializer must be constexpr at {}",
                                    self.reporter().loc(tok.loc)
                                ));
                            }
                        }
                        return vec![id];
                    }
                    return vec![self.parse_decl_func(m, cur, scope, ty, is_va_arg, is_exported)];
                }
            }
        }
        Vec::new()
    }

    /// Variable declaration tail: `NAME (= init)? ;`. The type has already
    /// been parsed.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn parse_decl_var(
        &mut self,
        m: usize,
        cur: &mut Cursor,
        scope: ScopeId,
        ty: Option<ParsedType>,
        is_define: bool,
        is_const: bool,
        is_volatile: bool,
        is_extern: bool,
        exported: bool,
    ) -> DeclId {
        trace!("parsing var decl at {}", self.reporter().loc(cur.seek().loc));
        if ty.as_ref().is_some_and(|t| t.size == 0) {
            self.reporter().fatal(&format!(
                "E0501 variable type cannot be void at {}",
                self.reporter().loc(cur.seek().loc)
            ));
        }
        let name = cur.pop();
        if name.kind != TokenKind::Ident {
            self.reporter().fatal(&format!(
                "E0502 expected name, got {} at {}",
                Self::tok_text(&name),
                self.reporter().loc(name.loc)
            ));
        }
        if self.modules[m].scope(scope).names.contains_key(&name.text) {
            self.reporter().fatal(&format!(
                "E0503 name {} is already defined in this scope at {}",
                name.text,
                self.reporter().loc(name.loc)
            ));
        }

        let mut init = None;
        let mut end = cur.pop();
        if end.kind == TokenKind::Assign {
            init = self.parse_expr(m, cur, scope);
            end = cur.pop();
        }
        if end.kind != TokenKind::Semi {
            self.reporter().fatal(&format!(
                "E0504 expected ';', got {} at {}",
                Self::tok_text(&end),
                self.reporter().loc(end.loc)
            ));
            cur.rewind(1);
        }

        if is_define && init.as_ref().map_or(true, |e| e.as_literal().is_none()) {
            self.reporter().fatal(&format!(
                "E0505 define variable must be initialized with a constexpr at {}",
                self.reporter().loc(name.loc)
            ));
        }
        if is_const && init.is_none() {
            self.reporter().fatal(&format!(
                "E0506 const variable must be initialized at {}",
                self.reporter().loc(name.loc)
            ));
        }
        if is_extern && init.is_some() {
            self.reporter().fatal(&format!(
                "E0507 extern variable cannot be initialized at {}",
                self.reporter().loc(name.loc)
            ));
        }

        let id = self.modules[m].alloc_decl(Decl::Var(VarDecl {
            loc: name.loc,
            name: name.text.clone(),
            ty,
            init,
            exported,
            is_define,
            is_const,
            is_volatile,
            is_extern,
            is_param: false,
        }));
        self.modules[m].scope_mut(scope).names.insert(name.text, id);
        id
    }

    /// Function declaration tail: name, parameter list, body. The return
    /// type has already been parsed.
    pub(crate) fn parse_decl_func(
        &mut self,
        m: usize,
        cur: &mut Cursor,
        scope: ScopeId,
        ret_ty: Option<ParsedType>,
        is_va_arg: bool,
        exported: bool,
    ) -> DeclId {
        trace!("parsing func decl at {}", self.reporter().loc(cur.seek().loc));
        let first = cur.seek().clone();

        // name: ID for a free function, ID.ID for a method
        let (full_name, struct_name, func_name) =
            if cur.match_seq(&[TokenKind::Ident, TokenKind::Dot, TokenKind::Ident]) {
                let s = cur.pop().text;
                cur.pop();
                let f = cur.pop().text;
                (format!("{s}.{f}"), s, f)
            } else if cur.seek().kind == TokenKind::Ident {
                let n = cur.pop().text;
                (n.clone(), String::new(), n)
            } else {
                self.reporter().fatal(&format!(
                    "E0508 expected name, got {} at {}",
                    Self::tok_text(&first),
                    self.reporter().loc(first.loc)
                ));
                (String::new(), String::new(), String::new())
            };
        if !self.modules[m].is_name_usable(&full_name) {
            self.reporter().fatal(&format!(
                "E0509 name {} is not usable at {}",
                full_name,
                self.reporter().loc(first.loc)
            ));
        }

        // parameters register into the body scope ahead of the brace scope
        let body = self.modules[m].alloc_scope(first.loc, Some(scope));
        let mut func_ty = ParsedType::new(ParsedTypeKind::Func, first.loc, "()", "", "");
        func_ty.size = self.arch;
        func_ty.align = self.arch;
        func_ty.direct = ret_ty.map(Box::new);
        let mut params: Vec<String> = Vec::new();

        self.expect_tok(cur, TokenKind::LParen, "E0510");
        if cur.seek().kind != TokenKind::RParen {
            while cur.can_pop(1) {
                let pty = match self.parse_type(m, cur, body) {
                    Ok(t) => Some(t),
                    Err(msg) => {
                        self.reporter().fatal(&msg);
                        None
                    }
                };
                let pname = cur.pop();
                if pname.kind != TokenKind::Ident {
                    self.reporter().fatal(&format!(
                        "E0511 expected parameter name, got {} at {}",
                        Self::tok_text(&pname),
                        self.reporter().loc(pname.loc)
                    ));
                }
                if params.contains(&pname.text) {
                    self.reporter().fatal(&format!(
                        "E0512 parameter name {} is already used at {}",
                        pname.text,
                        self.reporter().loc(pname.loc)
                    ));
                }
                params.push(pname.text.clone());
                if let Some(t) = &pty {
                    func_ty.indirect.push(t.clone());
                }

                let pid = self.modules[m].alloc_decl(Decl::Var(VarDecl {
                    loc: pname.loc,
                    name: pname.text.clone(),
                    ty: pty,
                    init: None,
                    exported: false,
                    is_define: false,
                    is_const: false,
                    is_volatile: false,
                    is_extern: false,
                    is_param: true,
                }));
                let s = self.modules[m].scope_mut(body);
                s.names.insert(pname.text, pid);
                s.body.push(Stat::Decl {
                    loc: pname.loc,
                    decl: pid,
                });

                if cur.seek().kind == TokenKind::Comma {
                    cur.pop();
                } else {
                    break;
                }
            }
        }
        self.expect_tok(cur, TokenKind::RParen, "E0513");

        // body braces parse into a child of the parameter scope
        let brace = self.parse_stat_scope(m, cur, body);
        self.modules[m].scope_mut(body).body.push(brace);

        // methods: owner struct must exist and the receiver must be Owner*
        if !struct_name.is_empty() {
            let owner = self.modules[m].find_decl(&struct_name, false);
            let owner_ok =
                owner.is_some_and(|id| matches!(self.modules[m].decl(id), Decl::Struct(_)));
            if !owner_ok {
                self.reporter().fatal(&format!(
                    "E0514 method struct {} does not exist at {}",
                    struct_name,
                    self.reporter().loc(first.loc)
                ));
            }
            let recv_ok = func_ty.indirect.first().is_some_and(|t| {
                t.check_chain(&[ParsedTypeKind::Ptr, ParsedTypeKind::Name])
                    && t.direct.as_deref().is_some_and(|d| d.name == struct_name)
            });
            if !recv_ok {
                self.reporter().fatal(&format!(
                    "E0515 first parameter of a method must be {}* at {}",
                    struct_name,
                    self.reporter().loc(first.loc)
                ));
            }
        }

        // variadic trailer: void*[], or the extended void*[] int[] pair
        let mut va = false;
        let mut va_ad = false;
        if is_va_arg {
            let is_void_ptr_slice = |t: &ParsedType| {
                t.check_chain(&[
                    ParsedTypeKind::Slice,
                    ParsedTypeKind::Ptr,
                    ParsedTypeKind::Primitive,
                ]) && t
                    .direct
                    .as_deref()
                    .and_then(|p| p.direct.as_deref())
                    .is_some_and(|v| v.name == "void")
            };
            let is_int_slice = |t: &ParsedType| {
                t.check_chain(&[ParsedTypeKind::Slice, ParsedTypeKind::Primitive])
                    && t.direct.as_deref().is_some_and(|v| v.name == "int")
            };
            let n = func_ty.indirect.len();
            va = n >= 1 && is_void_ptr_slice(&func_ty.indirect[n - 1]);
            va_ad = n >= 2
                && is_void_ptr_slice(&func_ty.indirect[n - 2])
                && is_int_slice(&func_ty.indirect[n - 1]);
            if !va && !va_ad {
                self.reporter().fatal(&format!(
                    "E0516 last parameter of a va_arg function must be void*[] at {}",
                    self.reporter().loc(first.loc)
                ));
            }
        }

        let id = self.modules[m].alloc_decl(Decl::Func(FuncDecl {
            loc: first.loc,
            name: full_name.clone(),
            struct_name,
            func_name,
            ty: func_ty,
            params,
            body,
            exported,
            is_va_arg: va || va_ad,
            is_va_arg_ad: va_ad,
        }));
        if !full_name.is_empty() {
            self.modules[m].scope_mut(scope).names.insert(full_name, id);
        }
        id
    }

    /// `struct NAME { type name ;|, ... }`.
    pub(crate) fn parse_decl_struct(
        &mut self,
        m: usize,
        cur: &mut Cursor,
        scope: ScopeId,
        exported: bool,
    ) -> DeclId {
        trace!(
            "parsing struct decl at {}",
            self.reporter().loc(cur.seek().loc)
        );
        let name = cur.pop();
        if name.kind != TokenKind::Ident {
            self.reporter().fatal(&format!(
                "E0517 expected name, got {} at {}",
                Self::tok_text(&name),
                self.reporter().loc(name.loc)
            ));
        }
        if !self.modules[m].is_name_usable(&name.text) {
            self.reporter().fatal(&format!(
                "E0518 name {} is not usable at {}",
                name.text,
                self.reporter().loc(name.loc)
            ));
        }
        self.expect_tok(cur, TokenKind::LBrace, "E0519");

        let mut mem_types = Vec::new();
        let mut mem_names: Vec<String> = Vec::new();
        while cur.can_pop(1) {
            if cur.seek().kind == TokenKind::RBrace {
                break;
            }
            match self.parse_type(m, cur, scope) {
                Ok(t) => mem_types.push(t),
                Err(msg) => {
                    self.reporter().fatal(&msg);
                    break;
                }
            }
            let mname = cur.pop();
            if mname.kind != TokenKind::Ident {
                self.reporter().fatal(&format!(
                    "E0520 expected member name, got {} at {}",
                    Self::tok_text(&mname),
                    self.reporter().loc(mname.loc)
                ));
            }
            if mem_names.contains(&mname.text) {
                self.reporter().fatal(&format!(
                    "E0521 duplicate member {} at {}",
                    mname.text,
                    self.reporter().loc(mname.loc)
                ));
            }
            mem_names.push(mname.text);

            let sep = cur.seek().clone();
            if sep.kind == TokenKind::RBrace {
                break;
            } else if sep.kind == TokenKind::Semi || sep.kind == TokenKind::Comma {
                cur.pop();
                if cur.seek().kind == TokenKind::RBrace {
                    break;
                }
            } else {
                self.reporter().fatal(&format!(
                    "E0522 expected ';', got {} at {}",
                    Self::tok_text(&sep),
                    self.reporter().loc(sep.loc)
                ));
            }
        }
        self.expect_tok(cur, TokenKind::RBrace, "E0523");

        let uname = self.modules[m].uname.clone();
        let ty = ParsedType::new(ParsedTypeKind::Name, name.loc, &name.text, "", uname);
        let offsets = vec![-1; mem_types.len()];
        let id = self.modules[m].alloc_decl(Decl::Struct(StructDecl {
            loc: name.loc,
            name: name.text.clone(),
            ty,
            mem_types,
            mem_names,
            mem_offsets: offsets,
            exported,
        }));
        self.modules[m].scope_mut(scope).names.insert(name.text, id);
        id
    }

    /// `enum NAME { name (= int-constexpr)? ,|; ... }`.
    ///
    /// The backing type is the smallest signed integer width in {1,2,4,8}
    /// containing `[min, max]` of the member values.
    pub(crate) fn parse_decl_enum(
        &mut self,
        m: usize,
        cur: &mut Cursor,
        scope: ScopeId,
        exported: bool,
    ) -> DeclId {
        trace!(
            "parsing enum decl at {}",
            self.reporter().loc(cur.seek().loc)
        );
        let name = cur.pop();
        if name.kind != TokenKind::Ident {
            self.reporter().fatal(&format!(
                "E0524 expected name, got {} at {}",
                Self::tok_text(&name),
                self.reporter().loc(name.loc)
            ));
        }
        if !self.modules[m].is_name_usable(&name.text) {
            self.reporter().fatal(&format!(
                "E0525 name {} is not usable at {}",
                name.text,
                self.reporter().loc(name.loc)
            ));
        }
        self.expect_tok(cur, TokenKind::LBrace, "E0526");

        let mut mem_names: Vec<String> = Vec::new();
        let mut mem_values: Vec<i64> = Vec::new();
        let mut value: i64 = 0;
        let mut max_v: i64 = 0;
        let mut min_v: i64 = 0;
        while cur.can_pop(1) {
            if cur.seek().kind == TokenKind::RBrace {
                break;
            }
            let mname = cur.pop();
            if mname.kind != TokenKind::Ident {
                self.reporter().fatal(&format!(
                    "E0527 expected member name, got {} at {}",
                    Self::tok_text(&mname),
                    self.reporter().loc(mname.loc)
                ));
            }
            if mem_names.contains(&mname.text) {
                self.reporter().fatal(&format!(
                    "E0528 name {} is already used at {}",
                    mname.text,
                    self.reporter().loc(mname.loc)
                ));
            }

            if cur.seek().kind == TokenKind::Assign {
                cur.pop();
                let v = self.parse_expr(m, cur, scope);
                match v.as_ref().and_then(|e| e.as_literal()) {
                    Some(Literal::Int(i)) => value = *i,
                    _ => {
                        self.reporter().fatal(&format!(
                            "E0529 expected integer constexpr at {}",
                            self.reporter().loc(mname.loc)
                        ));
                    }
                }
            }
            mem_names.push(mname.text);
            mem_values.push(value);
            max_v = max_v.max(value);
            min_v = min_v.min(value);
            value = value.wrapping_add(1);

            let sep = cur.seek().clone();
            if sep.kind == TokenKind::RBrace {
                break;
            } else if sep.kind == TokenKind::Semi || sep.kind == TokenKind::Comma {
                cur.pop();
                if cur.seek().kind == TokenKind::RBrace {
                    break;
                }
            } else {
                self.reporter().fatal(&format!(
                    "E0530 expected ',', got {} at {}",
                    Self::tok_text(&sep),
                    self.reporter().loc(sep.loc)
                ));
            }
        }
        self.expect_tok(cur, TokenKind::RBrace, "E0531");

        let uname = self.modules[m].uname.clone();
        let mut ty = ParsedType::new(ParsedTypeKind::Name, name.loc, &name.text, "", uname);
        ty.size = if (-128..=127).contains(&min_v) && (-128..=127).contains(&max_v) {
            1
        } else if (-32768..=32767).contains(&min_v) && (-32768..=32767).contains(&max_v) {
            2
        } else if (-2147483648..=2147483647).contains(&min_v)
            && (-2147483648..=2147483647).contains(&max_v)
        {
            4
        } else {
            8
        };
        ty.align = ty.size;
        let id = self.modules[m].alloc_decl(Decl::Enum(EnumDecl {
            loc: name.loc,
            name: name.text.clone(),
            ty,
            mem_names,
            mem_values,
            exported,
        }));
        self.modules[m].scope_mut(scope).names.insert(name.text, id);
        id
    }

    /// `include <T,...>? "path" alias` - resolves the path relative to the
    /// including file and parses the target module unless a finished
    /// non-template instance already exists.
    ///
    /// Plain includes start a fresh chunk; template instantiations share the
    /// including module's chunk.
    pub(crate) fn parse_include(
        &mut self,
        m: usize,
        cur: &mut Cursor,
        scope: ScopeId,
    ) -> Option<DeclId> {
        trace!("parsing include at {}", self.reporter().loc(cur.seek().loc));
        let mut tok = cur.pop();
        let mut args: Vec<ParsedType> = Vec::new();
        if tok.kind == TokenKind::Lt {
            while cur.can_pop(1) {
                match self.parse_type(m, cur, scope) {
                    Ok(t) => args.push(t),
                    Err(msg) => self.reporter().fatal(&msg),
                }
                let sep = cur.pop();
                if sep.kind == TokenKind::Gt {
                    break;
                } else if sep.kind != TokenKind::Comma {
                    self.reporter().fatal(&format!(
                        "E0701 expected '>', got {} at {}",
                        Self::tok_text(&sep),
                        self.reporter().loc(sep.loc)
                    ));
                    cur.rewind(1);
                    break;
                }
            }
            tok = cur.pop();
        }

        if tok.kind != TokenKind::LitStr {
            self.reporter().fatal(&format!(
                "E0702 expected module path, got {} at {}",
                Self::tok_text(&tok),
                self.reporter().loc(tok.loc)
            ));
        }
        let alias = cur.pop();
        if alias.kind != TokenKind::Ident {
            self.reporter().fatal(&format!(
                "E0703 expected module name, got {} at {}",
                Self::tok_text(&alias),
                self.reporter().loc(alias.loc)
            ));
        }
        if !self.modules[m].is_name_usable(&alias.text) {
            self.reporter().fatal(&format!(
                "E0704 module name {} is not usable at {}",
                alias.text,
                self.reporter().loc(alias.loc)
            ));
        }
        let path = crate::resolve_path(&self.modules[m].path, &tok.text);

        let tgt_uname;
        if let Some(pos) = self.find_module_by_path(&path) {
            if !self.modules[pos].is_finished {
                self.reporter().fatal(&format!(
                    "E0705 import cycle with source {} at {}",
                    path,
                    self.reporter().loc(tok.loc)
                ));
                return None;
            }
            if args.is_empty() {
                // non-template includes reuse the parsed module
                tgt_uname = self.modules[pos].uname.clone();
            } else {
                let chunk = self.modules[m].chunk_id;
                let idx = self.parse_src(&path, args.clone(), chunk)?;
                tgt_uname = self.modules[idx].uname.clone();
            }
        } else {
            let chunk = if args.is_empty() {
                self.chunk_count += 1;
                self.chunk_count
            } else {
                self.modules[m].chunk_id
            };
            match self.parse_src(&path, args.clone(), chunk) {
                Some(idx) => tgt_uname = self.modules[idx].uname.clone(),
                None => {
                    self.reporter().fatal(&format!(
                        "E0706 failed to parse module {} at {}",
                        path,
                        self.reporter().loc(tok.loc)
                    ));
                    return None;
                }
            }
        }

        let id = self.modules[m].alloc_decl(Decl::Include {
            loc: tok.loc,
            name: alias.text.clone(),
            tgt_path: path,
            tgt_uname,
            arg_types: args,
        });
        self.modules[m].scope_mut(scope).names.insert(alias.text, id);
        Some(id)
    }

    /// `template <A, B, ...>` - binds positional include-site arguments to
    /// module-level type names.
    pub(crate) fn parse_template(
        &mut self,
        m: usize,
        cur: &mut Cursor,
        scope: ScopeId,
    ) -> Vec<DeclId> {
        trace!(
            "parsing template at {}",
            self.reporter().loc(cur.seek().loc)
        );
        let mut res = Vec::new();
        self.expect_tok(cur, TokenKind::Lt, "E0707");
        while cur.can_pop(1) {
            let name = cur.pop();
            if name.kind != TokenKind::Ident {
                self.reporter().fatal(&format!(
                    "E0708 expected template name, got {} at {}",
                    Self::tok_text(&name),
                    self.reporter().loc(name.loc)
                ));
            }
            if !self.modules[m].is_name_usable(&name.text) {
                self.reporter().fatal(&format!(
                    "E0709 template name {} is not usable at {}",
                    name.text,
                    self.reporter().loc(name.loc)
                ));
            }

            let used = self.modules[m].template_used;
            let ty = if used < self.modules[m].template_args.len() {
                self.modules[m].template_used += 1;
                Some(self.modules[m].template_args[used].clone())
            } else {
                self.reporter().fatal(&format!(
                    "E0710 too many template parameters at {}",
                    self.reporter().loc(name.loc)
                ));
                None
            };

            let id = self.modules[m].alloc_decl(Decl::Template {
                loc: name.loc,
                name: name.text.clone(),
                ty,
            });
            self.modules[m].scope_mut(scope).names.insert(name.text, id);
            res.push(id);

            let sep = cur.pop();
            if sep.kind == TokenKind::Gt {
                break;
            } else if sep.kind != TokenKind::Comma {
                self.reporter().fatal(&format!(
                    "E0711 expected '>', got {} at {}",
                    Self::tok_text(&sep),
                    self.reporter().loc(sep.loc)
                ));
                cur.rewind(1);
                break;
            }
        }
        res
    }

    /// Fast-skip a var/func declaration in pass 1: a variable skips to its
    /// `;`, a function to the end of its balanced brace block.
    pub(crate) fn jump_decl(&mut self, m: usize, cur: &mut Cursor, scope: ScopeId) {
        let _ = self.parse_type(m, cur, scope);
        if cur.match_seq(&[TokenKind::Ident, TokenKind::Semi])
            || cur.match_seq(&[TokenKind::Ident, TokenKind::Assign])
        {
            while cur.can_pop(1) {
                if cur.pop().kind == TokenKind::Semi {
                    break;
                }
            }
        } else {
            let mut depth = 0;
            while cur.can_pop(1) {
                if cur.pop().kind == TokenKind::LBrace {
                    depth += 1;
                    break;
                }
            }
            while cur.can_pop(1) {
                match cur.pop().kind {
                    TokenKind::LBrace => depth += 1,
                    TokenKind::RBrace => {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                    }
                    _ => {}
                }
            }
        }
    }
}
