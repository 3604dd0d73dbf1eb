//! Per-module parse driver: three passes plus the struct sizing fixed point.

use crate::{Cursor, Parser};
use femto_ir::ast::{Decl, DeclId, Module, ParsedType, ParsedTypeKind, Stat};
use femto_ir::TokenKind;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Resolve an include path against the including file, lexically
/// normalizing `.` and `..` components. Absolute paths pass through.
pub fn resolve_path(base_file: &str, rel: &str) -> String {
    let p = Path::new(rel);
    let joined = if p.is_absolute() {
        p.to_path_buf()
    } else {
        Path::new(base_file)
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(p)
    };
    let mut out = PathBuf::new();
    for c in joined.components() {
        match c {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out.to_string_lossy().into_owned()
}

impl Parser<'_> {
    /// Parse a source file into a new module, recursing into its includes.
    ///
    /// Returns the module's index, or `None` on a fatal failure (cycle,
    /// unreadable file, template argument mismatch). The module is
    /// registered unfinished before lexing so the cycle guard can observe
    /// in-progress parses.
    pub fn parse_src(
        &mut self,
        path: &str,
        template_args: Vec<ParsedType>,
        chunk_id: u32,
    ) -> Option<usize> {
        if let Some(pos) = self.find_module_by_path(path) {
            if !self.modules[pos].is_finished {
                self.reporter()
                    .fatal(&format!("E0705 import cycle with source {path}"));
                return None;
            }
        }

        // unique module name: truncated basename, disambiguated with _k
        let base = Path::new(path)
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string());
        let stem: String = base.chars().take(self.name_cut).collect();
        let mut uname = stem.clone();
        let mut count = 0;
        while self.find_module(&uname).is_some() {
            count += 1;
            uname = format!("{stem}_{count}");
        }
        debug!("parsing {path} as {uname}");

        // read and register the source
        let src_id = self.reporter().sources().add(path);
        let source = match self.reader().read(path) {
            Ok(s) => s,
            Err(e) => {
                self.reporter()
                    .fatal(&format!("E0001 file open fail: {path}, {e}"));
                return None;
            }
        };

        // register the unfinished module before include recursion can start
        let idx = self.modules.len();
        self.modules
            .push(Module::new(path, &uname, src_id, chunk_id, template_args));

        let tokens = match femto_lexer::lex(&source, path, src_id) {
            Ok(t) => t,
            Err(e) => {
                self.reporter().fatal(&e.to_string());
                self.modules[idx].is_finished = true;
                return Some(idx);
            }
        };
        let mut cur = Cursor::new(tokens, src_id);
        debug!("tokenized {} as {} tokens", uname, cur.len());

        // pass 1: structural skeleton; var/func positions deferred to pass 3
        let mut deferred: Vec<usize> = Vec::new();
        while cur.can_pop(1) {
            match cur.seek().kind {
                TokenKind::KwInclude
                | TokenKind::KwTemplate
                | TokenKind::KwStruct
                | TokenKind::KwEnum
                | TokenKind::KwTypedef
                | TokenKind::KwRawC
                | TokenKind::KwRawIr => {
                    for d in self.parse_toplevel(idx, &mut cur, Module::TOP) {
                        self.push_top_decl(idx, d);
                    }
                }
                TokenKind::Semi => {
                    cur.pop();
                }
                TokenKind::KwExport
                    if matches!(
                        cur.peek(1).kind,
                        TokenKind::KwStruct | TokenKind::KwEnum | TokenKind::KwTypedef
                    ) =>
                {
                    // exported type declarations parse in pass 1 as well
                    for d in self.parse_toplevel(idx, &mut cur, Module::TOP) {
                        self.push_top_decl(idx, d);
                    }
                }
                _ => {
                    // var/func (possibly behind modifier tags): skip now
                    deferred.push(cur.pos());
                    while matches!(
                        cur.seek().kind,
                        TokenKind::KwExport
                            | TokenKind::KwDefine
                            | TokenKind::KwConst
                            | TokenKind::KwVolatile
                            | TokenKind::KwExtern
                            | TokenKind::KwVaArg
                    ) {
                        cur.pop();
                    }
                    self.jump_decl(idx, &mut cur, Module::TOP);
                }
            }
        }

        // template binding check
        {
            let module = &self.modules[idx];
            if module.template_used != module.template_args.len() {
                self.reporter().fatal(&format!(
                    "E0712 template arguments do not match ({} given, {} used) for {}",
                    module.template_args.len(),
                    module.template_used,
                    uname
                ));
                self.modules[idx].is_finished = true;
                return None;
            }
        }

        // pass 2: struct sizing fixed point
        let struct_ids: Vec<DeclId> = self.modules[idx]
            .scope(Module::TOP)
            .body
            .iter()
            .filter_map(|st| match st {
                Stat::Decl { decl, .. } => match self.modules[idx].decl(*decl) {
                    Decl::Struct(_) => Some(*decl),
                    _ => None,
                },
                _ => None,
            })
            .collect();
        loop {
            let mut modified = false;
            for &sid in &struct_ids {
                modified |= self.complete_struct(idx, sid);
            }
            if !modified {
                break;
            }
        }
        for &sid in &struct_ids {
            if let Decl::Struct(s) = self.modules[idx].decl(sid) {
                if s.ty.size <= 0 {
                    let msg = format!(
                        "E0713 cannot decide size of {} at {}",
                        s.name,
                        self.reporter().loc(s.loc)
                    );
                    self.reporter().fatal(&msg);
                }
            }
        }
        debug!("calculated struct sizes for {uname}");

        // pass 3: parse the deferred var/func declarations
        cur.set_pos(0);
        for pos in deferred {
            if cur.pos() <= pos {
                cur.set_pos(pos);
                for d in self.parse_toplevel(idx, &mut cur, Module::TOP) {
                    self.push_top_decl(idx, d);
                }
            }
        }

        self.modules[idx].is_finished = true;
        debug!("syntactic AST generated for {path}");
        Some(idx)
    }

    fn push_top_decl(&mut self, m: usize, decl: DeclId) {
        let loc = self.modules[m].decl(decl).loc();
        self.modules[m]
            .scope_mut(Module::TOP)
            .body
            .push(Stat::Decl { loc, decl });
    }

    /// Resolve an unresolved type through the module table, returning
    /// whether anything changed. Descends into element and parameter types
    /// first; `Name` references follow typedefs and templates transparently,
    /// `Foreign` references hop through the include's target module.
    pub(crate) fn complete_type(&self, ty: &mut ParsedType, m: usize) -> bool {
        let mut modified = false;
        if let Some(direct) = ty.direct.as_deref_mut() {
            modified |= self.complete_type(direct, m);
        }
        for p in &mut ty.indirect {
            modified |= self.complete_type(p, m);
        }
        if ty.size != -1 {
            // already resolved
            return modified;
        }

        match ty.kind {
            ParsedTypeKind::Arr => {
                if let Some(elem) = ty.direct.as_deref() {
                    if elem.size > 0 {
                        ty.size = elem.size * ty.arr_len;
                        ty.align = elem.align;
                        modified = true;
                    }
                }
            }

            ParsedTypeKind::Name => {
                let Some(pos) = self.find_module(&ty.src_uname) else {
                    self.reporter()
                        .fatal(&format!("E0801 unknown module {}", ty.src_uname));
                    return modified;
                };
                let check_exported = self.modules[pos].uname != self.modules[m].uname;
                let Some(id) = self.modules[pos].find_decl(&ty.name, check_exported) else {
                    self.reporter()
                        .fatal(&format!("E0802 unknown name {}", ty.name));
                    return modified;
                };
                match self.modules[pos].decl(id) {
                    Decl::Struct(s) => {
                        if s.ty.size > 0 {
                            ty.size = s.ty.size;
                            ty.align = s.ty.align;
                            modified = true;
                        }
                    }
                    Decl::Enum(e) => {
                        if e.ty.size > 0 {
                            ty.size = e.ty.size;
                            ty.align = e.ty.align;
                            modified = true;
                        }
                    }
                    Decl::Typedef { ty: target, .. } | Decl::Template { ty: Some(target), .. } => {
                        let mut t = target.clone();
                        modified |= self.complete_type(&mut t, pos);
                        if t.size > 0 {
                            ty.size = t.size;
                            ty.align = t.align;
                            modified = true;
                        }
                    }
                    _ => {
                        self.reporter()
                            .fatal(&format!("E0803 name {} is not a type", ty.name));
                    }
                }
            }

            ParsedTypeKind::Foreign => {
                let Some(pos) = self.find_module(&ty.src_uname) else {
                    self.reporter()
                        .fatal(&format!("E0804 unknown module {}", ty.src_uname));
                    return modified;
                };
                let inc = self.modules[pos].find_decl(&ty.inc_name, false);
                let Some(Decl::Include { tgt_uname, .. }) =
                    inc.map(|id| self.modules[pos].decl(id))
                else {
                    self.reporter()
                        .fatal(&format!("E0805 unknown include {}", ty.inc_name));
                    return modified;
                };
                let Some(tgt_pos) = self.find_module(tgt_uname) else {
                    self.reporter()
                        .fatal(&format!("E0806 unknown module {tgt_uname}"));
                    return modified;
                };
                let mut name_ty = ParsedType::new(
                    ParsedTypeKind::Name,
                    ty.loc,
                    &ty.name,
                    "",
                    tgt_uname.clone(),
                );
                modified |= self.complete_type(&mut name_ty, tgt_pos);
                if name_ty.size > 0 {
                    ty.size = name_ty.size;
                    ty.align = name_ty.align;
                    modified = true;
                }
            }

            _ => {}
        }
        modified
    }

    /// One sizing attempt for a struct: complete member types, then lay out
    /// offsets. Field offsets align up to the member's alignment; the final
    /// size rounds up to the struct alignment (max member alignment).
    pub(crate) fn complete_struct(&mut self, m: usize, decl_id: DeclId) -> bool {
        let (mut mem_types, old_size) = match self.modules[m].decl(decl_id) {
            Decl::Struct(s) => (s.mem_types.clone(), s.ty.size),
            _ => return false,
        };
        if old_size > 0 {
            return false;
        }

        let mut modified = false;
        let mut complete = true;
        for t in &mut mem_types {
            if t.size <= 0 {
                modified |= self.complete_type(t, m);
            }
            if t.size <= 0 {
                complete = false;
                break;
            }
        }

        if !complete {
            // persist partial progress for the next iteration
            if let Decl::Struct(s) = self.modules[m].decl_mut(decl_id) {
                s.mem_types = mem_types;
            }
            return modified;
        }

        let mut size: i64 = 0;
        let mut align: i64 = 0;
        let mut offsets = Vec::with_capacity(mem_types.len());
        for t in &mem_types {
            if size % t.align != 0 {
                size += t.align - size % t.align;
            }
            offsets.push(size);
            size += t.size;
            align = align.max(t.align);
        }
        if align > 0 && size % align != 0 {
            size += align - size % align;
        }

        if let Decl::Struct(s) = self.modules[m].decl_mut(decl_id) {
            s.mem_types = mem_types;
            s.mem_offsets = offsets;
            s.ty.size = size;
            s.ty.align = align;
            debug!("sized struct {} to {size} bytes", s.name);
        }
        modified || size != old_size
    }
}
