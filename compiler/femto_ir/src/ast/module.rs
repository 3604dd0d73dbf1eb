//! Per-file module: scope tree and declaration arena.

use super::{Decl, ParsedType, Stat};
use crate::{Literal, Loc};
use rustc_hash::FxHashMap;

/// Index of a scope in its module's scope arena.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct ScopeId(pub usize);

/// Index of a declaration in its module's declaration arena.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct DeclId(pub usize);

/// A lexical scope: ordered statement body plus a name map into the module's
/// declaration arena.
#[derive(Clone, Debug, Default)]
pub struct Scope {
    pub loc: Loc,
    pub parent: Option<ScopeId>,
    pub body: Vec<Stat>,
    pub names: FxHashMap<String, DeclId>,
    /// Set on the wrapper scope that owns foreach iteration variables.
    pub is_foreach: bool,
}

/// A parsed source file.
///
/// Scopes and declarations live in arenas so that a scope's name map and its
/// statement body can both address the same declaration. `scopes[0]` is the
/// module's top-level scope.
#[derive(Clone, Debug)]
pub struct Module {
    /// Absolute path of the source file.
    pub path: String,
    /// Disambiguated basename; the module's stable cross-module identifier.
    pub uname: String,
    /// Index into the compiler's source-path table.
    pub src_id: u32,
    /// Translation-unit group; template instantiations share their host's.
    pub chunk_id: u32,
    pub scopes: Vec<Scope>,
    pub decls: Vec<Decl>,
    /// False while the module is being parsed; used for import cycle checks.
    pub is_finished: bool,
    /// Template arguments given at the include site.
    pub template_args: Vec<ParsedType>,
    /// How many arguments `template<...>` declarations have consumed.
    pub template_used: usize,
}

impl Module {
    pub const TOP: ScopeId = ScopeId(0);

    pub fn new(
        path: impl Into<String>,
        uname: impl Into<String>,
        src_id: u32,
        chunk_id: u32,
        template_args: Vec<ParsedType>,
    ) -> Self {
        Module {
            path: path.into(),
            uname: uname.into(),
            src_id,
            chunk_id,
            scopes: vec![Scope::default()],
            decls: Vec::new(),
            is_finished: false,
            template_args,
            template_used: 0,
        }
    }

    pub fn alloc_scope(&mut self, loc: Loc, parent: Option<ScopeId>) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope {
            loc,
            parent,
            ..Scope::default()
        });
        id
    }

    pub fn alloc_decl(&mut self, decl: Decl) -> DeclId {
        let id = DeclId(self.decls.len());
        self.decls.push(decl);
        id
    }

    #[inline]
    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0]
    }

    #[inline]
    pub fn scope_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.0]
    }

    #[inline]
    pub fn decl(&self, id: DeclId) -> &Decl {
        &self.decls[id.0]
    }

    #[inline]
    pub fn decl_mut(&mut self, id: DeclId) -> &mut Decl {
        &mut self.decls[id.0]
    }

    /// Look a name up in the module's top-level scope.
    ///
    /// With `check_exported` the uppercase exportability rule is applied;
    /// this is the cross-module lookup used by includes.
    pub fn find_decl(&self, name: &str, check_exported: bool) -> Option<DeclId> {
        let id = *self.scopes[0].names.get(name)?;
        if check_exported && !self.decls[id.0].is_exported_name() {
            return None;
        }
        Some(id)
    }

    /// Look a name up through the scope chain starting at `scope`, ending at
    /// the module's top scope.
    pub fn find_decl_from(&self, scope: ScopeId, name: &str) -> Option<DeclId> {
        let mut cur = Some(scope);
        while let Some(id) = cur {
            let s = &self.scopes[id.0];
            if let Some(d) = s.names.get(name) {
                return Some(*d);
            }
            cur = s.parent;
        }
        None
    }

    /// Whether `name` can still be declared at module level.
    pub fn is_name_usable(&self, name: &str) -> bool {
        !self.scopes[0].names.contains_key(name)
    }

    /// Find a constant literal by name at module level.
    ///
    /// Accepts `Enum.Member` dotted names and `define`/`const` variables with
    /// folded literal initializers.
    pub fn find_literal(&self, name: &str, check_exported: bool) -> Option<Literal> {
        if let Some((enum_name, member)) = name.split_once('.') {
            let id = self.find_decl(enum_name, check_exported)?;
            if let Decl::Enum(e) = &self.decls[id.0] {
                let pos = e.mem_names.iter().position(|n| n == member)?;
                return Some(Literal::Int(e.mem_values[pos]));
            }
            return None;
        }
        let id = self.find_decl(name, check_exported)?;
        self.literal_of(id)
    }

    /// Find a constant literal through the scope chain, then at module level.
    pub fn find_literal_from(&self, scope: ScopeId, name: &str) -> Option<Literal> {
        if let Some(id) = self.find_decl_from(scope, name) {
            if let Some(lit) = self.literal_of(id) {
                return Some(lit);
            }
        }
        self.find_literal(name, false)
    }

    fn literal_of(&self, id: DeclId) -> Option<Literal> {
        if let Decl::Var(v) = &self.decls[id.0] {
            if v.is_define || v.is_const {
                if let Some(init) = &v.init {
                    return init.as_literal().cloned();
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{EnumDecl, ParsedTypeKind, VarDecl};
    use crate::Loc;

    fn test_module() -> Module {
        Module::new("/src/main.fc", "main", 0, 0, vec![])
    }

    #[test]
    fn test_scope_chain_lookup() {
        let mut m = test_module();
        let inner = m.alloc_scope(Loc::NONE, Some(Module::TOP));
        let d = m.alloc_decl(Decl::Var(VarDecl {
            loc: Loc::NONE,
            name: "x".into(),
            ty: None,
            init: None,
            exported: false,
            is_define: false,
            is_const: false,
            is_volatile: false,
            is_extern: false,
            is_param: false,
        }));
        m.scope_mut(Module::TOP).names.insert("x".into(), d);
        assert_eq!(m.find_decl_from(inner, "x"), Some(d));
        assert_eq!(m.find_decl_from(inner, "y"), None);
        assert!(!m.is_name_usable("x"));
        assert!(m.is_name_usable("y"));
    }

    #[test]
    fn test_exported_filter() {
        let mut m = test_module();
        let hidden = m.alloc_decl(Decl::Typedef {
            loc: Loc::NONE,
            name: "local".into(),
            ty: ParsedType::new(ParsedTypeKind::Primitive, Loc::NONE, "i32", "", ""),
            exported: false,
        });
        m.scope_mut(Module::TOP).names.insert("local".into(), hidden);
        assert!(m.find_decl("local", false).is_some());
        assert!(m.find_decl("local", true).is_none());
    }

    #[test]
    fn test_enum_member_literal() {
        let mut m = test_module();
        let e = m.alloc_decl(Decl::Enum(EnumDecl {
            loc: Loc::NONE,
            name: "Color".into(),
            ty: ParsedType::new(ParsedTypeKind::Name, Loc::NONE, "Color", "", "main"),
            mem_names: vec!["Red".into(), "Green".into()],
            mem_values: vec![0, 7],
            exported: false,
        }));
        m.scope_mut(Module::TOP).names.insert("Color".into(), e);
        assert_eq!(m.find_literal("Color.Green", false), Some(Literal::Int(7)));
        assert_eq!(m.find_literal("Color.Blue", false), None);
    }
}
