//! Analyzed module.

use super::Decl;
use rustc_hash::FxHashMap;

/// An analyzed module: top-level declarations in source order plus a name
/// map. Cross-module references carry `(uname, name)` pairs and are resolved
/// through the analyzer's module table into this map.
#[derive(Clone, Debug, Default)]
pub struct Module {
    /// Index into the compiler's source-path table.
    pub src_id: u32,
    pub uname: String,
    pub chunk_id: u32,
    pub decls: Vec<Decl>,
    /// Name → index into `decls`. Raw code blocks are unnamed and absent.
    pub names: FxHashMap<String, usize>,
}

impl Module {
    pub fn new(src_id: u32, uname: impl Into<String>, chunk_id: u32) -> Self {
        Module {
            src_id,
            uname: uname.into(),
            chunk_id,
            decls: Vec::new(),
            names: FxHashMap::default(),
        }
    }

    /// Append a declaration, registering its name when it has one.
    pub fn push_decl(&mut self, decl: Decl) -> usize {
        let idx = self.decls.len();
        if !decl.name.is_empty() {
            self.names.insert(decl.name.clone(), idx);
        }
        self.decls.push(decl);
        idx
    }

    /// Look up a top-level declaration by name.
    pub fn find_decl(&self, name: &str) -> Option<&Decl> {
        self.names.get(name).map(|&i| &self.decls[i])
    }

    /// Cross-module lookup filtered by the uppercase exportability rule.
    pub fn find_exported(&self, name: &str) -> Option<&Decl> {
        self.find_decl(name).filter(|d| d.exported)
    }
}
