//! Per-function analysis context.

use crate::Analyzer;
use femto_ir::ast;
use femto_ir::sem::{DeclBody, Type};
use rustc_hash::FxHashMap;

/// What a bare name refers to, in resolution order.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub(crate) enum Domain {
    Var,
    Func,
    Struct,
    Enum,
    Include,
}

/// A variable visible in the current scope stack.
#[derive(Clone, Debug)]
pub(crate) struct VarInfo {
    pub uid: i64,
    pub ty: Type,
    pub is_const: bool,
    pub is_define: bool,
    /// Declaring module's unique name; empty for locals.
    pub uname: String,
}

/// Context for analyzing one function body: the module it lives in, the
/// current function's identity and return type, the scope stack of local
/// variables, and the loop stack for break/continue targets.
pub(crate) struct Context {
    pub mi: usize,
    /// Current module's unique name, for visibility checks.
    pub uname: String,
    /// Owner struct of the current method; empty in free functions.
    pub struct_name: String,
    pub ret: Type,
    pub frames: Vec<FxHashMap<String, VarInfo>>,
    /// Uids of enclosing loop statements, innermost last.
    pub loops: Vec<i64>,
}

impl Context {
    pub fn new(mi: usize, uname: String, struct_name: String, ret: Type) -> Self {
        Context {
            mi,
            uname,
            struct_name,
            ret,
            frames: Vec::new(),
            loops: Vec::new(),
        }
    }

    /// Register a local variable in the innermost frame.
    pub fn bind(&mut self, name: &str, info: VarInfo) {
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(name.to_string(), info);
        }
    }

    /// Find a variable: scope stack innermost-first, then the module's
    /// top-level declarations.
    pub fn find_var(&self, an: &Analyzer, name: &str) -> Option<VarInfo> {
        for frame in self.frames.iter().rev() {
            if let Some(v) = frame.get(name) {
                return Some(v.clone());
            }
        }
        let decl = an.modules[self.mi].find_decl(name)?;
        match &decl.body {
            DeclBody::Var(v) => Some(VarInfo {
                uid: decl.uid,
                ty: decl.ty.clone(),
                is_const: v.is_const,
                is_define: v.is_define,
                uname: decl.src_uname.clone(),
            }),
            _ => None,
        }
    }

    /// Decide what domain a bare name belongs to. Locals shadow everything;
    /// module-level names classify by their declaration kind.
    pub fn find_domain(&self, an: &Analyzer, a1: &[ast::Module], name: &str) -> Option<Domain> {
        if self.find_var(an, name).is_some() {
            return Some(Domain::Var);
        }
        let id = a1[self.mi].find_decl(name, false)?;
        Some(match a1[self.mi].decl(id) {
            ast::Decl::Include { .. } => Domain::Include,
            ast::Decl::Struct(_) => Domain::Struct,
            ast::Decl::Enum(_) => Domain::Enum,
            ast::Decl::Var(_) => Domain::Var,
            ast::Decl::Func(_) => Domain::Func,
            _ => return None,
        })
    }
}

/// Name-based visibility classes.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub(crate) enum Visibility {
    /// Uppercase initial: visible everywhere.
    Public,
    /// Underscore prefix: same module and same struct only.
    Private,
    /// Lowercase initial: same module only.
    Protected,
}

pub(crate) fn visibility(name: &str) -> Visibility {
    match name.as_bytes().first() {
        Some(c) if c.is_ascii_uppercase() => Visibility::Public,
        Some(b'_') => Visibility::Private,
        _ => Visibility::Protected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_classes() {
        assert_eq!(visibility("Push"), Visibility::Public);
        assert_eq!(visibility("_x"), Visibility::Private);
        assert_eq!(visibility("count"), Visibility::Protected);
        assert_eq!(visibility(""), Visibility::Protected);
    }
}
