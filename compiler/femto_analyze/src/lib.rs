//! Semantic analyzer for Femto.
//!
//! Rewrites the syntactic AST ([`femto_ir::ast`]) into the analyzed AST
//! ([`femto_ir::sem`]): every expression gets a resolved type, an lvalue
//! flag and a const flag; names resolve to declaration handles across
//! scopes and modules; implicit conversions become explicit; visibility and
//! callable contracts are enforced.
//!
//! Analysis runs in two phases:
//!
//! 1. **Declarations** (sequential) - every module's top-level declarations
//!    convert into analyzed declarations with resolved types, building the
//!    per-module name maps the expression pass resolves against.
//! 2. **Function bodies** - per module, independent of other modules'
//!    bodies. With a concurrency budget (`mt_cfg > 0`) modules are analyzed
//!    on a bounded rayon pool; workers share the read-only AST1/declaration
//!    data, the concurrent type pool, the atomic uid counter and the
//!    thread-safe reporter, and produce each module's bodies as fresh data
//!    attached after the join.

mod context;
mod decl;
mod expr;
mod pool;
mod stat;
mod types;

use femto_diagnostic::Reporter;
use femto_ir::ast;
use femto_ir::sem::{self, Type};
use pool::TypePool;
use rayon::prelude::*;
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::debug;

/// Analyze the whole module vector. Returns the analyzed modules; they are
/// only meaningful when the reporter's error count stayed zero.
pub fn analyze(
    a1: &[ast::Module],
    arch: i64,
    mt_cfg: usize,
    reporter: &Reporter<'_>,
) -> Vec<sem::Module> {
    Analyzer::new(arch, mt_cfg, reporter).run(a1)
}

/// The analyzer: owns the growing analyzed-module table plus the shared
/// resources of the concurrent body pass.
pub struct Analyzer<'a> {
    arch: i64,
    mt_cfg: usize,
    reporter: &'a Reporter<'a>,
    uid: AtomicI64,
    pool: TypePool,
    pub modules: Vec<sem::Module>,
}

impl<'a> Analyzer<'a> {
    pub fn new(arch: i64, mt_cfg: usize, reporter: &'a Reporter<'a>) -> Self {
        Analyzer {
            arch,
            mt_cfg,
            reporter,
            uid: AtomicI64::new(0),
            pool: TypePool::new(arch),
            modules: Vec::new(),
        }
    }

    pub fn run(mut self, a1: &[ast::Module]) -> Vec<sem::Module> {
        // phase 1: declarations, in module order
        for module in a1 {
            let converted = self.convert_module_decls(a1, module);
            self.modules.push(converted);
            debug!("analyzed declarations of {}", module.uname);
        }
        if self.reporter.err_count() > 0 {
            return self.modules;
        }

        // phase 2: function bodies, optionally in parallel per module
        let n = self.modules.len();
        let results: Vec<Vec<(usize, sem::Scope)>> = if self.mt_cfg > 0 {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(self.mt_cfg)
                .build()
            {
                Ok(tp) => tp.install(|| {
                    (0..n)
                        .into_par_iter()
                        .map(|mi| self.analyze_module_functions(a1, mi))
                        .collect()
                }),
                Err(_) => (0..n)
                    .map(|mi| self.analyze_module_functions(a1, mi))
                    .collect(),
            }
        } else {
            (0..n)
                .map(|mi| self.analyze_module_functions(a1, mi))
                .collect()
        };
        for (mi, bodies) in results.into_iter().enumerate() {
            for (di, scope) in bodies {
                if let sem::DeclBody::Func(f) = &mut self.modules[mi].decls[di].body {
                    f.body = Some(scope);
                }
            }
            debug!("analyzed function bodies of {}", self.modules[mi].uname);
        }
        self.modules
    }

    #[inline]
    pub(crate) fn reporter(&self) -> &Reporter<'a> {
        self.reporter
    }

    #[inline]
    pub(crate) fn pool(&self) -> &TypePool {
        &self.pool
    }

    /// Allocate a globally unique declaration/statement id.
    pub(crate) fn next_uid(&self) -> i64 {
        self.uid.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Find an analyzed module by unique name.
    pub(crate) fn find_module(&self, uname: &str) -> Option<usize> {
        self.modules.iter().position(|m| m.uname == uname)
    }

    /// The canonical `int` of this arch.
    pub(crate) fn ty_int(&self) -> Type {
        self.pool
            .get("int")
            .unwrap_or_else(|| Type::primitive("int", self.arch, self.arch))
    }

    pub(crate) fn ty_bool(&self) -> Type {
        self.pool
            .get("bool")
            .unwrap_or_else(|| Type::primitive("bool", 1, 1))
    }

    pub(crate) fn ty_void(&self) -> Type {
        self.pool
            .get("void")
            .unwrap_or_else(|| Type::primitive("void", 0, 1))
    }

    /// Pointer to `target`, cached in the type pool.
    pub(crate) fn ty_ptr_to(&self, target: Type) -> Type {
        let arch = self.arch;
        self.pool.intern(move || Type::ptr_to(target, arch))
    }

    /// Slice of `elem`, cached in the type pool.
    pub(crate) fn ty_slice_of(&self, elem: Type) -> Type {
        let arch = self.arch;
        self.pool.intern(move || Type::slice_of(elem, arch))
    }
}
