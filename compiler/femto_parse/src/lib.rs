//! Parser for Femto.
//!
//! Turns token streams into per-module syntactic ASTs ([`femto_ir::ast`]).
//! Each source file is parsed in three passes:
//!
//! 1. **Structural skeleton** - includes, templates, structs, enums,
//!    typedefs and raw blocks are parsed fully; variable and function
//!    declarations are fast-skipped with their token positions recorded.
//!    Includes recurse into [`Parser::parse_src`] depth-first, so the module
//!    table is complete before sizing starts.
//! 2. **Struct sizing** - a fixed point over all struct declarations of the
//!    module resolves forward-referenced member types through the module
//!    table and computes member offsets, sizes and alignments.
//! 3. **Bodies** - the recorded positions are revisited and variables and
//!    functions are parsed fully, now that every type has a size.
//!
//! Error recovery is rewind-based: an unexpected token is reported and the
//! cursor steps back one token, so one mistake produces one diagnostic and
//! parsing continues on a best-effort basis. All parse diagnostics set the
//! fatal bit; the pipeline stops after the parse stage.

mod cursor;
mod decl;
mod driver;
mod expr;
mod fold;
mod stat;
mod ty;

#[cfg(test)]
mod tests;

pub use cursor::Cursor;
pub use driver::resolve_path;

use femto_diagnostic::Reporter;
use femto_ir::ast;

/// Source access used by include resolution.
///
/// The parser never touches the filesystem directly; `femto_compiler`
/// provides a std implementation and an in-memory one for tests.
pub trait SourceReader: Sync {
    /// Read the full text of an absolute path.
    fn read(&self, path: &str) -> Result<String, String>;
}

/// The parser driver. Owns the growing module table; modules are appended
/// in include-first depth-first order starting from the entry file.
pub struct Parser<'a> {
    pub arch: i64,
    pub name_cut: usize,
    pub chunk_count: u32,
    pub modules: Vec<ast::Module>,
    reader: &'a dyn SourceReader,
    reporter: &'a Reporter<'a>,
}

impl<'a> Parser<'a> {
    pub fn new(
        arch: i64,
        name_cut: usize,
        reader: &'a dyn SourceReader,
        reporter: &'a Reporter<'a>,
    ) -> Self {
        Parser {
            arch,
            name_cut: name_cut.max(1),
            chunk_count: 0,
            modules: Vec::new(),
            reader,
            reporter,
        }
    }

    #[inline]
    pub(crate) fn reporter(&self) -> &Reporter<'a> {
        self.reporter
    }

    #[inline]
    pub(crate) fn reader(&self) -> &dyn SourceReader {
        self.reader
    }

    /// Find a module by unique name.
    pub fn find_module(&self, uname: &str) -> Option<usize> {
        self.modules.iter().position(|m| m.uname == uname)
    }

    /// Find a module by absolute path.
    pub fn find_module_by_path(&self, path: &str) -> Option<usize> {
        self.modules.iter().position(|m| m.path == path)
    }
}
