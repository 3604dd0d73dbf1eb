//! Front-end pipeline driver for Femto.
//!
//! Sits between the core crates and the CLI:
//!
//! ```text
//! femto_ir, femto_lexer, femto_parse, femto_analyze, femto_diagnostic
//!                          ↓
//!                    femto_compiler  ← this crate
//!                          ↓
//!                       femtoc
//! ```
//!
//! [`compile_front`] parses the entry source (recursing into its includes)
//! and runs semantic analysis, returning the analyzed module vector together
//! with the aggregate error count. The result's modules are only meaningful
//! when the error count is zero.
//!
//! File access goes through [`SourceReader`]; [`FsReader`] reads from the
//! filesystem and [`MapReader`] serves in-memory sources for tests and
//! embedding.

use femto_diagnostic::Reporter;
use femto_ir::sem;
pub use femto_parse::SourceReader;
use femto_parse::{resolve_path, Parser};
use rustc_hash::FxHashMap;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Failure to read a source file.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("file not found: {0}")]
    NotFound(String),
    #[error("io error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} is not valid UTF-8")]
    NotUtf8 { path: String },
}

/// Reads sources from the filesystem.
#[derive(Default)]
pub struct FsReader;

impl SourceReader for FsReader {
    fn read(&self, path: &str) -> Result<String, String> {
        let bytes = std::fs::read(path).map_err(|e| {
            ReadError::Io {
                path: path.to_string(),
                source: e,
            }
            .to_string()
        })?;
        String::from_utf8(bytes).map_err(|_| {
            ReadError::NotUtf8 {
                path: path.to_string(),
            }
            .to_string()
        })
    }
}

/// Serves sources from an in-memory map keyed by absolute path.
#[derive(Default)]
pub struct MapReader {
    files: FxHashMap<String, String>,
}

impl MapReader {
    pub fn new(files: &[(&str, &str)]) -> Self {
        MapReader {
            files: files
                .iter()
                .map(|(p, s)| (p.to_string(), s.to_string()))
                .collect(),
        }
    }

    pub fn insert(&mut self, path: impl Into<String>, source: impl Into<String>) {
        self.files.insert(path.into(), source.into());
    }
}

impl SourceReader for MapReader {
    fn read(&self, path: &str) -> Result<String, String> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| ReadError::NotFound(path.to_string()).to_string())
    }
}

/// Front-end configuration.
#[derive(Clone, Debug)]
pub struct CompileConfig {
    /// Pointer width in bytes, 4 or 8.
    pub arch: i64,
    /// Maximum basename length used for module unique names.
    pub name_cut: usize,
    /// Analyzer concurrency budget; 0 runs single-threaded.
    pub mt_cfg: usize,
}

impl Default for CompileConfig {
    fn default() -> Self {
        CompileConfig {
            arch: 8,
            name_cut: 12,
            mt_cfg: 0,
        }
    }
}

/// Result of a front-end run.
pub struct CompileOutput {
    /// Analyzed modules, entry first, includes in depth-first order.
    pub modules: Vec<sem::Module>,
    /// Aggregate diagnostic error count; nonzero means `modules` must not
    /// be consumed by later stages.
    pub err_count: u32,
}

/// Compile the front half: entry source → analyzed AST collection.
///
/// Fatal errors (lexer failure, import cycles, unresolvable structs) abort
/// between passes; non-fatal errors accumulate so one run reports as much
/// as possible.
pub fn compile_front(
    entry_path: &str,
    config: &CompileConfig,
    reader: &dyn SourceReader,
    reporter: &Reporter<'_>,
) -> CompileOutput {
    let arch = match config.arch {
        4 | 8 => config.arch,
        other => {
            reporter.error(&format!("E0002 unsupported arch {other}, expected 4 or 8"));
            return CompileOutput {
                modules: Vec::new(),
                err_count: reporter.err_count(),
            };
        }
    };

    // entry path resolves against the working directory unless absolute
    let entry = if Path::new(entry_path).is_absolute() {
        entry_path.to_string()
    } else {
        let cwd = std::env::current_dir()
            .map(|d| d.to_string_lossy().into_owned())
            .unwrap_or_default();
        resolve_path(&format!("{cwd}/."), entry_path)
    };

    // parse: single-threaded, include-first depth-first
    let mut parser = Parser::new(arch, config.name_cut, reader, reporter);
    parser.parse_src(&entry, Vec::new(), 0);
    debug!(
        "parsed {} modules with {} errors",
        parser.modules.len(),
        reporter.err_count()
    );
    if reporter.err_count() > 0 || reporter.is_fatal() {
        return CompileOutput {
            modules: Vec::new(),
            err_count: reporter.err_count().max(1),
        };
    }

    // analyze: optionally parallel per module
    let modules = femto_analyze::analyze(&parser.modules, arch, config.mt_cfg, reporter);
    debug!(
        "analyzed {} modules with {} errors",
        modules.len(),
        reporter.err_count()
    );
    CompileOutput {
        modules,
        err_count: reporter.err_count(),
    }
}
