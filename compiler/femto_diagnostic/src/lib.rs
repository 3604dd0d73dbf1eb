//! Diagnostics for the Femto compiler.
//!
//! Diagnostics are one-line coded messages (`E#### message at path:line.col`)
//! pushed through a [`Reporter`]. The reporter is safe for concurrent use:
//! the analyzer's parallel workers append through a shared reference.
//!
//! Severity runs 1 (trace) to 5 (error). Messages at severity 5 increment
//! the error counter; the `fatal` flag additionally latches the fatal bit,
//! which aborts the pipeline at the next pass boundary.
//!
//! The [`SourceMap`] is the append-only table of source paths; token and AST
//! locations carry an index into it.

mod reporter;
mod source_map;

pub use reporter::{CollectSink, DiagnosticSink, Reporter, StderrSink};
pub use source_map::SourceMap;
