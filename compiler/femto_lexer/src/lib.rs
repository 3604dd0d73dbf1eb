//! Lexer for Femto.
//!
//! [`lex`] turns UTF-8 source text into a token vector, or fails with a
//! fatal [`LexError`]. The implementation is a byte-at-a-time state machine:
//! one byte per step, with two-byte operators taking priority over their
//! one-byte prefixes and keywords matched after an identifier completes.
//!
//! # Literals
//!
//! - Integers: base 10, `0x`/`0X` hex, `0o`/`0O` octal, `0b`/`0B` binary.
//!   A single `.` in a base-10 number makes it a float.
//! - Characters: one Unicode scalar between single quotes, emitted as an
//!   integer literal. Escapes: `\0 \n \r \t \\ \' \" \xHH`.
//! - Strings: double-quoted with the same escape set. Raw strings between
//!   back-ticks carry their bytes verbatim, newlines included.
//!
//! # Newlines
//!
//! `\n`, `\r` and `\r\n` each count as one line terminator; locations are
//! 1-based `(line, col)` pairs tagged with the file's source id.

mod error;
mod machine;

pub use error::LexError;

use femto_ir::Token;
use machine::Machine;

/// Lex a source file into tokens.
///
/// Any error is fatal: the caller logs it and aborts the pipeline. An empty
/// source yields an empty token vector.
pub fn lex(source: &str, path: &str, src_id: u32) -> Result<Vec<Token>, LexError> {
    Machine::new(source, path, src_id).run()
}
