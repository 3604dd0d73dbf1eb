//! Lexer errors.
//!
//! Every lexer error is fatal: the pipeline aborts after the lex phase.
//! Messages carry the `path:line.col` position pre-rendered, since the lexer
//! runs before the module is registered anywhere.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LexError {
    #[error("E0101 invalid character '{ch}' at {at}")]
    InvalidChar { ch: char, at: String },

    #[error("E0102 invalid number {text} at {at}")]
    InvalidNumber { text: String, at: String },

    #[error("E0103 number literal conversion failed for {text} at {at}")]
    NumberConversion { text: String, at: String },

    #[error("E0104 newline in character literal at {at}")]
    NewlineInChar { at: String },

    #[error("E0105 empty character literal at {at}")]
    EmptyChar { at: String },

    #[error("E0106 invalid character literal at {at}")]
    InvalidCharLiteral { at: String },

    #[error("E0108 invalid character escape '\\{esc}' at {at}")]
    InvalidCharEscape { esc: char, at: String },

    #[error("E0109 newline in string literal at {at}")]
    NewlineInString { at: String },

    #[error("E0111 invalid string escape '\\{esc}' at {at}")]
    InvalidStringEscape { esc: char, at: String },

    #[error("E0113 source ended inside an unterminated token at {at}")]
    Unterminated { at: String },
}
