//! Tokens and token classification.

use super::{Literal, Loc};
use std::fmt;

/// Token kinds: literals, identifier, punctuation/operators, keywords.
///
/// Literal payloads live in [`Token::value`], not in the kind, so kind
/// comparison stays a plain discriminant check. `Any` is the wildcard used by
/// the token cursor's sequence matcher; `Eof` is the null token returned by
/// an exhausted cursor. Neither is ever produced by the lexer.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum TokenKind {
    // Literals
    LitInt,
    LitFloat,
    LitStr,
    // Identifier
    Ident,
    // + - * / %
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    // < <= > >= == !=
    Lt,
    Le,
    Gt,
    Ge,
    EqEq,
    Ne,
    // && || ! & | ~ ^ << >>
    AndAnd,
    OrOr,
    Not,
    BitAnd,
    BitOr,
    BitNot,
    BitXor,
    Shl,
    Shr,
    // ? . , : ; ( ) { } [ ]
    Question,
    Dot,
    Comma,
    Colon,
    Semi,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    // = += -= *= /= %= ++ --
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    Inc,
    Dec,
    // Keywords: types
    KwAuto,
    KwInt,
    KwI8,
    KwI16,
    KwI32,
    KwI64,
    KwUint,
    KwU8,
    KwU16,
    KwU32,
    KwU64,
    KwF32,
    KwF64,
    KwBool,
    KwVoid,
    // Keywords: literals
    KwNull,
    KwTrue,
    KwFalse,
    // Keywords: control flow
    KwIf,
    KwElse,
    KwWhile,
    KwFor,
    KwSwitch,
    KwCase,
    KwDefault,
    KwBreak,
    KwContinue,
    KwFall,
    KwReturn,
    KwStruct,
    KwEnum,
    // Keywords: integrated functions
    KwSizeof,
    KwCast,
    KwMake,
    KwLen,
    KwMove,
    // Keywords: compiler directives and modifiers
    KwInclude,
    KwTypedef,
    KwTemplate,
    KwDefer,
    KwDefine,
    KwVaArg,
    KwRawC,
    KwRawIr,
    KwConst,
    KwVolatile,
    KwExtern,
    KwExport,
    // Cursor sentinels
    Any,
    Eof,
}

impl TokenKind {
    /// Map a completed identifier to its keyword kind, if any.
    pub fn keyword(word: &str) -> Option<TokenKind> {
        use TokenKind::*;
        Some(match word {
            "auto" => KwAuto,
            "int" => KwInt,
            "i8" => KwI8,
            "i16" => KwI16,
            "i32" => KwI32,
            "i64" => KwI64,
            "uint" => KwUint,
            "u8" => KwU8,
            "u16" => KwU16,
            "u32" => KwU32,
            "u64" => KwU64,
            "f32" => KwF32,
            "f64" => KwF64,
            "bool" => KwBool,
            "void" => KwVoid,
            "null" => KwNull,
            "true" => KwTrue,
            "false" => KwFalse,
            "if" => KwIf,
            "else" => KwElse,
            "while" => KwWhile,
            "for" => KwFor,
            "switch" => KwSwitch,
            "case" => KwCase,
            "default" => KwDefault,
            "break" => KwBreak,
            "continue" => KwContinue,
            "fall" => KwFall,
            "return" => KwReturn,
            "struct" => KwStruct,
            "enum" => KwEnum,
            "sizeof" => KwSizeof,
            "cast" => KwCast,
            "make" => KwMake,
            "len" => KwLen,
            "move" => KwMove,
            "include" => KwInclude,
            "typedef" => KwTypedef,
            "template" => KwTemplate,
            "defer" => KwDefer,
            "define" => KwDefine,
            "va_arg" => KwVaArg,
            "raw_c" => KwRawC,
            "raw_ir" => KwRawIr,
            "const" => KwConst,
            "volatile" => KwVolatile,
            "extern" => KwExtern,
            "export" => KwExport,
            _ => return None,
        })
    }

    /// Signed integer primitive keyword.
    #[inline]
    pub fn is_sint(self) -> bool {
        use TokenKind::*;
        matches!(self, KwInt | KwI8 | KwI16 | KwI32 | KwI64)
    }

    /// Unsigned integer primitive keyword.
    #[inline]
    pub fn is_uint(self) -> bool {
        use TokenKind::*;
        matches!(self, KwUint | KwU8 | KwU16 | KwU32 | KwU64)
    }

    #[inline]
    pub fn is_int(self) -> bool {
        self.is_sint() || self.is_uint()
    }

    #[inline]
    pub fn is_float(self) -> bool {
        matches!(self, TokenKind::KwF32 | TokenKind::KwF64)
    }

    /// Any primitive type keyword, including `bool` and `void`.
    #[inline]
    pub fn is_primitive(self) -> bool {
        self.is_int() || self.is_float() || matches!(self, TokenKind::KwBool | TokenKind::KwVoid)
    }

    /// Display name for diagnostics.
    pub fn display_name(self) -> &'static str {
        use TokenKind::*;
        match self {
            LitInt => "integer literal",
            LitFloat => "float literal",
            LitStr => "string literal",
            Ident => "identifier",
            Add => "+",
            Sub => "-",
            Mul => "*",
            Div => "/",
            Mod => "%",
            Lt => "<",
            Le => "<=",
            Gt => ">",
            Ge => ">=",
            EqEq => "==",
            Ne => "!=",
            AndAnd => "&&",
            OrOr => "||",
            Not => "!",
            BitAnd => "&",
            BitOr => "|",
            BitNot => "~",
            BitXor => "^",
            Shl => "<<",
            Shr => ">>",
            Question => "?",
            Dot => ".",
            Comma => ",",
            Colon => ":",
            Semi => ";",
            LParen => "(",
            RParen => ")",
            LBrace => "{",
            RBrace => "}",
            LBracket => "[",
            RBracket => "]",
            Assign => "=",
            AddAssign => "+=",
            SubAssign => "-=",
            MulAssign => "*=",
            DivAssign => "/=",
            ModAssign => "%=",
            Inc => "++",
            Dec => "--",
            KwAuto => "auto",
            KwInt => "int",
            KwI8 => "i8",
            KwI16 => "i16",
            KwI32 => "i32",
            KwI64 => "i64",
            KwUint => "uint",
            KwU8 => "u8",
            KwU16 => "u16",
            KwU32 => "u32",
            KwU64 => "u64",
            KwF32 => "f32",
            KwF64 => "f64",
            KwBool => "bool",
            KwVoid => "void",
            KwNull => "null",
            KwTrue => "true",
            KwFalse => "false",
            KwIf => "if",
            KwElse => "else",
            KwWhile => "while",
            KwFor => "for",
            KwSwitch => "switch",
            KwCase => "case",
            KwDefault => "default",
            KwBreak => "break",
            KwContinue => "continue",
            KwFall => "fall",
            KwReturn => "return",
            KwStruct => "struct",
            KwEnum => "enum",
            KwSizeof => "sizeof",
            KwCast => "cast",
            KwMake => "make",
            KwLen => "len",
            KwMove => "move",
            KwInclude => "include",
            KwTypedef => "typedef",
            KwTemplate => "template",
            KwDefer => "defer",
            KwDefine => "define",
            KwVaArg => "va_arg",
            KwRawC => "raw_c",
            KwRawIr => "raw_ir",
            KwConst => "const",
            KwVolatile => "volatile",
            KwExtern => "extern",
            KwExport => "export",
            Any => "<any>",
            Eof => "end of file",
        }
    }
}

/// A lexed token: kind, location, original text, and the parsed literal value
/// for number/string/char tokens.
#[derive(Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub loc: Loc,
    pub text: String,
    pub value: Option<Literal>,
}

impl Token {
    #[inline]
    pub fn new(kind: TokenKind, loc: Loc, text: impl Into<String>) -> Self {
        Token {
            kind,
            loc,
            text: text.into(),
            value: None,
        }
    }

    #[inline]
    pub fn with_value(kind: TokenKind, loc: Loc, text: impl Into<String>, value: Literal) -> Self {
        Token {
            kind,
            loc,
            text: text.into(),
            value: Some(value),
        }
    }

    /// The null token returned by an exhausted cursor. Carries the source id
    /// of the file so downstream error messages keep file context.
    pub fn null(src: u32) -> Self {
        Token {
            kind: TokenKind::Eof,
            loc: Loc::new(src, 0, 0),
            text: String::new(),
            value: None,
        }
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(v) => write!(f, "{:?}({v:?}) @ {:?}", self.kind, self.loc),
            None => write!(f, "{:?} @ {:?}", self.kind, self.loc),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_table() {
        assert_eq!(TokenKind::keyword("while"), Some(TokenKind::KwWhile));
        assert_eq!(TokenKind::keyword("va_arg"), Some(TokenKind::KwVaArg));
        assert_eq!(TokenKind::keyword("sizeof"), Some(TokenKind::KwSizeof));
        assert_eq!(TokenKind::keyword("main"), None);
        assert_eq!(TokenKind::keyword("Int"), None);
    }

    #[test]
    fn test_primitive_classification() {
        assert!(TokenKind::KwInt.is_sint());
        assert!(TokenKind::KwU64.is_uint());
        assert!(!TokenKind::KwU64.is_sint());
        assert!(TokenKind::KwF32.is_float());
        assert!(TokenKind::KwVoid.is_primitive());
        assert!(TokenKind::KwBool.is_primitive());
        assert!(!TokenKind::KwStruct.is_primitive());
    }

    #[test]
    fn test_null_token() {
        let t = Token::null(3);
        assert_eq!(t.kind, TokenKind::Eof);
        assert_eq!(t.loc.src, 3);
        assert_eq!(t.loc.line, 0);
    }
}
