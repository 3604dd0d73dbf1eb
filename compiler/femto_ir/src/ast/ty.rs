//! Syntactic type descriptors.

use crate::Loc;
use std::fmt;

/// Kind of a [`ParsedType`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ParsedTypeKind {
    /// Placeholder for inference (`auto`).
    Auto,
    /// `int`, `u8`, `f64`, `bool`, `void`, ...
    Primitive,
    /// Pointer; `direct` is the target.
    Ptr,
    /// Fixed-length array; `direct` is the element, `arr_len` the length.
    Arr,
    /// Slice (pointer + length); `direct` is the element.
    Slice,
    /// Function; `direct` is the return type, `indirect` the parameters.
    Func,
    /// Local struct/enum/typedef/template reference, possibly forward.
    Name,
    /// Cross-module reference `include_name.ident`.
    Foreign,
}

/// A recursive syntactic type descriptor.
///
/// `size`/`align`/`arr_len` are `-1` until resolved; the parser's struct
/// sizing pass completes forward references through the module table.
#[derive(Clone, PartialEq)]
pub struct ParsedType {
    pub kind: ParsedTypeKind,
    pub loc: Loc,
    /// Primitive keyword, referenced name, or a punctuation tag (`*`, `[]`).
    pub name: String,
    /// Include alias for `Foreign` types.
    pub inc_name: String,
    /// Unique name of the module the reference was written in.
    pub src_uname: String,
    /// Pointer target, array/slice element, function return.
    pub direct: Option<Box<ParsedType>>,
    /// Function parameters.
    pub indirect: Vec<ParsedType>,
    pub arr_len: i64,
    pub size: i64,
    pub align: i64,
}

impl ParsedType {
    pub fn new(
        kind: ParsedTypeKind,
        loc: Loc,
        name: impl Into<String>,
        inc_name: impl Into<String>,
        src_uname: impl Into<String>,
    ) -> Self {
        ParsedType {
            kind,
            loc,
            name: name.into(),
            inc_name: inc_name.into(),
            src_uname: src_uname.into(),
            direct: None,
            indirect: Vec::new(),
            arr_len: -1,
            size: -1,
            align: -1,
        }
    }

    /// Check that the type is a chain of the given kinds along `direct`.
    ///
    /// `check(&[Ptr, Name])` matches a pointer whose target is a name type.
    pub fn check_chain(&self, kinds: &[ParsedTypeKind]) -> bool {
        let mut cur = Some(self);
        for k in kinds {
            match cur {
                Some(t) if t.kind == *k => cur = t.direct.as_deref(),
                _ => return false,
            }
        }
        true
    }
}

impl fmt::Debug for ParsedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // error recovery can leave holes in the chain; render them as `?`
        struct Direct<'a>(Option<&'a ParsedType>);
        impl fmt::Debug for Direct<'_> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self.0 {
                    Some(t) => write!(f, "{t:?}"),
                    None => write!(f, "?"),
                }
            }
        }
        let direct = Direct(self.direct.as_deref());
        match self.kind {
            ParsedTypeKind::Auto => write!(f, "auto"),
            ParsedTypeKind::Primitive => write!(f, "{}", self.name),
            ParsedTypeKind::Ptr => write!(f, "{direct:?}*"),
            ParsedTypeKind::Arr => write!(f, "{direct:?}[{}]", self.arr_len),
            ParsedTypeKind::Slice => write!(f, "{direct:?}[]"),
            ParsedTypeKind::Func => {
                write!(f, "{direct:?}(")?;
                for (i, p) in self.indirect.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{p:?}")?;
                }
                write!(f, ")")
            }
            ParsedTypeKind::Name => write!(f, "{}", self.name),
            ParsedTypeKind::Foreign => write!(f, "{}.{}", self.inc_name, self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prim(name: &str, size: i64) -> ParsedType {
        let mut t = ParsedType::new(ParsedTypeKind::Primitive, Loc::NONE, name, "", "");
        t.size = size;
        t.align = size.max(1);
        t
    }

    #[test]
    fn test_check_chain() {
        let mut ptr = ParsedType::new(ParsedTypeKind::Ptr, Loc::NONE, "*", "", "");
        ptr.direct = Some(Box::new(ParsedType::new(
            ParsedTypeKind::Name,
            Loc::NONE,
            "S",
            "",
            "m",
        )));
        assert!(ptr.check_chain(&[ParsedTypeKind::Ptr, ParsedTypeKind::Name]));
        assert!(!ptr.check_chain(&[ParsedTypeKind::Slice]));
    }

    #[test]
    fn test_debug_render() {
        let mut arr = ParsedType::new(ParsedTypeKind::Arr, Loc::NONE, "[N]", "", "");
        arr.arr_len = 3;
        arr.direct = Some(Box::new(prim("i32", 4)));
        assert_eq!(format!("{arr:?}"), "i32[3]");
    }
}
