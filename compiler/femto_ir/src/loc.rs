//! Source locations.

use std::fmt;

/// A source location: `(source id, line, column)`.
///
/// `src` indexes the compiler's source-path table; `line` and `col` are
/// 1-based. The zero value (`line == 0`) marks synthesized nodes.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct Loc {
    pub src: u32,
    pub line: u32,
    pub col: u32,
}

impl Loc {
    #[inline]
    pub const fn new(src: u32, line: u32, col: u32) -> Self {
        Loc { src, line, col }
    }

    /// Location for synthesized nodes that have no source position.
    pub const NONE: Loc = Loc {
        src: 0,
        line: 0,
        col: 0,
    };
}

impl fmt::Debug for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}.{}", self.src, self.line, self.col)
    }
}

impl fmt::Display for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.line, self.col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loc_display() {
        let loc = Loc::new(2, 14, 3);
        assert_eq!(format!("{loc}"), "14.3");
        assert_eq!(format!("{loc:?}"), "2:14.3");
    }

    #[test]
    fn test_loc_none() {
        assert_eq!(Loc::NONE.line, 0);
        assert_eq!(Loc::default(), Loc::NONE);
    }
}
