//! Append-only source path table.

use femto_ir::Loc;
use parking_lot::RwLock;

/// Maps source ids to absolute paths.
///
/// Append-only; safe for concurrent reads while the parser appends (the
/// parser is single-threaded, analyzer workers only read).
#[derive(Default)]
pub struct SourceMap {
    paths: RwLock<Vec<String>>,
}

impl SourceMap {
    pub fn new() -> Self {
        SourceMap::default()
    }

    /// Register a path, returning its source id.
    pub fn add(&self, path: impl Into<String>) -> u32 {
        let mut paths = self.paths.write();
        paths.push(path.into());
        (paths.len() - 1) as u32
    }

    /// Path for a source id, if registered.
    pub fn path(&self, id: u32) -> Option<String> {
        self.paths.read().get(id as usize).cloned()
    }

    pub fn len(&self) -> usize {
        self.paths.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.read().is_empty()
    }

    /// Render a location as `path:line.col` for diagnostics.
    pub fn render(&self, loc: Loc) -> String {
        match self.path(loc.src) {
            Some(p) => format!("{}:{}.{}", p, loc.line, loc.col),
            None => format!("<unknown>:{}.{}", loc.line, loc.col),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_render() {
        let map = SourceMap::new();
        let a = map.add("/src/main.fc");
        let b = map.add("/src/util.fc");
        assert_eq!(a, 0);
        assert_eq!(b, 1);
        assert_eq!(map.render(Loc::new(1, 3, 7)), "/src/util.fc:3.7");
        assert_eq!(map.render(Loc::new(9, 1, 1)), "<unknown>:1.1");
    }
}
