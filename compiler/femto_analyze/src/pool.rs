//! Concurrent cache of canonical types.

use femto_ir::sem::Type;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

/// Name → type map shared by all analyzer workers.
///
/// Seeded with the primitives and the handful of derived types the analyzer
/// reaches for constantly (`u8*`, `u8[]`, `int[]`, `void*`, `void*[]`);
/// further derived types are cached under their rendered names as they are
/// built. Values are cloned out, so readers never hold the lock across work.
pub(crate) struct TypePool {
    map: RwLock<FxHashMap<String, Type>>,
}

impl TypePool {
    pub(crate) fn new(arch: i64) -> Self {
        let mut map = FxHashMap::default();
        let mut put = |t: Type| {
            map.insert(t.to_string(), t);
        };
        put(Type::primitive("int", arch, arch));
        put(Type::primitive("i8", 1, 1));
        put(Type::primitive("i16", 2, 2));
        put(Type::primitive("i32", 4, 4));
        put(Type::primitive("i64", 8, 8));
        put(Type::primitive("uint", arch, arch));
        put(Type::primitive("u8", 1, 1));
        put(Type::primitive("u16", 2, 2));
        put(Type::primitive("u32", 4, 4));
        put(Type::primitive("u64", 8, 8));
        put(Type::primitive("f32", 4, 4));
        put(Type::primitive("f64", 8, 8));
        put(Type::primitive("bool", 1, 1));
        put(Type::primitive("void", 0, 1));
        put(Type::ptr_to(Type::primitive("u8", 1, 1), arch));
        put(Type::slice_of(Type::primitive("u8", 1, 1), arch));
        put(Type::slice_of(Type::primitive("int", arch, arch), arch));
        put(Type::ptr_to(Type::primitive("void", 0, 1), arch));
        put(Type::slice_of(
            Type::ptr_to(Type::primitive("void", 0, 1), arch),
            arch,
        ));
        TypePool {
            map: RwLock::new(map),
        }
    }

    pub(crate) fn get(&self, name: &str) -> Option<Type> {
        self.map.read().get(name).cloned()
    }

    /// Fetch by rendered name or build-and-cache.
    pub(crate) fn intern(&self, build: impl FnOnce() -> Type) -> Type {
        let ty = build();
        let key = ty.to_string();
        if let Some(t) = self.map.read().get(&key) {
            return t.clone();
        }
        self.map.write().insert(key, ty.clone());
        ty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_primitives() {
        let pool = TypePool::new(8);
        assert_eq!(pool.get("int").unwrap().size, 8);
        assert_eq!(pool.get("u8*").unwrap().size, 8);
        assert_eq!(pool.get("u8[]").unwrap().size, 16);
        assert_eq!(pool.get("void*[]").unwrap().size, 16);
        assert!(pool.get("missing").is_none());
    }

    #[test]
    fn test_arch_dependent_widths() {
        let pool = TypePool::new(4);
        assert_eq!(pool.get("int").unwrap().size, 4);
        assert_eq!(pool.get("u8[]").unwrap().size, 8);
    }

    #[test]
    fn test_intern_caches() {
        let pool = TypePool::new(8);
        let a = pool.intern(|| Type::ptr_to(Type::primitive("i32", 4, 4), 8));
        assert!(pool.get("i32*").is_some());
        let b = pool.intern(|| Type::ptr_to(Type::primitive("i32", 4, 4), 8));
        assert!(a.equals(&b));
    }
}
