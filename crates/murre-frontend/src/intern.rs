// src/intern.rs
//
// String interning for Symbol IDs.

use rustc_hash::FxHashMap;

/// Unique identifier for symbols (interned strings)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symbol(u32);

impl Symbol {
    /// The unknown/fallback symbol (index 0).
    pub const UNKNOWN: Self = Self(0);

    /// Create a Symbol from a raw index. Only the interner should use this.
    pub(crate) fn new(index: u32) -> Self {
        Self(index)
    }

    /// Return the underlying index.
    pub fn index(self) -> u32 {
        self.0
    }

    /// Create a Symbol with an arbitrary index in test code.
    #[cfg(any(test, feature = "testing"))]
    pub fn new_for_test(index: u32) -> Self {
        Self(index)
    }
}

/// Interns strings to unique Symbol IDs
#[derive(Debug, Clone, Default)]
pub struct Interner {
    map: FxHashMap<String, Symbol>,
    strings: Vec<String>,
}

impl Interner {
    pub fn new() -> Self {
        let mut interner = Self::default();
        // Index 0 is reserved for Symbol::UNKNOWN.
        interner.intern("<unknown>");
        interner
    }

    pub fn intern(&mut self, s: &str) -> Symbol {
        if let Some(&sym) = self.map.get(s) {
            return sym;
        }
        let sym = Symbol::new(self.strings.len() as u32);
        self.strings.push(s.to_string());
        self.map.insert(s.to_string(), sym);
        sym
    }

    pub fn resolve(&self, sym: Symbol) -> &str {
        &self.strings[sym.index() as usize]
    }

    /// Look up a string to get its symbol, if it has been interned.
    pub fn lookup(&self, s: &str) -> Option<Symbol> {
        self.map.get(s).copied()
    }

    pub fn intern_with_prefix(&mut self, prefix: &str, base: Symbol) -> Symbol {
        let name = format!("{}{}", prefix, self.resolve(base));
        self.intern(&name)
    }

    /// Returns the number of interned strings.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Returns true if no strings have been interned.
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_returns_same_symbol() {
        let mut interner = Interner::new();
        let s1 = interner.intern("hello");
        let s2 = interner.intern("hello");
        let s3 = interner.intern("world");

        assert_eq!(s1, s2);
        assert_ne!(s1, s3);
    }

    #[test]
    fn resolve_returns_original_string() {
        let mut interner = Interner::new();
        let sym = interner.intern("test");
        assert_eq!(interner.resolve(sym), "test");
    }

    #[test]
    fn intern_with_prefix_builds_derived_name() {
        let mut interner = Interner::new();
        let base = interner.intern("count");
        let derived = interner.intern_with_prefix("__memo_parameter_", base);
        assert_eq!(interner.resolve(derived), "__memo_parameter_count");
    }
}
