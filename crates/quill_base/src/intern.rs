//! String interning for identifier and lexeme handling.
//!
//! Tokens carry [`Symbol`] handles rather than borrowed slices of the
//! source buffer, which keeps them `Copy`, hashable, and free of lifetime
//! ties to the source text. Interning the same string twice yields the
//! same symbol, so name comparison during scope lookup is an integer
//! compare.

use rustc_hash::FxHashMap;

/// A lightweight handle to an interned string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Symbol(u32);

impl Symbol {
    /// The empty string, always interned at index 0.
    pub const EMPTY: Symbol = Symbol(0);

    /// The internal index, usable for dense side tables.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl Default for Symbol {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Deduplicating string store handing out [`Symbol`] handles.
pub struct Interner {
    map: FxHashMap<String, Symbol>,
    strings: Vec<String>,
}

impl Interner {
    pub fn new() -> Self {
        let mut interner = Interner {
            map: FxHashMap::default(),
            strings: Vec::new(),
        };
        interner.strings.push(String::new());
        interner
    }

    /// Interns `s`, returning the existing symbol if it was seen before.
    pub fn intern(&mut self, s: &str) -> Symbol {
        if let Some(&sym) = self.map.get(s) {
            return sym;
        }
        let sym = Symbol(self.strings.len() as u32);
        self.strings.push(s.to_string());
        self.map.insert(s.to_string(), sym);
        sym
    }

    /// Returns the string behind `sym`.
    ///
    /// # Panics
    ///
    /// Panics if `sym` came from a different interner.
    pub fn resolve(&self, sym: Symbol) -> &str {
        &self.strings[sym.index()]
    }

    /// Looks up `s` without interning it.
    pub fn lookup(&self, s: &str) -> Option<Symbol> {
        self.map.get(s).copied()
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.len() <= 1
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}
