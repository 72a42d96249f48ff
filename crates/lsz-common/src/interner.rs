//! String interning.
//!
//! Every identifier, field key and string literal in the declaration graph is
//! stored once and referenced by an [`Atom`]. Atoms compare in O(1), which
//! keeps field search and annotation matching cheap.

use rustc_hash::FxHashMap;
use std::fmt;

/// Interned string handle.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Atom(pub u32);

impl Atom {
    /// The empty string is always interned first.
    pub const EMPTY: Self = Self(0);

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Single-threaded string interner.
///
/// The binder owns one interner per program; the solver only reads from it
/// (see [`Interner::lookup`]), so no synchronisation is needed.
pub struct Interner {
    map: FxHashMap<Box<str>, Atom>,
    strings: Vec<Box<str>>,
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

impl Interner {
    pub fn new() -> Self {
        let mut interner = Self {
            map: FxHashMap::default(),
            strings: Vec::new(),
        };
        let empty = interner.intern("");
        debug_assert_eq!(empty, Atom::EMPTY);
        interner
    }

    /// Intern `s`, returning the existing atom when already present.
    pub fn intern(&mut self, s: &str) -> Atom {
        if let Some(&atom) = self.map.get(s) {
            return atom;
        }
        let atom = Atom(self.strings.len() as u32);
        let boxed: Box<str> = s.into();
        self.strings.push(boxed.clone());
        self.map.insert(boxed, atom);
        atom
    }

    /// Look up `s` without interning it.
    pub fn lookup(&self, s: &str) -> Option<Atom> {
        self.map.get(s).copied()
    }

    /// Resolve an atom back to its text.
    ///
    /// Atoms from a different interner resolve to the empty string rather
    /// than panicking.
    pub fn resolve(&self, atom: Atom) -> &str {
        self.strings.get(atom.index()).map_or("", |s| s)
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        // The empty string is always present.
        self.strings.len() <= 1
    }
}

#[cfg(test)]
#[path = "../tests/interner_tests.rs"]
mod tests;
