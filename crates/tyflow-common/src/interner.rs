//! String interning for identifiers, property names and literal text.
//!
//! Atoms are 4-byte handles; comparing two atoms is comparing two strings.
//! The interner is single-threaded and uses interior mutability so that
//! it can be shared by reference between the binder arena and the type
//! interner of one checking session.

use rustc_hash::FxHashMap;
use serde::Serialize;
use std::cell::RefCell;
use std::sync::Arc;

/// An interned string handle.
///
/// Index 0 is reserved for the empty string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Default, PartialOrd, Ord)]
pub struct Atom(pub u32);

impl Atom {
    /// The empty/none atom.
    pub const NONE: Atom = Atom(0);

    #[inline]
    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

/// Property and method names the checker core asks about by name.
const COMMON_STRINGS: &[&str] = &[
    "length",
    "constructor",
    "prototype",
    "push",
    "unshift",
    "string",
    "number",
    "bigint",
    "boolean",
    "symbol",
    "undefined",
    "object",
    "function",
];

#[derive(Default)]
struct InternerState {
    map: FxHashMap<Arc<str>, Atom>,
    strings: Vec<Arc<str>>,
}

/// String interner for deduplicating names.
///
/// # Example
/// ```
/// use tyflow_common::interner::Interner;
/// let interner = Interner::new();
/// let a1 = interner.intern("hello");
/// let a2 = interner.intern("hello");
/// assert_eq!(a1, a2);
/// assert_eq!(&*interner.resolve(a1), "hello");
/// ```
pub struct Interner {
    state: RefCell<InternerState>,
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

impl Interner {
    /// Create a new interner with the empty string pre-interned at index 0.
    pub fn new() -> Self {
        let mut state = InternerState {
            map: FxHashMap::default(),
            strings: Vec::with_capacity(256),
        };
        let empty: Arc<str> = Arc::from("");
        state.strings.push(empty.clone());
        state.map.insert(empty, Atom::NONE);
        let interner = Interner {
            state: RefCell::new(state),
        };
        for s in COMMON_STRINGS {
            interner.intern(s);
        }
        interner
    }

    /// Intern a string, returning its Atom handle.
    #[inline]
    pub fn intern(&self, s: &str) -> Atom {
        let mut state = self.state.borrow_mut();
        if let Some(&atom) = state.map.get(s) {
            return atom;
        }
        let atom = Atom(state.strings.len() as u32);
        let owned: Arc<str> = Arc::from(s);
        state.strings.push(owned.clone());
        state.map.insert(owned, atom);
        atom
    }

    /// Resolve an Atom back to its string value.
    /// Returns the empty string if the atom is out of bounds.
    #[inline]
    pub fn resolve(&self, atom: Atom) -> Arc<str> {
        self.try_resolve(atom).unwrap_or_else(|| Arc::from(""))
    }

    #[inline]
    pub fn try_resolve(&self, atom: Atom) -> Option<Arc<str>> {
        self.state.borrow().strings.get(atom.0 as usize).cloned()
    }

    /// Look up an already-interned string without interning it.
    pub fn lookup(&self, s: &str) -> Option<Atom> {
        self.state.borrow().map.get(s).copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.state.borrow().strings.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_dedup_and_resolve() {
        let interner = Interner::new();
        let a = interner.intern("kind");
        let b = interner.intern("kind");
        assert_eq!(a, b);
        assert_eq!(&*interner.resolve(a), "kind");
        assert_eq!(interner.lookup("kind"), Some(a));
        assert_eq!(interner.lookup("missing"), None);
    }

    #[test]
    fn test_none_atom_is_empty_string() {
        let interner = Interner::new();
        assert!(Atom::NONE.is_none());
        assert_eq!(&*interner.resolve(Atom::NONE), "");
        assert_eq!(&*interner.resolve(Atom(u32::MAX)), "");
    }
}
