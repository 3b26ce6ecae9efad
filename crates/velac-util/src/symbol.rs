//! String interning for identifiers.
//!
//! A [`Symbol`] is a compact (4-byte) handle to a string stored in a global
//! table. Interning makes identifier comparison an integer comparison and
//! deduplicates the many repeated names a compiler sees.
//!
//! The table is thread-safe (DashMap, lock-free reads) and leaks its strings
//! on purpose: interned strings live for the whole process, which bounds the
//! leak by the source size and avoids lifetime tracking on every AST node.
//!
//! # Examples
//!
//! ```
//! use velac_util::symbol::Symbol;
//!
//! let a = Symbol::intern("main");
//! let b = Symbol::intern("main");
//! assert_eq!(a, b);
//! assert_eq!(a.as_str(), "main");
//! ```

use dashmap::DashMap;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::LazyLock;

use static_assertions::assert_eq_size;

/// An interned string identifier.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(u32);

assert_eq_size!(Symbol, u32);

impl Symbol {
    /// Intern a string, returning its symbol.
    ///
    /// Thread-safe; repeated calls with the same string return the same
    /// symbol.
    pub fn intern(string: &str) -> Self {
        STRING_TABLE.intern(string)
    }

    /// The empty symbol, used for synthetic declarations that must not
    /// participate in name lookup.
    pub fn empty() -> Self {
        Self::intern("")
    }

    /// Get the string this symbol was interned from.
    pub fn as_str(self) -> &'static str {
        STRING_TABLE.get(self)
    }

    /// Returns true if this is the empty symbol.
    pub fn is_empty(self) -> bool {
        self.as_str().is_empty()
    }

    /// Get the raw index value, for serialization or debugging.
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({:?})", self.as_str())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Global string table, initialized on first use.
static STRING_TABLE: LazyLock<StringTable> = LazyLock::new(StringTable::new);

/// Thread-safe string table.
///
/// Two maps are kept: forward (string to index) for interning and reverse
/// (index to string) for `as_str`. Both hold `&'static str` obtained by
/// leaking the owned string once per unique entry.
struct StringTable {
    forward: DashMap<&'static str, u32>,
    reverse: DashMap<u32, &'static str>,
    next_index: AtomicU32,
}

impl StringTable {
    fn new() -> Self {
        Self {
            forward: DashMap::with_capacity(256),
            reverse: DashMap::with_capacity(256),
            next_index: AtomicU32::new(0),
        }
    }

    fn intern(&self, string: &str) -> Symbol {
        if let Some(existing) = self.forward.get(string) {
            return Symbol(*existing);
        }
        let interned: &'static str = Box::leak(string.to_owned().into_boxed_str());
        // The entry guard is exclusive per key, so two racing interns of the
        // same new string still agree on one index.
        let index = *self.forward.entry(interned).or_insert_with(|| {
            let index = self.next_index.fetch_add(1, Ordering::SeqCst);
            self.reverse.insert(index, interned);
            index
        });
        Symbol(index)
    }

    fn get(&self, symbol: Symbol) -> &'static str {
        self.reverse
            .get(&symbol.0)
            .map(|entry| *entry)
            .unwrap_or("")
    }
}
