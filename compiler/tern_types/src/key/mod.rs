//! Interned path keys.
//!
//! A `Key` addresses one slot inside a container type: an integer index, a
//! string field name, or "any element". Keys are interned so that equal keys
//! are the same handle; a `MultiKey` is an immutable path of keys.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use rustc_hash::FxBuildHasher;
use std::fmt;
use std::sync::Arc;

/// Interned key handle.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct Key(u32);

impl Key {
    /// "Any element": the single subkey of array-like kinds.
    pub const ANY: Key = Key(0);

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn is_any(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_any() {
            write!(f, "Key::ANY")
        } else {
            write!(f, "Key({})", self.0)
        }
    }
}

/// Content of an interned key.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum KeyData {
    Any,
    Int(i64),
    Str(Box<str>),
}

impl fmt::Display for KeyData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyData::Any => f.write_str("*"),
            KeyData::Int(i) => write!(f, "{i}"),
            KeyData::Str(s) => f.write_str(s),
        }
    }
}

/// Append-only, concurrent key interner.
///
/// Forward lookups go through a `DashMap`; reverse lookups index a vector
/// that only ever grows.
pub struct KeyInterner {
    forward: DashMap<KeyData, Key, FxBuildHasher>,
    reverse: RwLock<Vec<KeyData>>,
}

impl KeyInterner {
    pub fn new() -> Self {
        let interner = KeyInterner {
            forward: DashMap::with_hasher(FxBuildHasher),
            reverse: RwLock::new(Vec::with_capacity(64)),
        };
        interner.forward.insert(KeyData::Any, Key::ANY);
        interner.reverse.write().push(KeyData::Any);
        interner
    }

    pub fn intern(&self, data: KeyData) -> Key {
        if let Some(key) = self.forward.get(&data) {
            return *key;
        }
        // The entry guard holds the shard lock, so two threads interning the
        // same key cannot both append.
        match self.forward.entry(data) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                let mut reverse = self.reverse.write();
                let key = Key(u32::try_from(reverse.len()).unwrap_or(u32::MAX));
                reverse.push(entry.key().clone());
                entry.insert(key);
                key
            }
        }
    }

    #[inline]
    pub fn int(&self, value: i64) -> Key {
        self.intern(KeyData::Int(value))
    }

    #[inline]
    pub fn string(&self, value: &str) -> Key {
        self.intern(KeyData::Str(value.into()))
    }

    /// Key for the `index`-th tuple item.
    #[inline]
    pub fn item(&self, index: usize) -> Key {
        self.int(i64::try_from(index).unwrap_or(i64::MAX))
    }

    pub fn lookup(&self, key: Key) -> KeyData {
        self.reverse
            .read()
            .get(key.index())
            .cloned()
            .unwrap_or(KeyData::Any)
    }

    /// Integer value of a key, if it is an integer key.
    pub fn as_int(&self, key: Key) -> Option<i64> {
        match self.reverse.read().get(key.index()) {
            Some(KeyData::Int(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.reverse.read().len()
    }

    /// True if only `Key::ANY` is interned.
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }
}

impl Default for KeyInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for KeyInterner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyInterner({} keys)", self.len())
    }
}

/// Immutable path of keys, shared by reference count.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct MultiKey(Arc<[Key]>);

impl MultiKey {
    pub fn new(keys: impl Into<Arc<[Key]>>) -> Self {
        MultiKey(keys.into())
    }

    /// Empty path. Prefer `TypeContext::root_path` in hot code.
    pub fn root() -> Self {
        MultiKey(Arc::from(Vec::new()))
    }

    /// `[Key::ANY]`. Prefer `TypeContext::any_key_path` in hot code.
    pub fn any_key() -> Self {
        MultiKey(Arc::from(vec![Key::ANY]))
    }

    /// This path followed by one more key.
    #[must_use]
    pub fn child(&self, key: Key) -> Self {
        let mut keys = self.0.to_vec();
        keys.push(key);
        MultiKey(keys.into())
    }

    #[inline]
    pub fn keys(&self) -> &[Key] {
        &self.0
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// True if the two handles share storage.
    #[inline]
    pub fn ptr_eq(&self, other: &MultiKey) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn display<'a>(&'a self, keys: &'a KeyInterner) -> impl fmt::Display + 'a {
        PathDisplay { path: self, keys }
    }
}

impl fmt::Debug for MultiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

struct PathDisplay<'a> {
    path: &'a MultiKey,
    keys: &'a KeyInterner,
}

impl fmt::Display for PathDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &key in self.path.keys() {
            match self.keys.lookup(key) {
                KeyData::Any => f.write_str("[*]")?,
                KeyData::Int(i) => write!(f, "[{i}]")?,
                KeyData::Str(s) => write!(f, "['{s}']")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
