//! Sealed key/value storage underlying frozen maps.
//!
//! A `Table` is populated exactly once from an entry iterator and exposes a
//! read-only surface from then on. Key order is first-insertion order and a
//! duplicate key keeps its original slot while taking the last-written value,
//! which is the native insert semantics of the backing `IndexMap`.

use std::hash::{BuildHasherDefault, Hash, Hasher};

use indexmap::{Equivalent, IndexMap, IndexSet};
use rustc_hash::FxHasher;

use crate::error::{Error, Result};
use crate::value::Value;

pub(crate) type FxIndexMap<K, V> = IndexMap<K, V, BuildHasherDefault<FxHasher>>;
pub(crate) type FxIndexSet<T> = IndexSet<T, BuildHasherDefault<FxHasher>>;

/// A key whose structural hash was computed, fallibly, exactly once.
///
/// The stored hash is what the table's hasher sees, so a key's possibly
/// expensive structural hash is never recomputed on lookup or rebuild.
#[derive(Clone, PartialEq, Eq)]
pub(crate) struct HashedKey {
    pub(crate) hash: u64,
    pub(crate) value: Value,
}

impl HashedKey {
    /// Fails with [`crate::Error::Unhashable`] naming the offending kind.
    pub(crate) fn new(value: Value) -> Result<Self> {
        let hash = value.try_hash()?;
        Ok(HashedKey { hash, value })
    }
}

impl Hash for HashedKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

/// Borrowed lookup probe; lets reads hash and compare without cloning keys.
pub(crate) struct Probe<'a> {
    hash: u64,
    value: &'a Value,
}

impl<'a> Probe<'a> {
    /// `None` when the probe value is unhashable (it cannot be a stored key).
    pub(crate) fn new(value: &'a Value) -> Option<Self> {
        let hash = value.try_hash().ok()?;
        Some(Probe { hash, value })
    }

    pub(crate) fn prehashed(hash: u64, value: &'a Value) -> Self {
        Probe { hash, value }
    }
}

impl Hash for Probe<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl Equivalent<HashedKey> for Probe<'_> {
    fn equivalent(&self, key: &HashedKey) -> bool {
        self.hash == key.hash && *self.value == key.value
    }
}

/// The canonical table store.
#[derive(Default)]
pub(crate) struct Table {
    entries: FxIndexMap<HashedKey, Value>,
}

impl Table {
    /// Populates a fresh table; unhashable keys are construction errors.
    pub(crate) fn from_entries<I>(entries: I) -> Result<Table>
    where
        I: IntoIterator<Item = (Value, Value)>,
    {
        let iter = entries.into_iter();
        let mut table = FxIndexMap::default();
        table.reserve(iter.size_hint().0);
        for (key, value) in iter {
            let key = HashedKey::new(key).map_err(Error::into_key_error)?;
            table.insert(key, value);
        }
        Ok(Table { entries: table })
    }

    /// Rebuild path for derived maps: key hashes are already known.
    pub(crate) fn from_hashed<I>(entries: I) -> Table
    where
        I: IntoIterator<Item = (HashedKey, Value)>,
    {
        Table {
            entries: entries.into_iter().collect(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn get(&self, key: &Value) -> Option<&Value> {
        let probe = Probe::new(key)?;
        self.entries.get(&probe)
    }

    /// Lookup with a known key hash; used on hot equality paths.
    pub(crate) fn get_prehashed(&self, hash: u64, key: &Value) -> Option<&Value> {
        self.entries.get(&Probe::prehashed(hash, key))
    }

    pub(crate) fn contains(&self, key: &Value) -> bool {
        self.get(key).is_some()
    }

    pub(crate) fn get_index(&self, index: usize) -> Option<(&HashedKey, &Value)> {
        self.entries.get_index(index)
    }

    pub(crate) fn iter(&self) -> indexmap::map::Iter<'_, HashedKey, Value> {
        self.entries.iter()
    }
}
