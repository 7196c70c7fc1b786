//! The frozen map core: construction protocol, identity, cached hashing,
//! and copy-on-write combinators.
//!
//! A `FrozenMap` owns its table exclusively; every "mutating-looking"
//! operation builds a brand-new table and wraps it in a new instance. The
//! only interior writes after construction are the two memoization slots
//! (structural hash and display string), each filled at most once.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, BitAnd, Index, Sub};
use std::sync::{Arc, OnceLock};

use crate::error::{Error, Result};
use crate::hash::entry_hash;
use crate::set::FrozenSet;
use crate::table::{FxIndexSet, HashedKey, Table};
use crate::value::{Kind, Value};
use crate::view::{Items, Iter, Keys, Values};

#[cfg(test)]
mod tests;

/// Sort orders accepted by [`FrozenMap::sorted`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SortBy {
    Keys,
    Values,
}

/// An immutable mapping from hashable values to values.
///
/// Contents are fixed at construction. `Clone` is the copy surface and costs
/// one reference-count bump; the clone shares the original's allocation
/// ([`FrozenMap::ptr_eq`] holds), which is what makes defensive copying free.
pub struct FrozenMap {
    inner: Arc<Core>,
}

struct Core {
    table: Table,
    hash: OnceLock<Result<u64>>,
    repr: OnceLock<String>,
}

impl Core {
    fn sealed(table: Table) -> Arc<Core> {
        Arc::new(Core {
            table,
            hash: OnceLock::new(),
            repr: OnceLock::new(),
        })
    }
}

/// Process-wide canonical representation of the zero-entry map.
///
/// Established at most once; every construction path that would produce an
/// empty map hands out this allocation instead of a fresh one.
fn empty_core() -> Arc<Core> {
    static EMPTY: OnceLock<Arc<Core>> = OnceLock::new();
    EMPTY
        .get_or_init(|| {
            log::trace!("establishing empty FrozenMap singleton");
            Core::sealed(Table::default())
        })
        .clone()
}

fn pair_entry(item: Value) -> Result<(Value, Value)> {
    let invalid = |kind: Kind| Error::InvalidSource {
        kind: kind.name(),
        why: "sequence items must be two-element key-value pairs",
    };
    match item {
        Value::Tuple(pair) if pair.len() == 2 => Ok((pair[0].clone(), pair[1].clone())),
        Value::List(pair) if pair.len() == 2 => {
            let mut pair = pair;
            let value = pair.pop().expect("len checked");
            let key = pair.pop().expect("len checked");
            Ok((key, value))
        }
        other => Err(invalid(other.kind())),
    }
}

/// Interprets a dynamic construction source as an entry list.
fn source_entries(source: Value) -> Result<Vec<(Value, Value)>> {
    match source {
        Value::Dict(pairs) => Ok(pairs),
        Value::List(items) => items.into_iter().map(pair_entry).collect(),
        Value::Tuple(items) => items.iter().cloned().map(pair_entry).collect(),
        other => Err(Error::InvalidSource {
            kind: other.kind().name(),
            why: "not a mapping or a sequence of key-value pairs",
        }),
    }
}

/// Extracts the elements of `other` viewed as candidate keys.
fn candidate_keys(other: &Value, op: &'static str) -> Result<Vec<Value>> {
    match other {
        Value::List(items) | Value::MutSet(items) => Ok(items.clone()),
        Value::Tuple(items) => Ok(items.to_vec()),
        Value::Set(set) => Ok(set.iter().cloned().collect()),
        Value::Map(map) => Ok(map.keys().iter().cloned().collect()),
        Value::Dict(pairs) => Ok(pairs.iter().map(|(k, _)| k.clone()).collect()),
        Value::Str(s) => Ok(s.chars().map(|c| Value::from(c.to_string())).collect()),
        Value::Bytes(b) => Ok(b.iter().map(|b| Value::Int(i64::from(*b))).collect()),
        Value::ByteBuf(b) => Ok(b.iter().map(|b| Value::Int(i64::from(*b))).collect()),
        other => Err(Error::UnsupportedOperand {
            op,
            kind: other.kind().name(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

impl FrozenMap {
    /// The empty singleton.
    #[must_use]
    pub fn new() -> Self {
        FrozenMap {
            inner: empty_core(),
        }
    }

    fn from_table(table: Table) -> Self {
        if table.is_empty() {
            return Self::new();
        }
        FrozenMap {
            inner: Core::sealed(table),
        }
    }

    /// Internal rebuild path for derived maps; key hashes are already known.
    fn derive<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (HashedKey, Value)>,
    {
        Self::from_table(Table::from_hashed(entries))
    }

    /// Builds a map from key-value pairs.
    ///
    /// Duplicate keys resolve last-write-wins while the key keeps its first
    /// slot in the order. Zero entries yield the empty singleton. An
    /// unhashable key fails with [`Error::UnhashableKey`].
    pub fn from_entries<I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Value, Value)>,
    {
        Ok(Self::from_table(Table::from_entries(entries)?))
    }

    /// Builds a map from a dynamic source: another map, a mutable dict, or a
    /// sequence of key-value pairs.
    ///
    /// Wrapping an existing map is an identity no-op: the returned handle
    /// shares the source's allocation and [`FrozenMap::ptr_eq`] holds.
    pub fn from_value(source: Value) -> Result<Self> {
        match source {
            Value::Map(map) => Ok(map),
            other => Self::from_entries(source_entries(other)?),
        }
    }

    /// [`FrozenMap::from_value`] plus override entries that win on key
    /// collision. An empty override iterator degenerates to `from_value`,
    /// preserving both the identity and the empty short-circuit.
    pub fn from_value_with<I>(source: Value, overrides: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Value, Value)>,
    {
        let overrides: Vec<(Value, Value)> = overrides.into_iter().collect();
        if overrides.is_empty() {
            return Self::from_value(source);
        }
        let mut entries = match source {
            Value::Map(map) => map.to_entries(),
            other => source_entries(other)?,
        };
        entries.extend(overrides);
        Self::from_entries(entries)
    }

    /// Maps every key in `keys` to a clone of `default`.
    pub fn from_keys<I>(keys: I, default: Value) -> Result<Self>
    where
        I: IntoIterator<Item = Value>,
    {
        Self::from_entries(keys.into_iter().map(|key| (key, default.clone())))
    }

    pub(crate) fn table(&self) -> &Table {
        &self.inner.table
    }
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

impl FrozenMap {
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.table.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.table.is_empty()
    }

    /// Returns the value for `key`, if present. An unhashable probe cannot
    /// be a stored key and reads as absent.
    #[must_use]
    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.inner.table.get(key)
    }

    /// Like [`FrozenMap::get`], with a caller-supplied default.
    #[must_use]
    pub fn get_or<'a>(&'a self, key: &Value, default: &'a Value) -> &'a Value {
        self.get(key).unwrap_or(default)
    }

    /// Fallible lookup; the error carries the rendered key.
    pub fn fetch(&self, key: &Value) -> Result<&Value> {
        self.get(key).ok_or_else(|| Error::KeyNotFound {
            key: key.to_string(),
        })
    }

    #[must_use]
    pub fn contains_key(&self, key: &Value) -> bool {
        self.inner.table.contains(key)
    }

    /// Iterates entries in table order.
    pub fn iter(&self) -> Iter<'_> {
        Iter::new(self.inner.table.iter())
    }

    /// Keys view.
    pub fn keys(&self) -> Keys<'_> {
        Keys::new(self)
    }

    /// Values view.
    pub fn values(&self) -> Values<'_> {
        Values::new(self)
    }

    /// Items view.
    pub fn items(&self) -> Items<'_> {
        Items::new(self)
    }

    fn resolve_index(&self, index: isize) -> Result<usize> {
        let len = self.len();
        let resolved = if index < 0 {
            index + len as isize
        } else {
            index
        };
        if resolved < 0 || resolved as usize >= len {
            return Err(Error::IndexOutOfRange { index, len });
        }
        Ok(resolved as usize)
    }

    /// Key at `index`; negative indices count from the back.
    pub fn key(&self, index: isize) -> Result<&Value> {
        let (key, _) = self
            .inner
            .table
            .get_index(self.resolve_index(index)?)
            .expect("index resolved in range");
        Ok(&key.value)
    }

    /// Value at `index`; negative indices count from the back.
    pub fn value(&self, index: isize) -> Result<&Value> {
        let (_, value) = self
            .inner
            .table
            .get_index(self.resolve_index(index)?)
            .expect("index resolved in range");
        Ok(value)
    }

    /// Entry at `index`; negative indices count from the back.
    pub fn item(&self, index: isize) -> Result<(&Value, &Value)> {
        let (key, value) = self
            .inner
            .table
            .get_index(self.resolve_index(index)?)
            .expect("index resolved in range");
        Ok((&key.value, value))
    }

    /// Nested traversal across mixed mapping/sequence structures.
    ///
    /// Each failing step raises that container's own miss error; callers
    /// wanting a default write `map.get_deep(path).ok().unwrap_or(..)`.
    pub fn get_deep(&self, path: &[Value]) -> Result<&Value> {
        let (first, rest) = path.split_first().ok_or(Error::InvalidSource {
            kind: "path",
            why: "traversal path is empty",
        })?;
        let mut current = self.fetch(first)?;
        for step in rest {
            current = traverse_step(current, step)?;
        }
        Ok(current)
    }

    /// Entry list in table order; the data half of the persistence snapshot.
    /// `from_entries` of the result reconstructs an equal map through the
    /// regular construction path.
    #[must_use]
    pub fn to_entries(&self) -> Vec<(Value, Value)> {
        self.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

fn sequence_index<'a>(items: &'a [Value], step: &Value) -> Result<&'a Value> {
    let index = match step {
        Value::Int(i) => *i as isize,
        other => {
            return Err(Error::InvalidSource {
                kind: other.kind().name(),
                why: "sequence indices must be integers",
            })
        }
    };
    let len = items.len();
    let resolved = if index < 0 { index + len as isize } else { index };
    if resolved < 0 || resolved as usize >= len {
        return Err(Error::IndexOutOfRange { index, len });
    }
    Ok(&items[resolved as usize])
}

fn traverse_step<'a>(container: &'a Value, step: &Value) -> Result<&'a Value> {
    match container {
        Value::Map(map) => map.fetch(step),
        Value::Dict(pairs) => pairs
            .iter()
            .find(|(k, _)| k == step)
            .map(|(_, v)| v)
            .ok_or_else(|| Error::KeyNotFound {
                key: step.to_string(),
            }),
        Value::Tuple(items) => sequence_index(items, step),
        Value::List(items) => sequence_index(items, step),
        other => Err(Error::InvalidSource {
            kind: other.kind().name(),
            why: "not a traversable container",
        }),
    }
}

// ---------------------------------------------------------------------------
// Hashing & identity
// ---------------------------------------------------------------------------

impl FrozenMap {
    /// The structural hash: an order-independent combination of every
    /// `(key, value)` entry.
    ///
    /// Computed on first call and cached. A failure (some value is
    /// unhashable) is memoized just as permanently: every later call returns
    /// the same error without re-attempting the computation.
    pub fn try_hash(&self) -> Result<u64> {
        self.inner
            .hash
            .get_or_init(|| {
                let computed = self.compute_hash();
                match &computed {
                    Ok(hash) => {
                        log::trace!("cached structural hash {hash:#018x} ({} entries)", self.len());
                    }
                    Err(err) => log::trace!("memoized hash failure: {err}"),
                }
                computed
            })
            .clone()
    }

    fn compute_hash(&self) -> Result<u64> {
        let mut acc = 0u64;
        for (key, value) in self.inner.table.iter() {
            acc = acc.wrapping_add(entry_hash(key.hash, value.try_hash()?));
        }
        Ok(acc)
    }

    /// Whether [`FrozenMap::try_hash`] succeeds (memoizing either way).
    #[must_use]
    pub fn is_hashable(&self) -> bool {
        self.try_hash().is_ok()
    }

    /// Whether both handles share one allocation. True for any two empty
    /// maps, for clones, and for identity-short-circuited constructions.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Mapping-like equality against a dynamic operand (`Map` or `Dict`).
    #[must_use]
    pub fn entries_eq(&self, other: &Value) -> bool {
        match other {
            Value::Map(map) => self == map,
            Value::Dict(pairs) => match FrozenMap::from_entries(pairs.clone()) {
                Ok(map) => self == &map,
                Err(_) => false,
            },
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Combinators
// ---------------------------------------------------------------------------

impl FrozenMap {
    /// Structural deep copy.
    ///
    /// A hashable map has no reachable mutable state, so the copy is the
    /// same shared allocation. Otherwise the values are deep-copied into a
    /// fresh instance that shares nothing mutable with the original.
    #[must_use]
    pub fn deep_copy(&self) -> Self {
        if self.is_hashable() {
            return self.clone();
        }
        Self::derive(
            self.inner
                .table
                .iter()
                .map(|(key, value)| (key.clone(), value.deep_copy())),
        )
    }

    /// New map with `key` set to `value` (inserted or replaced in place in
    /// the order). The receiver is untouched.
    pub fn set(&self, key: Value, value: Value) -> Result<Self> {
        let key = HashedKey::new(key).map_err(Error::into_key_error)?;
        Ok(Self::derive(
            self.inner
                .table
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .chain(std::iter::once((key, value))),
        ))
    }

    /// New map without `key`. Deleting the last entry returns the empty
    /// singleton; a missing key is an error, not a silent no-op.
    pub fn delete(&self, key: &Value) -> Result<Self> {
        if !self.contains_key(key) {
            return Err(Error::KeyNotFound {
                key: key.to_string(),
            });
        }
        Ok(Self::derive(
            self.inner
                .table
                .iter()
                .filter(|(k, _)| k.value != *key)
                .map(|(k, v)| (k.clone(), v.clone())),
        ))
    }

    /// The `+` contract for dynamic operands: merge a mapping-like value on
    /// top of this one, last-write-wins.
    pub fn add(&self, other: &Value) -> Result<Self> {
        let merged: Vec<(HashedKey, Value)> = match other {
            Value::Map(map) => map
                .inner
                .table
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            Value::Dict(pairs) => {
                let mut merged = Vec::with_capacity(pairs.len());
                for (key, value) in pairs {
                    let key = HashedKey::new(key.clone()).map_err(Error::into_key_error)?;
                    merged.push((key, value.clone()));
                }
                merged
            }
            other => {
                return Err(Error::UnsupportedOperand {
                    op: "+",
                    kind: other.kind().name(),
                })
            }
        };
        Ok(Self::derive(
            self.inner
                .table
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .chain(merged),
        ))
    }

    /// The `-` contract for dynamic operands: every element of `other` is a
    /// candidate key to exclude. String and byte scalars are rejected so a
    /// stray string never removes per-character keys.
    pub fn sub(&self, other: &Value) -> Result<Self> {
        match other {
            Value::Str(_) | Value::Bytes(_) | Value::ByteBuf(_) => {
                return Err(Error::UnsupportedOperand {
                    op: "-",
                    kind: other.kind().name(),
                })
            }
            _ => {}
        }
        Ok(self.without(candidate_keys(other, "-")?))
    }

    /// New map without the given candidate keys. An unhashable candidate can
    /// never equal a stored key and is skipped.
    #[must_use]
    pub fn without<I>(&self, keys: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        let excluded: FxIndexSet<HashedKey> = keys
            .into_iter()
            .filter_map(|key| HashedKey::new(key).ok())
            .collect();
        Self::derive(
            self.inner
                .table
                .iter()
                .filter(|(k, _)| !excluded.contains(*k))
                .map(|(k, v)| (k.clone(), v.clone())),
        )
    }

    /// The `&` contract: against a mapping-like operand, keep entries whose
    /// whole `(key, value)` pair matches; against a key-iterable, keep
    /// entries whose key occurs in it.
    pub fn intersect(&self, other: &Value) -> Result<Self> {
        match other {
            Value::Map(map) => Ok(Self::derive(
                self.inner
                    .table
                    .iter()
                    .filter(|(k, v)| map.table().get_prehashed(k.hash, &k.value) == Some(*v))
                    .map(|(k, v)| (k.clone(), v.clone())),
            )),
            Value::Dict(pairs) => Ok(Self::derive(
                self.inner
                    .table
                    .iter()
                    .filter(|(k, v)| pairs.iter().any(|(pk, pv)| *pk == k.value && pv == *v))
                    .map(|(k, v)| (k.clone(), v.clone())),
            )),
            other => {
                let mut wanted = FxIndexSet::default();
                for key in candidate_keys(other, "&")? {
                    wanted.insert(HashedKey::new(key)?);
                }
                Ok(Self::derive(
                    self.inner
                        .table
                        .iter()
                        .filter(|(k, _)| wanted.contains(*k))
                        .map(|(k, v)| (k.clone(), v.clone())),
                ))
            }
        }
    }

    /// Whether no element of `other`, viewed as a candidate key, is present.
    pub fn is_disjoint(&self, other: &Value) -> Result<bool> {
        let keys = candidate_keys(other, "isdisjoint")?;
        Ok(!keys.iter().any(|key| self.contains_key(key)))
    }

    /// New map with entries reordered by key or by value.
    #[must_use]
    pub fn sorted(&self, by: SortBy) -> Self {
        match by {
            SortBy::Keys => self.sorted_by(|a, b| a.0.cmp(b.0)),
            SortBy::Values => self.sorted_by(|a, b| a.1.cmp(b.1)),
        }
    }

    /// New map with entries reordered by an arbitrary comparator over
    /// `(key, value)` pairs. The sort is stable: ties keep table order.
    #[must_use]
    pub fn sorted_by<F>(&self, mut compare: F) -> Self
    where
        F: FnMut((&Value, &Value), (&Value, &Value)) -> Ordering,
    {
        let mut entries: Vec<(HashedKey, Value)> = self
            .inner
            .table
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        entries.sort_by(|a, b| compare((&a.0.value, &a.1), (&b.0.value, &b.1)));
        Self::derive(entries)
    }
}

// ---------------------------------------------------------------------------
// Trait impls
// ---------------------------------------------------------------------------

impl Clone for FrozenMap {
    fn clone(&self) -> Self {
        FrozenMap {
            inner: self.inner.clone(),
        }
    }
}

impl Default for FrozenMap {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for FrozenMap {
    /// Unordered entry-set equality, insertion order ignored.
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        if self.len() != other.len() {
            return false;
        }
        // Cached hashes can prove inequality, never equality.
        if let (Some(Ok(a)), Some(Ok(b))) = (self.inner.hash.get(), other.inner.hash.get()) {
            if a != b {
                return false;
            }
        }
        self.inner
            .table
            .iter()
            .all(|(k, v)| other.inner.table.get_prehashed(k.hash, &k.value) == Some(v))
    }
}

impl Eq for FrozenMap {}

impl fmt::Display for FrozenMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.render())
    }
}

impl fmt::Debug for FrozenMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.render())
    }
}

impl FrozenMap {
    /// The canonical rendering, computed at most once per instance.
    fn render(&self) -> &str {
        self.inner.repr.get_or_init(|| {
            let mut out = String::from("FrozenMap({");
            for (i, (key, value)) in self.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(&format!("{key}: {value}"));
            }
            out.push_str("})");
            out
        })
    }
}

impl Index<&Value> for FrozenMap {
    type Output = Value;

    fn index(&self, key: &Value) -> &Value {
        self.get(key).expect("key not found")
    }
}

impl<'a> IntoIterator for &'a FrozenMap {
    type Item = (&'a Value, &'a Value);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

impl TryFrom<Value> for FrozenMap {
    type Error = Error;

    fn try_from(source: Value) -> Result<Self> {
        Self::from_value(source)
    }
}

impl TryFrom<Vec<(Value, Value)>> for FrozenMap {
    type Error = Error;

    fn try_from(entries: Vec<(Value, Value)>) -> Result<Self> {
        Self::from_entries(entries)
    }
}

/// Typed merge: right operand wins on key collision.
impl Add<&FrozenMap> for &FrozenMap {
    type Output = FrozenMap;

    fn add(self, other: &FrozenMap) -> FrozenMap {
        FrozenMap::derive(
            self.inner
                .table
                .iter()
                .chain(other.inner.table.iter())
                .map(|(k, v)| (k.clone(), v.clone())),
        )
    }
}

/// Typed key exclusion.
impl Sub<&FrozenSet> for &FrozenMap {
    type Output = FrozenMap;

    fn sub(self, keys: &FrozenSet) -> FrozenMap {
        self.without(keys.iter().cloned())
    }
}

/// Typed items intersection.
impl BitAnd<&FrozenMap> for &FrozenMap {
    type Output = FrozenMap;

    fn bitand(self, other: &FrozenMap) -> FrozenMap {
        FrozenMap::derive(
            self.inner
                .table
                .iter()
                .filter(|(k, v)| other.inner.table.get_prehashed(k.hash, &k.value) == Some(*v))
                .map(|(k, v)| (k.clone(), v.clone())),
        )
    }
}
