//! Read-only key/value/item projections over a frozen map.
//!
//! A view is a borrowed back-reference; it holds no data of its own and
//! never clones the underlying table. Iteration order is table order, and
//! every iterator is double-ended, so reverse iteration yields the exact
//! reverse sequence.
//!
//! Set operations follow the left operand's element semantics: a plain
//! iterable subtracted from a keys view is a sequence of candidate keys, a
//! pair iterable combined with an items view is a sequence of candidate
//! entries. Operations that must hash right-hand elements are fallible;
//! view-versus-view comparisons never hash and are plain `PartialEq`/
//! `PartialOrd` impls, where the ordering is subset ordering rather than
//! anything lexicographic.

use std::cmp::Ordering;
use std::fmt;

use crate::error::Result;
use crate::map::FrozenMap;
use crate::set::FrozenSet;
use crate::table::{FxIndexSet, HashedKey};
use crate::value::Value;


// ---------------------------------------------------------------------------
// Iterators
// ---------------------------------------------------------------------------

/// Iterator over `(key, value)` entries in table order.
#[derive(Clone)]
pub struct Iter<'a> {
    inner: indexmap::map::Iter<'a, HashedKey, Value>,
}

impl<'a> Iter<'a> {
    pub(crate) fn new(inner: indexmap::map::Iter<'a, HashedKey, Value>) -> Self {
        Iter { inner }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a Value, &'a Value);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (&k.value, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl DoubleEndedIterator for Iter<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(k, v)| (&k.value, v))
    }
}

impl ExactSizeIterator for Iter<'_> {}

/// Iterator over keys in table order.
#[derive(Clone)]
pub struct KeysIter<'a> {
    inner: indexmap::map::Iter<'a, HashedKey, Value>,
}

impl<'a> Iterator for KeysIter<'a> {
    type Item = &'a Value;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| &k.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl DoubleEndedIterator for KeysIter<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(k, _)| &k.value)
    }
}

impl ExactSizeIterator for KeysIter<'_> {}

/// Iterator over values in table order.
#[derive(Clone)]
pub struct ValuesIter<'a> {
    inner: indexmap::map::Iter<'a, HashedKey, Value>,
}

impl<'a> Iterator for ValuesIter<'a> {
    type Item = &'a Value;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl DoubleEndedIterator for ValuesIter<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, v)| v)
    }
}

impl ExactSizeIterator for ValuesIter<'_> {}

// ---------------------------------------------------------------------------
// Keys view
// ---------------------------------------------------------------------------

/// Set-like view of a map's keys.
#[derive(Clone, Copy)]
pub struct Keys<'a> {
    map: &'a FrozenMap,
}

impl<'a> Keys<'a> {
    pub(crate) fn new(map: &'a FrozenMap) -> Self {
        Keys { map }
    }

    /// The originating map, unchanged.
    #[must_use]
    pub fn mapping(&self) -> &'a FrozenMap {
        self.map
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    #[must_use]
    pub fn contains(&self, key: &Value) -> bool {
        self.map.contains_key(key)
    }

    pub fn iter(&self) -> KeysIter<'a> {
        KeysIter {
            inner: self.map.table().iter(),
        }
    }

    fn own_hashed(&self) -> FxIndexSet<HashedKey> {
        self.map.table().iter().map(|(k, _)| k.clone()).collect()
    }

    fn collect_hashed<I>(other: I) -> Result<FxIndexSet<HashedKey>>
    where
        I: IntoIterator<Item = Value>,
    {
        other.into_iter().map(HashedKey::new).collect()
    }

    pub fn union<I>(&self, other: I) -> Result<FrozenSet>
    where
        I: IntoIterator<Item = Value>,
    {
        let mut items = self.own_hashed();
        for value in other {
            items.insert(HashedKey::new(value)?);
        }
        Ok(FrozenSet::from_hashed(items))
    }

    pub fn intersection<I>(&self, other: I) -> Result<FrozenSet>
    where
        I: IntoIterator<Item = Value>,
    {
        let wanted = Self::collect_hashed(other)?;
        let items = self
            .map
            .table()
            .iter()
            .map(|(k, _)| k)
            .filter(|k| wanted.contains(*k))
            .cloned()
            .collect();
        Ok(FrozenSet::from_hashed(items))
    }

    pub fn difference<I>(&self, other: I) -> Result<FrozenSet>
    where
        I: IntoIterator<Item = Value>,
    {
        let excluded = Self::collect_hashed(other)?;
        let items = self
            .map
            .table()
            .iter()
            .map(|(k, _)| k)
            .filter(|k| !excluded.contains(*k))
            .cloned()
            .collect();
        Ok(FrozenSet::from_hashed(items))
    }

    pub fn symmetric_difference<I>(&self, other: I) -> Result<FrozenSet>
    where
        I: IntoIterator<Item = Value>,
    {
        let other = Self::collect_hashed(other)?;
        let mut items: FxIndexSet<HashedKey> = self
            .map
            .table()
            .iter()
            .map(|(k, _)| k)
            .filter(|k| !other.contains(*k))
            .cloned()
            .collect();
        items.extend(
            other
                .into_iter()
                .filter(|k| self.map.table().get_prehashed(k.hash, &k.value).is_none()),
        );
        Ok(FrozenSet::from_hashed(items))
    }

    pub fn is_disjoint<I>(&self, other: I) -> Result<bool>
    where
        I: IntoIterator<Item = Value>,
    {
        for value in other {
            let key = HashedKey::new(value)?;
            if self
                .map
                .table()
                .get_prehashed(key.hash, &key.value)
                .is_some()
            {
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub fn is_subset<I>(&self, other: I) -> Result<bool>
    where
        I: IntoIterator<Item = Value>,
    {
        let other = Self::collect_hashed(other)?;
        Ok(self
            .map
            .table()
            .iter()
            .all(|(k, _)| other.contains(k)))
    }

    pub fn is_proper_subset<I>(&self, other: I) -> Result<bool>
    where
        I: IntoIterator<Item = Value>,
    {
        let other = Self::collect_hashed(other)?;
        Ok(self.len() < other.len()
            && self
                .map
                .table()
                .iter()
                .all(|(k, _)| other.contains(k)))
    }

    pub fn is_superset<I>(&self, other: I) -> Result<bool>
    where
        I: IntoIterator<Item = Value>,
    {
        for value in other {
            let key = HashedKey::new(value)?;
            if self
                .map
                .table()
                .get_prehashed(key.hash, &key.value)
                .is_none()
            {
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub fn is_proper_superset<I>(&self, other: I) -> Result<bool>
    where
        I: IntoIterator<Item = Value>,
    {
        let other = Self::collect_hashed(other)?;
        Ok(other.len() < self.len()
            && other
                .iter()
                .all(|k| self.map.table().get_prehashed(k.hash, &k.value).is_some()))
    }

    fn subset_of(&self, other: &Keys<'_>) -> bool {
        self.len() <= other.len()
            && self
                .map
                .table()
                .iter()
                .all(|(k, _)| other.map.table().get_prehashed(k.hash, &k.value).is_some())
    }
}

impl PartialEq for Keys<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.subset_of(other)
    }
}

impl Eq for Keys<'_> {}

/// Subset ordering: `<` is proper subset, incomparable views return `None`.
impl PartialOrd for Keys<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self.subset_of(other), other.subset_of(self)) {
            (true, true) => Some(Ordering::Equal),
            (true, false) => Some(Ordering::Less),
            (false, true) => Some(Ordering::Greater),
            (false, false) => None,
        }
    }
}

impl<'a> IntoIterator for Keys<'a> {
    type Item = &'a Value;
    type IntoIter = KeysIter<'a>;

    fn into_iter(self) -> KeysIter<'a> {
        self.iter()
    }
}

impl fmt::Debug for Keys<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("keys(")?;
        f.debug_list().entries(self.iter()).finish()?;
        f.write_str(")")
    }
}

// ---------------------------------------------------------------------------
// Values view
// ---------------------------------------------------------------------------

/// Sequence-like view of a map's values. Values carry no uniqueness
/// guarantee, so containment is a linear scan and there is no set algebra.
#[derive(Clone, Copy)]
pub struct Values<'a> {
    map: &'a FrozenMap,
}

impl<'a> Values<'a> {
    pub(crate) fn new(map: &'a FrozenMap) -> Self {
        Values { map }
    }

    /// The originating map, unchanged.
    #[must_use]
    pub fn mapping(&self) -> &'a FrozenMap {
        self.map
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    #[must_use]
    pub fn contains(&self, value: &Value) -> bool {
        self.iter().any(|v| v == value)
    }

    pub fn iter(&self) -> ValuesIter<'a> {
        ValuesIter {
            inner: self.map.table().iter(),
        }
    }
}

impl<'a> IntoIterator for Values<'a> {
    type Item = &'a Value;
    type IntoIter = ValuesIter<'a>;

    fn into_iter(self) -> ValuesIter<'a> {
        self.iter()
    }
}

impl fmt::Debug for Values<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("values(")?;
        f.debug_list().entries(self.iter()).finish()?;
        f.write_str(")")
    }
}

// ---------------------------------------------------------------------------
// Items view
// ---------------------------------------------------------------------------

/// Set-like view of a map's `(key, value)` entries.
///
/// Membership tests compare pairs through the table and never hash values;
/// the four set constructors build pair-tuples as set elements, which does
/// require every participating value to be hashable.
#[derive(Clone, Copy)]
pub struct Items<'a> {
    map: &'a FrozenMap,
}

fn pair_value(key: &Value, value: &Value) -> Value {
    Value::tuple([key.clone(), value.clone()])
}

impl<'a> Items<'a> {
    pub(crate) fn new(map: &'a FrozenMap) -> Self {
        Items { map }
    }

    /// The originating map, unchanged.
    #[must_use]
    pub fn mapping(&self) -> &'a FrozenMap {
        self.map
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Whether `key` maps to exactly `value`.
    #[must_use]
    pub fn contains(&self, key: &Value, value: &Value) -> bool {
        self.map.get(key) == Some(value)
    }

    pub fn iter(&self) -> Iter<'a> {
        Iter::new(self.map.table().iter())
    }

    fn own_hashed(&self) -> Result<FxIndexSet<HashedKey>> {
        self.iter()
            .map(|(k, v)| HashedKey::new(pair_value(k, v)))
            .collect()
    }

    fn collect_hashed<I>(other: I) -> Result<FxIndexSet<HashedKey>>
    where
        I: IntoIterator<Item = (Value, Value)>,
    {
        other
            .into_iter()
            .map(|(k, v)| HashedKey::new(Value::tuple([k, v])))
            .collect()
    }

    pub fn union<I>(&self, other: I) -> Result<FrozenSet>
    where
        I: IntoIterator<Item = (Value, Value)>,
    {
        let mut items = self.own_hashed()?;
        for (k, v) in other {
            items.insert(HashedKey::new(Value::tuple([k, v]))?);
        }
        Ok(FrozenSet::from_hashed(items))
    }

    pub fn intersection<I>(&self, other: I) -> Result<FrozenSet>
    where
        I: IntoIterator<Item = (Value, Value)>,
    {
        let wanted = Self::collect_hashed(other)?;
        let items = self
            .own_hashed()?
            .into_iter()
            .filter(|pair| wanted.contains(pair))
            .collect();
        Ok(FrozenSet::from_hashed(items))
    }

    pub fn difference<I>(&self, other: I) -> Result<FrozenSet>
    where
        I: IntoIterator<Item = (Value, Value)>,
    {
        let excluded = Self::collect_hashed(other)?;
        let items = self
            .own_hashed()?
            .into_iter()
            .filter(|pair| !excluded.contains(pair))
            .collect();
        Ok(FrozenSet::from_hashed(items))
    }

    pub fn symmetric_difference<I>(&self, other: I) -> Result<FrozenSet>
    where
        I: IntoIterator<Item = (Value, Value)>,
    {
        let own = self.own_hashed()?;
        let other = Self::collect_hashed(other)?;
        let mut items: FxIndexSet<HashedKey> = own
            .iter()
            .filter(|pair| !other.contains(*pair))
            .cloned()
            .collect();
        items.extend(other.into_iter().filter(|pair| !own.contains(pair)));
        Ok(FrozenSet::from_hashed(items))
    }

    /// Membership-based, so unhashable values on either side are fine.
    pub fn is_disjoint<I>(&self, other: I) -> bool
    where
        I: IntoIterator<Item = (Value, Value)>,
    {
        !other.into_iter().any(|(k, v)| self.contains(&k, &v))
    }

    pub fn is_subset<I>(&self, other: I) -> bool
    where
        I: IntoIterator<Item = (Value, Value)>,
    {
        let other: Vec<(Value, Value)> = other.into_iter().collect();
        self.iter()
            .all(|(k, v)| other.iter().any(|(ok, ov)| ok == k && ov == v))
    }

    pub fn is_superset<I>(&self, other: I) -> bool
    where
        I: IntoIterator<Item = (Value, Value)>,
    {
        other.into_iter().all(|(k, v)| self.contains(&k, &v))
    }

    fn subset_of(&self, other: &Items<'_>) -> bool {
        self.len() <= other.len()
            && self
                .map
                .table()
                .iter()
                .all(|(k, v)| other.map.table().get_prehashed(k.hash, &k.value) == Some(v))
    }
}

impl PartialEq for Items<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.map == other.map
    }
}

impl Eq for Items<'_> {}

/// Subset ordering over entry sets, as for [`Keys`].
impl PartialOrd for Items<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self.subset_of(other), other.subset_of(self)) {
            (true, true) => Some(Ordering::Equal),
            (true, false) => Some(Ordering::Less),
            (false, true) => Some(Ordering::Greater),
            (false, false) => None,
        }
    }
}

impl<'a> IntoIterator for Items<'a> {
    type Item = (&'a Value, &'a Value);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

impl fmt::Debug for Items<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("items(")?;
        f.debug_list().entries(self.iter()).finish()?;
        f.write_str(")")
    }
}
