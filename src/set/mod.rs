//! Immutable hashed sets of values.
//!
//! `FrozenSet` is the freeze target for mutable sets and the result type of
//! the view algebra. Unlike [`crate::FrozenMap`], its structural hash is
//! computed eagerly at construction: elements are hashable by construction,
//! so hashing a set can never fail and `FrozenSet` implements `Hash`.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

use crate::error::Result;
use crate::hash::element_hash;
use crate::table::{FxIndexSet, HashedKey, Probe};
use crate::value::Value;


/// An immutable set of hashable values.
///
/// Iteration order is first-insertion order. All zero-element sets share one
/// canonical allocation, observable through [`FrozenSet::ptr_eq`].
#[derive(Clone)]
pub struct FrozenSet {
    inner: Arc<SetCore>,
}

struct SetCore {
    items: FxIndexSet<HashedKey>,
    hash: u64,
}

fn empty_core() -> Arc<SetCore> {
    static EMPTY: OnceLock<Arc<SetCore>> = OnceLock::new();
    EMPTY
        .get_or_init(|| {
            log::trace!("establishing empty FrozenSet singleton");
            Arc::new(SetCore {
                items: FxIndexSet::default(),
                hash: 0,
            })
        })
        .clone()
}

impl FrozenSet {
    /// The empty singleton.
    #[must_use]
    pub fn new() -> Self {
        FrozenSet {
            inner: empty_core(),
        }
    }

    /// Builds a set, deduplicating equal elements (first occurrence wins the
    /// slot). Fails on the first unhashable element.
    pub fn from_values<I>(values: I) -> Result<Self>
    where
        I: IntoIterator<Item = Value>,
    {
        let mut items = FxIndexSet::default();
        for value in values {
            items.insert(HashedKey::new(value)?);
        }
        Ok(Self::from_hashed(items))
    }

    /// Rebuild path used by the view algebra: element hashes already known.
    pub(crate) fn from_hashed(items: FxIndexSet<HashedKey>) -> Self {
        if items.is_empty() {
            return Self::new();
        }
        let hash = items
            .iter()
            .fold(0u64, |acc, item| acc.wrapping_add(element_hash(item.hash)));
        FrozenSet {
            inner: Arc::new(SetCore { items, hash }),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.items.is_empty()
    }

    /// Membership test. An unhashable probe cannot be an element.
    #[must_use]
    pub fn contains(&self, value: &Value) -> bool {
        match Probe::new(value) {
            Some(probe) => self.inner.items.contains(&probe),
            None => false,
        }
    }

    pub(crate) fn contains_hashed(&self, key: &HashedKey) -> bool {
        self.inner.items.contains(key)
    }

    /// Iterates elements in first-insertion order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            inner: self.inner.items.iter(),
        }
    }

    /// The order-independent structural hash, fixed at construction.
    pub(crate) fn structural_hash(&self) -> u64 {
        self.inner.hash
    }

    /// Whether both handles share one allocation.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // -- set algebra ---------------------------------------------------

    #[must_use]
    pub fn union(&self, other: &FrozenSet) -> FrozenSet {
        let mut items = self.inner.items.clone();
        items.extend(other.inner.items.iter().cloned());
        Self::from_hashed(items)
    }

    #[must_use]
    pub fn intersection(&self, other: &FrozenSet) -> FrozenSet {
        let items = self
            .inner
            .items
            .iter()
            .filter(|item| other.contains_hashed(item))
            .cloned()
            .collect();
        Self::from_hashed(items)
    }

    #[must_use]
    pub fn difference(&self, other: &FrozenSet) -> FrozenSet {
        let items = self
            .inner
            .items
            .iter()
            .filter(|item| !other.contains_hashed(item))
            .cloned()
            .collect();
        Self::from_hashed(items)
    }

    #[must_use]
    pub fn symmetric_difference(&self, other: &FrozenSet) -> FrozenSet {
        let mut items: FxIndexSet<HashedKey> = self
            .inner
            .items
            .iter()
            .filter(|item| !other.contains_hashed(item))
            .cloned()
            .collect();
        items.extend(
            other
                .inner
                .items
                .iter()
                .filter(|item| !self.contains_hashed(item))
                .cloned(),
        );
        Self::from_hashed(items)
    }

    #[must_use]
    pub fn is_disjoint(&self, other: &FrozenSet) -> bool {
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        !small
            .inner
            .items
            .iter()
            .any(|item| large.contains_hashed(item))
    }

    #[must_use]
    pub fn is_subset(&self, other: &FrozenSet) -> bool {
        self.len() <= other.len()
            && self
                .inner
                .items
                .iter()
                .all(|item| other.contains_hashed(item))
    }

    #[must_use]
    pub fn is_superset(&self, other: &FrozenSet) -> bool {
        other.is_subset(self)
    }
}

impl Default for FrozenSet {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for FrozenSet {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        if self.len() != other.len() || self.inner.hash != other.inner.hash {
            return false;
        }
        self.inner
            .items
            .iter()
            .all(|item| other.contains_hashed(item))
    }
}

impl Eq for FrozenSet {}

impl Hash for FrozenSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.inner.hash);
    }
}

impl fmt::Display for FrozenSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("frozenset({")?;
        for (i, value) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{value}")?;
        }
        f.write_str("})")
    }
}

impl fmt::Debug for FrozenSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Iterator over set elements.
#[derive(Clone)]
pub struct Iter<'a> {
    inner: indexmap::set::Iter<'a, HashedKey>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Value;

    fn next(&mut self) -> Option<&'a Value> {
        self.inner.next().map(|item| &item.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl DoubleEndedIterator for Iter<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|item| &item.value)
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl<'a> IntoIterator for &'a FrozenSet {
    type Item = &'a Value;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}
