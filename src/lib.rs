//! An immutable mapping type with cached structural hashing.
//!
//! A [`FrozenMap`]'s contents are fixed when it is built; every
//! "mutating-looking" operation ([`FrozenMap::set`], [`FrozenMap::delete`],
//! the `+`/`-`/`&` combinators) returns a brand-new instance and leaves the
//! original untouched. The design freezes one flat table per instance and
//! rebuilds it on every derived update — there is no structural sharing of
//! sub-nodes across versions, which keeps reads as cheap as the backing
//! `IndexMap` and makes instances trivially shareable.
//!
//! # Hashing
//!
//! The structural hash combines per-entry contributions with a commutative
//! operation, so two maps holding the same entries hash identically no
//! matter the insertion order. The hash is computed lazily on first use and
//! cached; a failure (some value is a mutable container) is cached just as
//! permanently and re-raised on every later attempt. Key hashes are computed
//! once at construction and reused for every lookup, rebuild, and equality
//! check.
//!
//! # Identity
//!
//! All zero-entry maps share one process-wide allocation, and constructing a
//! map from a value that already is one hands back the same allocation.
//! Both are observable through [`FrozenMap::ptr_eq`], which is also what
//! makes `clone()` a free "defensive copy".
//!
//! # Values
//!
//! Entries hold dynamically-typed [`Value`]s. Immutable variants (scalars,
//! tuples, [`FrozenSet`], nested maps) are hashable as long as their
//! contents are; mutable variants (lists, dicts, mutable sets, byte
//! buffers) never are, and [`freeze::deep_freeze`] converts them into their
//! immutable counterparts recursively.
//!
//! # Views
//!
//! [`FrozenMap::keys`], [`FrozenMap::values`] and [`FrozenMap::items`]
//! return borrowed views supporting iteration (double-ended), containment,
//! and — for keys and items — set algebra and subset-ordering comparisons.

mod error;
mod hash;
mod map;
mod set;
mod snapshot;
mod table;
mod value;
mod view;

pub mod freeze;

#[cfg(test)]
mod test_workloads;

pub use error::{Error, Result};
pub use map::{FrozenMap, SortBy};
pub use set::{FrozenSet, Iter as SetIter};
pub use value::{Kind, Value};
pub use view::{Items, Iter, Keys, KeysIter, Values, ValuesIter};
