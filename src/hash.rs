//! Structural-hash primitives.
//!
//! A map's hash is the wrapping sum of per-entry contributions, so insertion
//! order never affects the result. Two mixing seeds keep key and value
//! contributions from cancelling when either hash is zero.

use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

/// Mixing seed for key hashes (golden ratio constant).
const SEED_KEY: u64 = 0x9E37_79B9_7F4A_7C15;

/// Mixing seed for value hashes (large prime).
const SEED_VAL: u64 = 0x517C_C1B7_2722_0A95;

/// Hashes a value with the crate-wide hasher.
pub(crate) fn hash_value<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = FxHasher::default();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Contribution of a single `(key, value)` entry to a map's hash.
pub(crate) const fn entry_hash(key_hash: u64, value_hash: u64) -> u64 {
    key_hash.wrapping_mul(SEED_KEY) ^ value_hash.wrapping_mul(SEED_VAL)
}

/// Contribution of a single element to a set's hash.
pub(crate) const fn element_hash(hash: u64) -> u64 {
    hash.wrapping_mul(SEED_VAL) ^ SEED_KEY
}

/// Order-sensitive combination of element hashes, tagged by container kind.
pub(crate) fn hash_ordered(tag: u64, parts: impl IntoIterator<Item = u64>) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write_u64(tag);
    for part in parts {
        hasher.write_u64(part);
    }
    hasher.finish()
}
