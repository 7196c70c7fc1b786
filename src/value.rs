//! Dynamic values stored in frozen maps.
//!
//! The variant split mirrors the freeze conversion table: immutable variants
//! are hashable as long as their contents are, mutable variants are never
//! hashable and exist as inputs to [`crate::freeze::deep_freeze`] and as
//! plain construction sources.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use ordered_float::OrderedFloat;

use crate::error::{Error, Result};
use crate::hash::{hash_ordered, hash_value};
use crate::map::FrozenMap;
use crate::set::FrozenSet;

/// Variant tag of a [`Value`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Kind {
    Null,
    Bool,
    Int,
    Float,
    Str,
    Bytes,
    Tuple,
    Set,
    Map,
    List,
    Dict,
    MutSet,
    ByteBuf,
}

impl Kind {
    /// Human-readable name, used in error messages and registry lookups.
    pub fn name(self) -> &'static str {
        match self {
            Kind::Null => "null",
            Kind::Bool => "bool",
            Kind::Int => "int",
            Kind::Float => "float",
            Kind::Str => "str",
            Kind::Bytes => "bytes",
            Kind::Tuple => "tuple",
            Kind::Set => "frozenset",
            Kind::Map => "map",
            Kind::List => "list",
            Kind::Dict => "dict",
            Kind::MutSet => "set",
            Kind::ByteBuf => "bytebuf",
        }
    }
}

/// A dynamically-typed value.
///
/// Equality is variant-strict: `Int(1)` and `Float(1.0)` are distinct, which
/// keeps `Eq` consistent with [`Value::try_hash`]. Mutable containers compare
/// in their stored order; `Set` and `Map` compare structurally.
#[derive(Clone, PartialEq, Eq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(OrderedFloat<f64>),
    Str(Arc<str>),
    Bytes(Arc<[u8]>),
    /// Immutable sequence; hashable when every element is.
    Tuple(Arc<[Value]>),
    /// Immutable hashed set; always hashable.
    Set(FrozenSet),
    /// Immutable mapping; hashable when every value is.
    Map(FrozenMap),
    /// Growable sequence. Never hashable.
    List(Vec<Value>),
    /// Plain mutable association table (duplicate keys resolve last-write-wins
    /// when frozen or used as a construction source). Never hashable.
    Dict(Vec<(Value, Value)>),
    /// Mutable set, kept as its insertion sequence. Never hashable.
    MutSet(Vec<Value>),
    /// Mutable byte buffer. Never hashable.
    ByteBuf(Vec<u8>),
}

impl Value {
    /// Returns the variant tag.
    pub fn kind(&self) -> Kind {
        match self {
            Value::Null => Kind::Null,
            Value::Bool(_) => Kind::Bool,
            Value::Int(_) => Kind::Int,
            Value::Float(_) => Kind::Float,
            Value::Str(_) => Kind::Str,
            Value::Bytes(_) => Kind::Bytes,
            Value::Tuple(_) => Kind::Tuple,
            Value::Set(_) => Kind::Set,
            Value::Map(_) => Kind::Map,
            Value::List(_) => Kind::List,
            Value::Dict(_) => Kind::Dict,
            Value::MutSet(_) => Kind::MutSet,
            Value::ByteBuf(_) => Kind::ByteBuf,
        }
    }

    /// Builds a tuple value from an iterator of elements.
    pub fn tuple(items: impl IntoIterator<Item = Value>) -> Value {
        let items: Vec<Value> = items.into_iter().collect();
        Value::Tuple(Arc::from(items))
    }

    /// Builds an immutable byte string.
    pub fn bytes(bytes: impl AsRef<[u8]>) -> Value {
        Value::Bytes(Arc::from(bytes.as_ref()))
    }

    /// Computes the structural hash, or reports the first unhashable
    /// component encountered.
    ///
    /// Scalars hash with a per-variant tag so equal payloads of different
    /// kinds do not collide by construction. `Map` delegates to its memoized
    /// cache; `Set` returns the hash precomputed when the set was built.
    pub fn try_hash(&self) -> Result<u64> {
        match self {
            Value::Null => Ok(hash_value(&Kind::Null)),
            Value::Bool(b) => Ok(hash_value(&(Kind::Bool, b))),
            Value::Int(i) => Ok(hash_value(&(Kind::Int, i))),
            Value::Float(x) => Ok(hash_value(&(Kind::Float, x))),
            Value::Str(s) => Ok(hash_value(&(Kind::Str, &**s))),
            Value::Bytes(b) => Ok(hash_value(&(Kind::Bytes, &**b))),
            Value::Tuple(items) => {
                let mut parts = Vec::with_capacity(items.len());
                for item in items.iter() {
                    parts.push(item.try_hash()?);
                }
                Ok(hash_ordered(hash_value(&Kind::Tuple), parts))
            }
            Value::Set(set) => Ok(set.structural_hash()),
            Value::Map(map) => map.try_hash(),
            Value::List(_) | Value::Dict(_) | Value::MutSet(_) | Value::ByteBuf(_) => {
                Err(Error::Unhashable {
                    kind: self.kind().name(),
                })
            }
        }
    }

    /// Whether [`Value::try_hash`] would succeed.
    pub fn is_hashable(&self) -> bool {
        self.try_hash().is_ok()
    }

    /// Structural deep copy.
    ///
    /// Hashable values are returned as cheap clones of their shared
    /// allocations; mutable containers get fresh buffers, recursively, so the
    /// copy shares no mutable state with the original.
    pub fn deep_copy(&self) -> Value {
        match self {
            Value::Tuple(items) => {
                if self.is_hashable() {
                    self.clone()
                } else {
                    Value::tuple(items.iter().map(Value::deep_copy))
                }
            }
            Value::Map(map) => Value::Map(map.deep_copy()),
            Value::List(items) => Value::List(items.iter().map(Value::deep_copy).collect()),
            Value::Dict(pairs) => Value::Dict(
                pairs
                    .iter()
                    .map(|(k, v)| (k.deep_copy(), v.deep_copy()))
                    .collect(),
            ),
            Value::MutSet(items) => Value::MutSet(items.iter().map(Value::deep_copy).collect()),
            Value::ByteBuf(bytes) => Value::ByteBuf(bytes.clone()),
            other => other.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

fn cmp_sorted_items<'a>(
    a: impl Iterator<Item = (&'a Value, &'a Value)>,
    b: impl Iterator<Item = (&'a Value, &'a Value)>,
) -> Ordering {
    let mut left: Vec<(&Value, &Value)> = a.collect();
    let mut right: Vec<(&Value, &Value)> = b.collect();
    left.sort();
    right.sort();
    left.cmp(&right)
}

fn cmp_sorted<'a>(
    a: impl Iterator<Item = &'a Value>,
    b: impl Iterator<Item = &'a Value>,
) -> Ordering {
    let mut left: Vec<&Value> = a.collect();
    let mut right: Vec<&Value> = b.collect();
    left.sort();
    right.sort();
    left.cmp(&right)
}

impl Ord for Value {
    /// Total order: by kind rank first, then naturally within a kind.
    ///
    /// `Set` and `Map` compare as their sorted element/entry sequences, which
    /// costs a sort per comparison; `Dict` and `MutSet` compare in stored
    /// order so that `Ord` stays consistent with their derived equality.
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.cmp(b),
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            (Value::Bytes(a), Value::Bytes(b)) => a.cmp(b),
            (Value::Tuple(a), Value::Tuple(b)) => a.iter().cmp(b.iter()),
            (Value::Set(a), Value::Set(b)) => cmp_sorted(a.iter(), b.iter()),
            (Value::Map(a), Value::Map(b)) => cmp_sorted_items(a.iter(), b.iter()),
            (Value::List(a), Value::List(b)) => a.iter().cmp(b.iter()),
            (Value::Dict(a), Value::Dict(b)) => a.cmp(b),
            (Value::MutSet(a), Value::MutSet(b)) => a.cmp(b),
            (Value::ByteBuf(a), Value::ByteBuf(b)) => a.cmp(b),
            _ => self.kind().cmp(&other.kind()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

fn write_byte_string(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    f.write_str("b\"")?;
    for b in bytes {
        if *b == b'\\' || *b == b'"' {
            write!(f, "\\{}", *b as char)?;
        } else if b.is_ascii_graphic() || *b == b' ' {
            write!(f, "{}", *b as char)?;
        } else {
            write!(f, "\\x{b:02x}")?;
        }
    }
    f.write_str("\"")
}

fn write_joined<'a>(
    f: &mut fmt::Formatter<'_>,
    items: impl Iterator<Item = &'a Value>,
) -> fmt::Result {
    for (i, item) in items.enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{}", x.0),
            Value::Str(s) => write!(f, "{:?}", &**s),
            Value::Bytes(b) => write_byte_string(f, b),
            Value::ByteBuf(b) => write_byte_string(f, b),
            Value::Tuple(items) => {
                f.write_str("(")?;
                write_joined(f, items.iter())?;
                if items.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            }
            Value::List(items) => {
                f.write_str("[")?;
                write_joined(f, items.iter())?;
                f.write_str("]")
            }
            Value::MutSet(items) => {
                if items.is_empty() {
                    f.write_str("set()")
                } else {
                    f.write_str("{")?;
                    write_joined(f, items.iter())?;
                    f.write_str("}")
                }
            }
            Value::Dict(pairs) => {
                f.write_str("{")?;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
            Value::Set(set) => write!(f, "{set}"),
            Value::Map(map) => write!(f, "{map}"),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

impl From<bool> for Value {
    fn from(b: bool) -> Value {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Value {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Value {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Value {
        Value::Float(OrderedFloat(x))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Value {
        Value::Str(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Value {
        Value::Str(Arc::from(s.as_str()))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Value {
        Value::List(items)
    }
}

impl From<FrozenMap> for Value {
    fn from(map: FrozenMap) -> Value {
        Value::Map(map)
    }
}

impl From<FrozenSet> for Value {
    fn from(set: FrozenSet) -> Value {
        Value::Set(set)
    }
}
