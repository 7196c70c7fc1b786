//! Recursive conversion of mutable values into their immutable counterparts.
//!
//! The fixed conversion table turns each mutable container into its frozen
//! twin, recursing into children first:
//!
//! | from      | to          |
//! |-----------|-------------|
//! | `list`    | `tuple`     |
//! | `dict`    | `map`       |
//! | `set`     | `frozenset` |
//! | `bytebuf` | `bytes`     |
//!
//! Immutable containers that can still hold unhashable children (`tuple`,
//! `map`) have symmetric inverse handling: they are unwrapped, their
//! contents frozen, and the container rebuilt. Hosts may override a
//! conversion through the process-wide registry.

use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::map::FrozenMap;
use crate::set::FrozenSet;
use crate::value::{Kind, Value};

/// A conversion from one value into a hashable rendering of it.
pub type Converter = fn(Value) -> Result<Value>;

/// The fixed mutable-to-immutable conversion table.
pub const CONVERSIONS: &[(Kind, Kind)] = &[
    (Kind::List, Kind::Tuple),
    (Kind::Dict, Kind::Map),
    (Kind::MutSet, Kind::Set),
    (Kind::ByteBuf, Kind::Bytes),
];

/// Immutable kinds that are unwrapped and rebuilt to reach nested mutable
/// children.
pub const INVERSES: &[(Kind, Kind)] = &[(Kind::Tuple, Kind::List), (Kind::Map, Kind::Dict)];

static CUSTOM: RwLock<Vec<(Kind, Converter)>> = RwLock::new(Vec::new());

fn default_converter(kind: Kind) -> Option<Converter> {
    match kind {
        Kind::List => Some(freeze_list),
        Kind::Dict => Some(freeze_dict),
        Kind::MutSet => Some(freeze_mut_set),
        Kind::ByteBuf => Some(freeze_byte_buf),
        _ => None,
    }
}

fn lookup_converter(kind: Kind) -> Option<Converter> {
    let custom = CUSTOM.read();
    custom
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, conv)| *conv)
        .or_else(|| default_converter(kind))
}

/// Registers a custom converter for `kind`, to be used by [`deep_freeze`]
/// instead of the built-in one.
///
/// Fails if `kind` already has a converter (built-in or custom) and `force`
/// is off.
pub fn register(kind: Kind, converter: Converter, force: bool) -> Result<()> {
    let mut custom = CUSTOM.write();
    if let Some(slot) = custom.iter_mut().find(|(k, _)| *k == kind) {
        if !force {
            return Err(Error::FreezeRegistry {
                kind: kind.name(),
                why: "already registered and force is off",
            });
        }
        slot.1 = converter;
    } else {
        if default_converter(kind).is_some() && !force {
            return Err(Error::FreezeRegistry {
                kind: kind.name(),
                why: "already registered and force is off",
            });
        }
        custom.push((kind, converter));
    }
    log::debug!("registered freeze converter for {}", kind.name());
    Ok(())
}

/// Removes a custom converter, restoring the built-in behavior for `kind`.
pub fn unregister(kind: Kind) -> Result<()> {
    let mut custom = CUSTOM.write();
    let before = custom.len();
    custom.retain(|(k, _)| *k != kind);
    if custom.len() == before {
        return Err(Error::FreezeRegistry {
            kind: kind.name(),
            why: "not registered",
        });
    }
    log::debug!("unregistered freeze converter for {}", kind.name());
    Ok(())
}

fn freeze_list(value: Value) -> Result<Value> {
    match value {
        Value::List(items) => Ok(Value::tuple(
            items
                .into_iter()
                .map(deep_freeze)
                .collect::<Result<Vec<_>>>()?,
        )),
        other => Err(Error::Unfreezable {
            kind: other.kind().name(),
        }),
    }
}

fn freeze_dict(value: Value) -> Result<Value> {
    match value {
        Value::Dict(pairs) => {
            let mut entries = Vec::with_capacity(pairs.len());
            for (key, value) in pairs {
                entries.push((deep_freeze(key)?, deep_freeze(value)?));
            }
            Ok(Value::Map(FrozenMap::from_entries(entries)?))
        }
        other => Err(Error::Unfreezable {
            kind: other.kind().name(),
        }),
    }
}

fn freeze_mut_set(value: Value) -> Result<Value> {
    match value {
        Value::MutSet(items) => {
            let frozen = items
                .into_iter()
                .map(deep_freeze)
                .collect::<Result<Vec<_>>>()?;
            Ok(Value::Set(FrozenSet::from_values(frozen)?))
        }
        other => Err(Error::Unfreezable {
            kind: other.kind().name(),
        }),
    }
}

fn freeze_byte_buf(value: Value) -> Result<Value> {
    match value {
        Value::ByteBuf(bytes) => Ok(Value::bytes(bytes)),
        other => Err(Error::Unfreezable {
            kind: other.kind().name(),
        }),
    }
}

/// Converts `value` and everything nested in it into immutable counterparts.
///
/// Already-hashable values pass through unchanged (sharing their
/// allocations). A value that is neither hashable nor convertible — or whose
/// converter produced something still unhashable — fails with
/// [`Error::Unfreezable`].
pub fn deep_freeze(value: Value) -> Result<Value> {
    if value.is_hashable() {
        return Ok(value);
    }
    let kind = value.kind();
    if let Some(converter) = lookup_converter(kind) {
        let frozen = converter(value)?;
        if !frozen.is_hashable() {
            return Err(Error::Unfreezable {
                kind: frozen.kind().name(),
            });
        }
        log::trace!("froze {} into {}", kind.name(), frozen.kind().name());
        return Ok(frozen);
    }
    // Inverse handling: unwrap the immutable container, freeze the
    // children, rebuild.
    match value {
        Value::Tuple(items) => {
            let frozen = items
                .iter()
                .cloned()
                .map(deep_freeze)
                .collect::<Result<Vec<_>>>()?;
            Ok(Value::tuple(frozen))
        }
        Value::Map(map) => {
            let mut entries = Vec::with_capacity(map.len());
            for (key, value) in &map {
                entries.push((key.clone(), deep_freeze(value.clone())?));
            }
            Ok(Value::Map(FrozenMap::from_entries(entries)?))
        }
        other => Err(Error::Unfreezable {
            kind: other.kind().name(),
        }),
    }
}
