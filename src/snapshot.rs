//! Serde integration.
//!
//! Serialization emits plain entries; deserialization rebuilds through the
//! regular construction path, so the empty-singleton and last-write-wins
//! rules apply to reconstructed instances exactly as they do to fresh ones.
//! Interchange formats do not carry the tuple/list distinction; type-exact
//! persistence should go through [`crate::FrozenMap::to_entries`].

use std::fmt;

use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};

use crate::map::FrozenMap;
use crate::set::FrozenSet;
use crate::value::Value;

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(x) => serializer.serialize_f64(x.0),
            Value::Str(s) => serializer.serialize_str(s),
            Value::Bytes(b) => serializer.serialize_bytes(b),
            Value::ByteBuf(b) => serializer.serialize_bytes(b),
            Value::Tuple(items) => serialize_seq(serializer, items.iter()),
            Value::List(items) => serialize_seq(serializer, items.iter()),
            Value::MutSet(items) => serialize_seq(serializer, items.iter()),
            Value::Set(set) => set.serialize(serializer),
            Value::Map(map) => map.serialize(serializer),
            Value::Dict(pairs) => {
                let mut state = serializer.serialize_map(Some(pairs.len()))?;
                for (key, value) in pairs {
                    state.serialize_entry(key, value)?;
                }
                state.end()
            }
        }
    }
}

fn serialize_seq<'a, S: Serializer>(
    serializer: S,
    items: impl ExactSizeIterator<Item = &'a Value>,
) -> Result<S::Ok, S::Error> {
    let mut state = serializer.serialize_seq(Some(items.len()))?;
    for item in items {
        state.serialize_element(item)?;
    }
    state.end()
}

impl Serialize for FrozenMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self {
            state.serialize_entry(key, value)?;
        }
        state.end()
    }
}

impl Serialize for FrozenSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_seq(Some(self.len()))?;
        for item in self {
            state.serialize_element(item)?;
        }
        state.end()
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any frozen-map value")
    }

    fn visit_unit<E>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        Value::deserialize(deserializer)
    }

    fn visit_bool<E>(self, b: bool) -> Result<Value, E> {
        Ok(Value::Bool(b))
    }

    fn visit_i64<E>(self, i: i64) -> Result<Value, E> {
        Ok(Value::Int(i))
    }

    fn visit_u64<E>(self, u: u64) -> Result<Value, E> {
        if let Ok(i) = i64::try_from(u) {
            Ok(Value::Int(i))
        } else {
            Ok(Value::from(u as f64))
        }
    }

    fn visit_f64<E>(self, x: f64) -> Result<Value, E> {
        Ok(Value::from(x))
    }

    fn visit_str<E>(self, s: &str) -> Result<Value, E> {
        Ok(Value::from(s))
    }

    fn visit_string<E>(self, s: String) -> Result<Value, E> {
        Ok(Value::from(s))
    }

    fn visit_bytes<E>(self, bytes: &[u8]) -> Result<Value, E> {
        Ok(Value::bytes(bytes))
    }

    fn visit_byte_buf<E>(self, bytes: Vec<u8>) -> Result<Value, E> {
        Ok(Value::bytes(bytes))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::List(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Value, A::Error> {
        Ok(Value::Map(build_map(map)?))
    }
}

fn build_map<'de, A: MapAccess<'de>>(mut access: A) -> Result<FrozenMap, A::Error> {
    let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
    while let Some((key, value)) = access.next_entry::<Value, Value>()? {
        entries.push((key, value));
    }
    FrozenMap::from_entries(entries).map_err(de::Error::custom)
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Value, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

struct MapVisitor;

impl<'de> Visitor<'de> for MapVisitor {
    type Value = FrozenMap;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of frozen-map values")
    }

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<FrozenMap, A::Error> {
        build_map(map)
    }
}

impl<'de> Deserialize<'de> for FrozenMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<FrozenMap, D::Error> {
        deserializer.deserialize_map(MapVisitor)
    }
}

struct SetVisitor;

impl<'de> Visitor<'de> for SetVisitor {
    type Value = FrozenSet;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a sequence of hashable frozen-map values")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<FrozenSet, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element::<Value>()? {
            items.push(item);
        }
        FrozenSet::from_values(items).map_err(de::Error::custom)
    }
}

impl<'de> Deserialize<'de> for FrozenSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<FrozenSet, D::Error> {
        deserializer.deserialize_seq(SetVisitor)
    }
}
