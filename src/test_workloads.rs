use indexmap::IndexMap;
use rand::Rng;

use crate::{FrozenMap, Value};

#[derive(Debug)]
pub(crate) enum Operation {
    Set(i64),
    Delete(i64),
    Dump,
}

fn key(i: i64) -> Value {
    Value::from(i)
}

fn value(i: i64) -> Value {
    Value::from(i + 1)
}

/// Drives a derived-map chain against an `IndexMap` oracle.
///
/// `shift_remove` keeps the oracle's order aligned with `delete`, which
/// rebuilds the table without the removed slot.
pub(crate) fn run_map_workload(ops: impl IntoIterator<Item = Operation>) {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut oracle = IndexMap::<i64, i64>::new();
    let mut map = FrozenMap::new();
    for op in ops {
        match op {
            Operation::Set(i) => {
                let before = map.clone();
                oracle.insert(i, i + 1);
                map = map.set(key(i), value(i)).unwrap();
                assert_eq!(map.get(&key(i)), Some(&value(i)));
                assert_eq!(map.len(), oracle.len());
                assert!(!before.ptr_eq(&map));
            }
            Operation::Delete(i) => {
                let before = map.clone();
                if oracle.shift_remove(&i).is_some() {
                    map = map.delete(&key(i)).unwrap();
                    assert!(map.get(&key(i)).is_none());
                } else {
                    map.delete(&key(i)).unwrap_err();
                    assert!(before.ptr_eq(&map));
                }
                assert_eq!(map.len(), oracle.len());
            }
            Operation::Dump => {
                assert_eq!(map.len(), oracle.len());
                let got: Vec<(Value, Value)> = map.to_entries();
                let want: Vec<(Value, Value)> =
                    oracle.iter().map(|(k, v)| (key(*k), Value::from(*v))).collect();
                assert_eq!(got, want);
                for (k, v) in &oracle {
                    assert_eq!(map.get(&key(*k)), Some(&Value::from(*v)));
                }
                // A permuted rebuild is equal and hashes identically.
                let mut reversed = map.to_entries();
                reversed.reverse();
                let rebuilt = FrozenMap::from_entries(reversed).unwrap();
                assert_eq!(rebuilt, map);
                assert_eq!(rebuilt.try_hash().unwrap(), map.try_hash().unwrap());
            }
        }
    }
}

const N: i64 = 400;

pub(crate) fn set_delete_dense() -> impl Iterator<Item = Operation> {
    (0..N)
        .map(Operation::Set)
        .chain(std::iter::once(Operation::Dump))
        .chain((0..N).map(Operation::Delete))
        .chain(std::iter::once(Operation::Dump))
}

pub(crate) fn set_delete_sparse() -> impl Iterator<Item = Operation> {
    let mut rng = rand::thread_rng();
    let keys: Vec<i64> = (0..N).map(|_| rng.gen_range(0..N / 2)).collect();
    let deletes: Vec<i64> = (0..N).map(|_| rng.gen_range(0..N)).collect();
    keys.into_iter()
        .map(Operation::Set)
        .chain(std::iter::once(Operation::Dump))
        .chain(deletes.into_iter().map(Operation::Delete))
        .chain(std::iter::once(Operation::Dump))
}
