use crate::test_workloads::{self, run_map_workload};
use crate::{Error, FrozenMap, SortBy, Value};

fn entries() -> Vec<(Value, Value)> {
    vec![
        (Value::from("Sulla"), Value::from("Marco")),
        (Value::from("Hicks"), Value::from("Bill")),
        (
            Value::Map(FrozenMap::from_entries([(Value::from(1), Value::from(2))]).unwrap()),
            Value::from("frozen"),
        ),
    ]
}

fn fd() -> FrozenMap {
    FrozenMap::from_entries(entries()).unwrap()
}

fn fd_unhashable() -> FrozenMap {
    FrozenMap::from_entries([(Value::from(1), Value::List(vec![]))]).unwrap()
}

#[test]
fn workload_dense() {
    run_map_workload(test_workloads::set_delete_dense())
}

#[test]
fn workload_sparse() {
    run_map_workload(test_workloads::set_delete_sparse())
}

// -- construction ------------------------------------------------------

#[test]
fn empty_constructions_share_the_singleton() {
    let a = FrozenMap::new();
    let b = FrozenMap::from_entries([]).unwrap();
    let c = FrozenMap::from_value(Value::Dict(vec![])).unwrap();
    let d = FrozenMap::from_value(Value::List(vec![])).unwrap();
    let e = FrozenMap::from_value_with(Value::Dict(vec![]), []).unwrap();
    assert!(a.ptr_eq(&b));
    assert!(a.ptr_eq(&c));
    assert!(a.ptr_eq(&d));
    assert!(a.ptr_eq(&e));
    assert!(a.is_empty());
}

#[test]
fn wrapping_a_map_is_an_identity_no_op() {
    let m = fd();
    let wrapped = FrozenMap::from_value(Value::Map(m.clone())).unwrap();
    assert!(wrapped.ptr_eq(&m));
    let wrapped = FrozenMap::from_value_with(Value::Map(m.clone()), []).unwrap();
    assert!(wrapped.ptr_eq(&m));
}

#[test]
fn overrides_defeat_the_identity_short_circuit() {
    let m = fd();
    let with = FrozenMap::from_value_with(
        Value::Map(m.clone()),
        [(Value::from("Sulla"), Value::from("Mario"))],
    )
    .unwrap();
    assert!(!with.ptr_eq(&m));
    assert_eq!(with.get(&Value::from("Sulla")), Some(&Value::from("Mario")));
    assert_eq!(with.len(), m.len());
    // The original is untouched.
    assert_eq!(m.get(&Value::from("Sulla")), Some(&Value::from("Marco")));
}

#[test]
fn pair_sequences_construct_like_dicts() {
    let from_pairs = FrozenMap::from_value(Value::List(vec![
        Value::tuple([Value::from("a"), Value::from(1)]),
        Value::List(vec![Value::from("b"), Value::from(2)]),
        Value::tuple([Value::from("a"), Value::from(3)]),
    ]))
    .unwrap();
    let expected = FrozenMap::from_entries([
        (Value::from("a"), Value::from(3)),
        (Value::from("b"), Value::from(2)),
    ])
    .unwrap();
    assert_eq!(from_pairs, expected);
    // Duplicate keys keep their first slot with the last value.
    assert_eq!(from_pairs.key(0).unwrap(), &Value::from("a"));
    assert_eq!(from_pairs.value(0).unwrap(), &Value::from(3));
}

#[test]
fn bad_sources_are_rejected() {
    assert!(matches!(
        FrozenMap::from_value(Value::from(3)),
        Err(Error::InvalidSource { kind: "int", .. })
    ));
    assert!(matches!(
        FrozenMap::from_value(Value::List(vec![Value::from(1)])),
        Err(Error::InvalidSource { kind: "int", .. })
    ));
    assert!(matches!(
        FrozenMap::from_value(Value::List(vec![Value::tuple([Value::from(1)])])),
        Err(Error::InvalidSource { kind: "tuple", .. })
    ));
}

#[test]
fn unhashable_keys_are_construction_errors() {
    let err = FrozenMap::from_entries([(Value::List(vec![]), Value::from(1))]).unwrap_err();
    assert_eq!(err, Error::UnhashableKey { kind: "list" });
}

#[test]
fn from_keys_clones_the_default() {
    let m = FrozenMap::from_keys([Value::from("a"), Value::from("b")], Value::Null).unwrap();
    assert_eq!(m.len(), 2);
    assert_eq!(m.get(&Value::from("a")), Some(&Value::Null));
    assert_eq!(m.get(&Value::from("b")), Some(&Value::Null));
}

// -- reads -------------------------------------------------------------

#[test]
fn lookups() {
    let m = fd();
    assert_eq!(m.get(&Value::from("Sulla")), Some(&Value::from("Marco")));
    assert_eq!(m.get(&Value::from("God")), None);
    assert!(m.contains_key(&Value::from("Hicks")));
    assert!(!m.contains_key(&Value::from("God")));
    assert_eq!(
        m.get_or(&Value::from("God"), &Value::Null),
        &Value::Null
    );
    assert_eq!(m[&Value::from("Hicks")], Value::from("Bill"));
    let err = m.fetch(&Value::from("God")).unwrap_err();
    assert!(matches!(err, Error::KeyNotFound { .. }));
}

#[test]
#[should_panic(expected = "key not found")]
fn index_missing_panics() {
    let _ = fd()[&Value::from("God")];
}

#[test]
fn unhashable_probe_reads_as_absent() {
    let m = fd();
    assert_eq!(m.get(&Value::List(vec![])), None);
    assert!(!m.contains_key(&Value::List(vec![])));
}

#[test]
fn positional_accessors_support_negative_indices() {
    let m = fd();
    assert_eq!(m.key(0).unwrap(), &Value::from("Sulla"));
    assert_eq!(m.value(1).unwrap(), &Value::from("Bill"));
    assert_eq!(m.key(-3).unwrap(), &Value::from("Sulla"));
    assert_eq!(m.item(-1).unwrap().1, &Value::from("frozen"));
    assert!(matches!(
        m.key(3),
        Err(Error::IndexOutOfRange { index: 3, len: 3 })
    ));
    assert!(matches!(
        m.value(-4),
        Err(Error::IndexOutOfRange { index: -4, len: 3 })
    ));
}

#[test]
fn get_deep_traverses_mixed_structures() {
    let inner = FrozenMap::from_entries([(
        Value::from("xs"),
        Value::List(vec![Value::from(10), Value::from(20)]),
    )])
    .unwrap();
    let m = FrozenMap::from_entries([(Value::from("inner"), Value::Map(inner))]).unwrap();

    let path = [Value::from("inner"), Value::from("xs"), Value::from(-1)];
    assert_eq!(m.get_deep(&path).unwrap(), &Value::from(20));

    let miss = m.get_deep(&[Value::from("inner"), Value::from("ys")]);
    assert!(matches!(miss, Err(Error::KeyNotFound { .. })));

    let overflow = m.get_deep(&[Value::from("inner"), Value::from("xs"), Value::from(5)]);
    assert!(matches!(overflow, Err(Error::IndexOutOfRange { .. })));

    let bad_step = m.get_deep(&[Value::from("inner"), Value::from("xs"), Value::from("nope")]);
    assert!(matches!(bad_step, Err(Error::InvalidSource { .. })));

    let default = m
        .get_deep(&[Value::from("gone")])
        .ok()
        .cloned()
        .unwrap_or(Value::Null);
    assert_eq!(default, Value::Null);
}

#[test]
fn iteration_and_reverse_iteration() {
    let m = fd();
    let keys: Vec<&Value> = m.keys().iter().collect();
    assert_eq!(keys.len(), 3);
    assert_eq!(keys[0], &Value::from("Sulla"));
    let mut reversed: Vec<&Value> = m.keys().iter().rev().collect();
    reversed.reverse();
    assert_eq!(keys, reversed);

    let pairs: Vec<(&Value, &Value)> = m.iter().collect();
    let mut back: Vec<(&Value, &Value)> = m.iter().rev().collect();
    back.reverse();
    assert_eq!(pairs, back);
}

// -- equality & hashing ------------------------------------------------

#[test]
fn equality_ignores_insertion_order() {
    let mut reordered = entries();
    reordered.reverse();
    let a = fd();
    let b = FrozenMap::from_entries(reordered).unwrap();
    assert!(!a.ptr_eq(&b));
    assert_eq!(a, b);
    assert_eq!(a.try_hash().unwrap(), b.try_hash().unwrap());
}

#[test]
fn hashing_is_idempotent() {
    let m = fd();
    let first = m.try_hash().unwrap();
    assert_eq!(m.try_hash().unwrap(), first);
    assert_eq!(m.try_hash().unwrap(), first);
}

#[test]
fn unhashability_is_sticky() {
    let m = fd_unhashable();
    let first = m.try_hash().unwrap_err();
    assert_eq!(first, Error::Unhashable { kind: "list" });
    // Memoized: same failure on every later attempt, never a success.
    assert_eq!(m.try_hash().unwrap_err(), first);
    assert_eq!(m.try_hash().unwrap_err(), first);
    assert!(!m.is_hashable());
}

#[test]
fn entries_eq_accepts_mapping_like_operands() {
    let m = FrozenMap::from_entries([
        (Value::from("a"), Value::from(1)),
        (Value::from("b"), Value::from(2)),
    ])
    .unwrap();
    let dict = Value::Dict(vec![
        (Value::from("b"), Value::from(2)),
        (Value::from("a"), Value::from(1)),
    ]);
    assert!(m.entries_eq(&dict));
    assert!(m.entries_eq(&Value::Map(m.clone())));
    assert!(!m.entries_eq(&Value::from(1)));
    assert!(!m.entries_eq(&Value::Dict(vec![])));
}

#[test]
fn round_trip_through_entries_preserves_equality() {
    let m = fd();
    let back = FrozenMap::from_entries(m.to_entries()).unwrap();
    assert_eq!(back, m);
    assert!(FrozenMap::from_entries(FrozenMap::new().to_entries())
        .unwrap()
        .ptr_eq(&FrozenMap::new()));
}

// -- copies ------------------------------------------------------------

#[test]
fn clone_is_a_free_copy() {
    let m = fd();
    assert!(m.clone().ptr_eq(&m));
}

#[test]
fn deep_copy_shares_hashable_instances_only() {
    let hashable = fd();
    assert!(hashable.deep_copy().ptr_eq(&hashable));

    let unhashable = fd_unhashable();
    let copy = unhashable.deep_copy();
    assert!(!copy.ptr_eq(&unhashable));
    assert_eq!(copy, unhashable);
}

// -- combinators -------------------------------------------------------

fn small() -> FrozenMap {
    FrozenMap::from_entries([
        (Value::from("a"), Value::from(1)),
        (Value::from("b"), Value::from(2)),
    ])
    .unwrap()
}

#[test]
fn set_inserts_and_replaces() {
    let m = small();
    let with_c = m.set(Value::from("c"), Value::from(3)).unwrap();
    assert_eq!(
        with_c,
        FrozenMap::from_entries([
            (Value::from("a"), Value::from(1)),
            (Value::from("b"), Value::from(2)),
            (Value::from("c"), Value::from(3)),
        ])
        .unwrap()
    );
    let replaced = m.set(Value::from("a"), Value::from(9)).unwrap();
    assert_eq!(replaced.key(0).unwrap(), &Value::from("a"));
    assert_eq!(replaced.value(0).unwrap(), &Value::from(9));
    // The receiver is unchanged.
    assert_eq!(m.len(), 2);
    assert_eq!(m.get(&Value::from("a")), Some(&Value::from(1)));
}

#[test]
fn delete_removes_and_canonicalizes_empty() {
    let m = small();
    let without_a = m.delete(&Value::from("a")).unwrap();
    assert_eq!(
        without_a,
        FrozenMap::from_entries([(Value::from("b"), Value::from(2))]).unwrap()
    );
    let empty = without_a.delete(&Value::from("b")).unwrap();
    assert!(empty.ptr_eq(&FrozenMap::new()));

    let err = m.delete(&Value::from("zzz")).unwrap_err();
    assert!(matches!(err, Error::KeyNotFound { .. }));
}

#[test]
fn add_merges_mapping_like_operands() {
    let m = small();
    let merged = m
        .add(&Value::Dict(vec![
            (Value::from("b"), Value::from(20)),
            (Value::from("c"), Value::from(3)),
        ]))
        .unwrap();
    assert_eq!(merged.get(&Value::from("b")), Some(&Value::from(20)));
    assert_eq!(merged.get(&Value::from("c")), Some(&Value::from(3)));
    assert_eq!(merged.len(), 3);

    let err = m.add(&Value::from(1)).unwrap_err();
    assert_eq!(
        err,
        Error::UnsupportedOperand {
            op: "+",
            kind: "int"
        }
    );

    let typed = &m + &small();
    assert_eq!(typed, m);
}

#[test]
fn sub_excludes_candidate_keys() {
    let m = small();
    let only_b = m
        .sub(&Value::List(vec![Value::from("a"), Value::from("zzz")]))
        .unwrap();
    assert_eq!(
        only_b,
        FrozenMap::from_entries([(Value::from("b"), Value::from(2))]).unwrap()
    );

    // Unhashable candidates can never match a key and are skipped.
    let unchanged = m.sub(&Value::List(vec![Value::List(vec![])])).unwrap();
    assert_eq!(unchanged, m);

    // Strings are not key iterables for subtraction.
    let err = m.sub(&Value::from("ab")).unwrap_err();
    assert_eq!(
        err,
        Error::UnsupportedOperand {
            op: "-",
            kind: "str"
        }
    );

    let empty = m
        .sub(&Value::List(vec![Value::from("a"), Value::from("b")]))
        .unwrap();
    assert!(empty.ptr_eq(&FrozenMap::new()));
}

#[test]
fn intersect_follows_operand_shape() {
    let m = small();
    // Mapping operand: whole entries must match.
    let same_value = m
        .intersect(&Value::Dict(vec![
            (Value::from("a"), Value::from(1)),
            (Value::from("b"), Value::from(99)),
        ]))
        .unwrap();
    assert_eq!(
        same_value,
        FrozenMap::from_entries([(Value::from("a"), Value::from(1))]).unwrap()
    );
    // Key-iterable operand: keys alone decide.
    let by_keys = m
        .intersect(&Value::List(vec![Value::from("b"), Value::from("x")]))
        .unwrap();
    assert_eq!(
        by_keys,
        FrozenMap::from_entries([(Value::from("b"), Value::from(2))]).unwrap()
    );
    let err = m.intersect(&Value::from(1.5)).unwrap_err();
    assert!(matches!(err, Error::UnsupportedOperand { op: "&", .. }));

    let other = FrozenMap::from_entries([
        (Value::from("b"), Value::from(2)),
        (Value::from("c"), Value::from(3)),
    ])
    .unwrap();
    let typed = &m & &other;
    assert_eq!(
        typed,
        FrozenMap::from_entries([(Value::from("b"), Value::from(2))]).unwrap()
    );
}

#[test]
fn is_disjoint_views_elements_as_keys() {
    let m = small();
    assert!(!m
        .is_disjoint(&Value::List(vec![Value::from("a")]))
        .unwrap());
    assert!(m
        .is_disjoint(&Value::List(vec![Value::from("x"), Value::from("y")]))
        .unwrap());
    assert!(matches!(
        m.is_disjoint(&Value::from(1)),
        Err(Error::UnsupportedOperand { .. })
    ));
}

#[test]
fn sorted_reorders_without_mutating() {
    let m = FrozenMap::from_entries([
        (Value::from("b"), Value::from(1)),
        (Value::from("a"), Value::from(3)),
        (Value::from("c"), Value::from(2)),
    ])
    .unwrap();

    let by_keys = m.sorted(SortBy::Keys);
    let keys: Vec<&Value> = by_keys.keys().iter().collect();
    assert_eq!(
        keys,
        [&Value::from("a"), &Value::from("b"), &Value::from("c")]
    );

    let by_values = m.sorted(SortBy::Values);
    let values: Vec<&Value> = by_values.values().iter().collect();
    assert_eq!(values, [&Value::from(1), &Value::from(2), &Value::from(3)]);

    let descending = m.sorted_by(|a, b| b.0.cmp(a.0));
    let keys: Vec<&Value> = descending.keys().iter().collect();
    assert_eq!(
        keys,
        [&Value::from("c"), &Value::from("b"), &Value::from("a")]
    );

    assert_eq!(by_keys, m);
    assert_eq!(m.key(0).unwrap(), &Value::from("b"));
}

// -- display -----------------------------------------------------------

#[test]
fn display_is_canonical_and_stable() {
    let m = small();
    let rendered = format!("{m}");
    assert_eq!(rendered, r#"FrozenMap({"a": 1, "b": 2})"#);
    assert_eq!(format!("{m:?}"), rendered);
    assert_eq!(format!("{m}"), rendered);
    assert_eq!(format!("{}", FrozenMap::new()), "FrozenMap({})");
}

#[test]
fn display_renders_nested_values() {
    let m = FrozenMap::from_entries([(
        Value::from("xs"),
        Value::tuple([Value::from(1), Value::bytes([0x00, 0x41])]),
    )])
    .unwrap();
    assert_eq!(format!("{m}"), r#"FrozenMap({"xs": (1, b"\x00A")})"#);
}

// -- concurrency -------------------------------------------------------

#[test]
fn maps_are_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<FrozenMap>();
    assert_send_sync::<Value>();
    assert_send_sync::<crate::FrozenSet>();
}

#[test]
fn racing_first_hashes_converge() {
    let m = fd();
    let mut results = Vec::new();
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let m = m.clone();
                scope.spawn(move || m.try_hash().unwrap())
            })
            .collect();
        for handle in handles {
            results.push(handle.join().unwrap());
        }
    });
    assert!(results.windows(2).all(|w| w[0] == w[1]));
}
