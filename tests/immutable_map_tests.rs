//! Integration tests for ImmutableMap.
//!
//! Covers construction, lookup, functional update, deletion, bulk update,
//! views, equality and the structural hash.

use hamt_map::persistent::{self, ImmutableMap, MapError};
use rstest::rstest;
use std::collections::HashSet;

// =============================================================================
// Empty map
// =============================================================================

#[rstest]
fn test_new_creates_empty_map() {
    let map: ImmutableMap<String, i32> = ImmutableMap::new();
    assert!(map.is_empty());
    assert_eq!(map.len(), 0);
    assert_eq!(map.get("key"), None);
}

#[rstest]
fn test_empty_default_and_new_agree() {
    let from_new: ImmutableMap<String, i32> = ImmutableMap::new();
    let from_default: ImmutableMap<String, i32> = ImmutableMap::default();
    let from_function: ImmutableMap<String, i32> = persistent::empty();
    assert_eq!(from_new, from_default);
    assert_eq!(from_new, from_function);
    assert_eq!(from_new.structural_hash(), from_function.structural_hash());
}

// =============================================================================
// Scenario: two sets, lookups with and without default
// =============================================================================

#[rstest]
fn test_set_two_keys_then_get() {
    let map = persistent::empty().set("a", 1).set("b", 2);

    assert_eq!(map.len(), 2);
    assert_eq!(map.get("a"), Some(&1));
    assert_eq!(*map.get_or("c", &-1), -1);
    assert_eq!(map.get("c"), None);
}

#[rstest]
fn test_lookup_fails_with_offending_key() {
    let map = ImmutableMap::new().set("a".to_string(), 1);

    assert_eq!(map.lookup("a"), Ok(&1));
    assert_eq!(
        map.lookup("missing"),
        Err(MapError::KeyNotFound {
            key: "missing".to_string()
        })
    );
}

#[rstest]
fn test_contains_key() {
    let map = ImmutableMap::new().set(1, "one");
    assert!(map.contains_key(&1));
    assert!(!map.contains_key(&2));
}

// =============================================================================
// Functional update
// =============================================================================

#[rstest]
fn test_set_does_not_modify_original() {
    let map1 = ImmutableMap::new().set("key".to_string(), 1);
    let map2 = map1.set("key2".to_string(), 2);

    assert_eq!(map1.len(), 1);
    assert_eq!(map1.get("key2"), None);
    assert_eq!(map2.len(), 2);
    assert_eq!(map2.get("key"), Some(&1));
    assert_eq!(map2.get("key2"), Some(&2));
}

#[rstest]
fn test_set_replaces_value_without_growing() {
    let map1 = ImmutableMap::new().set("key", 1);
    let map2 = map1.set("key", 2);

    assert_eq!(map2.len(), 1);
    assert_eq!(map1.get("key"), Some(&1));
    assert_eq!(map2.get("key"), Some(&2));
}

#[rstest]
fn test_set_same_value_returns_equal_map() {
    let map1 = ImmutableMap::new().set("key", 1);
    let map2 = map1.set("key", 1);

    assert!(map1.ptr_eq(&map2));
    assert_eq!(map1, map2);
}

#[rstest]
#[case(10)]
#[case(100)]
#[case(5000)]
fn test_set_many_keys(#[case] count: i32) {
    let mut map = ImmutableMap::new();
    for index in 0..count {
        map = map.set(index, index * 2);
    }

    assert_eq!(map.len(), count as usize);
    for index in 0..count {
        assert_eq!(map.get(&index), Some(&(index * 2)));
    }
    assert_eq!(map.get(&count), None);
}

// =============================================================================
// Scenario: deletion
// =============================================================================

#[rstest]
fn test_delete_only_key_yields_empty_map() {
    let map = persistent::empty().set("a".to_string(), 1);
    let removed = map.delete("a").unwrap();

    assert_eq!(removed.len(), 0);
    assert!(removed.is_empty());
    assert_eq!(removed, ImmutableMap::new());
}

#[rstest]
fn test_delete_from_empty_map_fails() {
    let map: ImmutableMap<String, i32> = persistent::empty();
    assert_eq!(
        map.delete("a"),
        Err(MapError::KeyNotFound {
            key: "a".to_string()
        })
    );
}

#[rstest]
fn test_delete_absent_key_fails() {
    let map = ImmutableMap::new().set(1, 1).set(2, 2);
    assert_eq!(map.delete(&3), Err(MapError::KeyNotFound { key: 3 }));
    assert_eq!(map.len(), 2);
}

#[rstest]
fn test_delete_does_not_modify_original() {
    let map = ImmutableMap::new().set(1, "one").set(2, "two");
    let removed = map.delete(&1).unwrap();

    assert_eq!(map.len(), 2);
    assert_eq!(map.get(&1), Some(&"one"));
    assert_eq!(removed.len(), 1);
    assert_eq!(removed.get(&1), None);
    assert_eq!(removed.get(&2), Some(&"two"));
}

#[rstest]
fn test_delete_even_keys_leaves_odd_keys() {
    let mut map = ImmutableMap::new();
    for index in 0..1000 {
        map = map.set(index, index);
    }
    for index in (0..1000).step_by(2) {
        map = map.delete(&index).unwrap();
    }

    assert_eq!(map.len(), 500);
    for index in 0..1000 {
        if index % 2 == 0 {
            assert_eq!(map.get(&index), None);
        } else {
            assert_eq!(map.get(&index), Some(&index));
        }
    }
}

// =============================================================================
// Bulk update
// =============================================================================

#[rstest]
fn test_update_applies_pairs_in_order() {
    let map = ImmutableMap::new().set("a", 1);
    let updated = map.update([("b", 2), ("c", 3), ("b", 20)]).unwrap();

    assert_eq!(updated.len(), 3);
    assert_eq!(updated.get("b"), Some(&20));
    assert_eq!(map.len(), 1);
}

#[rstest]
fn test_update_matches_repeated_set() {
    let pairs: Vec<(i32, i32)> = (0..500).map(|index| (index % 300, index)).collect();
    let base = ImmutableMap::new().set(-1, -1);

    let mut expected = base.clone();
    for (key, value) in pairs.iter().copied() {
        expected = expected.set(key, value);
    }
    let updated = base.update(pairs).unwrap();

    assert_eq!(updated, expected);
    assert_eq!(updated.len(), 301);
}

#[rstest]
fn test_update_accepts_two_item_sequences() {
    let rows = vec![vec![1, 10], vec![2, 20]];
    let map: ImmutableMap<i32, i32> = ImmutableMap::new().update(rows).unwrap();
    assert_eq!(map.get(&2), Some(&20));
}

#[rstest]
fn test_update_rejects_malformed_element_without_applying() {
    let map = ImmutableMap::new().set(0, 0);
    let result = map.update(vec![vec![1, 10], vec![2, 20, 200], vec![3, 30]]);

    assert_eq!(
        result,
        Err(MapError::ShapeMismatch {
            position: 1,
            length: 3
        })
    );
    assert_eq!(map.len(), 1);
}

#[rstest]
fn test_merge_prefers_other() {
    let left = ImmutableMap::new().set(1, "a").set(2, "b");
    let right = ImmutableMap::new().set(2, "B").set(3, "C");
    let merged = left.merge(&right);

    assert_eq!(merged.len(), 3);
    assert_eq!(merged.get(&2), Some(&"B"));
    assert_eq!(left.get(&2), Some(&"b"));
}

// =============================================================================
// Views and iteration
// =============================================================================

#[rstest]
fn test_views_cover_every_entry() {
    let map: ImmutableMap<i32, i32> = (0..200).map(|index| (index, -index)).collect();

    let keys: HashSet<i32> = map.keys().iter().copied().collect();
    let values: HashSet<i32> = map.values().iter().copied().collect();
    let items: HashSet<(i32, i32)> = map.items().iter().map(|(key, value)| (*key, *value)).collect();

    assert_eq!(keys, (0..200).collect());
    assert_eq!(values, (0..200).map(|index| -index).collect());
    assert_eq!(items.len(), 200);
    assert_eq!(map.keys().len(), 200);
}

#[rstest]
fn test_views_restart_and_outlive_later_updates() {
    let map: ImmutableMap<i32, i32> = (0..50).map(|index| (index, index)).collect();
    let keys = map.keys();
    let _bigger = map.set(1000, 1000);

    assert_eq!(keys.iter().count(), 50);
    assert_eq!(keys.iter().count(), 50);
    assert!(!keys.contains(&1000));
}

#[rstest]
fn test_items_view_contains_checks_value() {
    let map = ImmutableMap::new().set("a", 1);
    assert!(map.items().contains("a", &1));
    assert!(!map.items().contains("a", &2));
    assert!(!map.items().contains("b", &1));
}

#[rstest]
fn test_into_iterator_for_owned_and_borrowed() {
    let map = ImmutableMap::new().set(1, 10).set(2, 20);

    let mut borrowed: Vec<(i32, i32)> = (&map).into_iter().map(|(k, v)| (*k, *v)).collect();
    borrowed.sort_unstable();
    let mut owned: Vec<(i32, i32)> = map.into_iter().collect();
    owned.sort_unstable();

    assert_eq!(borrowed, vec![(1, 10), (2, 20)]);
    assert_eq!(owned, borrowed);
}

// =============================================================================
// Equality and structural hash
// =============================================================================

#[rstest]
fn test_equality_ignores_insertion_order() {
    let forward: ImmutableMap<i32, i32> = (0..300).map(|index| (index, index)).collect();
    let backward: ImmutableMap<i32, i32> = (0..300).rev().map(|index| (index, index)).collect();

    assert_eq!(forward, backward);
    assert_eq!(forward.structural_hash(), backward.structural_hash());
}

#[rstest]
fn test_maps_with_different_values_are_not_equal() {
    let left = ImmutableMap::new().set(1, 1).set(2, 2);
    let right = ImmutableMap::new().set(1, 1).set(2, 3);
    assert_ne!(left, right);
}

#[rstest]
fn test_maps_with_different_sizes_are_not_equal() {
    let left = ImmutableMap::new().set(1, 1);
    let right = left.set(2, 2);
    assert_ne!(left, right);
}

#[rstest]
fn test_structural_hash_is_stable() {
    let map = ImmutableMap::new().set("x", 1).set("y", 2);
    assert_eq!(map.structural_hash(), map.structural_hash());
    assert_eq!(map.structural_hash(), map.clone().structural_hash());
}

#[rstest]
#[allow(clippy::mutable_key_type)]
fn test_maps_can_be_hash_set_members() {
    let first = ImmutableMap::new().set(1, 1).set(2, 2);
    let second = ImmutableMap::new().set(2, 2).set(1, 1);
    let third = ImmutableMap::new().set(3, 3);

    let set: HashSet<ImmutableMap<i32, i32>> = [first, second, third].into_iter().collect();
    assert_eq!(set.len(), 2);
}

#[rstest]
#[allow(clippy::mutable_key_type)]
fn test_maps_can_be_nested_as_keys() {
    let inner = ImmutableMap::new().set(1, 1);
    let outer = ImmutableMap::new().set(inner.clone(), "inner");
    assert_eq!(outer.get(&inner), Some(&"inner"));
}

// =============================================================================
// Debug
// =============================================================================

#[rstest]
fn test_debug_format() {
    let map = ImmutableMap::new().set("key", 1);
    assert_eq!(format!("{map:?}"), "{\"key\": 1}");

    let empty: ImmutableMap<i32, i32> = ImmutableMap::new();
    assert_eq!(format!("{empty:?}"), "{}");
}
