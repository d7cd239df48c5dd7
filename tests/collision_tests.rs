//! Integration tests for fully colliding keys.
//!
//! `CollidingKey` hashes only its `bucket`, so every key in a bucket shares
//! one folded hash and must live in a collision node.

use hamt_map::persistent::{ImmutableMap, MapError};
use rstest::rstest;
use std::hash::{Hash, Hasher};

#[derive(Clone, Debug, PartialEq, Eq)]
struct CollidingKey {
    bucket: u8,
    id: u32,
}

impl Hash for CollidingKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bucket.hash(state);
    }
}

fn keys(bucket: u8, count: u32) -> Vec<CollidingKey> {
    (0..count).map(|id| CollidingKey { bucket, id }).collect()
}

#[rstest]
#[case(2)]
#[case(40)]
#[case(64)]
fn test_colliding_keys_are_all_retrievable(#[case] count: u32) {
    let mut map = ImmutableMap::new();
    for key in keys(0, count) {
        map = map.set(key.clone(), key.id);
    }

    assert_eq!(map.len(), count as usize);
    for key in keys(0, count) {
        assert_eq!(map.get(&key), Some(&key.id));
    }
    assert_eq!(map.get(&CollidingKey { bucket: 0, id: count }), None);
}

#[rstest]
fn test_colliding_keys_replace_values() {
    let mut map = ImmutableMap::new();
    for key in keys(1, 40) {
        map = map.set(key, 0);
    }
    let updated = map.set(CollidingKey { bucket: 1, id: 17 }, 99);

    assert_eq!(updated.len(), 40);
    assert_eq!(updated.get(&CollidingKey { bucket: 1, id: 17 }), Some(&99));
    assert_eq!(map.get(&CollidingKey { bucket: 1, id: 17 }), Some(&0));
}

#[rstest]
fn test_colliding_keys_delete_one_by_one() {
    let all = keys(2, 45);
    let mut map: ImmutableMap<CollidingKey, u32> =
        all.iter().map(|key| (key.clone(), key.id)).collect();

    for (removed, key) in all.iter().enumerate() {
        map = map.delete(key).unwrap();
        assert_eq!(map.len(), all.len() - removed - 1);
        assert_eq!(map.get(key), None);
        for remaining in &all[removed + 1..] {
            assert_eq!(map.get(remaining), Some(&remaining.id));
        }
    }
    assert!(map.is_empty());
}

#[rstest]
fn test_delete_absent_colliding_key_fails() {
    let map: ImmutableMap<CollidingKey, u32> =
        keys(3, 40).into_iter().map(|key| (key, 0)).collect();
    let absent = CollidingKey { bucket: 3, id: 1000 };

    assert_eq!(
        map.delete(&absent),
        Err(MapError::KeyNotFound { key: absent })
    );
}

#[rstest]
fn test_collision_buckets_coexist_with_each_other() {
    let mut map = ImmutableMap::new();
    for bucket in 0..20 {
        for key in keys(bucket, 5) {
            map = map.set(key, u32::from(bucket));
        }
    }

    assert_eq!(map.len(), 100);
    for bucket in 0..20 {
        for key in keys(bucket, 5) {
            assert_eq!(map.get(&key), Some(&u32::from(bucket)));
        }
    }
}

#[rstest]
fn test_collision_degrades_and_recovers_to_equal_map() {
    let survivor = CollidingKey { bucket: 4, id: 0 };
    let baseline = ImmutableMap::new().set(survivor.clone(), 0_u32);

    let mut map = baseline.clone();
    for key in keys(4, 48).into_iter().skip(1) {
        map = map.set(key.clone(), key.id);
    }
    assert_eq!(map.len(), 48);

    for key in keys(4, 48).into_iter().skip(1) {
        map = map.delete(&key).unwrap();
    }

    assert_eq!(map, baseline);
    assert_eq!(map.structural_hash(), baseline.structural_hash());
    assert_eq!(map.get(&survivor), Some(&0));
}

#[rstest]
fn test_colliding_keys_through_mutation_context() {
    let source: ImmutableMap<CollidingKey, u32> =
        keys(5, 20).into_iter().map(|key| (key, 0)).collect();
    let mut context = source.mutate();
    for key in keys(5, 60) {
        context.set(key.clone(), key.id).unwrap();
    }
    for key in keys(5, 60).into_iter().filter(|key| key.id % 2 == 0) {
        context.delete(&key).unwrap();
    }
    let result = context.finish().unwrap();

    assert_eq!(result.len(), 30);
    for key in keys(5, 60) {
        let expected = (key.id % 2 == 1).then_some(key.id);
        assert_eq!(result.get(&key).copied(), expected);
    }
    assert_eq!(source.len(), 20);
    for key in keys(5, 20) {
        assert_eq!(source.get(&key), Some(&0));
    }
}

#[rstest]
fn test_colliding_map_iterates_every_entry() {
    let map: ImmutableMap<CollidingKey, u32> =
        keys(6, 41).into_iter().map(|key| (key.clone(), key.id)).collect();

    let mut ids: Vec<u32> = map.keys().iter().map(|key| key.id).collect();
    ids.sort_unstable();
    assert_eq!(ids, (0..41).collect::<Vec<_>>());
    assert_eq!(map.values().len(), 41);
}
