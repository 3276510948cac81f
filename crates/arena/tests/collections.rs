//! Container behavior through the public API
//!
//! Each container is driven the way application code would use it, with a
//! deliberately small arena so growth paths run.

use nebula_arena::{Arena, ArenaConfig, ArenaMap, ArenaSkipList, ArenaVec, Backing};

fn small_arena() -> Arena {
    Arena::with_config(
        ArenaConfig::tiny()
            .with_page_size(4096)
            .with_backing(Backing::Heap),
    )
    .unwrap()
}

#[derive(Debug, Clone, PartialEq)]
struct Person {
    name: String,
    age: u32,
}

// ---------------------------------------------------------------------------
// ArenaVec
// ---------------------------------------------------------------------------

#[test]
fn test_vec_append_then_truncate_keeps_prefix() {
    let arena = small_arena();
    let mut v = ArenaVec::from_slice_in(&[1, 2, 3], &arena);
    v.append(100..200);
    assert_eq!(v.len(), 103);
    assert!(v.capacity() >= 103);

    assert!(v.truncate(3));
    assert_eq!(v, [1, 2, 3]);
    assert!(!v.truncate(10));
}

#[test]
fn test_vec_clear_keeps_capacity() {
    let arena = small_arena();
    let mut v = ArenaVec::new_in(&arena);
    for i in 0..500u64 {
        v.push(i);
    }
    let cap = v.capacity();
    v.clear();
    assert!(v.is_empty());
    assert_eq!(v.capacity(), cap);
}

#[test]
fn test_vec_of_people() {
    let arena = small_arena();
    let mut people = ArenaVec::new_in(&arena);
    people.push(Person { name: "Alice".into(), age: 30 });
    people.push(Person { name: "Bob".into(), age: 25 });
    people.push(Person { name: "Charlie".into(), age: 35 });

    people.sort_stable_with(|a, b| a.age < b.age);
    let names: Vec<&str> = people.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["Bob", "Alice", "Charlie"]);

    let removed = people.remove_by(None, |_, p| p.age > 28);
    assert_eq!(removed, 2);

    let heap = people.into_heap();
    assert_eq!(heap, [Person { name: "Bob".into(), age: 25 }]);
}

#[test]
fn test_vec_edit_operations() {
    let arena = small_arena();
    let mut v = ArenaVec::from_iter_in([10, 20, 30], &arena);
    assert!(v.insert(1, 15));
    assert!(!v.insert(9, 0));
    assert!(v.set(0, 5));
    assert_eq!(v.remove(3), Some(30));
    assert_eq!(v.remove(3), None);
    assert_eq!(v, [5, 15, 20]);

    v.resize(5, 0);
    assert_eq!(v, [5, 15, 20, 0, 0]);
    assert_eq!(v.index_of(&0), Some(3));
    assert_eq!(v.last_index_of(&0), Some(4));
    assert_eq!(v.pop(), Some(0));
}

#[test]
fn test_vec_clone_into_other_arena() {
    let source = small_arena();
    let target = small_arena();
    let v = ArenaVec::from_slice_in(&["x".to_string(), "y".to_string()], &source);
    let copy = v.clone_in(&target);
    assert_eq!(copy, v);
    assert!(target.owns_slice(&copy));
    assert!(!source.owns_slice(&copy));
}

// ---------------------------------------------------------------------------
// ArenaMap
// ---------------------------------------------------------------------------

#[test]
fn test_map_set_delete_get() {
    let arena = Arena::bump(1);
    let map = ArenaMap::new_in(&arena);
    map.insert("a", 1);
    map.insert("b", 2);
    assert_eq!(map.remove("a"), Some(1));

    assert_eq!(map.get("a"), None);
    assert_eq!(map.get("b"), Some(2));
    assert_eq!(map.len(), 1);
}

#[test]
fn test_map_update_does_not_grow_len() {
    let arena = small_arena();
    let map = ArenaMap::new_in(&arena);
    assert_eq!(map.insert(1, "one"), None);
    assert_eq!(map.insert(1, "uno"), Some("one"));
    assert_eq!(map.len(), 1);
    assert_eq!(map.get(&1), Some("uno"));
}

#[test]
fn test_map_grows_and_keeps_entries() {
    let arena = small_arena();
    let map = ArenaMap::new_in(&arena);
    let initial = map.capacity();
    for i in 0..1_000u32 {
        map.insert(format!("key-{i}"), i);
    }
    assert!(map.capacity() > initial);
    assert_eq!(map.len(), 1_000);
    for i in 0..1_000u32 {
        assert_eq!(map.get(format!("key-{i}").as_str()), Some(i));
    }

    let snapshot = map.to_hash_map();
    assert_eq!(snapshot.len(), 1_000);
    assert_eq!(snapshot["key-500"], 500);
}

#[test]
fn test_map_read_guard() {
    let arena = small_arena();
    let map = ArenaMap::new_in(&arena);
    for (k, v) in [("x", 1), ("y", 2), ("z", 3)] {
        map.insert(k, v);
    }
    let guard = map.read();
    let mut keys: Vec<&str> = guard.keys().copied().collect();
    keys.sort_unstable();
    assert_eq!(keys, ["x", "y", "z"]);
    assert_eq!(guard.values().sum::<i32>(), 6);
}

// ---------------------------------------------------------------------------
// ArenaSkipList
// ---------------------------------------------------------------------------

#[test]
fn test_skiplist_thousand_keys_in_one_page_arena() {
    let arena = Arena::bump(1);
    let list = ArenaSkipList::new_in(&arena);
    for k in 0..1000 {
        list.insert(k, k * 10);
    }

    assert_eq!(list.len(), 1000);
    assert_eq!(list.get(&500), Some(5000));

    let keys: Vec<i32> = list.read().keys().copied().collect();
    assert_eq!(keys, (0..1000).collect::<Vec<_>>());
}

#[test]
fn test_skiplist_min_max() {
    let arena = small_arena();
    let list = ArenaSkipList::new_in(&arena);
    assert_eq!(list.min(), None);
    assert_eq!(list.max(), None);

    for k in [10, 5, 15, 3, 20] {
        list.insert(k, ());
    }
    assert_eq!(list.min().map(|(k, _)| k), Some(3));
    assert_eq!(list.max().map(|(k, _)| k), Some(20));
}

#[test]
fn test_skiplist_string_keys_in_order() {
    let arena = small_arena();
    let list = ArenaSkipList::new_in(&arena);
    for word in ["pear", "apple", "fig", "banana"] {
        list.insert(word.to_string(), word.len());
    }
    assert_eq!(list.remove("fig"), Some(3));
    assert_eq!(
        list.to_vec(),
        [
            ("apple".to_string(), 5),
            ("banana".to_string(), 6),
            ("pear".to_string(), 4)
        ]
    );
}
