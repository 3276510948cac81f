//! Shared containers across scoped threads

use std::thread;

use nebula_arena::{Arena, ArenaMap, ArenaSkipList};

const THREADS: usize = 4;
const PER_THREAD: usize = 250;

#[test]
fn test_map_shared_between_threads() {
    let arena = Arena::bump(4);
    let map = ArenaMap::new_in(&arena);

    thread::scope(|s| {
        for t in 0..THREADS {
            let map = &map;
            s.spawn(move || {
                for i in 0..PER_THREAD {
                    let key = t * PER_THREAD + i;
                    map.insert(key, key * 2);
                    assert_eq!(map.get(&key), Some(key * 2));
                }
            });
        }
    });

    assert_eq!(map.len(), THREADS * PER_THREAD);
    for key in 0..THREADS * PER_THREAD {
        assert_eq!(map.get(&key), Some(key * 2));
    }
}

#[test]
fn test_skiplist_shared_between_threads() {
    let arena = Arena::bump(4);
    let list = ArenaSkipList::new_in(&arena);

    thread::scope(|s| {
        for t in 0..THREADS {
            let list = &list;
            s.spawn(move || {
                for i in 0..PER_THREAD {
                    list.insert(i * THREADS + t, t);
                }
            });
        }
        s.spawn(|| {
            // Readers always observe a sorted sequence
            for _ in 0..50 {
                let keys: Vec<usize> = list.read().keys().copied().collect();
                assert!(keys.windows(2).all(|w| w[0] < w[1]));
            }
        });
    });

    assert_eq!(list.len(), THREADS * PER_THREAD);
    let keys: Vec<usize> = list.read().keys().copied().collect();
    assert_eq!(keys, (0..THREADS * PER_THREAD).collect::<Vec<_>>());
}

#[test]
fn test_raw_allocation_from_many_threads() {
    let arena = Arena::bump(1);

    let addresses: Vec<Vec<usize>> = thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let arena = &arena;
                s.spawn(move || {
                    (0..PER_THREAD)
                        .map(|_| arena.alloc(24, 8).as_ptr() as usize)
                        .collect::<Vec<usize>>()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let mut all: Vec<usize> = addresses.into_iter().flatten().collect();
    all.sort_unstable();
    all.dedup();
    assert_eq!(all.len(), THREADS * PER_THREAD, "no address handed out twice");
    assert!(all.iter().all(|&a| a % 8 == 0));
    assert_eq!(arena.stats().allocations, (THREADS * PER_THREAD) as u64);
}
