//! Basic arena usage
//!
//! Run with `RUST_LOG=debug cargo run --example basic_usage` to see the
//! arena's tracing events.

use nebula_arena::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
struct Person<'a> {
    name: &'a str,
    age: u32,
}

fn main() -> ArenaResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut arena = Arena::with_config(ArenaConfig::tiny())?;

    let heap_people = {
        println!("=== ArenaVec ===");

        let mut ints = ArenaVec::new_in(&arena);
        ints.extend_from_slice(&[1, 2, 3, 4, 5]);
        ints.append([6, 7, 8]);
        println!("len {}, capacity {}: {:?}", ints.len(), ints.capacity(), ints);
        for i in 9..=15 {
            ints.push(i);
        }
        println!("after more pushes: {ints:?}");

        let mut words = ArenaVec::from_slice_in(&["hello", "world"], &arena);
        words.extend_from_slice(&["arena", "memory"]);
        words.push("allocation");
        if let Some(at) = words.index_of(&"arena") {
            println!("'arena' found at index {at} in {words:?}");
        }

        println!("\n=== Arena values ===");
        let mut people = ArenaVec::new_in(&arena);
        people.push(&*arena.alloc_value(Person { name: arena.alloc_str("Alice"), age: 30 }));
        people.push(&*arena.alloc_value(Person { name: arena.alloc_str("Bob"), age: 25 }));
        people.push(&*arena.alloc_value(Person { name: arena.alloc_str("Charlie"), age: 35 }));
        people.sort_with(|a, b| a.age < b.age);
        for (i, p) in people.iter().enumerate() {
            println!("person {}: {} is {} years old", i + 1, p.name, p.age);
        }

        println!("\n=== ArenaMap ===");
        let ages = ArenaMap::new_in(&arena);
        for p in &people {
            ages.insert(p.name, p.age);
        }
        ages.remove("Bob");
        println!("{} entries, Alice -> {:?}", ages.len(), ages.get("Alice"));

        println!("\n=== ArenaSkipList ===");
        let scores = ArenaSkipList::new_in(&arena);
        for (name, score) in [("carol", 91), ("alice", 78), ("bob", 85)] {
            scores.insert(score, name);
        }
        scores.for_each_while(|score, name| {
            println!("{score}: {name}");
            true
        });
        println!("min {:?}, max {:?}", scores.min(), scores.max());

        println!("\n{}", arena.stats());

        // Owned copies survive the reset below
        people
            .iter()
            .map(|p| (p.name.to_string(), p.age))
            .collect::<Vec<_>>()
    };

    arena.reset();
    println!("after reset: {}", arena.stats());
    println!("heap copy: {heap_people:?}");

    arena.delete();
    Ok(())
}
