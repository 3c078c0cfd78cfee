#![allow(
    clippy::unwrap_used,
    reason = "test code uses unwrap for concise assertions"
)]

use super::*;
use pretty_assertions::assert_eq;

#[test]
fn intern_is_idempotent() {
    let interner = StringInterner::new();

    let a = interner.intern("$items");
    let b = interner.intern("$count");
    let a2 = interner.intern("$items");

    assert_eq!(a, a2);
    assert_ne!(a, b);
    assert_eq!(interner.lookup(a), "$items");
    assert_eq!(interner.lookup(b), "$count");
}

#[test]
fn empty_string_is_preinterned() {
    let interner = StringInterner::new();
    assert_eq!(interner.intern(""), Name::EMPTY);
    assert_eq!(interner.lookup(Name::EMPTY), "");
    assert!(interner.is_empty());
}

#[test]
fn get_does_not_insert() {
    let interner = StringInterner::new();
    assert_eq!(interner.get("missing"), None);
    assert_eq!(interner.len(), 1);

    let name = interner.intern("present");
    assert_eq!(interner.get("present"), Some(name));
    assert_eq!(interner.len(), 2);
}

#[test]
fn shared_interner_sees_same_table() {
    let interner = SharedInterner::new();
    let other = interner.clone();

    let n1 = interner.intern("Foo");
    let n2 = other.intern("Foo");

    assert_eq!(n1, n2);
    assert_eq!(other.lookup(n1), "Foo");
}

#[test]
fn concurrent_interning_agrees() {
    let interner = SharedInterner::new();
    let words: Vec<String> = (0..200).map(|i| format!("ident_{i}")).collect();

    let results: Vec<Vec<Name>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let interner = interner.clone();
                let words = &words;
                scope.spawn(move || words.iter().map(|w| interner.intern(w)).collect())
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for names in &results[1..] {
        assert_eq!(names, &results[0]);
    }
    assert_eq!(interner.len(), 201);
}
