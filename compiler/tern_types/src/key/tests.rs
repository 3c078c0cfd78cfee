#![allow(
    clippy::unwrap_used,
    reason = "test code uses unwrap for concise assertions"
)]

use super::*;
use pretty_assertions::assert_eq;

#[test]
fn any_is_preinterned() {
    let keys = KeyInterner::new();
    assert_eq!(keys.intern(KeyData::Any), Key::ANY);
    assert_eq!(keys.lookup(Key::ANY), KeyData::Any);
    assert!(keys.is_empty());
}

#[test]
fn equal_keys_share_handle() {
    let keys = KeyInterner::new();
    let a = keys.int(3);
    let b = keys.string("name");
    assert_eq!(keys.int(3), a);
    assert_eq!(keys.string("name"), b);
    assert_ne!(a, b);
    assert_eq!(keys.lookup(a), KeyData::Int(3));
    assert_eq!(keys.as_int(a), Some(3));
    assert_eq!(keys.as_int(b), None);
}

#[test]
fn int_and_string_keys_are_distinct() {
    let keys = KeyInterner::new();
    assert_ne!(keys.int(1), keys.string("1"));
}

#[test]
fn concurrent_intern_is_consistent() {
    let keys = KeyInterner::new();
    let handles: Vec<Vec<Key>> = std::thread::scope(|scope| {
        let workers: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| (0..100).map(|i| keys.int(i)).collect::<Vec<_>>()))
            .collect();
        workers.into_iter().map(|w| w.join().unwrap()).collect()
    });
    for run in &handles[1..] {
        assert_eq!(run, &handles[0]);
    }
    assert_eq!(keys.len(), 101);
    for (i, key) in handles[0].iter().enumerate() {
        assert_eq!(keys.as_int(*key), Some(i as i64));
    }
}

#[test]
fn multikey_paths() {
    let keys = KeyInterner::new();
    let root = MultiKey::root();
    assert!(root.is_root());

    let path = root.child(keys.int(0)).child(Key::ANY);
    assert_eq!(path.depth(), 2);
    assert_eq!(path.display(&keys).to_string(), "[0][*]");

    let field = MultiKey::new(vec![keys.string("x")]);
    assert_eq!(field.display(&keys).to_string(), "['x']");
}

#[test]
fn cloned_multikey_shares_storage() {
    let path = MultiKey::any_key();
    let copy = path.clone();
    assert!(path.ptr_eq(&copy));
    assert_eq!(path.keys(), &[Key::ANY]);
}
