use super::*;
use pretty_assertions::assert_eq;
use tern_ir::StringInterner;

struct Hierarchy {
    table: ClassTable,
    animal: ClassId,
    dog: ClassId,
    cat: ClassId,
    stone: ClassId,
    pet: ClassId,
    named: ClassId,
}

/// animal <- dog, animal <- cat; dog and cat implement pet and named.
fn hierarchy() -> Hierarchy {
    let names = StringInterner::new();
    let table = ClassTable::new();
    let animal = table.declare_class(names.intern("Animal"), None);
    let dog = table.declare_class(names.intern("Dog"), Some(animal));
    let cat = table.declare_class(names.intern("Cat"), Some(animal));
    let stone = table.declare_class(names.intern("Stone"), None);
    let pet = table.declare_interface(names.intern("Pet"));
    let named = table.declare_interface(names.intern("Named"));
    Hierarchy {
        table,
        animal,
        dog,
        cat,
        stone,
        pet,
        named,
    }
}

#[test]
fn declare_is_idempotent() {
    let names = StringInterner::new();
    let table = ClassTable::new();
    let a = table.declare_class(names.intern("A"), None);
    let again = table.declare_class(names.intern("A"), None);
    assert_eq!(a, again);
    assert_eq!(table.len(), 1);
    assert_eq!(table.lookup(names.intern("A")), Some(a));
}

#[test]
fn derives_from_is_reflexive_and_transitive() {
    let h = hierarchy();
    assert!(h.table.derives_from(h.dog, h.dog));
    assert!(h.table.derives_from(h.dog, h.animal));
    assert!(!h.table.derives_from(h.animal, h.dog));
    assert!(!h.table.derives_from(h.stone, h.animal));
}

#[test]
fn siblings_collapse_to_parent() {
    let h = hierarchy();
    assert_eq!(
        h.table.common_ancestor(&[h.dog, h.cat]),
        CommonAncestor::Unique(h.animal)
    );
    assert_eq!(
        h.table.common_ancestor(&[h.dog, h.animal]),
        CommonAncestor::Unique(h.animal)
    );
    assert_eq!(h.table.common_ancestor(&[h.dog]), CommonAncestor::Unique(h.dog));
}

#[test]
fn unrelated_classes_have_no_ancestor() {
    let h = hierarchy();
    assert_eq!(h.table.common_ancestor(&[h.dog, h.stone]), CommonAncestor::None);
    assert_eq!(h.table.common_ancestor(&[]), CommonAncestor::None);
}

#[test]
fn two_shared_interfaces_are_ambiguous() {
    let names = StringInterner::new();
    let table = ClassTable::new();
    let pet = table.declare_interface(names.intern("Pet"));
    let named = table.declare_interface(names.intern("Named"));
    let dog = table.declare_class(names.intern("Dog"), None);
    let robot = table.declare_class(names.intern("Robot"), None);
    for class in [dog, robot] {
        table.implement(class, pet);
        table.implement(class, named);
    }
    assert_eq!(table.common_ancestor(&[dog, robot]), CommonAncestor::Ambiguous);
}

#[test]
fn interface_and_parent_together_prefer_nothing_shared() {
    let h = hierarchy();
    h.table.implement(h.dog, h.pet);
    h.table.implement(h.stone, h.named);
    assert_eq!(h.table.common_ancestor(&[h.dog, h.stone]), CommonAncestor::None);
    assert!(h.table.derives_from(h.dog, h.pet));
}
