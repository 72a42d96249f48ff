use super::*;
use lsz_binder::{DeclId, GlobalId};

fn leaf(n: u32) -> TypeNode {
    TypeNode::Leaf(DeclId(n))
}

#[test]
fn test_union_of_two_nodes() {
    let mut arena = UnionArena::new();
    let union = arena.union_of(leaf(1), leaf(2), None);
    assert_eq!(arena.members(union), &[leaf(1), leaf(2)]);
}

#[test]
fn test_insert_dedups_in_first_merge_order() {
    let mut arena = UnionArena::new();
    let union = arena.union_of(leaf(2), leaf(1), None);

    assert!(!arena.insert(union, leaf(2)));
    assert!(arena.insert(union, TypeNode::Global(GlobalId(0))));
    assert_eq!(
        arena.members(union),
        &[leaf(2), leaf(1), TypeNode::Global(GlobalId(0))]
    );
}

#[test]
fn test_nested_unions_are_flattened() {
    let mut arena = UnionArena::new();
    let inner = arena.union_of(leaf(1), leaf(2), None);
    let outer = arena.union_of(TypeNode::Union(inner), leaf(3), None);

    assert_eq!(arena.members(outer), &[leaf(1), leaf(2), leaf(3)]);
    assert!(arena.members(outer).iter().all(|m| !m.is_union()));
    assert!(!arena.insert(outer, TypeNode::Union(outer)));
    assert!(!arena.insert(outer, TypeNode::Union(inner)));
}

#[test]
fn test_contains_checks_every_member_of_a_union() {
    let mut arena = UnionArena::new();
    let small = arena.union_of(leaf(1), leaf(2), None);
    let big = arena.union_of(TypeNode::Union(small), leaf(3), None);

    assert!(arena.contains(big, TypeNode::Union(small)));
    assert!(!arena.contains(small, TypeNode::Union(big)));
    assert!(arena.contains(big, leaf(3)));
}

#[test]
fn test_unknown_union_is_empty() {
    let arena = UnionArena::new();
    assert!(arena.members(UnionId(9)).is_empty());
    assert!(arena.is_empty());
}

#[test]
fn test_node_accessors() {
    assert_eq!(leaf(4).as_leaf(), Some(DeclId(4)));
    assert_eq!(leaf(4).as_global(), None);
    assert_eq!(
        TypeNode::Global(GlobalId(2)).as_global(),
        Some(GlobalId(2))
    );
    assert!(TypeNode::Union(UnionId(0)).is_union());
}

#[test]
fn test_flattening_overlapping_union_keeps_order_without_duplicates() {
    let mut arena = UnionArena::new();
    let left = arena.union_of(leaf(1), leaf(2), None);
    let right = arena.union_of(leaf(2), leaf(3), None);

    assert!(arena.insert(left, TypeNode::Union(right)));
    let members: &[TypeNode] = arena.members(left);
    assert_eq!(members, &[leaf(1), leaf(2), leaf(3)]);
    assert!(!arena.insert(left, TypeNode::Union(right)));
    assert_eq!(arena.members(left).len(), 3);
}
